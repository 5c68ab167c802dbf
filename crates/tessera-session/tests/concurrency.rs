//! Multi-threaded behavior of the session registry.

use std::sync::Barrier;
use std::thread;

use chrono::{Duration, TimeZone, Utc};
use tessera_session::{
    Error, ManualClock, RegistryConfig, SessionRegistry, SweepPolicy, Timestamp, Token,
};

fn t0() -> Timestamp {
    Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap()
}

fn registry(max: usize, policy: SweepPolicy) -> SessionRegistry {
    let config = RegistryConfig::new()
        .with_max_sessions(max)
        .with_sweep_policy(policy);
    SessionRegistry::new(config).unwrap()
}

#[test]
fn test_concurrent_create_never_over_admits() {
    const THREADS: usize = 16;
    const PER_THREAD: usize = 50;
    const CAPACITY: usize = 300;

    let reg = registry(CAPACITY, SweepPolicy::External);
    let barrier = Barrier::new(THREADS);
    let expires = t0() + Duration::hours(1);

    let results: Vec<Vec<Result<Token, Error>>> = thread::scope(|s| {
        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                let reg = reg.clone();
                let barrier = &barrier;
                s.spawn(move || {
                    barrier.wait();
                    (0..PER_THREAD)
                        .map(|_| reg.create(expires))
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let mut issued = Vec::new();
    let mut rejected = 0;
    for result in results.into_iter().flatten() {
        match result {
            Ok(token) => issued.push(token),
            Err(Error::CapacityExceeded { capacity }) => {
                assert_eq!(capacity, CAPACITY);
                rejected += 1;
            }
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    assert_eq!(issued.len(), CAPACITY);
    assert_eq!(rejected, THREADS * PER_THREAD - CAPACITY);
    assert_eq!(reg.len(), CAPACITY);
    for token in &issued {
        assert_eq!(reg.expiration(token.as_str()), Some(expires));
        assert!(reg.is_live(token.as_str(), t0()));
    }
}

#[test]
fn test_concurrent_create_and_clean() {
    const WRITERS: usize = 8;
    const PER_WRITER: usize = 100;

    let clock = ManualClock::new(t0());
    let reg = registry(10_000, SweepPolicy::OnCapacity).with_clock(clock);
    let stale = t0() - Duration::seconds(1);
    let fresh = t0() + Duration::hours(1);

    let fresh_tokens: Vec<Token> = thread::scope(|s| {
        let writers: Vec<_> = (0..WRITERS)
            .map(|i| {
                let reg = reg.clone();
                s.spawn(move || {
                    let mut kept = Vec::new();
                    for n in 0..PER_WRITER {
                        if (i + n) % 2 == 0 {
                            kept.push(reg.create(fresh).unwrap());
                        } else {
                            reg.create(stale).unwrap();
                        }
                    }
                    kept
                })
            })
            .collect();

        let sweeper = {
            let reg = reg.clone();
            s.spawn(move || {
                let mut removed = 0;
                for _ in 0..50 {
                    removed += reg.clean(t0());
                    thread::yield_now();
                }
                removed
            })
        };

        let kept = writers
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect();
        sweeper.join().unwrap();
        kept
    });

    reg.clean(t0());

    assert_eq!(reg.len(), fresh_tokens.len());
    assert_eq!(reg.stats(t0()).expired, 0);
    for token in &fresh_tokens {
        assert!(reg.is_live(token.as_str(), t0()));
    }
}

#[test]
fn test_readers_see_consistent_answers_during_sweeps() {
    let reg = registry(1_000, SweepPolicy::External);
    let keep = reg.create(t0() + Duration::hours(1)).unwrap();
    for _ in 0..500 {
        reg.create(t0() - Duration::hours(1)).unwrap();
    }

    thread::scope(|s| {
        for _ in 0..4 {
            let reg = reg.clone();
            let keep = keep.clone();
            s.spawn(move || {
                for _ in 0..1_000 {
                    assert!(reg.is_live(keep.as_str(), t0()));
                    assert!(!reg.is_valid(keep.as_str(), t0()));
                }
            });
        }
        let reg = reg.clone();
        s.spawn(move || reg.clean(t0()));
    });

    assert_eq!(reg.len(), 1);
}
