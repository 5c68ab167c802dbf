//! Expiry sweeping.
//!
//! The scan/remove helpers operate on an already-locked session map; the
//! registry decides which lock is held. [`Sweeper`] runs
//! [`SessionRegistry::clean`] periodically on a background thread.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread::JoinHandle;
use std::time::Duration;

use tracing::{debug, info};

use crate::clock::Timestamp;
use crate::registry::{SessionMap, SessionRegistry};

/// An entry is expired once its expiration is strictly before `now`.
pub(crate) fn is_expired(expiration: Timestamp, now: Timestamp) -> bool {
    expiration < now
}

/// Count expired entries without modifying the map.
pub(crate) fn count_expired(sessions: &SessionMap, now: Timestamp) -> usize {
    sessions
        .values()
        .filter(|expiration| is_expired(**expiration, now))
        .count()
}

/// Remove all expired entries and return how many were removed.
pub(crate) fn remove_expired(sessions: &mut SessionMap, now: Timestamp) -> usize {
    let before = sessions.len();
    sessions.retain(|_, expiration| !is_expired(*expiration, now));
    before - sessions.len()
}

/// Periodic background sweeper.
pub struct Sweeper;

impl Sweeper {
    /// Start sweeping `registry` every `interval`.
    ///
    /// Each pass calls `clean` with the registry's clock. The thread runs
    /// until the returned handle is stopped or dropped.
    pub fn spawn(registry: SessionRegistry, interval: Duration) -> SweeperHandle {
        let (stop_tx, stop_rx) = mpsc::channel::<()>();
        let removed = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&removed);

        let thread = std::thread::spawn(move || {
            info!(
                interval_ms = interval.as_millis() as u64,
                "Session sweeper started"
            );

            loop {
                match stop_rx.recv_timeout(interval) {
                    Err(RecvTimeoutError::Timeout) => {
                        let swept = registry.clean(registry.now());
                        if swept > 0 {
                            counter.fetch_add(swept, Ordering::Relaxed);
                        }
                    }
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }
            }

            debug!(
                removed = counter.load(Ordering::Relaxed),
                "Session sweeper stopped"
            );
        });

        SweeperHandle {
            stop_tx: Some(stop_tx),
            thread: Some(thread),
            removed,
        }
    }
}

/// Handle to a running [`Sweeper`] thread.
///
/// Dropping the handle stops the sweeper and waits for it to exit.
pub struct SweeperHandle {
    stop_tx: Option<mpsc::Sender<()>>,
    thread: Option<JoinHandle<()>>,
    removed: Arc<AtomicUsize>,
}

impl SweeperHandle {
    /// Check if the sweeper thread is still running.
    pub fn is_running(&self) -> bool {
        self.thread.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Total sessions removed by this sweeper so far.
    pub fn removed(&self) -> usize {
        self.removed.load(Ordering::Relaxed)
    }

    /// Stop the sweeper and wait for it to exit. Returns the total removed.
    pub fn stop(mut self) -> usize {
        self.shutdown();
        self.removed()
    }

    fn shutdown(&mut self) {
        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.send(());
        }
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

impl Drop for SweeperHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}
