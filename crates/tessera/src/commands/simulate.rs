//! Simulate command - drive a registry with concurrent session requests.

use std::thread::{self, ScopedJoinHandle};
use std::time::{Duration, Instant};

use anyhow::{Context as _, Result, anyhow, bail};
use chrono::Utc;
use clap::{Args, ValueEnum};
use serde::Serialize;
use tessera_session::{Error, RegistryConfig, SessionRegistry, SweepPolicy, Sweeper};
use tracing::{debug, info};

use super::Context;

/// Arguments for the simulate command.
#[derive(Args, Debug)]
pub struct SimulateArgs {
    /// Number of sessions to request
    #[arg(long, default_value_t = 1000)]
    pub sessions: usize,

    /// Number of threads issuing requests
    #[arg(long, default_value_t = 4)]
    pub threads: usize,

    /// Lifetime of each session in milliseconds
    #[arg(long, default_value_t = 100)]
    pub ttl_ms: u64,

    /// Override the configured capacity
    #[arg(long)]
    pub max_sessions: Option<usize>,

    /// Override the configured sweep policy
    #[arg(long, value_enum)]
    pub policy: Option<PolicyArg>,

    /// Run a background sweeper at this interval (milliseconds)
    #[arg(long)]
    pub sweep_interval_ms: Option<u64>,

    /// Wait for every session to expire before the final sweep
    #[arg(long)]
    pub wait: bool,

    /// Output the report as JSON
    #[arg(long)]
    pub json: bool,
}

/// Sweep policy as spelled on the command line.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum PolicyArg {
    External,
    OnCapacity,
}

impl From<PolicyArg> for SweepPolicy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::External => SweepPolicy::External,
            PolicyArg::OnCapacity => SweepPolicy::OnCapacity,
        }
    }
}

/// Outcome of a simulation run.
#[derive(Debug, Serialize)]
pub struct SimulationReport {
    pub requested: usize,
    pub created: usize,
    pub rejected: usize,
    pub failed: usize,
    pub capacity: usize,
    pub policy: SweepPolicy,
    pub expired_before_sweep: usize,
    pub swept_in_background: usize,
    pub swept_on_clean: usize,
    pub remaining: usize,
    pub elapsed_ms: u64,
}

#[derive(Debug, Default)]
struct Tally {
    created: usize,
    rejected: usize,
    failed: usize,
}

/// Run the simulate command.
pub fn run(args: SimulateArgs, ctx: &Context) -> Result<()> {
    if args.threads == 0 {
        bail!("--threads must be at least 1");
    }
    if args.sweep_interval_ms == Some(0) {
        bail!("--sweep-interval-ms must be at least 1");
    }

    let ttl = session_ttl(args.ttl_ms)?;

    let config = effective_config(&args, &ctx.config.config.session);
    let registry = SessionRegistry::new(config.clone()).context("invalid registry settings")?;

    info!(
        sessions = args.sessions,
        threads = args.threads,
        capacity = config.max_sessions,
        policy = %config.sweep_policy,
        "Starting simulation"
    );

    let sweeper = args
        .sweep_interval_ms
        .map(Duration::from_millis)
        .or_else(|| config.sweep_interval())
        .map(|interval| Sweeper::spawn(registry.clone(), interval));

    let started = Instant::now();
    let tally = issue_sessions(&registry, args.sessions, args.threads, ttl)?;

    if args.wait {
        thread::sleep(Duration::from_millis(args.ttl_ms.saturating_add(1)));
    }

    let swept_in_background = sweeper.map(|s| s.stop()).unwrap_or(0);
    let now = Utc::now();
    let expired_before_sweep = registry.stats(now).expired;
    let swept_on_clean = registry.clean(now);

    let report = SimulationReport {
        requested: args.sessions,
        created: tally.created,
        rejected: tally.rejected,
        failed: tally.failed,
        capacity: config.max_sessions,
        policy: config.sweep_policy,
        expired_before_sweep,
        swept_in_background,
        swept_on_clean,
        remaining: registry.len(),
        elapsed_ms: started.elapsed().as_millis() as u64,
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    Ok(())
}

/// Apply command-line overrides on top of the loaded `[session]` table.
fn effective_config(args: &SimulateArgs, base: &RegistryConfig) -> RegistryConfig {
    let mut config = base.clone();
    if let Some(max) = args.max_sessions {
        config = config.with_max_sessions(max);
    }
    if let Some(policy) = args.policy {
        config = config.with_sweep_policy(policy.into());
    }
    config
}

/// Convert `--ttl-ms` into a lifetime that can be added to the current time.
fn session_ttl(ttl_ms: u64) -> Result<chrono::Duration> {
    let ttl = i64::try_from(ttl_ms)
        .ok()
        .and_then(chrono::Duration::try_milliseconds)
        .filter(|ttl| Utc::now().checked_add_signed(*ttl).is_some())
        .ok_or_else(|| anyhow!("--ttl-ms {ttl_ms} is out of range for a session expiration"))?;
    Ok(ttl)
}

fn issue_sessions(
    registry: &SessionRegistry,
    sessions: usize,
    threads: usize,
    ttl: chrono::Duration,
) -> Result<Tally> {
    let per_thread = sessions / threads;
    let remainder = sessions % threads;

    thread::scope(|s| {
        let handles: Vec<_> = (0..threads)
            .map(|i| {
                let count = per_thread + usize::from(i < remainder);
                let registry = registry.clone();
                s.spawn(move || -> Result<Tally> {
                    let mut tally = Tally::default();
                    for _ in 0..count {
                        let expiration = Utc::now()
                            .checked_add_signed(ttl)
                            .ok_or_else(|| anyhow!("session expiration out of range"))?;
                        match registry.create(expiration) {
                            Ok(_) => tally.created += 1,
                            Err(Error::CapacityExceeded { .. }) => tally.rejected += 1,
                            Err(e) => {
                                debug!(error = %e, "Session creation failed");
                                tally.failed += 1;
                            }
                        }
                    }
                    Ok(tally)
                })
            })
            .collect();

        join_tallies(handles)
    })
}

/// Join every worker and sum their tallies; a panicked or failed worker fails the run.
fn join_tallies(handles: Vec<ScopedJoinHandle<'_, Result<Tally>>>) -> Result<Tally> {
    let mut total = Tally::default();
    for handle in handles {
        let tally = handle
            .join()
            .map_err(|_| anyhow!("session worker panicked"))??;
        total.created += tally.created;
        total.rejected += tally.rejected;
        total.failed += tally.failed;
    }
    Ok(total)
}

fn print_report(report: &SimulationReport) {
    println!("Simulation ({} policy)", report.policy);
    println!("  requested:            {}", report.requested);
    println!("  created:              {}", report.created);
    println!("  rejected (capacity):  {}", report.rejected);
    println!("  failed (entropy):     {}", report.failed);
    println!("  capacity:             {}", report.capacity);
    println!("  expired before sweep: {}", report.expired_before_sweep);
    println!("  swept in background:  {}", report.swept_in_background);
    println!("  swept on clean:       {}", report.swept_on_clean);
    println!("  remaining:            {}", report.remaining);
    println!("  elapsed:              {}ms", report.elapsed_ms);
}
