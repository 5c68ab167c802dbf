//! Configuration for the session registry.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default maximum number of live sessions.
pub const DEFAULT_MAX_SESSIONS: usize = 10_000;

/// When the registry reclaims expired sessions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SweepPolicy {
    /// Sessions are only reclaimed by explicit `clean` calls or a background sweeper.
    External,
    /// `create` sweeps expired sessions when the registry is full, before rejecting.
    #[default]
    OnCapacity,
}

impl SweepPolicy {
    /// Whether `create` should sweep when it finds the registry full.
    pub fn sweeps_on_create(self) -> bool {
        matches!(self, SweepPolicy::OnCapacity)
    }
}

impl fmt::Display for SweepPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SweepPolicy::External => write!(f, "external"),
            SweepPolicy::OnCapacity => write!(f, "on_capacity"),
        }
    }
}

/// Configuration for the session registry.
///
/// Loaded from the `[session]` table of a TOML file or built in code:
///
/// ```toml
/// [session]
/// max_sessions = 10000
/// sweep_policy = "on_capacity"
/// sweep_interval_secs = 60
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Maximum number of sessions held at once. Must be non-zero.
    pub max_sessions: usize,

    /// When expired sessions are reclaimed.
    pub sweep_policy: SweepPolicy,

    /// Interval for a background sweeper, if the host runs one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sweep_interval_secs: Option<u64>,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            max_sessions: DEFAULT_MAX_SESSIONS,
            sweep_policy: SweepPolicy::default(),
            sweep_interval_secs: None,
        }
    }
}

impl RegistryConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum number of sessions.
    pub fn with_max_sessions(mut self, max: usize) -> Self {
        self.max_sessions = max;
        self
    }

    /// Set the sweep policy.
    pub fn with_sweep_policy(mut self, policy: SweepPolicy) -> Self {
        self.sweep_policy = policy;
        self
    }

    /// Set the background sweep interval.
    ///
    /// The interval is stored in whole seconds; fractions round up, so any
    /// non-zero interval is at least one second.
    pub fn with_sweep_interval(mut self, interval: Duration) -> Self {
        let secs = interval
            .as_secs()
            .saturating_add(u64::from(interval.subsec_nanos() > 0));
        self.sweep_interval_secs = Some(secs);
        self
    }

    /// Background sweep interval, if configured.
    pub fn sweep_interval(&self) -> Option<Duration> {
        self.sweep_interval_secs.map(Duration::from_secs)
    }

    /// Reject configurations the registry cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.max_sessions == 0 {
            return Err(Error::InvalidConfig(
                "max_sessions must be greater than zero".to_string(),
            ));
        }
        if self.sweep_interval_secs == Some(0) {
            return Err(Error::InvalidConfig(
                "sweep_interval_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
