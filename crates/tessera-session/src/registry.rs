//! Session registry: token → expiration store with a capacity bound.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::{RwLock, RwLockUpgradableReadGuard};
use serde::Serialize;
use tracing::{debug, trace, warn};

use crate::clock::{Clock, SystemClock, Timestamp};
use crate::config::RegistryConfig;
use crate::error::{Error, Result};
use crate::sweep;
use crate::token::{Token, TokenGenerator};

pub(crate) type SessionMap = HashMap<Token, Timestamp>;

/// In-memory registry of session tokens and their expirations.
///
/// This registry provides:
/// - Token issuing bounded by `max_sessions`
/// - Time-based validity checks against a caller-supplied `now`
/// - Sweeping of expired sessions, explicit or triggered by a full registry
/// - Thread-safe access via RwLock
///
/// Clones share the same underlying store.
pub struct SessionRegistry {
    sessions: Arc<RwLock<SessionMap>>,
    config: RegistryConfig,
    generator: TokenGenerator,
    clock: Arc<dyn Clock>,
}

impl SessionRegistry {
    /// Create a registry using the OS entropy source and the system clock.
    ///
    /// Fails with [`Error::InvalidConfig`] if the configuration is rejected.
    pub fn new(config: RegistryConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            config,
            generator: TokenGenerator::new(),
            clock: Arc::new(SystemClock),
        })
    }

    /// Replace the clock used for capacity-triggered sweeps.
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    /// Replace the token generator.
    pub fn with_generator(mut self, generator: TokenGenerator) -> Self {
        self.generator = generator;
        self
    }

    /// Get the registry configuration.
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Maximum number of sessions.
    pub fn capacity(&self) -> usize {
        self.config.max_sessions
    }

    /// Number of stored sessions, expired-but-unswept ones included.
    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    /// Check if the registry holds no sessions.
    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }

    /// Create a session expiring at `expiration` and return its token.
    ///
    /// The expiration is not checked against the current time. When the
    /// registry is full and the policy is
    /// [`OnCapacity`](crate::SweepPolicy::OnCapacity), expired sessions are
    /// swept first; if that frees nothing, [`Error::CapacityExceeded`] is
    /// returned and nothing is inserted.
    pub fn create(&self, expiration: Timestamp) -> Result<Token> {
        let capacity = self.config.max_sessions;
        let mut sessions = self.sessions.write();

        if sessions.len() >= capacity {
            if self.config.sweep_policy.sweeps_on_create() {
                let now = self.clock.now();
                let removed = sweep::remove_expired(&mut sessions, now);
                debug!(
                    removed = removed,
                    remaining = sessions.len(),
                    "Registry full, swept expired sessions"
                );
            }
            if sessions.len() >= capacity {
                warn!(capacity = capacity, "Rejecting session, registry is full");
                return Err(Error::CapacityExceeded { capacity });
            }
        }

        let token = self.generator.generate()?;
        sessions.insert(token.clone(), expiration);

        trace!(
            token = %token.redacted(),
            expiration = %expiration,
            size = sessions.len(),
            "Session created"
        );

        Ok(token)
    }

    /// Report whether `token` is known and `now` is strictly after its expiration.
    ///
    /// This answers "has this session run out", so a session created with
    /// expiration `E` is reported valid from just after `E` onward. Use
    /// [`is_live`](Self::is_live) for the "not yet expired" check.
    /// Unknown tokens are never valid. The store is not modified.
    pub fn is_valid(&self, token: &str, now: Timestamp) -> bool {
        self.expiration(token)
            .is_some_and(|expiration| now > expiration)
    }

    /// [`is_valid`](Self::is_valid) with `now` read from `clock`.
    pub fn is_valid_with(&self, token: &str, clock: &impl Clock) -> bool {
        self.is_valid(token, clock.now())
    }

    /// Report whether `token` is known and has not yet expired at `now`.
    pub fn is_live(&self, token: &str, now: Timestamp) -> bool {
        self.expiration(token)
            .is_some_and(|expiration| now <= expiration)
    }

    /// Stored expiration of `token`, if any.
    pub fn expiration(&self, token: &str) -> Option<Timestamp> {
        self.sessions.read().get(token).copied()
    }

    /// Remove every session whose expiration is strictly before `now`.
    ///
    /// The scan holds an upgradable read lock, so readers proceed while
    /// writers wait; the lock is upgraded only if something has to go.
    /// Returns the number of sessions removed.
    pub fn clean(&self, now: Timestamp) -> usize {
        let sessions = self.sessions.upgradable_read();
        if sweep::count_expired(&sessions, now) == 0 {
            trace!(size = sessions.len(), "Sweep found nothing to remove");
            return 0;
        }

        let mut sessions = RwLockUpgradableReadGuard::upgrade(sessions);
        let removed = sweep::remove_expired(&mut sessions, now);

        debug!(
            removed = removed,
            remaining = sessions.len(),
            "Swept expired sessions"
        );

        removed
    }

    /// Get registry statistics as of `now`.
    pub fn stats(&self, now: Timestamp) -> RegistryStats {
        let sessions = self.sessions.read();
        RegistryStats {
            sessions: sessions.len(),
            expired: sweep::count_expired(&sessions, now),
            capacity: self.config.max_sessions,
        }
    }

    /// Current time according to the registry's clock.
    pub(crate) fn now(&self) -> Timestamp {
        self.clock.now()
    }
}

impl Clone for SessionRegistry {
    fn clone(&self) -> Self {
        Self {
            sessions: Arc::clone(&self.sessions),
            config: self.config.clone(),
            generator: self.generator.clone(),
            clock: Arc::clone(&self.clock),
        }
    }
}

impl fmt::Debug for SessionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionRegistry")
            .field("config", &self.config)
            .field("size", &self.len())
            .finish_non_exhaustive()
    }
}

/// Registry statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RegistryStats {
    /// Stored sessions, including expired ones not yet swept.
    pub sessions: usize,

    /// Stored sessions whose expiration is before the sampled time.
    pub expired: usize,

    /// Maximum capacity.
    pub capacity: usize,
}
