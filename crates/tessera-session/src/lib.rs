//! In-memory session token registry.
//!
//! This crate issues opaque random session tokens bound to an expiration
//! time, with:
//! - A capacity bound on the number of stored sessions
//! - Validity checks against a caller-supplied current time
//! - Sweeping of expired sessions, explicit, capacity-triggered, or periodic
//!
//! # Example
//!
//! ```rust
//! use chrono::{Duration, Utc};
//! use tessera_session::{RegistryConfig, SessionRegistry, SweepPolicy};
//!
//! let config = RegistryConfig::default()
//!     .with_max_sessions(1000)
//!     .with_sweep_policy(SweepPolicy::OnCapacity);
//! let registry = SessionRegistry::new(config)?;
//!
//! let expires = Utc::now() + Duration::hours(1);
//! let token = registry.create(expires)?;
//! assert!(registry.is_live(token.as_str(), Utc::now()));
//! # Ok::<(), tessera_session::Error>(())
//! ```

mod clock;
mod config;
mod error;
mod registry;
mod sweep;
mod token;

pub use clock::{Clock, ManualClock, SystemClock, Timestamp};
pub use config::{DEFAULT_MAX_SESSIONS, RegistryConfig, SweepPolicy};
pub use error::{Error, Result};
pub use registry::{RegistryStats, SessionRegistry};
pub use sweep::{Sweeper, SweeperHandle};
pub use token::{EntropySource, OsEntropy, TOKEN_BYTES, TOKEN_LEN, Token, TokenGenerator};
