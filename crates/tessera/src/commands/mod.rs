//! CLI command handlers.

pub mod config;
pub mod simulate;

use crate::config::LoadedConfig;

/// Shared context for all commands.
#[derive(Debug, Clone)]
pub struct Context {
    /// Configuration resolved from file discovery.
    pub config: LoadedConfig,
    /// Verbose output enabled.
    pub verbose: bool,
}
