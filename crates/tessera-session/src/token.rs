//! Session token generation.

use std::borrow::Borrow;
use std::fmt;
use std::sync::Arc;

use base64::{Engine, engine::general_purpose::STANDARD};
use rand::TryRngCore;
use rand::rngs::OsRng;
use serde::Serialize;
use tracing::warn;

use crate::error::{Error, Result};

/// Number of random bytes behind each token.
pub const TOKEN_BYTES: usize = 18;

/// Length of the encoded token text.
pub const TOKEN_LEN: usize = TOKEN_BYTES.div_ceil(3) * 4;

/// Opaque session identifier.
///
/// Standard base64 (with padding) of [`TOKEN_BYTES`] random bytes.
#[derive(Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Token(String);

impl Token {
    /// Borrow the token text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume the token, returning its text.
    pub fn into_string(self) -> String {
        self.0
    }

    /// Short prefix that is safe to put in logs.
    pub(crate) fn redacted(&self) -> &str {
        let end = self
            .0
            .char_indices()
            .nth(6)
            .map_or(self.0.len(), |(i, _)| i);
        &self.0[..end]
    }
}

// Tokens are credentials: Debug shows only a prefix.
impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Token({}…)", self.redacted())
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Token {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for Token {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<Token> for String {
    fn from(token: Token) -> Self {
        token.0
    }
}

/// Source of random bytes for tokens.
pub trait EntropySource: Send + Sync {
    /// Fill `dest` entirely with random bytes.
    fn fill(&self, dest: &mut [u8]) -> Result<()>;
}

/// The operating system's secure random generator.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsEntropy;

impl EntropySource for OsEntropy {
    fn fill(&self, dest: &mut [u8]) -> Result<()> {
        OsRng
            .try_fill_bytes(dest)
            .map_err(|e| Error::Entropy(e.to_string()))
    }
}

/// Produces session tokens from an entropy source.
#[derive(Clone)]
pub struct TokenGenerator {
    source: Arc<dyn EntropySource>,
}

impl Default for TokenGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TokenGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenGenerator").finish_non_exhaustive()
    }
}

impl TokenGenerator {
    /// Create a generator backed by the OS random generator.
    pub fn new() -> Self {
        Self::with_source(OsEntropy)
    }

    /// Create a generator backed by a custom entropy source.
    pub fn with_source(source: impl EntropySource + 'static) -> Self {
        Self {
            source: Arc::new(source),
        }
    }

    /// Generate a new token.
    ///
    /// Entropy failures are returned as-is; there is no retry.
    pub fn generate(&self) -> Result<Token> {
        let mut bytes = [0u8; TOKEN_BYTES];
        if let Err(e) = self.source.fill(&mut bytes) {
            warn!(error = %e, "Failed to read entropy for session token");
            return Err(e);
        }
        Ok(Token(STANDARD.encode(bytes)))
    }
}
