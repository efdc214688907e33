//! Webhook secret sources.
//!
//! The signature verifier asks a [`SecretProvider`] for the shared secret on
//! every request, so a provider backed by the environment picks up rotations
//! without a restart.
//!
//! | Type | Source | Use |
//! |------|--------|-----|
//! | [`LiteralSecret`] | configuration value | development / CI |
//! | [`EnvSecret`] | environment variable, read per request | deployments |

use async_trait::async_trait;
use tracing::warn;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Secret material that is wiped from memory on drop and never printed.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SecretValue {
    inner: String,
}

impl SecretValue {
    /// Create secret value from string
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            inner: value.into(),
        }
    }

    /// Get secret as bytes (only for immediate use)
    pub fn expose_bytes(&self) -> &[u8] {
        self.inner.as_bytes()
    }

    /// Check if secret is empty
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl std::fmt::Debug for SecretValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretValue")
            .field("inner", &"<REDACTED>")
            .finish()
    }
}

/// Source of the shared secret used to verify webhook signatures.
#[async_trait]
pub trait SecretProvider: Send + Sync {
    /// Fetch the current secret.
    ///
    /// `Ok(None)` means no secret is configured, which the verifier treats as
    /// "skip verification". `Err` means the source itself failed.
    async fn webhook_secret(&self) -> Result<Option<SecretValue>, SecretError>;

    /// Short, non-sensitive description for log lines.
    fn describe(&self) -> String;
}

/// Error type for secret operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SecretError {
    #[error("Secret source unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("Invalid secret format: {key}")]
    InvalidFormat { key: String },
}

// ============================================================================
// LiteralSecret
// ============================================================================

/// A secret embedded in configuration.
///
/// **Development and testing only.** A `WARN` is emitted on construction so
/// operators notice a literal secret before going to production.
pub struct LiteralSecret {
    secret: SecretValue,
}

impl LiteralSecret {
    pub fn new(secret: impl Into<String>) -> Self {
        warn!(
            "Literal webhook secret is active; \
             secrets in configuration files are not safe for production"
        );
        Self {
            secret: SecretValue::new(secret),
        }
    }
}

impl std::fmt::Debug for LiteralSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LiteralSecret")
            .field("secret", &"<REDACTED>")
            .finish()
    }
}

#[async_trait]
impl SecretProvider for LiteralSecret {
    async fn webhook_secret(&self) -> Result<Option<SecretValue>, SecretError> {
        if self.secret.is_empty() {
            return Ok(None);
        }
        Ok(Some(self.secret.clone()))
    }

    fn describe(&self) -> String {
        "literal".to_string()
    }
}

// ============================================================================
// EnvSecret
// ============================================================================

/// A secret read from an environment variable at verification time.
///
/// An unset or empty variable means "no secret configured".
#[derive(Debug, Clone)]
pub struct EnvSecret {
    variable: String,
}

impl EnvSecret {
    pub fn new(variable: impl Into<String>) -> Self {
        Self {
            variable: variable.into(),
        }
    }

    /// Name of the environment variable.
    pub fn variable(&self) -> &str {
        &self.variable
    }
}

#[async_trait]
impl SecretProvider for EnvSecret {
    async fn webhook_secret(&self) -> Result<Option<SecretValue>, SecretError> {
        match std::env::var(&self.variable) {
            Ok(value) if value.is_empty() => Ok(None),
            Ok(value) => Ok(Some(SecretValue::new(value))),
            Err(std::env::VarError::NotPresent) => Ok(None),
            Err(std::env::VarError::NotUnicode(_)) => Err(SecretError::InvalidFormat {
                key: self.variable.clone(),
            }),
        }
    }

    fn describe(&self) -> String {
        format!("env:{}", self.variable)
    }
}

#[cfg(test)]
#[path = "secrets_tests.rs"]
mod tests;
