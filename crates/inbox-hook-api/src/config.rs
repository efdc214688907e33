//! Configuration types for the HTTP service
//!
//! Every field carries a serde default, so an empty environment produces a
//! valid configuration. [`ServiceConfig::load`] layers the sources:
//!
//! 1. `/etc/inbox-hook/service.yaml` (optional)
//! 2. `./config/service.yaml` (optional)
//! 3. an explicit file, from the caller or `INBOX_HOOK_CONFIG_FILE` (required when given)
//! 4. environment variables prefixed `INBOX_HOOK__`, with `__` between
//!    segments, e.g. `INBOX_HOOK__SERVER__PORT=9090`

use crate::errors::ConfigError;
use crate::provider_registry::ProviderId;
use inbox_hook_core::{EnvSecret, LiteralSecret, SecretProvider, VerificationPolicy};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Provider registered when the configuration lists none.
pub const DEFAULT_PROVIDER_ID: &str = "nylas";

/// Environment variable holding the default provider's webhook secret.
pub const DEFAULT_SECRET_VARIABLE: &str = "NYLAS_WEBHOOK_SECRET";

/// Environment variable naming an explicit configuration file.
pub const CONFIG_FILE_ENV: &str = "INBOX_HOOK_CONFIG_FILE";

/// Prefix for configuration environment variables.
pub const ENV_PREFIX: &str = "INBOX_HOOK";

// ============================================================================
// ServiceConfig
// ============================================================================

/// Service configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// HTTP server settings
    pub server: ServerConfig,

    /// Logging configuration
    pub logging: LoggingConfig,

    /// Notification providers, each served under `/webhook/{id}` and
    /// `/pubsub/{id}`
    pub providers: Vec<ProviderConfig>,
}

impl ServiceConfig {
    /// Load configuration from files and the environment.
    ///
    /// `explicit_path` takes precedence over `INBOX_HOOK_CONFIG_FILE`. The
    /// file format follows its extension (`.yaml`, `.json` or `.toml`).
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Load`] when an explicit file is missing, a file
    /// is malformed, or a value cannot be coerced to its field type.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = config::Config::builder()
            .add_source(
                config::File::with_name("/etc/inbox-hook/service")
                    .required(false)
                    .format(config::FileFormat::Yaml),
            )
            .add_source(
                config::File::with_name("config/service")
                    .required(false)
                    .format(config::FileFormat::Yaml),
            );

        let from_env = std::env::var(CONFIG_FILE_ENV)
            .ok()
            .filter(|p| !p.is_empty());
        let explicit = explicit_path
            .map(Path::to_path_buf)
            .or_else(|| from_env.map(Into::into));

        if let Some(path) = explicit {
            info!(path = %path.display(), "Loading configuration from explicit path");
            builder = builder.add_source(config::File::from(path).required(true));
        }

        let config = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Ok(config.try_deserialize()?)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::Invalid`] for a zero port or body size
    /// - [`ConfigError::ProviderValidation`] for the first invalid or
    ///   duplicated provider
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Invalid {
                message: "server.port must not be 0".to_string(),
            });
        }
        if self.server.max_body_size == 0 {
            return Err(ConfigError::Invalid {
                message: "server.max_body_size must not be 0".to_string(),
            });
        }

        let mut seen = HashSet::new();
        for provider in &self.providers {
            provider.validate()?;
            if !seen.insert(provider.id.as_str()) {
                return Err(ConfigError::ProviderValidation {
                    provider: provider.id.clone(),
                    message: "provider id is configured more than once".to_string(),
                });
            }
        }
        Ok(())
    }

    /// The configured providers, or the default provider when none are
    /// configured.
    pub fn effective_providers(&self) -> Vec<ProviderConfig> {
        if self.providers.is_empty() {
            vec![ProviderConfig::default_provider()]
        } else {
            self.providers.clone()
        }
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,

    /// Graceful shutdown timeout in seconds
    pub shutdown_timeout_seconds: u64,

    /// Maximum request size in bytes
    pub max_body_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            shutdown_timeout_seconds: 30,
            max_body_size: 10 * 1024 * 1024, // 10MB
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default level when `RUST_LOG` is not set
    pub level: String,

    /// Enable JSON structured logging
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
        }
    }
}

// ============================================================================
// ProviderConfig
// ============================================================================

/// One notification provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// URL-safe provider identifier (`[a-z0-9\-_]+`).
    pub id: String,

    /// Header carrying the webhook signature. Defaults to
    /// `X-<Id>-Signature`.
    #[serde(default)]
    pub signature_header: Option<String>,

    /// Reject webhooks that cannot be verified instead of accepting them
    /// with a warning.
    #[serde(default)]
    pub require_signature: bool,

    /// Where the webhook secret comes from. `None` disables verification.
    #[serde(default)]
    pub secret: Option<ProviderSecretConfig>,
}

impl ProviderConfig {
    /// The provider used when nothing is configured: `nylas`, secret from
    /// `NYLAS_WEBHOOK_SECRET`, permissive verification.
    pub fn default_provider() -> Self {
        Self {
            id: DEFAULT_PROVIDER_ID.to_string(),
            signature_header: None,
            require_signature: false,
            secret: Some(ProviderSecretConfig::Env {
                variable: DEFAULT_SECRET_VARIABLE.to_string(),
            }),
        }
    }

    /// Signature header name, explicit or derived from the id.
    pub fn signature_header(&self) -> String {
        self.signature_header
            .clone()
            .filter(|h| !h.is_empty())
            .unwrap_or_else(|| default_signature_header(&self.id))
    }

    pub fn verification_policy(&self) -> VerificationPolicy {
        if self.require_signature {
            VerificationPolicy::Strict
        } else {
            VerificationPolicy::Permissive
        }
    }

    /// Build the secret source for this provider.
    pub fn secret_provider(&self) -> Option<Arc<dyn SecretProvider>> {
        self.secret.as_ref().map(ProviderSecretConfig::to_provider)
    }

    /// Validate this provider.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ProviderValidation`] when the id is not
    /// URL-safe, the secret is misconfigured, or a signature is required
    /// without a secret.
    pub fn validate(&self) -> Result<(), ConfigError> {
        ProviderId::new(&self.id).map_err(|e| self.invalid(&e.to_string()))?;

        if let Some(header) = &self.signature_header {
            if axum::http::HeaderName::from_bytes(header.as_bytes()).is_err() {
                return Err(self.invalid(&format!("'{header}' is not a valid header name")));
            }
        }

        match &self.secret {
            Some(secret) => secret.validate(&self.id)?,
            None if self.require_signature => {
                return Err(self.invalid("require_signature is set but no secret is configured"));
            }
            None => {}
        }

        Ok(())
    }

    fn invalid(&self, message: &str) -> ConfigError {
        ConfigError::ProviderValidation {
            provider: self.id.clone(),
            message: message.to_string(),
        }
    }
}

/// `nylas` becomes `X-Nylas-Signature`, `my_app` becomes `X-My-App-Signature`.
pub fn default_signature_header(provider_id: &str) -> String {
    let name = provider_id
        .split(['-', '_'])
        .filter(|segment| !segment.is_empty())
        .map(|segment| {
            let mut chars = segment.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join("-");
    format!("X-{name}-Signature")
}

// ============================================================================
// ProviderSecretConfig
// ============================================================================

/// Source of a provider's webhook secret.
///
/// ```yaml
/// secret:
///   type: env
///   variable: NYLAS_WEBHOOK_SECRET
/// ```
///
/// `literal` embeds the secret in configuration and is meant for local
/// development; a `WARN` is emitted when it is activated.
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum ProviderSecretConfig {
    /// Secret embedded in the configuration.
    Literal { value: String },

    /// Secret read from an environment variable at verification time.
    Env { variable: String },
}

impl ProviderSecretConfig {
    /// Validate this secret source.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ProviderValidation`] when the literal value or
    /// the variable name is empty.
    pub fn validate(&self, provider_id: &str) -> Result<(), ConfigError> {
        let message = match self {
            Self::Literal { value } if value.is_empty() => "literal secret value must not be empty",
            Self::Env { variable } if variable.is_empty() => {
                "secret environment variable name must not be empty"
            }
            _ => return Ok(()),
        };
        Err(ConfigError::ProviderValidation {
            provider: provider_id.to_string(),
            message: message.to_string(),
        })
    }

    pub fn to_provider(&self) -> Arc<dyn SecretProvider> {
        match self {
            Self::Literal { value } => Arc::new(LiteralSecret::new(value.clone())),
            Self::Env { variable } => Arc::new(EnvSecret::new(variable.clone())),
        }
    }
}

impl std::fmt::Debug for ProviderSecretConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Literal { .. } => f
                .debug_struct("ProviderSecretConfig::Literal")
                .field("value", &"<REDACTED>")
                .finish(),
            Self::Env { variable } => f
                .debug_struct("ProviderSecretConfig::Env")
                .field("variable", variable)
                .finish(),
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
