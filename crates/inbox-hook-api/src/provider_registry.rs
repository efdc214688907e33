//! Provider registry for multi-provider notification routing.
//!
//! This module provides [`ProviderRegistry`] for associating named providers
//! (e.g. `"nylas"`) with their [`NotificationIntake`] pipelines. The registry
//! is built once at startup and used read-only during request handling.
//!
//! # URL Structure
//!
//! Each registered provider is reachable at:
//! ```text
//! GET  /webhook/{provider_id}?challenge=<token>
//! POST /webhook/{provider_id}
//! POST /pubsub/{provider_id}
//! ```

use crate::config::{ProviderConfig, ServiceConfig};
use crate::errors::ConfigError;
use inbox_hook_core::{
    Dispatcher, NotificationIntake, NotificationProcessor, NotificationSink, SignatureVerifier,
};
use std::{collections::HashMap, sync::Arc};
use tracing::info;

// ============================================================================
// ProviderId
// ============================================================================

/// URL-safe identifier for a notification provider.
///
/// A provider ID must consist entirely of lowercase ASCII letters, digits,
/// hyphens (`-`), or underscores (`_`). It must not be empty.
///
/// # Examples
///
/// ```rust
/// use inbox_hook_api::provider_registry::ProviderId;
///
/// let id = ProviderId::new("nylas").unwrap();
/// assert_eq!(id.as_str(), "nylas");
///
/// assert!(ProviderId::new("Nylas").is_err()); // uppercase not allowed
/// assert!(ProviderId::new("").is_err());      // empty not allowed
/// assert!(ProviderId::new("../escape").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProviderId(String);

impl ProviderId {
    /// Create a new `ProviderId`, validating it contains only URL-safe characters.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidProviderIdError::Empty`] if the value is empty.
    /// Returns [`InvalidProviderIdError::InvalidChars`] if the value contains
    /// characters outside `[a-z0-9\-_]`.
    pub fn new(value: impl Into<String>) -> Result<Self, InvalidProviderIdError> {
        let s = value.into();
        if s.is_empty() {
            return Err(InvalidProviderIdError::Empty);
        }
        if !s
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_')
        {
            return Err(InvalidProviderIdError::InvalidChars { value: s });
        }
        Ok(Self(s))
    }

    /// Return the provider ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ProviderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Error returned when a [`ProviderId`] cannot be created.
#[derive(Debug, thiserror::Error)]
pub enum InvalidProviderIdError {
    #[error("Provider ID must not be empty")]
    Empty,

    #[error(
        "Provider ID '{value}' contains invalid characters; \
         use lowercase alphanumeric, hyphens, or underscores"
    )]
    InvalidChars { value: String },
}

// ============================================================================
// ProviderRegistry
// ============================================================================

/// A registered provider: its pipeline and the header its signature
/// arrives in.
#[derive(Clone)]
pub struct RegisteredProvider {
    pub intake: Arc<dyn NotificationIntake>,
    pub signature_header: String,
}

/// Registry mapping provider IDs to their intake pipelines.
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    providers: HashMap<String, RegisteredProvider>,
}

impl ProviderRegistry {
    /// Create a new, empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the registry for every effective provider in `config`.
    ///
    /// All providers share `sink`. Each gets the built-in handlers and a
    /// verifier configured from its secret and `require_signature` flag.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ProviderValidation`] for the first provider
    /// that fails validation.
    pub fn from_config(
        config: &ServiceConfig,
        sink: Arc<dyn NotificationSink>,
    ) -> Result<Self, ConfigError> {
        let mut registry = Self::new();

        for provider in config.effective_providers() {
            provider.validate()?;
            let id = ProviderId::new(&provider.id).map_err(|e| ConfigError::ProviderValidation {
                provider: provider.id.clone(),
                message: e.to_string(),
            })?;

            registry.register(
                id,
                Arc::new(build_processor(&provider, sink.clone())),
                provider.signature_header(),
            );
            info!(
                provider = %provider.id,
                signature_header = %provider.signature_header(),
                require_signature = provider.require_signature,
                secret_configured = provider.secret.is_some(),
                "Registered notification provider"
            );
        }

        Ok(registry)
    }

    /// Register a provider.
    ///
    /// If a provider with the same ID is already registered it is replaced.
    /// Returns `&mut Self` to allow method chaining.
    pub fn register(
        &mut self,
        id: ProviderId,
        intake: Arc<dyn NotificationIntake>,
        signature_header: impl Into<String>,
    ) -> &mut Self {
        self.providers.insert(
            id.0,
            RegisteredProvider {
                intake,
                signature_header: signature_header.into(),
            },
        );
        self
    }

    /// Look up a provider by name.
    ///
    /// Returns `None` if the provider is not registered.
    pub fn get(&self, provider: &str) -> Option<RegisteredProvider> {
        self.providers.get(provider).cloned()
    }

    /// Check whether a provider is registered.
    pub fn contains(&self, provider: &str) -> bool {
        self.providers.contains_key(provider)
    }

    /// Registered provider IDs, sorted.
    pub fn provider_ids(&self) -> Vec<String> {
        let mut ids: Vec<_> = self.providers.keys().cloned().collect();
        ids.sort_unstable();
        ids
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

fn build_processor(
    provider: &ProviderConfig,
    sink: Arc<dyn NotificationSink>,
) -> NotificationProcessor {
    let verifier = SignatureVerifier::new(provider.secret_provider(), provider.verification_policy());
    NotificationProcessor::new(verifier, Dispatcher::with_default_handlers(sink))
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("providers", &self.provider_ids())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[path = "provider_registry_tests.rs"]
mod tests;
