//! Prometheus counters for the intake endpoints.
//!
//! Each [`ServiceMetrics`] owns its own [`Registry`], so several routers (in
//! tests, for example) never collide on metric names.

use inbox_hook_core::{Disposition, IntakeError, IntakeOutcome};
use prometheus::{IntCounterVec, Opts, Registry, TextEncoder};
use std::sync::Arc;

/// Which intake endpoint a request arrived on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntakePath {
    Webhook,
    PubSub,
}

impl IntakePath {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Webhook => "webhook",
            Self::PubSub => "pubsub",
        }
    }
}

/// Service metrics for observability
pub struct ServiceMetrics {
    registry: Registry,

    /// Requests per endpoint and provider
    pub requests_total: IntCounterVec,

    /// Accepted notifications per category (`unrecognized` / `missing` for
    /// the default branch)
    pub notifications_total: IntCounterVec,

    /// Notification text that could not be parsed, per endpoint
    pub malformed_total: IntCounterVec,

    /// Rejected webhook signatures per provider
    pub signature_failures_total: IntCounterVec,

    /// Webhooks accepted without a signature check, per provider
    pub verification_skipped_total: IntCounterVec,
}

fn counter_vec(
    registry: &Registry,
    name: &str,
    help: &str,
    labels: &[&str],
) -> Result<IntCounterVec, prometheus::Error> {
    let counter = IntCounterVec::new(Opts::new(name, help), labels)?;
    registry.register(Box::new(counter.clone()))?;
    Ok(counter)
}

impl ServiceMetrics {
    pub fn new() -> Result<Arc<Self>, prometheus::Error> {
        let registry = Registry::new();

        Ok(Arc::new(Self {
            requests_total: counter_vec(
                &registry,
                "inbox_hook_requests_total",
                "Total intake requests received",
                &["path", "provider"],
            )?,
            notifications_total: counter_vec(
                &registry,
                "inbox_hook_notifications_total",
                "Notifications accepted, by canonical category",
                &["category"],
            )?,
            malformed_total: counter_vec(
                &registry,
                "inbox_hook_malformed_total",
                "Notifications acknowledged without being parseable",
                &["path"],
            )?,
            signature_failures_total: counter_vec(
                &registry,
                "inbox_hook_signature_failures_total",
                "Webhooks rejected for an invalid signature",
                &["provider"],
            )?,
            verification_skipped_total: counter_vec(
                &registry,
                "inbox_hook_verification_skipped_total",
                "Webhooks accepted without signature verification",
                &["provider"],
            )?,
            registry,
        }))
    }

    pub fn record_request(&self, path: IntakePath, provider: &str) {
        self.requests_total
            .with_label_values(&[path.as_str(), provider])
            .inc();
    }

    /// Count the result of an accepted delivery.
    pub fn record_outcome(&self, path: IntakePath, provider: &str, outcome: &IntakeOutcome) {
        if outcome.verification_skipped() {
            self.verification_skipped_total
                .with_label_values(&[provider])
                .inc();
        }

        match &outcome.disposition {
            Disposition::Dispatched(dispatched) => {
                self.notifications_total
                    .with_label_values(&[dispatched.metric_label()])
                    .inc();
            }
            Disposition::Malformed => {
                self.malformed_total
                    .with_label_values(&[path.as_str()])
                    .inc();
            }
        }
    }

    /// Count a refused delivery.
    pub fn record_error(&self, provider: &str, error: &IntakeError) {
        if matches!(error, IntakeError::SignatureMismatch) {
            self.signature_failures_total
                .with_label_values(&[provider])
                .inc();
        }
    }

    /// Render every metric in the Prometheus text exposition format.
    pub fn render(&self) -> Result<String, prometheus::Error> {
        TextEncoder::new().encode_to_string(&self.registry.gather())
    }
}

impl std::fmt::Debug for ServiceMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceMetrics").finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "metrics_tests.rs"]
mod tests;
