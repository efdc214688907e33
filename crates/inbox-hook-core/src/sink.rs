//! Structured-event sink for observable outcomes.
//!
//! Every outcome worth surfacing to an operator goes through one
//! [`NotificationSink`]: category summaries, notifications nobody handles,
//! payloads that could not be parsed and skipped signature checks. The
//! production sink renders them as `tracing` events; tests collect them with
//! [`MemorySink`].

use crate::notification::{Category, KnownCategory};
use crate::signature::SkipReason;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Mutex;
use tracing::{info, warn};

// ============================================================================
// Events
// ============================================================================

/// One labelled value in a summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryField {
    pub name: String,
    pub value: String,
}

impl SummaryField {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Human-readable digest a handler produces for a known category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationSummary {
    pub notification_id: String,
    pub category: KnownCategory,
    pub fields: Vec<SummaryField>,
}

impl NotificationSummary {
    pub fn new(notification_id: impl Into<String>, category: KnownCategory) -> Self {
        Self {
            notification_id: notification_id.into(),
            category,
            fields: Vec::new(),
        }
    }

    /// Append a field, builder style.
    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push(SummaryField::new(name, value));
        self
    }

    /// Value of the first field called `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .map(|f| f.value.as_str())
    }
}

/// An observable outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SinkEvent {
    /// A handler summarized a notification.
    Summary(NotificationSummary),

    /// No handler is registered for the category, or the category is
    /// missing. Carries the raw object so nothing is lost.
    Unhandled {
        notification_id: String,
        category: Category,
        object: Value,
    },

    /// The notification text was not JSON. The delivery is still accepted.
    Malformed { raw: String, error: String },

    /// A webhook was accepted without verifying its signature.
    VerificationSkipped { reason: SkipReason },
}

/// Receives every observable outcome.
pub trait NotificationSink: Send + Sync {
    fn emit(&self, event: SinkEvent);
}

// ============================================================================
// Implementations
// ============================================================================

/// Renders sink events as log lines.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl NotificationSink for TracingSink {
    fn emit(&self, event: SinkEvent) {
        match event {
            SinkEvent::Summary(summary) => {
                let fields = summary
                    .fields
                    .iter()
                    .map(|f| format!("{}={}", f.name, f.value))
                    .collect::<Vec<_>>()
                    .join(", ");
                info!(
                    notification_id = %summary.notification_id,
                    category = %summary.category,
                    summary = %fields,
                    "Notification received"
                );
            }
            SinkEvent::Unhandled {
                notification_id,
                category,
                object,
            } => {
                warn!(
                    notification_id = %notification_id,
                    category = %category,
                    object = %object,
                    "No handler for notification category"
                );
            }
            SinkEvent::Malformed { raw, error } => {
                warn!(
                    raw = %raw,
                    error = %error,
                    "Malformed notification acknowledged"
                );
            }
            SinkEvent::VerificationSkipped { reason } => {
                warn!(
                    reason = %reason,
                    "Webhook signature verification skipped"
                );
            }
        }
    }
}

/// Collects events in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<SinkEvent>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything emitted so far, in order.
    pub fn events(&self) -> Vec<SinkEvent> {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn len(&self) -> usize {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All summaries emitted so far.
    pub fn summaries(&self) -> Vec<NotificationSummary> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                SinkEvent::Summary(summary) => Some(summary),
                _ => None,
            })
            .collect()
    }
}

impl NotificationSink for MemorySink {
    fn emit(&self, event: SinkEvent) {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(event);
    }
}

#[cfg(test)]
#[path = "sink_tests.rs"]
mod tests;
