//! Notification data model.
//!
//! The provider sends CloudEvents-style documents:
//!
//! ```json
//! {
//!   "specversion": "1.0",
//!   "type": "message.created",
//!   "source": "/google/emails/realtime",
//!   "id": "mock-id",
//!   "time": 1695415185,
//!   "webhook_delivery_attempt": 1,
//!   "data": {
//!     "application_id": "app-1",
//!     "grant_id": "grant-1",
//!     "object": { "subject": "Hello", "from": [{ "email": "a@example.com" }] }
//!   }
//! }
//! ```
//!
//! Only the envelope fields are lifted into [`Notification`]; the changed
//! entity under `data.object` stays a loosely typed [`serde_json::Value`].

use crate::document;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Delivery attempt assumed when the document does not carry one.
pub const DEFAULT_DELIVERY_ATTEMPT: u32 = 1;

/// Suffixes the provider's pipeline appends to a category
/// (`message.created.transformed`, `message.updated.truncated`, ...).
pub const TRANSFORMATION_MARKERS: &[&str] = &["transformed", "truncated", "cleaned"];

// ============================================================================
// Category
// ============================================================================

/// Categories this system knows by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KnownCategory {
    MessageCreated,
    MessageUpdated,
    EventCreated,
    EventUpdated,
    ContactCreated,
    ContactUpdated,
}

impl KnownCategory {
    pub const ALL: [KnownCategory; 6] = [
        Self::MessageCreated,
        Self::MessageUpdated,
        Self::EventCreated,
        Self::EventUpdated,
        Self::ContactCreated,
        Self::ContactUpdated,
    ];

    /// Canonical dot-namespaced name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MessageCreated => "message.created",
            Self::MessageUpdated => "message.updated",
            Self::EventCreated => "event.created",
            Self::EventUpdated => "event.updated",
            Self::ContactCreated => "contact.created",
            Self::ContactUpdated => "contact.updated",
        }
    }

    /// Look up a canonical name. Transformation markers must already be stripped.
    pub fn from_canonical(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == name)
    }
}

impl fmt::Display for KnownCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canonical category of a notification.
///
/// Unknown and missing categories are valid outcomes, not errors; they are
/// routed to the default branch.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Known(KnownCategory),
    /// A non-empty category this system has no name for, with markers stripped.
    Unrecognized(String),
    /// The document had no usable `type`.
    Missing,
}

impl Category {
    /// Canonicalize a raw `type` value.
    pub fn from_raw(raw: Option<&str>) -> Self {
        let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
            return Self::Missing;
        };

        let canonical = strip_transformation_markers(raw);
        if canonical.is_empty() {
            return Self::Missing;
        }

        match KnownCategory::from_canonical(canonical) {
            Some(known) => Self::Known(known),
            None => Self::Unrecognized(canonical.to_string()),
        }
    }

    /// Name for logs and metric labels.
    pub fn label(&self) -> &str {
        match self {
            Self::Known(known) => known.as_str(),
            Self::Unrecognized(name) => name,
            Self::Missing => "missing",
        }
    }

    pub fn known(&self) -> Option<KnownCategory> {
        match self {
            Self::Known(known) => Some(*known),
            _ => None,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Remove trailing `.<marker>` segments, repeatedly.
///
/// Only whole trailing segments are removed, so the longest prefix in front
/// of the marker run is kept: `message.created.truncated.transformed`
/// becomes `message.created`, while `transformed.message` is unchanged.
pub fn strip_transformation_markers(category: &str) -> &str {
    let mut current = category;
    while let Some((prefix, last)) = current.rsplit_once('.') {
        if !TRANSFORMATION_MARKERS.contains(&last) {
            break;
        }
        current = prefix;
    }
    current
}

// ============================================================================
// Notification
// ============================================================================

/// The decoded notification.
///
/// `id` is the provider's idempotency key. The same notification can arrive
/// more than once; nothing here deduplicates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub spec_version: Option<String>,
    /// Raw `type` value as sent, before canonicalization.
    pub raw_category: Option<String>,
    pub source: Option<String>,
    pub id: Option<String>,
    /// Emission time, epoch seconds.
    pub time: Option<i64>,
    pub delivery_attempt: u32,
    pub data: NotificationData,
}

/// The `data` member of a notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationData {
    pub application_id: Option<String>,
    pub grant_id: Option<String>,
    /// The changed entity (message, event, contact, ...). `Value::Null` when absent.
    pub object: Value,
}

impl Notification {
    /// Extract a notification from a parsed document.
    ///
    /// Never fails: fields that are missing or have an unexpected type are
    /// left empty.
    pub fn from_document(doc: &Value) -> Self {
        let delivery_attempt = document::i64_at(doc, "webhook_delivery_attempt")
            .or_else(|| document::i64_at(doc, "delivery_attempt"))
            .and_then(|n| u32::try_from(n).ok())
            .filter(|n| *n > 0)
            .unwrap_or(DEFAULT_DELIVERY_ATTEMPT);

        let object = document::lookup(doc, "data.object")
            .cloned()
            .unwrap_or(Value::Null);

        let grant_id = document::str_at(doc, "data.grant_id")
            .or_else(|| document::str_at(doc, "data.object.grant_id"))
            .map(str::to_string);

        Self {
            spec_version: document::str_at(doc, "specversion").map(str::to_string),
            raw_category: document::lookup(doc, "type")
                .and_then(Value::as_str)
                .map(str::to_string),
            source: document::str_at(doc, "source").map(str::to_string),
            id: document::str_at(doc, "id").map(str::to_string),
            time: document::i64_at(doc, "time"),
            delivery_attempt,
            data: NotificationData {
                application_id: document::str_at(doc, "data.application_id").map(str::to_string),
                grant_id,
                object,
            },
        }
    }

    /// Notification id, or the summary placeholder.
    pub fn id_or_placeholder(&self) -> &str {
        self.id.as_deref().unwrap_or(document::PLACEHOLDER)
    }
}

#[cfg(test)]
#[path = "notification_tests.rs"]
mod tests;
