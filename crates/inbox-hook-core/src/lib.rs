//! # Inbox-Hook Core
//!
//! Core logic for receiving change notifications from an email/calendar
//! provider.
//!
//! Notifications arrive on one of two paths:
//!
//! - **Webhook**: the provider POSTs the notification JSON directly. The raw
//!   body is authenticated with an HMAC-SHA256 signature before anything
//!   parses it.
//! - **Push relay**: a pub/sub relay POSTs an envelope whose `message.data`
//!   field carries the notification JSON as base64. The relay is the trust
//!   boundary, so no signature check happens on this path.
//!
//! Both paths converge on the [`classifier`], which turns the raw text into a
//! [`notification::Notification`] with a canonical [`Category`], and the
//! [`dispatch::Dispatcher`], which routes it to a category handler. Every
//! observable outcome is reported through a single
//! [`sink::NotificationSink`].
//!
//! ## Architecture
//!
//! - The core is stateless; a [`pipeline::NotificationProcessor`] is built
//!   once and shared across requests behind an `Arc`.
//! - Secrets, handlers and the sink are injected through traits.
//! - Nothing in this crate knows about HTTP.
//!
//! ## Usage
//!
//! ```rust
//! use inbox_hook_core::{classifier::classify, Category, KnownCategory};
//!
//! let raw = r#"{"type":"message.created.transformed","id":"n-1","data":{"object":{}}}"#;
//! let classified = classify(raw).unwrap();
//! assert_eq!(classified.category, Category::Known(KnownCategory::MessageCreated));
//! ```

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A UTC instant, rendered as RFC 3339.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Convert Unix epoch seconds into a timestamp.
    ///
    /// Returns `None` when the value is outside the range chrono can represent.
    pub fn from_epoch_seconds(seconds: i64) -> Option<Self> {
        Utc.timestamp_opt(seconds, 0).single().map(Self)
    }

    pub fn to_rfc3339(&self) -> String {
        self.0.to_rfc3339()
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_rfc3339())
    }
}

// ============================================================================
// Module declarations
// ============================================================================

/// Provider handshake used to validate an endpoint
pub mod challenge;

/// Raw text to typed notification with canonical category
pub mod classifier;

/// Category to handler routing
pub mod dispatch;

/// Optional-field extraction over loosely typed JSON documents
pub mod document;

/// Push relay envelope decoding
pub mod envelope;

/// Built-in category handlers
pub mod handlers;

/// Notification data model
pub mod notification;

/// Webhook and push intake pipeline
pub mod pipeline;

/// Webhook secret sources
pub mod secrets;

/// HMAC-SHA256 webhook signature verification
pub mod signature;

/// Structured-event sink for observable outcomes
pub mod sink;

// Re-export key types for convenience
pub use challenge::{ChallengeAnswer, ChallengeState, Handshake};
pub use classifier::{classify, ClassifiedNotification, MalformedNotification};
pub use dispatch::{DispatchError, DispatchOutcome, Dispatcher, HandlerError, NotificationHandler};
pub use envelope::{decode_payload, encode_payload, DecodeError, NotificationEnvelope, PushRequest};
pub use notification::{Category, KnownCategory, Notification};
pub use pipeline::{
    Disposition, IntakeError, IntakeOutcome, NotificationIntake, NotificationProcessor,
};
pub use secrets::{EnvSecret, LiteralSecret, SecretError, SecretProvider, SecretValue};
pub use signature::{
    SignatureVerifier, SkipReason, VerificationError, VerificationOutcome, VerificationPolicy,
};
pub use sink::{MemorySink, NotificationSink, SinkEvent, TracingSink};

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
