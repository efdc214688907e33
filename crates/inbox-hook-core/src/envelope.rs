//! Push relay envelope decoding.
//!
//! A pub/sub push delivery wraps the provider's notification JSON in a
//! transport envelope:
//!
//! ```json
//! {
//!   "message": {
//!     "data": "eyJ0eXBlIjoibWVzc2FnZS5jcmVhdGVkIn0=",
//!     "messageId": "1234567890",
//!     "publishTime": "2024-01-01T00:00:00.000Z",
//!     "attributes": { "origin": "nylas" }
//!   },
//!   "subscription": "projects/acme/subscriptions/inbox-hook"
//! }
//! ```
//!
//! The codec only unwraps the transport. It does not require the decoded text
//! to be JSON; that is the classifier's concern.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Body of a push relay delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushRequest {
    /// The delivered message. `None` when the relay sent an empty body shape.
    #[serde(default)]
    pub message: Option<NotificationEnvelope>,

    /// Subscription the delivery was made for.
    #[serde(default)]
    pub subscription: Option<String>,
}

impl PushRequest {
    /// Parse a push request body.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::MalformedEnvelope`] when the body is not a JSON
    /// object of the expected shape.
    pub fn from_slice(body: &[u8]) -> Result<Self, DecodeError> {
        serde_json::from_slice(body).map_err(|e| DecodeError::MalformedEnvelope {
            message: e.to_string(),
        })
    }

    /// The wrapped message, or [`DecodeError::MissingMessage`].
    pub fn envelope(&self) -> Result<&NotificationEnvelope, DecodeError> {
        self.message.as_ref().ok_or(DecodeError::MissingMessage)
    }
}

/// Transport wrapper for one relayed notification.
///
/// The delivery identifier is unique per delivery, not per logical event:
/// relay retries produce new message ids for the same notification.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationEnvelope {
    /// Base64 (standard alphabet) encoded notification text.
    #[serde(default)]
    pub data: Option<String>,

    #[serde(default, alias = "message_id")]
    pub message_id: Option<String>,

    #[serde(default, alias = "publish_time")]
    pub publish_time: Option<String>,

    #[serde(default)]
    pub attributes: Option<HashMap<String, String>>,
}

impl NotificationEnvelope {
    /// Build an envelope around `payload`, encoding it with [`encode_payload`].
    pub fn wrap(payload: &[u8], message_id: impl Into<String>) -> Self {
        Self {
            data: Some(encode_payload(payload)),
            message_id: Some(message_id.into()),
            publish_time: Some(crate::Timestamp::now().to_rfc3339()),
            attributes: None,
        }
    }
}

/// Decode the envelope's payload into text.
///
/// # Errors
///
/// - [`DecodeError::MissingPayload`] when `data` is absent or empty
/// - [`DecodeError::InvalidBase64`] when `data` is not standard base64
/// - [`DecodeError::InvalidUtf8`] when the decoded bytes are not UTF-8
pub fn decode_payload(envelope: &NotificationEnvelope) -> Result<String, DecodeError> {
    let data = envelope
        .data
        .as_deref()
        .filter(|d| !d.is_empty())
        .ok_or(DecodeError::MissingPayload)?;

    let bytes = STANDARD
        .decode(data)
        .map_err(|e| DecodeError::InvalidBase64 {
            message: e.to_string(),
        })?;

    String::from_utf8(bytes).map_err(|e| DecodeError::InvalidUtf8 {
        message: e.to_string(),
    })
}

/// Encode a payload the way the relay does.
pub fn encode_payload(payload: &[u8]) -> String {
    STANDARD.encode(payload)
}

/// Failures while unwrapping a push delivery.
///
/// All variants are request problems. Redelivering the same envelope will
/// fail the same way, so none of them are retryable.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("Push body is not a valid envelope: {message}")]
    MalformedEnvelope { message: String },

    #[error("Push body has no message")]
    MissingMessage,

    #[error("Envelope has no message.data payload")]
    MissingPayload,

    #[error("Envelope payload is not valid base64: {message}")]
    InvalidBase64 { message: String },

    #[error("Envelope payload is not valid UTF-8: {message}")]
    InvalidUtf8 { message: String },
}

#[cfg(test)]
#[path = "envelope_tests.rs"]
mod tests;
