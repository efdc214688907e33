//! Raw text to typed notification with canonical category.
//!
//! Both intake paths hand the classifier the notification text: the webhook
//! body as received, or the decoded payload of a push envelope.

use crate::notification::{Category, Notification};
use serde_json::Value;

/// A parsed notification together with its canonical category.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedNotification {
    pub notification: Notification,
    pub category: Category,
}

/// The text was not JSON.
///
/// Redelivery cannot fix a malformed payload, so callers log the raw text and
/// still acknowledge the delivery.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Notification is not valid JSON: {message}")]
pub struct MalformedNotification {
    /// The text exactly as received, kept for diagnosis.
    pub raw: String,
    pub message: String,
}

/// Parse and classify notification text.
///
/// # Errors
///
/// Returns [`MalformedNotification`] only when `raw` is not JSON. Any valid
/// JSON document classifies; a document without a usable `type` gets
/// [`Category::Missing`].
pub fn classify(raw: &str) -> Result<ClassifiedNotification, MalformedNotification> {
    let doc: Value = serde_json::from_str(raw).map_err(|e| MalformedNotification {
        raw: raw.to_string(),
        message: e.to_string(),
    })?;

    let notification = Notification::from_document(&doc);
    let category = Category::from_raw(notification.raw_category.as_deref());

    Ok(ClassifiedNotification {
        notification,
        category,
    })
}

#[cfg(test)]
#[path = "classifier_tests.rs"]
mod tests;
