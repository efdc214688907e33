//! Built-in category handlers.
//!
//! Each handler reads a few optional fields from `data.object` and emits a
//! [`NotificationSummary`]. The object's shape is never validated: missing
//! or wrongly typed fields render as [`PLACEHOLDER`].

use crate::dispatch::{HandlerError, NotificationHandler};
use crate::document::{self, or_placeholder, PLACEHOLDER};
use crate::notification::{KnownCategory, Notification};
use crate::sink::{NotificationSink, NotificationSummary, SinkEvent};
use crate::Timestamp;
use async_trait::async_trait;
use serde_json::Value;
use tracing::instrument;

// ============================================================================
// Rendering helpers
// ============================================================================

/// Render a participant (`{"name": .., "email": ..}`) as `Name <email>`,
/// or just the email when there is no name.
fn render_participant(participant: &Value) -> Option<String> {
    let email = document::str_at(participant, "email");
    let name = document::str_at(participant, "name");
    match (name, email) {
        (Some(name), Some(email)) => Some(format!("{name} <{email}>")),
        (None, Some(email)) => Some(email.to_string()),
        (Some(name), None) => Some(name.to_string()),
        (None, None) => None,
    }
}

/// Render a participant list at `path`, comma separated.
fn render_participants(object: &Value, path: &str) -> String {
    let rendered = document::array_at(object, path).map(|participants| {
        participants
            .iter()
            .filter_map(render_participant)
            .collect::<Vec<_>>()
            .join(", ")
    });
    or_placeholder(rendered.filter(|s| !s.is_empty()))
}

/// Render epoch seconds at `path` as an RFC 3339 instant.
fn render_epoch(object: &Value, path: &str) -> Option<String> {
    document::i64_at(object, path)
        .and_then(Timestamp::from_epoch_seconds)
        .map(|ts| ts.to_rfc3339())
}

/// Render one end of an event's `when` block.
///
/// Timed events carry epoch seconds; all-day events carry dates, which are
/// shown as given.
fn render_when(object: &Value, time_key: &str, date_key: &str) -> String {
    let rendered = render_epoch(object, &format!("when.{time_key}"))
        .or_else(|| document::str_at(object, &format!("when.{date_key}")).map(str::to_string))
        .or_else(|| document::str_at(object, "when.date").map(str::to_string));
    or_placeholder(rendered)
}

fn emit_summary(sink: &dyn NotificationSink, summary: NotificationSummary) {
    sink.emit(SinkEvent::Summary(summary));
}

// ============================================================================
// message.created
// ============================================================================

/// Summarizes a new message: sender, recipients, subject and timestamp.
#[derive(Debug, Clone, Copy, Default)]
pub struct MessageCreatedHandler;

#[async_trait]
impl NotificationHandler for MessageCreatedHandler {
    #[instrument(skip_all, fields(notification_id = %notification.id_or_placeholder()))]
    async fn handle(
        &self,
        notification: &Notification,
        sink: &dyn NotificationSink,
    ) -> Result<(), HandlerError> {
        let object = &notification.data.object;

        let summary = NotificationSummary::new(
            notification.id_or_placeholder(),
            KnownCategory::MessageCreated,
        )
        .field("from", render_participants(object, "from"))
        .field("to", render_participants(object, "to"))
        .field("subject", or_placeholder(document::str_at(object, "subject")))
        .field("date", or_placeholder(render_epoch(object, "date")));

        emit_summary(sink, summary);
        Ok(())
    }
}

// ============================================================================
// message.updated
// ============================================================================

/// Summarizes a message change: thread, folders and read state.
#[derive(Debug, Clone, Copy, Default)]
pub struct MessageUpdatedHandler;

#[async_trait]
impl NotificationHandler for MessageUpdatedHandler {
    #[instrument(skip_all, fields(notification_id = %notification.id_or_placeholder()))]
    async fn handle(
        &self,
        notification: &Notification,
        sink: &dyn NotificationSink,
    ) -> Result<(), HandlerError> {
        let object = &notification.data.object;

        let folders = document::array_at(object, "folders").map(|folders| {
            folders
                .iter()
                .filter_map(Value::as_str)
                .collect::<Vec<_>>()
                .join(", ")
        });

        let state = document::bool_at(object, "unread").map(|unread| {
            if unread {
                "unread"
            } else {
                "read"
            }
        });

        let summary = NotificationSummary::new(
            notification.id_or_placeholder(),
            KnownCategory::MessageUpdated,
        )
        .field("thread_id", or_placeholder(document::str_at(object, "thread_id")))
        .field("folders", or_placeholder(folders.filter(|s| !s.is_empty())))
        .field("state", or_placeholder(state));

        emit_summary(sink, summary);
        Ok(())
    }
}

// ============================================================================
// event.created
// ============================================================================

/// Summarizes a new calendar event: title, calendar, window and
/// participant count.
#[derive(Debug, Clone, Copy, Default)]
pub struct EventCreatedHandler;

#[async_trait]
impl NotificationHandler for EventCreatedHandler {
    #[instrument(skip_all, fields(notification_id = %notification.id_or_placeholder()))]
    async fn handle(
        &self,
        notification: &Notification,
        sink: &dyn NotificationSink,
    ) -> Result<(), HandlerError> {
        let object = &notification.data.object;

        let participants = document::array_at(object, "participants")
            .map(|p| p.len().to_string())
            .unwrap_or_else(|| PLACEHOLDER.to_string());

        let summary = NotificationSummary::new(
            notification.id_or_placeholder(),
            KnownCategory::EventCreated,
        )
        .field("title", or_placeholder(document::str_at(object, "title")))
        .field(
            "calendar",
            or_placeholder(document::str_at(object, "calendar_id")),
        )
        .field("start", render_when(object, "start_time", "start_date"))
        .field("end", render_when(object, "end_time", "end_date"))
        .field("participants", participants);

        emit_summary(sink, summary);
        Ok(())
    }
}

#[cfg(test)]
#[path = "handlers_tests.rs"]
mod tests;
