//! Category to handler routing.
//!
//! The [`Dispatcher`] owns a lookup table from [`KnownCategory`] to handler.
//! Categories without an entry, unrecognized categories and notifications
//! without a category all take the default branch: the raw object is
//! reported through the sink and the delivery counts as processed.

use crate::classifier::ClassifiedNotification;
use crate::handlers::{EventCreatedHandler, MessageCreatedHandler, MessageUpdatedHandler};
use crate::notification::{Category, KnownCategory, Notification};
use crate::sink::{NotificationSink, SinkEvent};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error, instrument};

// ============================================================================
// Handler Trait
// ============================================================================

/// Category-specific processing of a notification.
#[async_trait]
pub trait NotificationHandler: Send + Sync {
    /// Process one notification, reporting anything observable to `sink`.
    async fn handle(
        &self,
        notification: &Notification,
        sink: &dyn NotificationSink,
    ) -> Result<(), HandlerError>;
}

/// Failure inside a handler.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HandlerError {
    #[error("Notification object is not usable: {message}")]
    InvalidObject { message: String },

    #[error("Handler failed: {message}")]
    Failed { message: String },
}

// ============================================================================
// Dispatch Types
// ============================================================================

/// Where a notification went.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchOutcome {
    /// A registered handler processed it.
    Handled(KnownCategory),
    /// The category is present but has no handler.
    Unhandled { category: Category },
    /// The notification has no category at all.
    Unroutable,
}

impl DispatchOutcome {
    /// Metric label: the canonical category, `unrecognized` or `missing`.
    pub fn metric_label(&self) -> &str {
        match self {
            Self::Handled(category) => category.as_str(),
            Self::Unhandled {
                category: Category::Known(category),
            } => category.as_str(),
            Self::Unhandled { .. } => "unrecognized",
            Self::Unroutable => "missing",
        }
    }
}

/// A handler failed. This is the only dispatch failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DispatchError {
    #[error(
        "Handler for {category} failed on notification {notification_id} (attempt {delivery_attempt}): {source}"
    )]
    Handler {
        category: KnownCategory,
        notification_id: String,
        delivery_attempt: u32,
        #[source]
        source: HandlerError,
    },
}

// ============================================================================
// Dispatcher
// ============================================================================

/// Routes classified notifications to handlers.
#[derive(Clone)]
pub struct Dispatcher {
    handlers: HashMap<KnownCategory, Arc<dyn NotificationHandler>>,
    sink: Arc<dyn NotificationSink>,
}

impl Dispatcher {
    /// Create a dispatcher with no handlers; everything takes the default branch.
    pub fn new(sink: Arc<dyn NotificationSink>) -> Self {
        Self {
            handlers: HashMap::new(),
            sink,
        }
    }

    /// Create a dispatcher with the built-in summary handlers for
    /// `message.created`, `message.updated` and `event.created`.
    pub fn with_default_handlers(sink: Arc<dyn NotificationSink>) -> Self {
        Self::new(sink)
            .register(KnownCategory::MessageCreated, Arc::new(MessageCreatedHandler))
            .register(KnownCategory::MessageUpdated, Arc::new(MessageUpdatedHandler))
            .register(KnownCategory::EventCreated, Arc::new(EventCreatedHandler))
    }

    /// Register `handler` for `category`, replacing any earlier one.
    pub fn register(
        mut self,
        category: KnownCategory,
        handler: Arc<dyn NotificationHandler>,
    ) -> Self {
        self.handlers.insert(category, handler);
        self
    }

    pub fn has_handler(&self, category: KnownCategory) -> bool {
        self.handlers.contains_key(&category)
    }

    pub fn sink(&self) -> &Arc<dyn NotificationSink> {
        &self.sink
    }

    /// Route one notification.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::Handler`] when the selected handler fails.
    /// Unknown and missing categories are not errors.
    #[instrument(
        skip_all,
        fields(
            notification_id = %classified.notification.id_or_placeholder(),
            category = %classified.category,
            delivery_attempt = classified.notification.delivery_attempt
        )
    )]
    pub async fn dispatch(
        &self,
        classified: &ClassifiedNotification,
    ) -> Result<DispatchOutcome, DispatchError> {
        let notification = &classified.notification;

        let handler = classified
            .category
            .known()
            .and_then(|known| self.handlers.get(&known).map(|h| (known, h)));

        let Some((category, handler)) = handler else {
            self.sink.emit(SinkEvent::Unhandled {
                notification_id: notification.id_or_placeholder().to_string(),
                category: classified.category.clone(),
                object: notification.data.object.clone(),
            });

            return Ok(match &classified.category {
                Category::Missing => DispatchOutcome::Unroutable,
                other => DispatchOutcome::Unhandled {
                    category: other.clone(),
                },
            });
        };

        match handler.handle(notification, self.sink.as_ref()).await {
            Ok(()) => {
                debug!("Notification handled");
                Ok(DispatchOutcome::Handled(category))
            }
            Err(source) => {
                error!(error = %source, "Notification handler failed");
                Err(DispatchError::Handler {
                    category,
                    notification_id: notification.id_or_placeholder().to_string(),
                    delivery_attempt: notification.delivery_attempt,
                    source,
                })
            }
        }
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut categories: Vec<_> = self.handlers.keys().map(|c| c.as_str()).collect();
        categories.sort_unstable();
        f.debug_struct("Dispatcher")
            .field("handlers", &categories)
            .finish()
    }
}

#[cfg(test)]
#[path = "dispatch_tests.rs"]
mod tests;
