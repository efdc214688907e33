//! Error types for the HTTP service

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use inbox_hook_core::{DispatchError, IntakeError};
use tracing::{error, warn};

/// Intake handler errors with HTTP status code mapping
///
/// - `400 Bad Request`: the delivery itself is broken (undecodable push
///   envelope, body bytes unavailable for verification); redelivery will
///   fail the same way
/// - `401 Unauthorized`: the webhook signature does not match
/// - `404 Not Found`: the `{provider}` path segment is not registered
/// - `500 Internal Server Error`: a secret source or a handler failed; the
///   provider may redeliver
///
/// Malformed notification text never reaches this type: it is acknowledged
/// by the pipeline.
///
/// # Security Considerations
///
/// 5xx responses carry a generic message. The detailed error is logged
/// server-side.
#[derive(Debug, thiserror::Error)]
pub enum WebhookHandlerError {
    /// The intake pipeline refused the delivery
    #[error("{0}")]
    Intake(#[from] IntakeError),

    /// Webhook provider not found in the registry
    ///
    /// Maps to: `404 Not Found` (permanent error, the provider is not configured)
    #[error("Webhook provider not found: {provider}")]
    ProviderNotFound { provider: String },

    /// Unexpected internal server error
    #[error("Internal server error: {message}")]
    InternalError { message: String },
}

impl WebhookHandlerError {
    /// HTTP status for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Intake(IntakeError::Decode(_)) | Self::Intake(IntakeError::RawBodyUnavailable) => {
                StatusCode::BAD_REQUEST
            }
            Self::Intake(IntakeError::SignatureMismatch) => StatusCode::UNAUTHORIZED,
            Self::Intake(IntakeError::Verification(_))
            | Self::Intake(IntakeError::Dispatch(_))
            | Self::InternalError { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ProviderNotFound { .. } => StatusCode::NOT_FOUND,
        }
    }
}

const GENERIC_SERVER_ERROR: &str = "Internal server error occurred. Please try again later.";

impl IntoResponse for WebhookHandlerError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let message = match &self {
            Self::Intake(IntakeError::Dispatch(DispatchError::Handler {
                category,
                notification_id,
                delivery_attempt,
                source,
            })) => {
                error!(
                    notification_id = %notification_id,
                    category = %category,
                    delivery_attempt = delivery_attempt,
                    error = %source,
                    "Notification handler failed"
                );
                GENERIC_SERVER_ERROR.to_string()
            }
            Self::Intake(IntakeError::Verification(e)) => {
                error!(error = %e, "Signature verification could not be performed");
                GENERIC_SERVER_ERROR.to_string()
            }
            Self::InternalError { message } => {
                // Log detailed error server-side but return generic message to client
                error!(error = %message, "Internal server error occurred");
                GENERIC_SERVER_ERROR.to_string()
            }
            Self::Intake(IntakeError::SignatureMismatch) => {
                warn!("Webhook signature mismatch");
                self.to_string()
            }
            Self::Intake(e) => {
                warn!(error = %e, "Rejecting undeliverable request");
                self.to_string()
            }
            Self::ProviderNotFound { provider } => {
                warn!(provider = %provider, "Webhook provider not found");
                self.to_string()
            }
        };

        let body = serde_json::json!({
            "error": message,
            "status": status.as_u16(),
            "timestamp": chrono::Utc::now().to_rfc3339(),
        });

        (status, Json(body)).into_response()
    }
}

/// Service-level errors
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Failed to bind to address {address}: {message}")]
    BindFailed { address: String, message: String },

    #[error("Server failed: {message}")]
    ServerFailed { message: String },

    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigError),
}

impl ServiceError {
    /// Process exit code for this failure
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::BindFailed { .. } => 1,
            Self::ServerFailed { .. } => 2,
            Self::Configuration(_) => 3,
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {message}")]
    Invalid { message: String },

    #[error("Configuration could not be loaded: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid configuration for provider '{provider}': {message}")]
    ProviderValidation { provider: String, message: String },
}
