//! # Inbox-Hook HTTP Service
//!
//! HTTP surface for receiving provider change notifications.
//!
//! This service provides:
//! - `GET /webhook/{provider}?challenge=<token>`: the endpoint handshake
//! - `POST /webhook/{provider}`: direct webhook deliveries, verified against
//!   the raw request body
//! - `POST /pubsub/{provider}`: pub/sub push deliveries
//! - `GET /health` and `GET /metrics`
//!
//! All protocol logic lives in `inbox_hook_core`; this crate maps requests
//! onto a [`NotificationIntake`](inbox_hook_core::NotificationIntake) and
//! its results onto status codes.

pub mod config;
pub mod errors;
pub mod metrics;
pub mod provider_registry;
pub mod responses;

pub use config::{
    LoggingConfig, ProviderConfig, ProviderSecretConfig, ServerConfig, ServiceConfig,
};
pub use errors::{ConfigError, ServiceError, WebhookHandlerError};
pub use metrics::{IntakePath, ServiceMetrics};
pub use provider_registry::{ProviderId, ProviderRegistry, RegisteredProvider};
pub use responses::{ChallengeQuery, HealthResponse, WebhookAccepted};

use axum::{
    extract::{rejection::BytesRejection, DefaultBodyLimit, Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use bytes::Bytes;
use inbox_hook_core::Timestamp;
use std::{future::IntoFuture, sync::Arc, time::Duration};
use tokio::sync::Notify;
use tower_http::trace::TraceLayer;
use tracing::{error, info, instrument, warn};

// ============================================================================
// Application State
// ============================================================================

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Configuration for the service
    pub config: Arc<ServiceConfig>,

    /// Registered providers and their intake pipelines
    pub registry: Arc<ProviderRegistry>,

    /// Metrics collector for observability
    pub metrics: Arc<ServiceMetrics>,
}

impl AppState {
    /// Create new application state
    pub fn new(
        config: ServiceConfig,
        registry: ProviderRegistry,
        metrics: Arc<ServiceMetrics>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            registry: Arc::new(registry),
            metrics,
        }
    }

    fn provider(&self, provider: &str) -> Result<RegisteredProvider, WebhookHandlerError> {
        self.registry
            .get(provider)
            .ok_or_else(|| WebhookHandlerError::ProviderNotFound {
                provider: provider.to_string(),
            })
    }
}

// ============================================================================
// HTTP Server
// ============================================================================

/// Create HTTP router with all endpoints
pub fn create_router(state: AppState) -> Router {
    let intake_routes = Router::new()
        .route(
            "/webhook/{provider}",
            get(handle_challenge).post(handle_webhook),
        )
        .route("/pubsub/{provider}", post(handle_pubsub));

    let health_routes = Router::new().route("/health", get(handle_health_check));

    let observability_routes = Router::new().route("/metrics", get(metrics_endpoint));

    let max_body_size = state.config.server.max_body_size;

    Router::new()
        .merge(intake_routes)
        .merge(health_routes)
        .merge(observability_routes)
        .layer(DefaultBodyLimit::max(max_body_size))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start HTTP server
///
/// Serves until SIGINT or SIGTERM, then lets in-flight requests finish for
/// at most `server.shutdown_timeout_seconds`.
pub async fn start_server(
    config: ServiceConfig,
    registry: ProviderRegistry,
) -> Result<(), ServiceError> {
    let metrics = ServiceMetrics::new().map_err(|e| {
        ServiceError::Configuration(ConfigError::Invalid {
            message: format!("Failed to initialize metrics: {}", e),
        })
    })?;

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let shutdown_timeout = Duration::from_secs(config.server.shutdown_timeout_seconds);

    let state = AppState::new(config, registry, metrics);
    let app = create_router(state);

    let listener =
        tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(|e| ServiceError::BindFailed {
                address: addr.clone(),
                message: e.to_string(),
            })?;

    info!("Starting HTTP server on {}", addr);

    let shutdown_started = Arc::new(Notify::new());
    let notify = shutdown_started.clone();

    let server = axum::serve(listener, app).with_graceful_shutdown(async move {
        shutdown_signal().await;
        info!(
            timeout_seconds = shutdown_timeout.as_secs(),
            "Initiating graceful shutdown"
        );
        notify.notify_one();
    });

    let drain_deadline = async move {
        shutdown_started.notified().await;
        tokio::time::sleep(shutdown_timeout).await;
    };

    tokio::select! {
        result = server.into_future() => {
            result.map_err(|e| ServiceError::ServerFailed {
                message: e.to_string(),
            })?;
        }
        _ = drain_deadline => {
            warn!(
                timeout_seconds = shutdown_timeout.as_secs(),
                "Graceful shutdown timed out; dropping open connections"
            );
        }
    }

    info!("HTTP server shutdown complete");
    Ok(())
}

/// Resolves on SIGINT (Ctrl+C) or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C signal handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT (Ctrl+C)"),
        _ = terminate => info!("Received SIGTERM"),
    }
}

// ============================================================================
// Intake Handlers
// ============================================================================

/// Answer the provider's endpoint challenge.
///
/// The token is echoed as `text/plain` with no quoting or trailing newline.
/// Query pairs are taken as a list so a repeated `challenge` parameter still
/// gets an answer.
#[instrument(skip_all, fields(provider = %provider))]
pub async fn handle_challenge(
    State(state): State<AppState>,
    Path(provider): Path<String>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Response, WebhookHandlerError> {
    let registered = state.provider(&provider)?;
    let query = ChallengeQuery::from_pairs(pairs);
    let answer = registered
        .intake
        .answer_challenge(query.challenge.as_deref());

    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, answer.content_type())],
        answer.body,
    )
        .into_response())
}

/// Handle a direct webhook delivery.
///
/// The body is taken as raw bytes so the signature is checked against
/// exactly what was sent. A body that cannot be read is passed on as
/// unavailable rather than rejected here; the pipeline decides whether that
/// matters.
#[instrument(skip_all, fields(provider = %provider))]
pub async fn handle_webhook(
    State(state): State<AppState>,
    Path(provider): Path<String>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<WebhookAccepted>, WebhookHandlerError> {
    let registered = state.provider(&provider)?;
    state.metrics.record_request(IntakePath::Webhook, &provider);

    let raw_body = match &body {
        Ok(bytes) => Some(bytes.as_ref()),
        Err(rejection) => {
            warn!(error = %rejection, "Webhook body could not be read");
            None
        }
    };

    // A header that is present but not visible ASCII still counts as a
    // signature; it will simply fail to match.
    let signature = headers
        .get(registered.signature_header.as_str())
        .map(|value| value.to_str().unwrap_or_default());

    match registered.intake.process_webhook(raw_body, signature).await {
        Ok(outcome) => {
            state
                .metrics
                .record_outcome(IntakePath::Webhook, &provider, &outcome);
            info!(disposition = ?outcome.disposition, "Webhook accepted");
            Ok(Json(WebhookAccepted::accepted()))
        }
        Err(e) => {
            state.metrics.record_error(&provider, &e);
            Err(e.into())
        }
    }
}

/// Handle a pub/sub push delivery.
#[instrument(skip_all, fields(provider = %provider, body_len = body.len()))]
pub async fn handle_pubsub(
    State(state): State<AppState>,
    Path(provider): Path<String>,
    body: Bytes,
) -> Result<StatusCode, WebhookHandlerError> {
    let registered = state.provider(&provider)?;
    state.metrics.record_request(IntakePath::PubSub, &provider);

    match registered.intake.process_push(&body).await {
        Ok(outcome) => {
            state
                .metrics
                .record_outcome(IntakePath::PubSub, &provider, &outcome);
            info!(disposition = ?outcome.disposition, "Push delivery accepted");
            Ok(StatusCode::NO_CONTENT)
        }
        Err(e) => {
            state.metrics.record_error(&provider, &e);
            Err(e.into())
        }
    }
}

// ============================================================================
// Health and Observability Handlers
// ============================================================================

/// Basic health check endpoint
#[instrument(skip_all)]
async fn handle_health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        providers: state.registry.provider_ids(),
        timestamp: Timestamp::now(),
    })
}

/// Prometheus metrics endpoint
#[instrument(skip_all)]
async fn metrics_endpoint(State(state): State<AppState>) -> Result<String, StatusCode> {
    state.metrics.render().map_err(|e| {
        error!(error = %e, "Failed to render metrics");
        StatusCode::INTERNAL_SERVER_ERROR
    })
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
