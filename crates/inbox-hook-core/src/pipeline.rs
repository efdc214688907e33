//! Webhook and push intake pipeline.
//!
//! [`NotificationProcessor`] composes the verifier, the envelope codec, the
//! classifier and the dispatcher into the two intake paths:
//!
//! ```text
//! webhook: raw body ──► SignatureVerifier ──┐
//!                                           ├──► classify ──► Dispatcher
//! push:    envelope ──► decode_payload ─────┘
//! ```
//!
//! The push path has no signature step; the relay transport is the trust
//! boundary. Malformed notification text is acknowledged on both paths
//! because redelivery cannot repair it.

use crate::challenge::{ChallengeAnswer, Handshake};
use crate::classifier::classify;
use crate::dispatch::{DispatchError, DispatchOutcome, Dispatcher};
use crate::envelope::{decode_payload, DecodeError, PushRequest};
use crate::signature::{SignatureVerifier, VerificationError, VerificationOutcome};
use crate::sink::{NotificationSink, SinkEvent};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, field, info, instrument, warn, Span};

// ============================================================================
// Outcome and Error Types
// ============================================================================

/// What happened to an accepted delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Disposition {
    Dispatched(DispatchOutcome),
    /// The notification text could not be parsed; it was logged and dropped.
    Malformed,
}

/// Result of an accepted delivery on either path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntakeOutcome {
    /// Signature check result. `None` on the push path.
    pub verification: Option<VerificationOutcome>,
    pub disposition: Disposition,
}

impl IntakeOutcome {
    /// `true` when the webhook was accepted without a signature check.
    pub fn verification_skipped(&self) -> bool {
        matches!(self.verification, Some(VerificationOutcome::Skipped(_)))
    }
}

/// A delivery that must not be acknowledged as successful.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IntakeError {
    #[error("Push delivery could not be decoded: {0}")]
    Decode(#[from] DecodeError),

    #[error("Raw request body is unavailable for signature verification")]
    RawBodyUnavailable,

    #[error("Webhook signature does not match the request body")]
    SignatureMismatch,

    #[error("Signature verification failed: {0}")]
    Verification(VerificationError),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

impl IntakeError {
    /// `true` when a redelivery may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Verification(_) | Self::Dispatch(_))
    }
}

impl From<VerificationError> for IntakeError {
    fn from(e: VerificationError) -> Self {
        match e {
            VerificationError::RawBodyUnavailable => Self::RawBodyUnavailable,
            other => Self::Verification(other),
        }
    }
}

// ============================================================================
// Intake Trait
// ============================================================================

/// The intake operations exposed to a transport.
#[async_trait]
pub trait NotificationIntake: Send + Sync {
    /// Process a direct webhook delivery.
    ///
    /// `raw_body` is `None` when the transport could not capture the body
    /// bytes unchanged. `signature` is the provider's signature header.
    async fn process_webhook(
        &self,
        raw_body: Option<&[u8]>,
        signature: Option<&str>,
    ) -> Result<IntakeOutcome, IntakeError>;

    /// Process a pub/sub push delivery.
    async fn process_push(&self, body: &[u8]) -> Result<IntakeOutcome, IntakeError>;

    /// Answer the provider's endpoint challenge.
    fn answer_challenge(&self, token: Option<&str>) -> ChallengeAnswer;
}

// ============================================================================
// Default Implementation
// ============================================================================

/// The production intake pipeline for one provider.
///
/// Immutable after construction; share it behind an `Arc`.
#[derive(Clone)]
pub struct NotificationProcessor {
    verifier: SignatureVerifier,
    dispatcher: Dispatcher,
    sink: Arc<dyn NotificationSink>,
}

impl NotificationProcessor {
    /// Build a processor. Skips and malformed payloads are reported to the
    /// dispatcher's sink.
    pub fn new(verifier: SignatureVerifier, dispatcher: Dispatcher) -> Self {
        let sink = dispatcher.sink().clone();
        Self {
            verifier,
            dispatcher,
            sink,
        }
    }

    pub fn verifier(&self) -> &SignatureVerifier {
        &self.verifier
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    fn record_malformed(&self, raw: String, error: String) -> Disposition {
        self.sink.emit(SinkEvent::Malformed { raw, error });
        Disposition::Malformed
    }

    /// The shared tail of both paths.
    async fn classify_and_dispatch(&self, raw: &str) -> Result<Disposition, IntakeError> {
        let classified = match classify(raw) {
            Ok(classified) => classified,
            Err(malformed) => {
                return Ok(self.record_malformed(malformed.raw, malformed.message));
            }
        };

        info!(
            notification_id = %classified.notification.id_or_placeholder(),
            category = %classified.category,
            delivery_attempt = classified.notification.delivery_attempt,
            "Notification classified"
        );

        let outcome = self.dispatcher.dispatch(&classified).await?;
        Ok(Disposition::Dispatched(outcome))
    }
}

#[async_trait]
impl NotificationIntake for NotificationProcessor {
    #[instrument(
        skip_all,
        fields(body_len = raw_body.map(<[u8]>::len), has_signature = signature.is_some())
    )]
    async fn process_webhook(
        &self,
        raw_body: Option<&[u8]>,
        signature: Option<&str>,
    ) -> Result<IntakeOutcome, IntakeError> {
        let verification = self.verifier.check(raw_body, signature).await?;

        match verification {
            VerificationOutcome::Rejected => {
                warn!("Rejecting webhook with invalid signature");
                return Err(IntakeError::SignatureMismatch);
            }
            VerificationOutcome::Skipped(reason) => {
                self.sink.emit(SinkEvent::VerificationSkipped { reason });
            }
            VerificationOutcome::Verified => {}
        }

        let disposition = match raw_body {
            None => self.record_malformed(
                String::new(),
                "raw request body is unavailable".to_string(),
            ),
            Some(bytes) => match std::str::from_utf8(bytes) {
                Ok(text) => self.classify_and_dispatch(text).await?,
                Err(e) => self.record_malformed(
                    String::from_utf8_lossy(bytes).into_owned(),
                    e.to_string(),
                ),
            },
        };

        Ok(IntakeOutcome {
            verification: Some(verification),
            disposition,
        })
    }

    #[instrument(
        skip_all,
        fields(
            body_len = body.len(),
            message_id = field::Empty,
            subscription = field::Empty
        )
    )]
    async fn process_push(&self, body: &[u8]) -> Result<IntakeOutcome, IntakeError> {
        let request = PushRequest::from_slice(body)?;
        let envelope = request.envelope()?;

        let span = Span::current();
        if let Some(message_id) = envelope.message_id.as_deref() {
            span.record("message_id", message_id);
        }
        if let Some(subscription) = request.subscription.as_deref() {
            span.record("subscription", subscription);
        }

        let payload = decode_payload(envelope)?;
        debug!(payload_len = payload.len(), "Push payload decoded");

        let disposition = self.classify_and_dispatch(&payload).await?;

        Ok(IntakeOutcome {
            verification: None,
            disposition,
        })
    }

    fn answer_challenge(&self, token: Option<&str>) -> ChallengeAnswer {
        let answer = Handshake::new().answer(token);
        if answer.is_probe() {
            debug!("Challenge probe without token");
        } else {
            info!("Answering provider challenge");
        }
        answer
    }
}

impl std::fmt::Debug for NotificationProcessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationProcessor")
            .field("verifier", &self.verifier)
            .field("dispatcher", &self.dispatcher)
            .finish()
    }
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;
