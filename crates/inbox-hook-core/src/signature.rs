//! HMAC-SHA256 webhook signature verification.
//!
//! The provider signs the exact bytes of the request body with the shared
//! secret and sends the lowercase hex digest in a signature header. The
//! digest must be recomputed over the body bytes *as received*: parsing the
//! JSON and serializing it again changes whitespace and key order and will
//! not reproduce the provider's digest.
//!
//! # Policy
//!
//! | Policy | No secret | No signature header | Mismatch |
//! |--------|-----------|---------------------|----------|
//! | [`VerificationPolicy::Permissive`] | skipped | skipped | rejected |
//! | [`VerificationPolicy::Strict`] | error | rejected | rejected |
//!
//! Permissive is the default so that local development works without a
//! secret. Every skip is reported to the caller as
//! [`VerificationOutcome::Skipped`] so it can be surfaced as a warning.

use crate::secrets::{SecretError, SecretProvider};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::sync::Arc;
use subtle::ConstantTimeEq;
use tracing::{debug, instrument};

type HmacSha256 = Hmac<Sha256>;

/// Compute the lowercase hex HMAC-SHA256 of `body` keyed by `secret`.
pub fn compute_signature(secret: &[u8], body: &[u8]) -> Result<String, VerificationError> {
    let mut mac = HmacSha256::new_from_slice(secret).map_err(|_| VerificationError::InvalidKey)?;
    mac.update(body);
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Check `provided` against the digest of `body`.
///
/// The comparison is an exact, case-sensitive match on the hex text. A
/// mismatch is `Ok(false)`, never an error.
pub fn verify_signature(
    body: &[u8],
    secret: &[u8],
    provided: &str,
) -> Result<bool, VerificationError> {
    let expected = compute_signature(secret, body)?;
    Ok(bool::from(expected.as_bytes().ct_eq(provided.as_bytes())))
}

/// How to treat requests that cannot be verified.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationPolicy {
    /// Skip verification (with a warning) when the secret or the signature
    /// header is missing.
    #[default]
    Permissive,
    /// Require both a secret and a signature header.
    Strict,
}

/// Why verification did not run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    NoSecretConfigured,
    NoSignatureHeader,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoSecretConfigured => "no webhook secret configured",
            Self::NoSignatureHeader => "request carries no signature header",
        }
    }
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of a verification attempt that did not hit an infrastructure error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationOutcome {
    Verified,
    Skipped(SkipReason),
    Rejected,
}

impl VerificationOutcome {
    /// `true` unless the signature was rejected.
    pub fn is_accepted(&self) -> bool {
        !matches!(self, Self::Rejected)
    }
}

/// Verification could not be performed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VerificationError {
    /// A secret and a signature were present but the request body bytes were
    /// not captured. This is a transport problem with the request.
    #[error("Raw request body is unavailable for signature verification")]
    RawBodyUnavailable,

    #[error("Webhook secret unavailable: {0}")]
    SecretUnavailable(#[from] SecretError),

    #[error("Webhook secret cannot be used as an HMAC key")]
    InvalidKey,
}

/// Applies the verification policy for one provider.
#[derive(Clone)]
pub struct SignatureVerifier {
    secret: Option<Arc<dyn SecretProvider>>,
    policy: VerificationPolicy,
}

impl SignatureVerifier {
    pub fn new(secret: Option<Arc<dyn SecretProvider>>, policy: VerificationPolicy) -> Self {
        Self { secret, policy }
    }

    /// A permissive verifier with no secret; every request is skipped.
    pub fn unconfigured() -> Self {
        Self::new(None, VerificationPolicy::Permissive)
    }

    pub fn policy(&self) -> VerificationPolicy {
        self.policy
    }

    /// Verify a webhook request.
    ///
    /// `raw_body` is `None` when the transport could not hand over the body
    /// bytes unchanged.
    ///
    /// # Errors
    ///
    /// - [`VerificationError::RawBodyUnavailable`] when a secret and a
    ///   signature are present but `raw_body` is `None`
    /// - [`VerificationError::SecretUnavailable`] when the secret source fails,
    ///   or under [`VerificationPolicy::Strict`] when no secret is configured
    #[instrument(skip_all, fields(policy = ?self.policy, has_signature = signature.is_some()))]
    pub async fn check(
        &self,
        raw_body: Option<&[u8]>,
        signature: Option<&str>,
    ) -> Result<VerificationOutcome, VerificationError> {
        let secret = match &self.secret {
            Some(provider) => provider.webhook_secret().await?,
            None => None,
        };

        let secret = match (secret, self.policy) {
            (Some(secret), _) => secret,
            (None, VerificationPolicy::Permissive) => {
                return Ok(VerificationOutcome::Skipped(SkipReason::NoSecretConfigured));
            }
            (None, VerificationPolicy::Strict) => {
                return Err(VerificationError::SecretUnavailable(
                    SecretError::ProviderUnavailable(
                        "strict verification requires a configured secret".to_string(),
                    ),
                ));
            }
        };

        let signature = match (signature, self.policy) {
            (Some(signature), _) => signature,
            (None, VerificationPolicy::Permissive) => {
                return Ok(VerificationOutcome::Skipped(SkipReason::NoSignatureHeader));
            }
            (None, VerificationPolicy::Strict) => return Ok(VerificationOutcome::Rejected),
        };

        let body = raw_body.ok_or(VerificationError::RawBodyUnavailable)?;

        if verify_signature(body, secret.expose_bytes(), signature)? {
            debug!("Webhook signature verified");
            Ok(VerificationOutcome::Verified)
        } else {
            debug!("Webhook signature mismatch");
            Ok(VerificationOutcome::Rejected)
        }
    }
}

impl std::fmt::Debug for SignatureVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignatureVerifier")
            .field(
                "secret",
                &self.secret.as_ref().map(|provider| provider.describe()),
            )
            .field("policy", &self.policy)
            .finish()
    }
}

#[cfg(test)]
#[path = "signature_tests.rs"]
mod tests;
