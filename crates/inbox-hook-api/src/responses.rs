//! Response types and query parameters for the API.

use inbox_hook_core::Timestamp;
use serde::{Deserialize, Serialize};

/// Body returned for an accepted webhook delivery
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookAccepted {
    pub success: bool,
}

impl WebhookAccepted {
    pub fn accepted() -> Self {
        Self { success: true }
    }
}

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub providers: Vec<String>,
    pub timestamp: Timestamp,
}

/// Query parameters of the provider challenge
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ChallengeQuery {
    pub challenge: Option<String>,
}

impl ChallengeQuery {
    /// Pick the challenge token out of decoded query pairs.
    ///
    /// A repeated `challenge` parameter answers with its first value, and
    /// unrelated parameters are ignored.
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        Self {
            challenge: pairs
                .into_iter()
                .find_map(|(name, value)| (name == "challenge").then_some(value)),
        }
    }
}

#[cfg(test)]
#[path = "responses_tests.rs"]
mod tests;
