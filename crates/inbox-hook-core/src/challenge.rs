//! Provider handshake used to validate an endpoint.
//!
//! Before the provider delivers notifications to a new endpoint it sends a
//! `GET` with a `challenge` query parameter and expects the token echoed back
//! verbatim as plain text within a few seconds. Any quoting, JSON wrapping or
//! trailing newline fails the handshake.

use serde::{Deserialize, Serialize};

/// Content type of every challenge answer.
pub const CHALLENGE_CONTENT_TYPE: &str = "text/plain";

/// Handshake progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChallengeState {
    AwaitingChallenge,
    Answered,
}

/// A handshake that has not been answered yet.
///
/// [`Handshake::answer`] consumes the handshake, so an answer can only be
/// produced once.
#[derive(Debug, Default)]
pub struct Handshake {
    _private: (),
}

impl Handshake {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer the challenge.
    ///
    /// The body is the token's exact bytes. Without a token the answer is
    /// empty: a plain `GET` probe is acknowledged without content.
    pub fn answer(self, token: Option<&str>) -> ChallengeAnswer {
        ChallengeAnswer {
            state: ChallengeState::Answered,
            body: token.unwrap_or_default().to_string(),
            probe: token.is_none(),
        }
    }
}

/// The response to a challenge. Always sent with status 200.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChallengeAnswer {
    pub state: ChallengeState,
    pub body: String,
    probe: bool,
}

impl ChallengeAnswer {
    pub fn content_type(&self) -> &'static str {
        CHALLENGE_CONTENT_TYPE
    }

    /// `true` when the request carried no token.
    pub fn is_probe(&self) -> bool {
        self.probe
    }
}

#[cfg(test)]
#[path = "challenge_tests.rs"]
mod tests;
