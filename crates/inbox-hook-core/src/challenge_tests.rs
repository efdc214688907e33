use super::*;

#[test]
fn test_answer_state_serializes_snake_case() {
    let answer = Handshake::new().answer(Some("abc123"));

    let json = serde_json::to_value(&answer).unwrap();
    assert_eq!(json["state"], "answered");
    assert_eq!(
        serde_json::to_value(ChallengeState::AwaitingChallenge).unwrap(),
        "awaiting_challenge"
    );
}

#[test]
fn test_token_echoed_verbatim() {
    let answer = Handshake::new().answer(Some("abc123"));

    assert_eq!(answer.state, ChallengeState::Answered);
    assert_eq!(answer.body, "abc123");
    assert_eq!(answer.content_type(), "text/plain");
    assert!(!answer.is_probe());
}

/// No trimming, quoting or escaping is applied.
#[test]
fn test_token_bytes_unchanged() {
    for token in [" spaced ", "\"quoted\"", "ümlaut-✓", "a+b/c=="] {
        let answer = Handshake::new().answer(Some(token));
        assert_eq!(answer.body.as_bytes(), token.as_bytes());
    }
}

#[test]
fn test_absent_token_is_empty_probe() {
    let answer = Handshake::new().answer(None);

    assert_eq!(answer.state, ChallengeState::Answered);
    assert!(answer.body.is_empty());
    assert!(answer.is_probe());
}

#[test]
fn test_empty_token_is_not_probe() {
    let answer = Handshake::new().answer(Some(""));
    assert!(answer.body.is_empty());
    assert!(!answer.is_probe());
}
