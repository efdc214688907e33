//! Integration tests for the endpoint challenge handshake

mod common;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use common::TestService;
use tower::ServiceExt;

fn challenge_request(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_challenge_token_echoed_exactly() {
    let service = TestService::signed();

    let response = service
        .app
        .clone()
        .oneshot(challenge_request("/webhook/nylas?challenge=abc123"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "text/plain"
    );
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&body[..], b"abc123");
}

#[tokio::test]
async fn test_challenge_needs_no_signature_or_secret() {
    let service = TestService::unsigned();

    let (status, text) = service
        .send(challenge_request("/webhook/nylas?challenge=f00d"))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(text, "f00d");
    assert!(service.sink.is_empty());
}

#[tokio::test]
async fn test_probe_without_token_returns_empty_body() {
    let service = TestService::signed();

    let (status, text) = service.send(challenge_request("/webhook/nylas")).await;

    assert_eq!(status, StatusCode::OK);
    assert!(text.is_empty());
}

#[tokio::test]
async fn test_challenge_on_unknown_provider_is_not_found() {
    let service = TestService::signed();

    let (status, _) = service
        .send(challenge_request("/webhook/other?challenge=abc"))
        .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}
