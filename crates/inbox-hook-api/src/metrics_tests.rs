use super::*;
use inbox_hook_core::{DispatchOutcome, KnownCategory, SkipReason, VerificationOutcome};

#[test]
fn test_each_instance_has_its_own_registry() {
    let first = ServiceMetrics::new().unwrap();
    let second = ServiceMetrics::new().unwrap();

    first.record_request(IntakePath::Webhook, "nylas");

    assert_eq!(
        first
            .requests_total
            .with_label_values(&["webhook", "nylas"])
            .get(),
        1
    );
    assert_eq!(
        second
            .requests_total
            .with_label_values(&["webhook", "nylas"])
            .get(),
        0
    );
}

#[test]
fn test_record_outcome_counts_category_and_skip() {
    let metrics = ServiceMetrics::new().unwrap();
    let outcome = IntakeOutcome {
        verification: Some(VerificationOutcome::Skipped(SkipReason::NoSecretConfigured)),
        disposition: Disposition::Dispatched(DispatchOutcome::Handled(
            KnownCategory::MessageCreated,
        )),
    };

    metrics.record_outcome(IntakePath::Webhook, "nylas", &outcome);

    assert_eq!(
        metrics
            .notifications_total
            .with_label_values(&["message.created"])
            .get(),
        1
    );
    assert_eq!(
        metrics
            .verification_skipped_total
            .with_label_values(&["nylas"])
            .get(),
        1
    );
}

#[test]
fn test_record_outcome_counts_malformed_per_path() {
    let metrics = ServiceMetrics::new().unwrap();
    let outcome = IntakeOutcome {
        verification: None,
        disposition: Disposition::Malformed,
    };

    metrics.record_outcome(IntakePath::PubSub, "nylas", &outcome);

    assert_eq!(
        metrics.malformed_total.with_label_values(&["pubsub"]).get(),
        1
    );
}

#[test]
fn test_record_error_counts_signature_failures_only() {
    let metrics = ServiceMetrics::new().unwrap();

    metrics.record_error("nylas", &IntakeError::SignatureMismatch);
    metrics.record_error("nylas", &IntakeError::RawBodyUnavailable);

    assert_eq!(
        metrics
            .signature_failures_total
            .with_label_values(&["nylas"])
            .get(),
        1
    );
}

#[test]
fn test_render_uses_text_exposition_format() {
    let metrics = ServiceMetrics::new().unwrap();
    metrics.record_request(IntakePath::PubSub, "nylas");

    let text = metrics.render().unwrap();

    assert!(text.contains("# TYPE inbox_hook_requests_total counter"));
    assert!(text.contains(r#"inbox_hook_requests_total{path="pubsub",provider="nylas"} 1"#));
}
