//! Tests for push envelope parsing and payload decoding.

use super::*;

fn envelope_with_data(data: &str) -> NotificationEnvelope {
    NotificationEnvelope {
        data: Some(data.to_string()),
        ..Default::default()
    }
}

mod decode_tests {
    use super::*;

    #[test]
    fn test_decode_returns_original_text() {
        let text = r#"{"type":"message.created","id":"abc"}"#;
        let envelope = NotificationEnvelope::wrap(text.as_bytes(), "m-1");

        assert_eq!(decode_payload(&envelope).unwrap(), text);
    }

    /// The codec does not care whether the decoded text is JSON.
    #[test]
    fn test_decode_accepts_non_json_text() {
        let envelope = envelope_with_data(&encode_payload(b"not json {"));
        assert_eq!(decode_payload(&envelope).unwrap(), "not json {");
    }

    #[test]
    fn test_missing_data_is_missing_payload() {
        let envelope = NotificationEnvelope::default();
        assert_eq!(
            decode_payload(&envelope).unwrap_err(),
            DecodeError::MissingPayload
        );
    }

    #[test]
    fn test_empty_data_is_missing_payload() {
        let envelope = envelope_with_data("");
        assert_eq!(
            decode_payload(&envelope).unwrap_err(),
            DecodeError::MissingPayload
        );
    }

    #[test]
    fn test_invalid_base64_rejected() {
        let envelope = envelope_with_data("%%% not base64 %%%");
        assert!(matches!(
            decode_payload(&envelope),
            Err(DecodeError::InvalidBase64 { .. })
        ));
    }

    /// URL-safe alphabet characters are not part of the standard alphabet.
    #[test]
    fn test_url_safe_alphabet_rejected() {
        let envelope = envelope_with_data("-_-_");
        assert!(matches!(
            decode_payload(&envelope),
            Err(DecodeError::InvalidBase64 { .. })
        ));
    }

    #[test]
    fn test_non_utf8_payload_rejected() {
        let envelope = envelope_with_data(&encode_payload(&[0xff, 0xfe, 0xfd]));
        assert!(matches!(
            decode_payload(&envelope),
            Err(DecodeError::InvalidUtf8 { .. })
        ));
    }
}

mod push_request_tests {
    use super::*;

    #[test]
    fn test_parses_relay_shape() {
        let body = br#"{
            "message": {
                "data": "eyJ0eXBlIjoibWVzc2FnZS5jcmVhdGVkIn0=",
                "messageId": "136969346945",
                "publishTime": "2024-03-01T10:00:00.000Z",
                "attributes": {"origin": "nylas"}
            },
            "subscription": "projects/acme/subscriptions/inbox"
        }"#;

        let request = PushRequest::from_slice(body).unwrap();
        let envelope = request.envelope().unwrap();

        assert_eq!(envelope.message_id.as_deref(), Some("136969346945"));
        assert_eq!(
            envelope.publish_time.as_deref(),
            Some("2024-03-01T10:00:00.000Z")
        );
        assert_eq!(
            envelope
                .attributes
                .as_ref()
                .and_then(|a| a.get("origin"))
                .map(String::as_str),
            Some("nylas")
        );
        assert_eq!(
            request.subscription.as_deref(),
            Some("projects/acme/subscriptions/inbox")
        );
        assert_eq!(
            decode_payload(envelope).unwrap(),
            r#"{"type":"message.created"}"#
        );
    }

    /// Some relays send snake_case metadata keys alongside the camelCase ones.
    #[test]
    fn test_accepts_snake_case_metadata() {
        let body = br#"{"message":{"data":"e30=","message_id":"7","publish_time":"t"}}"#;
        let request = PushRequest::from_slice(body).unwrap();
        let envelope = request.envelope().unwrap();

        assert_eq!(envelope.message_id.as_deref(), Some("7"));
        assert_eq!(envelope.publish_time.as_deref(), Some("t"));
    }

    #[test]
    fn test_missing_message_reported() {
        let request = PushRequest::from_slice(br#"{"subscription":"s"}"#).unwrap();
        assert_eq!(request.envelope().unwrap_err(), DecodeError::MissingMessage);
    }

    #[test]
    fn test_non_json_body_is_malformed_envelope() {
        assert!(matches!(
            PushRequest::from_slice(b"definitely not json"),
            Err(DecodeError::MalformedEnvelope { .. })
        ));
    }

    #[test]
    fn test_message_without_data_parses_but_fails_decode() {
        let request = PushRequest::from_slice(br#"{"message":{"messageId":"1"}}"#).unwrap();
        let envelope = request.envelope().unwrap();
        assert_eq!(
            decode_payload(envelope).unwrap_err(),
            DecodeError::MissingPayload
        );
    }
}
