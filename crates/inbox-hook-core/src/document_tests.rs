//! Tests for the optional-field extraction helpers.

use super::*;
use serde_json::json;

mod lookup_tests {
    use super::*;

    #[test]
    fn test_nested_path_resolves() {
        let doc = json!({"data": {"object": {"subject": "Hello"}}});
        assert_eq!(
            lookup(&doc, "data.object.subject"),
            Some(&json!("Hello"))
        );
    }

    #[test]
    fn test_missing_segment_returns_none() {
        let doc = json!({"data": {}});
        assert!(lookup(&doc, "data.object.subject").is_none());
    }

    /// Traversing through a non-object (array, string, number) yields `None`.
    #[test]
    fn test_non_object_segment_returns_none() {
        let doc = json!({"data": ["object"]});
        assert!(lookup(&doc, "data.object").is_none());

        let doc = json!({"data": "text"});
        assert!(lookup(&doc, "data.object").is_none());
    }
}

mod typed_accessor_tests {
    use super::*;

    #[test]
    fn test_str_at_rejects_blank_and_non_string() {
        let doc = json!({"a": "  ", "b": 42, "c": "value"});
        assert_eq!(str_at(&doc, "a"), None);
        assert_eq!(str_at(&doc, "b"), None);
        assert_eq!(str_at(&doc, "c"), Some("value"));
    }

    #[test]
    fn test_i64_at_does_not_coerce_strings() {
        let doc = json!({"start": 1700000000, "end": "1700003600"});
        assert_eq!(i64_at(&doc, "start"), Some(1_700_000_000));
        assert_eq!(i64_at(&doc, "end"), None);
    }

    #[test]
    fn test_bool_and_array_accessors() {
        let doc = json!({"unread": true, "folders": ["INBOX", "IMPORTANT"]});
        assert_eq!(bool_at(&doc, "unread"), Some(true));
        assert_eq!(array_at(&doc, "folders").map(<[_]>::len), Some(2));
        assert!(array_at(&doc, "unread").is_none());
    }

    #[test]
    fn test_or_placeholder() {
        assert_eq!(or_placeholder(Some("x")), "x");
        assert_eq!(or_placeholder::<String>(None), PLACEHOLDER);
    }
}
