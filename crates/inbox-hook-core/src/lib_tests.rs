//! Tests for [`Timestamp`].

use super::*;

#[test]
fn test_from_epoch_seconds() {
    let ts = Timestamp::from_epoch_seconds(1_695_415_185).unwrap();
    assert_eq!(ts.to_rfc3339(), "2023-09-22T20:39:45+00:00");
    assert_eq!(ts.to_string(), "2023-09-22T20:39:45+00:00");
}

#[test]
fn test_from_epoch_seconds_out_of_range() {
    assert!(Timestamp::from_epoch_seconds(i64::MAX).is_none());
}

#[test]
fn test_serializes_as_rfc3339_string() {
    let ts = Timestamp::from_epoch_seconds(0).unwrap();
    let json = serde_json::to_value(ts).unwrap();
    assert!(json.as_str().unwrap().starts_with("1970-01-01T00:00:00"));
}
