//! Payload Parsing Tests
//!
//! Tests for decoding and validating CloudWatch alarm notifications.

use alarmsight::domain::{parse_payload, ParseError, Payload};

fn fixture() -> Payload {
    let raw = std::fs::read_to_string(concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/tests/fixtures/payload.json"
    ))
    .unwrap();
    serde_json::from_str(&raw).unwrap()
}

#[test]
fn test_parse_fixture() {
    let payload = fixture();
    let event = parse_payload(&payload).unwrap();

    assert_eq!(
        (event.alarm_name.as_str(), event.state_value.as_str()),
        ("lambda-demo-metric-alarm", "ALARM")
    );
    assert!(event.is_alarming());
    assert_eq!(event.account_id, "123456789012");
    assert_eq!(event.region, "ap-northeast-1");
    assert_eq!(event.alarm_arn.resource, "alarm:lambda-demo-metric-alarm");
    assert!(event.state_reason.starts_with("Threshold Crossed"));
}

#[test]
fn test_fixture_keeps_unconsumed_fields() {
    let payload = fixture();
    assert_eq!(payload.source, "aws.cloudwatch");
    assert_eq!(
        payload.alarm_data.configuration.description,
        "Errors reported by the demo function"
    );
    assert_eq!(payload.alarm_data.configuration.metrics.len(), 1);
}

#[test]
fn test_minimal_payload() {
    let payload: Payload = serde_json::from_str(
        r#"{
            "alarmArn": "arn:aws:cloudwatch:us-east-1:111122223333:alarm:api-5xx",
            "alarmData": {"alarmName": "api-5xx", "state": {"value": "OK"}}
        }"#,
    )
    .unwrap();

    let event = parse_payload(&payload).unwrap();
    assert_eq!(event.alarm_name, "api-5xx");
    assert_eq!(event.state_value, "OK");
    assert!(!event.is_alarming());
}

#[test]
fn test_missing_state_block() {
    let payload: Payload = serde_json::from_str(
        r#"{
            "alarmArn": "arn:aws:cloudwatch:us-east-1:111122223333:alarm:api-5xx",
            "alarmData": {"alarmName": "api-5xx"}
        }"#,
    )
    .unwrap();

    assert_eq!(parse_payload(&payload), Err(ParseError::MissingStateValue));
}

#[test]
fn test_type_mismatch_is_distinct_from_missing_field() {
    let mut payload = fixture();
    payload.alarm_arn = "arn:aws:lambda:ap-northeast-1:123456789012:function:lambda-demo".to_string();
    let mismatch = parse_payload(&payload).unwrap_err();
    assert!(matches!(mismatch, ParseError::NotAnAlarm { .. }));

    let mut payload = fixture();
    payload.alarm_data.alarm_name.clear();
    let missing = parse_payload(&payload).unwrap_err();
    assert_eq!(missing, ParseError::MissingAlarmName);

    assert_ne!(mismatch, missing);
}

#[test]
fn test_empty_arn_is_malformed() {
    let mut payload = fixture();
    payload.alarm_arn.clear();
    assert!(matches!(
        parse_payload(&payload),
        Err(ParseError::MalformedArn { .. })
    ));
}

#[test]
fn test_null_alarm_name_is_missing_name() {
    let payload: Payload = serde_json::from_str(
        r#"{
            "alarmArn": "arn:aws:cloudwatch:us-east-1:111122223333:alarm:a",
            "alarmData": {"alarmName": null, "state": {"value": "ALARM"}}
        }"#,
    )
    .unwrap();

    assert_eq!(parse_payload(&payload), Err(ParseError::MissingAlarmName));
}

#[test]
fn test_null_alarm_data_is_missing_name() {
    let payload: Payload = serde_json::from_str(
        r#"{"alarmArn": "arn:aws:cloudwatch:us-east-1:111122223333:alarm:a", "alarmData": null}"#,
    )
    .unwrap();

    assert_eq!(parse_payload(&payload), Err(ParseError::MissingAlarmName));
}

#[test]
fn test_null_state_value_is_missing_state() {
    let payload: Payload = serde_json::from_str(
        r#"{
            "alarmArn": "arn:aws:cloudwatch:us-east-1:111122223333:alarm:a",
            "alarmData": {"alarmName": "a", "state": {"value": null, "reason": null}}
        }"#,
    )
    .unwrap();

    assert_eq!(parse_payload(&payload), Err(ParseError::MissingStateValue));
}
