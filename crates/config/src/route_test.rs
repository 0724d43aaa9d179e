//! Tests for route and filter configuration parsing

use super::*;

#[test]
fn test_route_deserializes_camel_case() {
    let route: LogRouteConfig = serde_json::from_str(
        r#"{
            "tableName": "checkout_events",
            "columns": ["logId", "url", "receivedAt"],
            "retentionDays": 30,
            "pruningIntervalDays": 7
        }"#,
    )
    .unwrap();

    assert_eq!(route.table_name.as_deref(), Some("checkout_events"));
    assert_eq!(route.columns.as_ref().unwrap().len(), 3);
    assert_eq!(route.retention_days, Some(30));
    assert_eq!(route.pruning_interval_days, Some(7));
    assert!(route.filter.is_none());
}

#[test]
fn test_filter_groups_parse() {
    let groups = parse_filter_json(
        r#"[
            {"request.method": {"equals": "POST"}, "cf.threatScore": {"greaterThan": 10}},
            {"header:x-ab-test-group": {"equals": "B"}}
        ]"#,
    )
    .unwrap();

    assert_eq!(groups.len(), 2);
    let first = &groups[0];
    assert!(first.contains_key("request.method"));
    assert_eq!(
        first["request.method"]["equals"],
        serde_json::Value::String("POST".into())
    );
}

#[test]
fn test_malformed_filter_json_is_config_error() {
    let err = parse_filter_json("not json").unwrap_err();
    assert!(matches!(err, crate::ConfigError::MalformedFilterJson(_)));
}

#[test]
fn test_route_builder() {
    let route = LogRouteConfig::new("events")
        .with_columns(vec!["logId".into()])
        .with_retention(30, 7);

    assert_eq!(route.table_name.as_deref(), Some("events"));
    assert_eq!(route.retention_days, Some(30));
    assert_eq!(route.pruning_interval_days, Some(7));
}
