//! Tests for INSERT construction

use super::*;
use crate::test_support::{plan_with, record};
use loghose_config::LogRouteConfig;
use loghose_protocol::field;

#[test]
fn test_columns_follow_schema_order() {
    let plan = plan_with(
        "firehose",
        vec![LogRouteConfig::new("slim").with_columns(vec![
            "receivedAt".to_string(),
            "logId".to_string(),
        ])],
    );
    let route = plan.route_for_table("slim").unwrap();

    let statements = build_insert_statements(route, &[record("id-1", None)]);
    assert_eq!(statements.len(), 1);
    assert_eq!(
        statements[0].sql,
        "INSERT INTO slim (logId, receivedAt) VALUES (?1, ?2)"
    );
}

#[test]
fn test_missing_fields_bind_null() {
    let plan = plan_with(
        "firehose",
        vec![LogRouteConfig::new("slim").with_columns(vec![
            "logId".to_string(),
            "rayId".to_string(),
            "receivedAt".to_string(),
        ])],
    );
    let route = plan.route_for_table("slim").unwrap();

    let statements = build_insert_statements(route, &[record("id-1", None)]);
    let params = &statements[0].params;
    assert_eq!(params[0], SqlValue::Text("id-1".to_string()));
    assert_eq!(params[1], SqlValue::Null);
    assert_eq!(params[2], SqlValue::Null);
}

#[test]
fn test_booleans_bind_as_integers() {
    let plan = plan_with(
        "firehose",
        vec![LogRouteConfig::new("slim").with_columns(vec![
            "logId".to_string(),
            "bodyTruncated".to_string(),
        ])],
    );
    let route = plan.route_for_table("slim").unwrap();

    let mut rec = record("id-1", None);
    rec.set(field::BODY_TRUNCATED, true);
    let statements = build_insert_statements(route, &[rec]);
    assert_eq!(statements[0].params[1], SqlValue::Integer(1));
}

#[test]
fn test_one_statement_per_record() {
    let plan = plan_with("firehose", vec![]);
    let route = plan.firehose();

    let batch = vec![record("a", None), record("b", None), record("c", None)];
    let statements = build_insert_statements(route, &batch);
    assert_eq!(statements.len(), 3);
    // Full master schema: 55 placeholders per statement
    assert_eq!(statements[0].params.len(), 55);
}
