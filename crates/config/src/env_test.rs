//! Tests for environment parsing

use super::*;
use std::collections::HashMap;

fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |name| map.get(name).cloned()
}

#[test]
fn test_defaults() {
    let config = EnvConfig::from_lookup(|_| None);
    assert_eq!(config.firehose_table, "log_firehose");
    assert_eq!(config.firehose_filters, None);
    assert_eq!(config.batch_interval_ms, 10_000);
    assert_eq!(config.max_batch_size, 200);
    assert_eq!(config.max_body_size, 10_000);
}

#[test]
fn test_reads_values() {
    let config = EnvConfig::from_lookup(lookup_from(&[
        ("LOG_HOSE_TABLE", "requests"),
        ("LOG_HOSE_RETENTION_DAYS", "30"),
        ("LOG_HOSE_PRUNING_INTERVAL_DAYS", "1"),
        ("BATCH_INTERVAL_MS", "5000"),
        ("MAX_BATCH_SIZE", "50"),
        ("MAX_BODY_SIZE", "2048"),
    ]));

    assert_eq!(config.firehose_table, "requests");
    assert_eq!(config.firehose_retention_days, Some(30));
    assert_eq!(config.firehose_pruning_interval_days, Some(1));
    assert_eq!(config.batch_interval_ms, 5_000);
    assert_eq!(config.max_batch_size, 50);
    assert_eq!(config.max_body_size, 2_048);
}

#[test]
fn test_non_numeric_reverts_to_default() {
    let config = EnvConfig::from_lookup(lookup_from(&[
        ("BATCH_INTERVAL_MS", "soon"),
        ("MAX_BATCH_SIZE", "many"),
    ]));

    assert_eq!(config.batch_interval_ms, 10_000);
    assert_eq!(config.max_batch_size, 200);
}

#[test]
fn test_non_positive_reverts_to_default() {
    let config = EnvConfig::from_lookup(lookup_from(&[
        ("BATCH_INTERVAL_MS", "0"),
        ("MAX_BATCH_SIZE", "-5"),
    ]));

    assert_eq!(config.batch_interval_ms, 10_000);
    assert_eq!(config.max_batch_size, 200);
}

#[test]
fn test_invalid_optional_is_dropped() {
    let config =
        EnvConfig::from_lookup(lookup_from(&[("LOG_HOSE_RETENTION_DAYS", "forever")]));
    assert_eq!(config.firehose_retention_days, None);
}

#[test]
fn test_empty_table_name_falls_back() {
    let config = EnvConfig::from_lookup(lookup_from(&[("LOG_HOSE_TABLE", "  ")]));
    assert_eq!(config.firehose_table, "log_firehose");
}
