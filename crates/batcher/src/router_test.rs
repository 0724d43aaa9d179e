//! Tests for the shard dispatcher

use super::*;
use crate::config::BatcherConfig;
use crate::test_support::{plan_with, record, TestDeps};

fn router(deps: &TestDeps) -> ShardRouter {
    ShardRouter::new(
        BatcherConfig::default().with_batch_interval_ms(60_000),
        deps.deps(),
    )
}

#[test]
fn test_shard_is_deterministic_in_ray_id() {
    let deps = TestDeps::new();
    let router = router(&deps);

    let a = router.shard_for(&record("log-1", Some("ray-abc")));
    let b = router.shard_for(&record("log-2", Some("ray-abc")));
    assert_eq!(a, b, "same ray id must map to the same instance");
    assert!(a.starts_with("shard_"));
}

#[test]
fn test_shard_falls_back_to_log_id() {
    let deps = TestDeps::new();
    let router = router(&deps);

    let a = router.shard_for(&record("log-1", None));
    let b = router.shard_for(&record("log-1", None));
    assert_eq!(a, b);
}

#[test]
fn test_shards_stay_within_ring() {
    let deps = TestDeps::new();
    let router = ShardRouter::with_shard_count(
        BatcherConfig::default(),
        deps.deps(),
        4,
    );

    for i in 0..64 {
        let name = router.shard_for(&record(&format!("log-{i}"), None));
        let index: u32 = name.strip_prefix("shard_").unwrap().parse().unwrap();
        assert!(index < 4);
    }
}

#[tokio::test]
async fn test_dispatch_delivers_plan_then_record() {
    let deps = TestDeps::new();
    let router = router(&deps);
    let plan = plan_with("firehose", vec![]);

    router
        .dispatch(
            record("log-1", Some("ray-abc")),
            vec!["firehose".to_string()],
            &plan,
        )
        .await;
    router.drain_all().await;

    // The flush resolved its route, so the plan arrived before the record
    assert_eq!(deps.store.inserted_log_ids(), vec!["log-1"]);
}

#[tokio::test]
async fn test_named_instance_reused() {
    let deps = TestDeps::new();
    let router = router(&deps);

    let first = router.named("pruner_events");
    let second = router.named("pruner_events");
    assert_eq!(first.id(), second.id());
    assert_eq!(router.handles().len(), 1);
}

#[tokio::test]
async fn test_records_for_same_ray_share_an_instance() {
    let deps = TestDeps::new();
    let router = router(&deps);
    let plan = plan_with("firehose", vec![]);

    for i in 0..3 {
        router
            .dispatch(
                record(&format!("log-{i}"), Some("ray-xyz")),
                vec!["firehose".to_string()],
                &plan,
            )
            .await;
    }
    assert_eq!(router.handles().len(), 1);

    router.drain_all().await;
    // FIFO within the shared instance
    assert_eq!(
        deps.store.inserted_log_ids(),
        vec!["log-0", "log-1", "log-2"]
    );
}
