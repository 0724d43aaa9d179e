//! The worker entrypoint

use std::sync::Arc;

use loghose_assemble::Assembler;
use loghose_batcher::{BatcherConfig, BatcherDeps, ShardRouter};
use loghose_config::{EnvConfig, LogRouteConfig};
use loghose_plan::{compile_plan, LogPlan, PlanError};
use loghose_protocol::{LogRecord, LogRequest, RequestView};
use tokio_util::task::TaskTracker;

/// The pipeline entrypoint
///
/// Holds the compiled plan (immutable for the process lifetime), the
/// assembler, and the shard router. Cheap to share behind an `Arc`.
pub struct Worker {
    plan: Arc<LogPlan>,
    assembler: Assembler,
    router: Arc<ShardRouter>,
    tracker: TaskTracker,
}

impl Worker {
    /// Compile the plan and wire the batching tier
    ///
    /// Fails on an invalid route table or malformed firehose filter
    /// JSON: a worker with a broken plan must not serve requests.
    pub fn new(
        env: EnvConfig,
        user_routes: Vec<LogRouteConfig>,
        deps: BatcherDeps,
    ) -> Result<Self, PlanError> {
        let plan = Arc::new(compile_plan(&env, &user_routes)?);

        let batcher_config = BatcherConfig::default()
            .with_batch_interval_ms(env.batch_interval_ms)
            .with_max_batch_size(env.max_batch_size);

        Ok(Self {
            plan,
            assembler: Assembler::new(env.max_body_size),
            router: Arc::new(ShardRouter::new(batcher_config, deps)),
            tracker: TaskTracker::new(),
        })
    }

    /// Attach an environment snapshot to every assembled record
    pub fn with_environment(
        mut self,
        environment: &serde_json::Map<String, serde_json::Value>,
    ) -> Self {
        self.assembler = self.assembler.with_environment(environment);
        self
    }

    /// The compiled log plan
    pub fn plan(&self) -> &Arc<LogPlan> {
        &self.plan
    }

    /// Enqueue a request for logging; returns immediately
    ///
    /// Assembly, filter evaluation, and dispatch run in a tracked
    /// background task. Nothing that happens there is ever surfaced to
    /// the caller; failures are visible only through logs, metrics, and
    /// the diagnostics stores.
    pub fn log(&self, request: LogRequest, data: Option<serde_json::Value>) {
        let plan = Arc::clone(&self.plan);
        let router = Arc::clone(&self.router);
        let assembler = self.assembler.clone();

        self.tracker.spawn(async move {
            let view = RequestView::new(&request);
            let record = assembler.assemble(&view, data.as_ref());

            let tables: Vec<String> = plan
                .matched_routes(&view)
                .iter()
                .map(|route| route.table_name.clone())
                .collect();
            if tables.is_empty() {
                return;
            }

            router.dispatch(record, tables, &plan).await;
        });
    }

    /// Assemble and return the record without enqueuing
    pub fn get_log_data(
        &self,
        request: &LogRequest,
        data: Option<&serde_json::Value>,
    ) -> LogRecord {
        let view = RequestView::new(request);
        self.assembler.assemble(&view, data)
    }

    /// Scheduled entry: run retention checks for every prunable route
    ///
    /// Each check runs on a dedicated `pruner_<table>` instance. The
    /// plan is delivered before the check so schema initialization can
    /// resolve the route; both complete before this returns.
    pub async fn run_scheduled(&self) {
        for route in self.plan.routes() {
            if !route.prunable() {
                continue;
            }

            let handle = self.router.named(&format!("pruner_{}", route.table_name));
            handle.set_log_plan(Arc::clone(&self.plan)).await;
            handle.run_retention_check(route.table_name.clone()).await;
            tracing::debug!(table = %route.table_name, "retention check complete");
        }
    }

    /// Wait for in-flight logging tasks, then drain every instance
    pub async fn shutdown(&self) {
        self.tracker.close();
        self.tracker.wait().await;
        self.router.drain_all().await;
    }
}
