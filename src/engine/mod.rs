// Monitoring engine
//
// Owns the bucket store, rule states and snapshot store, and runs the
// rotation cycle: rotate buckets, compute the rollup, evaluate alerts,
// publish the snapshot. Constructed explicitly and shared by reference;
// there is no process-wide singleton.

use std::sync::Arc;
use std::sync::Mutex;
use std::time::Instant;

use chrono::{DateTime, Utc};
use tokio::time::MissedTickBehavior;

use crate::alert::{AlertEvaluator, AlertEvent};
use crate::config::MonitorConfig;
use crate::errors::RejectionReason;
use crate::event::PredictionEvent;
use crate::ingest::{Accepted, Ingester};
use crate::snapshot::{Snapshot, SnapshotStore};
use crate::window::{BucketStore, RollupWindow};

pub struct MonitoringEngine {
    config: MonitorConfig,
    store: Arc<BucketStore>,
    ingester: Ingester,
    /// Touched only by the rotation cycle (writes) and history queries
    /// (reads); never held across an await
    evaluator: Mutex<AlertEvaluator>,
    snapshots: SnapshotStore,
    started_at: DateTime<Utc>,
}

impl MonitoringEngine {
    pub fn new(config: MonitorConfig) -> Self {
        Self::new_at(config, Utc::now())
    }

    /// `new` with an explicit clock, for deterministic tests
    pub fn new_at(config: MonitorConfig, now: DateTime<Utc>) -> Self {
        let store = Arc::new(BucketStore::new(
            config.bucket_span_secs,
            config.retention_secs,
            now,
        ));
        let ingester = Ingester::new(Arc::clone(&store), config.skew_tolerance_secs);
        let evaluator = Mutex::new(AlertEvaluator::new(
            config.rules.clone(),
            config.history_limit,
            now,
        ));
        let snapshots = SnapshotStore::new(Snapshot::initial(Self::window_span(&config), now));

        tracing::info!(
            bucket_span_secs = config.bucket_span_secs,
            rollup_buckets = config.rollup_buckets,
            retention_secs = config.retention_secs,
            rules = config.rules.len(),
            "Monitoring engine initialized"
        );

        Self {
            config,
            store,
            ingester,
            evaluator,
            snapshots,
            started_at: now,
        }
    }

    /// Nominal reporting span: the closed buckets a rollup combines
    fn window_span(config: &MonitorConfig) -> i64 {
        config.rollup_buckets * config.bucket_span_secs
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// The only ingestion entry point
    pub fn record(&self, event: &PredictionEvent) -> Result<Accepted, RejectionReason> {
        self.ingester.record(event)
    }

    /// `record` with an explicit clock, for deterministic tests
    pub fn record_at(
        &self,
        event: &PredictionEvent,
        now: DateTime<Utc>,
    ) -> Result<Accepted, RejectionReason> {
        self.ingester.record_at(event, now)
    }

    /// One full rotation cycle. Called by the scheduled task on a fixed
    /// cadence; cycles never overlap because there is a single caller.
    /// Returns the alert transitions emitted this cycle.
    pub fn rotate_once(&self, now: DateTime<Utc>) -> Vec<AlertEvent> {
        let released = self.store.rotate(now);
        if released > 0 {
            tracing::debug!(released, "Released buckets past retention horizon");
        }

        let buckets = self.store.window(self.config.rollup_buckets);
        let rollup = RollupWindow::from_buckets(&buckets, Self::window_span(&self.config));

        let (events, views) = {
            let mut evaluator = self
                .evaluator
                .lock()
                .expect("alert evaluator lock poisoned");
            let events = evaluator.evaluate(&rollup, now);
            (events, evaluator.views())
        };

        // Metrics and alert states land in one atomic replace
        self.snapshots
            .publish(Snapshot::from_rollup(&rollup, views, now));
        events
    }

    /// Latest fully-evaluated snapshot; the sole read path for consumers
    pub fn snapshot(&self) -> Snapshot {
        self.snapshots.current()
    }

    /// Bounded alert transition history, most recent first
    pub fn alert_history(&self, limit: usize) -> Vec<AlertEvent> {
        self.evaluator
            .lock()
            .expect("alert evaluator lock poisoned")
            .history(limit)
    }
}

/// Scheduled rotation task, one per engine. Missed ticks are skipped so
/// two cycles can never run concurrently; an overrun is an operational
/// fault logged here, not a domain alert.
pub async fn run_rotation_task(engine: Arc<MonitoringEngine>) {
    let cadence = std::time::Duration::from_secs(engine.config().bucket_span_secs as u64);
    let mut interval = tokio::time::interval(cadence);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    // The first tick fires immediately and publishes a baseline snapshot
    loop {
        interval.tick().await;
        let cycle_start = Instant::now();
        engine.rotate_once(Utc::now());
        let elapsed = cycle_start.elapsed();
        if elapsed > cadence {
            tracing::warn!(
                elapsed_ms = elapsed.as_millis() as u64,
                cadence_ms = cadence.as_millis() as u64,
                "Rotation cycle overran its cadence, next evaluation skipped"
            );
        }
    }
}
