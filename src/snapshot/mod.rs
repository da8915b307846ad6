// Snapshot store and exporter
//
// Exactly one current snapshot exists at a time. The rotation task builds
// it after the alert pass and publishes it as a single atomic replace over
// a watch channel, so a reader can never observe a metrics update without
// its corresponding alert re-evaluation.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::watch;

use crate::alert::AlertView;
use crate::event::PredictorKind;
use crate::window::{MetricValue, RollupWindow};

/// Latency percentiles for one predictor over the window
#[derive(Debug, Clone, Serialize)]
pub struct LatencySummary {
    pub p50_ms: MetricValue,
    pub p95_ms: MetricValue,
}

/// Derived metrics for the published window
#[derive(Debug, Clone, Serialize)]
pub struct SnapshotMetrics {
    pub agreement_rate: MetricValue,
    pub disagreement_rate: MetricValue,
    pub statistical_accuracy: MetricValue,
    pub generative_accuracy: MetricValue,
    pub statistical_latency: LatencySummary,
    pub generative_latency: LatencySummary,
    pub generative_failure_rate: MetricValue,
    pub ingestion_rejection_rate: MetricValue,
}

/// Point-in-time view of engine health: one fully evaluated rollup plus
/// the alert states that evaluation produced
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub window_span_secs: i64,
    pub generated_at: DateTime<Utc>,
    pub sample_count: u64,
    pub metrics: SnapshotMetrics,
    pub alerts: Vec<AlertView>,
}

impl Snapshot {
    /// Empty baseline published before the first rotation completes
    pub fn initial(window_span_secs: i64, now: DateTime<Utc>) -> Self {
        Self::from_rollup(
            &RollupWindow::from_buckets(&[], window_span_secs),
            Vec::new(),
            now,
        )
    }

    pub fn from_rollup(rollup: &RollupWindow, alerts: Vec<AlertView>, now: DateTime<Utc>) -> Self {
        Self {
            window_span_secs: rollup.window_span_secs,
            generated_at: now,
            sample_count: rollup.total_count,
            metrics: SnapshotMetrics {
                agreement_rate: rollup.agreement_rate(),
                disagreement_rate: rollup.disagreement_rate(),
                statistical_accuracy: rollup.accuracy_proxy(PredictorKind::Statistical),
                generative_accuracy: rollup.accuracy_proxy(PredictorKind::Generative),
                statistical_latency: LatencySummary {
                    p50_ms: rollup.latency_percentile(PredictorKind::Statistical, 50.0),
                    p95_ms: rollup.latency_percentile(PredictorKind::Statistical, 95.0),
                },
                generative_latency: LatencySummary {
                    p50_ms: rollup.latency_percentile(PredictorKind::Generative, 50.0),
                    p95_ms: rollup.latency_percentile(PredictorKind::Generative, 95.0),
                },
                generative_failure_rate: rollup.generative_failure_rate(),
                ingestion_rejection_rate: rollup.ingestion_rejection_rate(),
            },
            alerts,
        }
    }
}

/// Single-writer, many-reader holder for the current snapshot
pub struct SnapshotStore {
    tx: watch::Sender<Snapshot>,
}

impl SnapshotStore {
    pub fn new(initial: Snapshot) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx }
    }

    /// Atomic replace, called only by the rotation task
    pub fn publish(&self, snapshot: Snapshot) {
        // send_replace never fails even with zero subscribed readers
        self.tx.send_replace(snapshot);
    }

    /// Clone of the latest published snapshot
    pub fn current(&self) -> Snapshot {
        self.tx.borrow().clone()
    }
}

/// Serialize a snapshot verbatim for external consumption
pub fn export_json(snapshot: &Snapshot) -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(snapshot)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::window::WindowBucket;

    #[test]
    fn test_initial_snapshot_is_all_insufficient() {
        let snapshot = Snapshot::initial(900, Utc::now());
        assert_eq!(snapshot.sample_count, 0);
        assert_eq!(snapshot.metrics.agreement_rate, MetricValue::InsufficientData);
        assert_eq!(
            snapshot.metrics.statistical_accuracy,
            MetricValue::InsufficientData
        );
        assert!(snapshot.alerts.is_empty());
    }

    #[test]
    fn test_publish_replaces_atomically() {
        let store = SnapshotStore::new(Snapshot::initial(900, Utc::now()));

        let mut bucket = WindowBucket::new(0);
        bucket.total_count = 10;
        bucket.agree_count = 9;
        bucket.disagree_count = 1;
        let rollup = RollupWindow::from_buckets(&[bucket], 900);
        store.publish(Snapshot::from_rollup(&rollup, Vec::new(), Utc::now()));

        let current = store.current();
        assert_eq!(current.sample_count, 10);
        assert_eq!(
            current.metrics.agreement_rate,
            MetricValue::Ok { value: 0.9 }
        );
    }

    #[test]
    fn test_export_reports_insufficient_data_explicitly() {
        let snapshot = Snapshot::initial(900, Utc::now());
        let json = export_json(&snapshot).unwrap();
        // Undefined metrics are spelled out, never coerced to zero
        assert!(json.contains("insufficient_data"));
        assert!(json.contains("\"sample_count\": 0"));
    }
}
