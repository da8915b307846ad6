// End-to-end tests for the monitoring engine

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use uuid::Uuid;

use creditwatch::alert::{AlertPhase, AlertRule, AlertTransition, CompareOp};
use creditwatch::config::MonitorConfig;
use creditwatch::engine::MonitoringEngine;
use creditwatch::errors::RejectionReason;
use creditwatch::event::{PredictionEvent, PredictionOutcome, RiskLabel};
use creditwatch::window::{MetricKind, MetricValue};

fn at(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(secs, 0).unwrap()
}

fn event_at(secs: i64, fingerprint: &str, agree: bool) -> PredictionEvent {
    PredictionEvent {
        event_id: Uuid::new_v4(),
        timestamp: at(secs),
        request_fingerprint: fingerprint.to_string(),
        statistical_prediction: Some(PredictionOutcome::Statistical {
            label: RiskLabel::Good,
            confidence: 0.85,
        }),
        generative_prediction: Some(PredictionOutcome::Generative {
            label: if agree { RiskLabel::Good } else { RiskLabel::Bad },
            rationale: "income stability".to_string(),
        }),
        ground_truth: None,
        statistical_latency_ms: Some(15),
        generative_latency_ms: Some(600),
        generative_call_succeeded: true,
    }
}

fn disagreement_config(debounce: u32) -> MonitorConfig {
    let mut config = MonitorConfig::default();
    config.bucket_span_secs = 60;
    config.rollup_buckets = 1;
    config.rules = vec![AlertRule {
        id: "disagreement-high".to_string(),
        metric: MetricKind::DisagreementRate,
        op: CompareOp::GreaterThan,
        threshold: 0.3,
        min_samples: 10,
        debounce_cycles: debounce,
        hysteresis_margin: 0.05,
        priority: 0,
    }];
    config
}

/// 60s buckets, disagreement > 0.3, min_samples 10, debounce 2. Three
/// buckets at rates 0.1 / 0.4 / 0.5 leave the rule inactive, inactive,
/// firing: only the second breach in a row fires.
#[test]
fn test_debounce_progression_across_buckets() {
    let engine = MonitoringEngine::new_at(disagreement_config(2), at(0));
    let rates = [2, 8, 10]; // disagreements out of 20 events per bucket

    for (cycle, disagreements) in rates.iter().enumerate() {
        let base = cycle as i64 * 60;
        for i in 0..20 {
            let agree = i >= *disagreements;
            let fp = format!("req-{cycle}-{i}");
            engine
                .record_at(&event_at(base + i, &fp, agree), at(base + i))
                .unwrap();
        }
        engine.rotate_once(at(base + 60));

        let state = engine.snapshot().alerts[0].state;
        match cycle {
            0 | 1 => assert_eq!(state, AlertPhase::Inactive, "after bucket {}", cycle + 1),
            _ => assert_eq!(state, AlertPhase::Firing, "after bucket 3"),
        }
    }

    let history = engine.alert_history(10);
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].transition, AlertTransition::Fired);
    assert!((history[0].metric_value - 0.5).abs() < 1e-9);
}

/// 1000 concurrent record calls with unique fingerprints landing in the
/// same open bucket are each counted exactly once.
#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_concurrent_ingestion_counts_every_event_once() {
    let engine = Arc::new(MonitoringEngine::new_at(MonitorConfig::default(), at(0)));

    let mut handles = Vec::new();
    for i in 0..1000 {
        let engine = Arc::clone(&engine);
        handles.push(tokio::spawn(async move {
            let fp = format!("req-{i}");
            engine.record_at(&event_at(30, &fp, true), at(30)).unwrap();
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    engine.rotate_once(at(60));
    let snapshot = engine.snapshot();
    assert_eq!(snapshot.sample_count, 1000);
    assert_eq!(
        snapshot.metrics.agreement_rate,
        MetricValue::Ok { value: 1.0 }
    );
}

/// Late events are rejected and counted but never mutate a closed bucket.
#[test]
fn test_late_events_never_reopen_closed_buckets() {
    let engine = MonitoringEngine::new_at(MonitorConfig::default(), at(0));
    for i in 0..10 {
        let fp = format!("req-{i}");
        engine.record_at(&event_at(i, &fp, true), at(i)).unwrap();
    }
    engine.rotate_once(at(60));
    assert_eq!(engine.snapshot().sample_count, 10);

    let err = engine
        .record_at(&event_at(30, "straggler", true), at(70))
        .unwrap_err();
    assert_eq!(err, RejectionReason::LateEvent { bucket_start: 0 });

    engine.rotate_once(at(120));
    let snapshot = engine.snapshot();
    // Volume unchanged, rejection visible as its own signal
    assert_eq!(snapshot.sample_count, 10);
    assert_eq!(
        snapshot.metrics.ingestion_rejection_rate,
        MetricValue::Ok { value: 1.0 / 11.0 }
    );
}

/// Accuracy over a window with no ground truth is reported as undefined.
#[test]
fn test_accuracy_insufficient_without_ground_truth() {
    let engine = MonitoringEngine::new_at(MonitorConfig::default(), at(0));
    for i in 0..50 {
        let fp = format!("req-{i}");
        engine.record_at(&event_at(i, &fp, true), at(i)).unwrap();
    }
    engine.rotate_once(at(60));

    let metrics = engine.snapshot().metrics;
    assert_eq!(metrics.statistical_accuracy, MetricValue::InsufficientData);
    assert_eq!(metrics.generative_accuracy, MetricValue::InsufficientData);

    // With ground truth present the proxy becomes a ratio
    let mut labeled = event_at(70, "labeled", true);
    labeled.ground_truth = Some(RiskLabel::Good);
    engine.record_at(&labeled, at(70)).unwrap();
    engine.rotate_once(at(120));

    let metrics = engine.snapshot().metrics;
    assert_eq!(
        metrics.statistical_accuracy,
        MetricValue::Ok { value: 1.0 }
    );
}

/// Buckets past the retention horizon drop out of every rollup.
#[test]
fn test_retention_releases_old_buckets() {
    let mut config = MonitorConfig::default();
    config.bucket_span_secs = 60;
    config.rollup_buckets = 2;
    config.retention_secs = 120;
    let engine = MonitoringEngine::new_at(config, at(0));

    for i in 0..10 {
        let fp = format!("req-{i}");
        engine.record_at(&event_at(i, &fp, true), at(i)).unwrap();
    }
    engine.rotate_once(at(60));
    assert_eq!(engine.snapshot().sample_count, 10);

    // Two more rotations move the bucket past retention_secs / span cycles
    engine.rotate_once(at(120));
    engine.rotate_once(at(180));
    assert_eq!(engine.snapshot().sample_count, 0);
}

/// A published snapshot always carries the alert pass that matched its
/// metrics: firing state and the triggering value arrive together.
#[test]
fn test_snapshot_metrics_and_alerts_published_together() {
    let engine = MonitoringEngine::new_at(disagreement_config(1), at(0));
    for i in 0..20 {
        let fp = format!("req-{i}");
        engine.record_at(&event_at(i, &fp, false), at(i)).unwrap();
    }

    // Before the cycle: baseline snapshot, no metrics, no alerts
    let before = engine.snapshot();
    assert_eq!(before.sample_count, 0);
    assert_eq!(before.alerts.len(), 0);

    engine.rotate_once(at(60));
    let after = engine.snapshot();
    assert_eq!(after.sample_count, 20);
    assert_eq!(after.alerts[0].state, AlertPhase::Firing);
    assert_eq!(after.alerts[0].metric_value, Some(1.0));
    assert_eq!(
        after.metrics.disagreement_rate,
        MetricValue::Ok { value: 1.0 }
    );
}

/// Rollups combine the configured closed buckets with the open bucket.
#[test]
fn test_rollup_spans_closed_and_open_buckets() {
    let mut config = MonitorConfig::default();
    config.rollup_buckets = 2;
    let engine = MonitoringEngine::new_at(config, at(0));

    engine.record_at(&event_at(10, "a", true), at(10)).unwrap();
    engine.rotate_once(at(60));
    engine.record_at(&event_at(70, "b", true), at(70)).unwrap();
    engine.rotate_once(at(120));
    // Open bucket contribution
    engine.record_at(&event_at(130, "c", false), at(130)).unwrap();
    engine.rotate_once(at(140));

    let snapshot = engine.snapshot();
    assert_eq!(snapshot.sample_count, 3);
    assert_eq!(
        snapshot.metrics.disagreement_rate,
        MetricValue::Ok { value: 1.0 / 3.0 }
    );
}
