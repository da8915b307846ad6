// Rollup windows and derived metrics
//
// A rollup is recomputed on read from bucket ranges, never stored as
// mutable state, so bucket granularity and reporting granularity cannot
// drift apart. Metrics are ratios over summed counters; a window with no
// qualifying samples reports InsufficientData rather than zero.

use serde::{Deserialize, Serialize};

use crate::event::PredictorKind;

use super::bucket::WindowBucket;

/// Metric selector usable in alert rules and reported in snapshots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    AgreementRate,
    DisagreementRate,
    StatisticalAccuracy,
    GenerativeAccuracy,
    StatisticalP95LatencyMs,
    GenerativeP95LatencyMs,
    GenerativeFailureRate,
    IngestionRejectionRate,
}

impl MetricKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricKind::AgreementRate => "agreement_rate",
            MetricKind::DisagreementRate => "disagreement_rate",
            MetricKind::StatisticalAccuracy => "statistical_accuracy",
            MetricKind::GenerativeAccuracy => "generative_accuracy",
            MetricKind::StatisticalP95LatencyMs => "statistical_p95_latency_ms",
            MetricKind::GenerativeP95LatencyMs => "generative_p95_latency_ms",
            MetricKind::GenerativeFailureRate => "generative_failure_rate",
            MetricKind::IngestionRejectionRate => "ingestion_rejection_rate",
        }
    }
}

/// A computed metric, or an explicit statement that the window cannot
/// support it (zero ground-truth events, zero samples)
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MetricValue {
    Ok { value: f64 },
    InsufficientData,
}

impl MetricValue {
    pub fn value(&self) -> Option<f64> {
        match self {
            MetricValue::Ok { value } => Some(*value),
            MetricValue::InsufficientData => None,
        }
    }

    fn ratio(numerator: u64, denominator: u64) -> Self {
        if denominator == 0 {
            MetricValue::InsufficientData
        } else {
            MetricValue::Ok {
                value: numerator as f64 / denominator as f64,
            }
        }
    }
}

/// Read-only view over the last N closed buckets plus the open bucket
#[derive(Debug, Clone)]
pub struct RollupWindow {
    pub window_span_secs: i64,
    pub total_count: u64,
    pub agree_count: u64,
    pub disagree_count: u64,
    pub generative_failures: u64,
    pub ground_truth_count: u64,
    pub statistical_correct: u64,
    pub generative_correct: u64,
    pub rejected_malformed: u64,
    pub rejected_late: u64,
    statistical_latencies_ms: Vec<u64>,
    generative_latencies_ms: Vec<u64>,
}

impl RollupWindow {
    /// Sum a range of bucket copies into one view
    pub fn from_buckets(buckets: &[WindowBucket], window_span_secs: i64) -> Self {
        let mut rollup = Self {
            window_span_secs,
            total_count: 0,
            agree_count: 0,
            disagree_count: 0,
            generative_failures: 0,
            ground_truth_count: 0,
            statistical_correct: 0,
            generative_correct: 0,
            rejected_malformed: 0,
            rejected_late: 0,
            statistical_latencies_ms: Vec::new(),
            generative_latencies_ms: Vec::new(),
        };
        for bucket in buckets {
            rollup.total_count += bucket.total_count;
            rollup.agree_count += bucket.agree_count;
            rollup.disagree_count += bucket.disagree_count;
            rollup.generative_failures += bucket.generative_failures;
            rollup.ground_truth_count += bucket.ground_truth_count;
            rollup.statistical_correct += bucket.statistical_correct;
            rollup.generative_correct += bucket.generative_correct;
            rollup.rejected_malformed += bucket.rejected_malformed;
            rollup.rejected_late += bucket.rejected_late;
            rollup
                .statistical_latencies_ms
                .extend_from_slice(&bucket.statistical_latencies_ms);
            rollup
                .generative_latencies_ms
                .extend_from_slice(&bucket.generative_latencies_ms);
        }
        rollup
    }

    pub fn agreement_rate(&self) -> MetricValue {
        MetricValue::ratio(self.agree_count, self.total_count)
    }

    pub fn disagreement_rate(&self) -> MetricValue {
        MetricValue::ratio(self.disagree_count, self.total_count)
    }

    pub fn generative_failure_rate(&self) -> MetricValue {
        MetricValue::ratio(self.generative_failures, self.total_count)
    }

    /// Fraction of ground-truth-bearing events a predictor got right
    pub fn accuracy_proxy(&self, kind: PredictorKind) -> MetricValue {
        let correct = match kind {
            PredictorKind::Statistical => self.statistical_correct,
            PredictorKind::Generative => self.generative_correct,
        };
        MetricValue::ratio(correct, self.ground_truth_count)
    }

    /// Rejected share of everything that hit the ingestion boundary
    pub fn ingestion_rejection_rate(&self) -> MetricValue {
        let rejected = self.rejected_malformed + self.rejected_late;
        MetricValue::ratio(rejected, self.total_count + rejected)
    }

    /// Nearest-rank percentile over the window's latency samples
    pub fn latency_percentile(&self, kind: PredictorKind, percentile: f64) -> MetricValue {
        let samples = match kind {
            PredictorKind::Statistical => &self.statistical_latencies_ms,
            PredictorKind::Generative => &self.generative_latencies_ms,
        };
        if samples.is_empty() {
            return MetricValue::InsufficientData;
        }
        let mut sorted = samples.clone();
        sorted.sort_unstable();
        let rank = ((percentile / 100.0) * sorted.len() as f64).ceil() as usize;
        let index = rank.clamp(1, sorted.len()) - 1;
        MetricValue::Ok {
            value: sorted[index] as f64,
        }
    }

    /// Evaluate a rule's metric selector against this window
    pub fn metric(&self, kind: MetricKind) -> MetricValue {
        match kind {
            MetricKind::AgreementRate => self.agreement_rate(),
            MetricKind::DisagreementRate => self.disagreement_rate(),
            MetricKind::StatisticalAccuracy => self.accuracy_proxy(PredictorKind::Statistical),
            MetricKind::GenerativeAccuracy => self.accuracy_proxy(PredictorKind::Generative),
            MetricKind::StatisticalP95LatencyMs => {
                self.latency_percentile(PredictorKind::Statistical, 95.0)
            }
            MetricKind::GenerativeP95LatencyMs => {
                self.latency_percentile(PredictorKind::Generative, 95.0)
            }
            MetricKind::GenerativeFailureRate => self.generative_failure_rate(),
            MetricKind::IngestionRejectionRate => self.ingestion_rejection_rate(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bucket(start: i64, total: u64, agree: u64) -> WindowBucket {
        let mut b = WindowBucket::new(start);
        b.total_count = total;
        b.agree_count = agree;
        b.disagree_count = total - agree;
        b
    }

    #[test]
    fn test_rollup_sums_bucket_counters() {
        let buckets = vec![bucket(0, 10, 8), bucket(60, 20, 10)];
        let rollup = RollupWindow::from_buckets(&buckets, 120);

        assert_eq!(rollup.total_count, 30);
        assert_eq!(rollup.agreement_rate(), MetricValue::Ok { value: 0.6 });
        assert_eq!(rollup.disagreement_rate(), MetricValue::Ok { value: 0.4 });
    }

    #[test]
    fn test_empty_window_reports_insufficient_data() {
        let rollup = RollupWindow::from_buckets(&[], 900);
        assert_eq!(rollup.agreement_rate(), MetricValue::InsufficientData);
        assert_eq!(
            rollup.metric(MetricKind::GenerativeFailureRate),
            MetricValue::InsufficientData
        );
    }

    #[test]
    fn test_accuracy_without_ground_truth_is_insufficient() {
        // Events exist, but none carry ground truth: accuracy must be
        // reported as undefined, never 0 or 1
        let rollup = RollupWindow::from_buckets(&[bucket(0, 50, 40)], 60);
        assert_eq!(
            rollup.accuracy_proxy(PredictorKind::Statistical),
            MetricValue::InsufficientData
        );
        assert_eq!(
            rollup.accuracy_proxy(PredictorKind::Generative),
            MetricValue::InsufficientData
        );
    }

    #[test]
    fn test_accuracy_proxy_ratio() {
        let mut b = bucket(0, 10, 10);
        b.ground_truth_count = 4;
        b.statistical_correct = 3;
        b.generative_correct = 2;
        let rollup = RollupWindow::from_buckets(&[b], 60);

        assert_eq!(
            rollup.accuracy_proxy(PredictorKind::Statistical),
            MetricValue::Ok { value: 0.75 }
        );
        assert_eq!(
            rollup.accuracy_proxy(PredictorKind::Generative),
            MetricValue::Ok { value: 0.5 }
        );
    }

    #[test]
    fn test_latency_percentiles_nearest_rank() {
        let mut b = WindowBucket::new(0);
        b.statistical_latencies_ms = (1..=100).collect();
        let rollup = RollupWindow::from_buckets(&[b], 60);

        assert_eq!(
            rollup.latency_percentile(PredictorKind::Statistical, 50.0),
            MetricValue::Ok { value: 50.0 }
        );
        assert_eq!(
            rollup.latency_percentile(PredictorKind::Statistical, 95.0),
            MetricValue::Ok { value: 95.0 }
        );
        assert_eq!(
            rollup.latency_percentile(PredictorKind::Generative, 95.0),
            MetricValue::InsufficientData
        );
    }

    #[test]
    fn test_rejection_rate_counts_both_reasons() {
        let mut b = bucket(0, 8, 8);
        b.rejected_malformed = 1;
        b.rejected_late = 1;
        let rollup = RollupWindow::from_buckets(&[b], 60);

        assert_eq!(
            rollup.ingestion_rejection_rate(),
            MetricValue::Ok { value: 0.2 }
        );
    }
}
