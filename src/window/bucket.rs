// Time-bucketed counters
//
// A bucket is append-only while its span contains the current time and
// frozen once the span elapses. Counters only ever increment, so a clone
// taken at any point is a consistent lower bound on the final totals.

use crate::errors::RejectionReason;
use crate::event::{PredictionEvent, PredictorKind};

/// Running counters for one fixed-duration time slice
#[derive(Debug, Clone)]
pub struct WindowBucket {
    /// Aligned start of the span, epoch seconds
    pub start: i64,
    /// Accepted events routed into this bucket
    pub total_count: u64,
    /// Events where both predictors produced the same label
    pub agree_count: u64,
    /// Events where labels differ or one outcome is missing
    pub disagree_count: u64,
    /// Events whose generative call failed
    pub generative_failures: u64,
    /// Events carrying a ground-truth label
    pub ground_truth_count: u64,
    /// Correct classifications among ground-truth events, per predictor
    pub statistical_correct: u64,
    pub generative_correct: u64,
    /// Latency samples for percentile computation, per predictor
    pub statistical_latencies_ms: Vec<u64>,
    pub generative_latencies_ms: Vec<u64>,
    /// Rejections observed while this bucket was open, by reason
    pub rejected_malformed: u64,
    pub rejected_late: u64,
}

impl WindowBucket {
    pub fn new(start: i64) -> Self {
        Self {
            start,
            total_count: 0,
            agree_count: 0,
            disagree_count: 0,
            generative_failures: 0,
            ground_truth_count: 0,
            statistical_correct: 0,
            generative_correct: 0,
            statistical_latencies_ms: Vec::new(),
            generative_latencies_ms: Vec::new(),
            rejected_malformed: 0,
            rejected_late: 0,
        }
    }

    /// Fold an accepted event into the counters
    pub fn apply(&mut self, event: &PredictionEvent) {
        self.total_count += 1;

        if event.predictors_agree() {
            self.agree_count += 1;
        } else {
            self.disagree_count += 1;
        }

        if !event.generative_call_succeeded {
            self.generative_failures += 1;
        }

        if event.ground_truth.is_some() {
            self.ground_truth_count += 1;
            if event.correct(PredictorKind::Statistical) == Some(true) {
                self.statistical_correct += 1;
            }
            if event.correct(PredictorKind::Generative) == Some(true) {
                self.generative_correct += 1;
            }
        }

        if let Some(ms) = event.statistical_latency_ms {
            self.statistical_latencies_ms.push(ms);
        }
        if let Some(ms) = event.generative_latency_ms {
            self.generative_latencies_ms.push(ms);
        }
    }

    /// Count a rejection against this bucket without touching event counters
    pub fn note_rejection(&mut self, reason: &RejectionReason) {
        match reason {
            RejectionReason::Malformed(_) => self.rejected_malformed += 1,
            RejectionReason::LateEvent { .. } => self.rejected_late += 1,
        }
    }
}
