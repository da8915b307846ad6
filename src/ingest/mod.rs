// Event ingestion
//
// The single write path into the engine. Validates each outcome record,
// routes it into the bucket containing its timestamp, and counts every
// rejection so a burst of bad events is itself visible as a metric.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::errors::RejectionReason;
use crate::event::{PredictionEvent, PredictorKind, Recommendation};
use crate::window::BucketStore;

/// Handed back to the serving layer on successful ingestion
#[derive(Debug, Clone, Serialize)]
pub struct Accepted {
    pub event_id: Uuid,
    /// Aligned start of the bucket the event landed in, epoch seconds
    pub bucket_start: i64,
    /// Combined predictor recommendation for this request
    pub recommendation: Recommendation,
}

pub struct Ingester {
    store: Arc<BucketStore>,
    /// Tolerated clock skew for timestamps ahead of the engine's clock
    skew_tolerance: Duration,
}

impl Ingester {
    pub fn new(store: Arc<BucketStore>, skew_tolerance_secs: i64) -> Self {
        Self {
            store,
            skew_tolerance: Duration::seconds(skew_tolerance_secs),
        }
    }

    /// Validate and route one event. Never blocks on aggregation or
    /// alert evaluation; the bucket store is the only shared state.
    pub fn record(&self, event: &PredictionEvent) -> Result<Accepted, RejectionReason> {
        self.record_at(event, Utc::now())
    }

    /// `record` with an explicit clock, for deterministic tests
    pub fn record_at(
        &self,
        event: &PredictionEvent,
        now: DateTime<Utc>,
    ) -> Result<Accepted, RejectionReason> {
        if let Err(reason) = self.validate(event, now) {
            self.store.note_rejection(&reason);
            tracing::debug!(
                event_id = %event.event_id,
                reason = reason.as_str(),
                "Rejected prediction event"
            );
            return Err(reason);
        }

        match self.store.apply_event(event) {
            Ok(bucket_start) => Ok(Accepted {
                event_id: event.event_id,
                bucket_start,
                recommendation: event.recommendation(),
            }),
            Err(reason) => {
                self.store.note_rejection(&reason);
                tracing::debug!(
                    event_id = %event.event_id,
                    reason = reason.as_str(),
                    "Rejected prediction event"
                );
                Err(reason)
            }
        }
    }

    fn validate(&self, event: &PredictionEvent, now: DateTime<Utc>) -> Result<(), RejectionReason> {
        if event.request_fingerprint.trim().is_empty() {
            return Err(RejectionReason::malformed("empty request fingerprint"));
        }

        if event.statistical_prediction.is_none() && event.generative_prediction.is_none() {
            return Err(RejectionReason::malformed(
                "event carries neither prediction",
            ));
        }

        // Each slot may only hold the outcome variant it is named after
        if let Some(outcome) = &event.statistical_prediction {
            if outcome.kind() != PredictorKind::Statistical {
                return Err(RejectionReason::malformed(
                    "statistical slot holds a generative outcome",
                ));
            }
        }
        if let Some(outcome) = &event.generative_prediction {
            if outcome.kind() != PredictorKind::Generative {
                return Err(RejectionReason::malformed(
                    "generative slot holds a statistical outcome",
                ));
            }
        }

        if event.timestamp > now + self.skew_tolerance {
            return Err(RejectionReason::malformed(
                "timestamp beyond clock-skew tolerance",
            ));
        }

        Ok(())
    }
}
