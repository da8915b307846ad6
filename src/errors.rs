// Engine error taxonomy
//
// All ingestion failures are local and non-fatal: a rejected event is
// counted and reported, never allowed to stop ingestion or aggregation.

use serde::Serialize;
use thiserror::Error;

/// Why an event was refused at the ingestion boundary
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "reason", content = "detail", rename_all = "snake_case")]
pub enum RejectionReason {
    /// Event fails structural validation; rejected, counted, never retried
    #[error("malformed event: {0}")]
    Malformed(String),

    /// Timestamp falls in an already-closed bucket; a distinct signal of
    /// clock or pipeline skew, not folded into Malformed
    #[error("late event: bucket starting at {bucket_start} is already closed")]
    LateEvent { bucket_start: i64 },
}

impl RejectionReason {
    pub fn malformed(detail: impl Into<String>) -> Self {
        RejectionReason::Malformed(detail.into())
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RejectionReason::Malformed(_) => "malformed",
            RejectionReason::LateEvent { .. } => "late_event",
        }
    }
}
