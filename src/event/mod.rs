// Prediction event model
// One record per scored credit request, carrying both predictors' outcomes

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Credit-risk class label produced by either predictor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLabel {
    Good,
    Bad,
}

/// Which predictor produced an outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PredictorKind {
    Statistical,
    Generative,
}

impl PredictorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PredictorKind::Statistical => "statistical",
            PredictorKind::Generative => "generative",
        }
    }
}

/// One predictor's outcome for a request
///
/// The two predictors produce shape-different results: the statistical
/// classifier attaches a confidence score, the generative model a free-text
/// rationale. Tagged by `kind` so an event slot can be checked against the
/// predictor it claims to come from.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PredictionOutcome {
    Statistical { label: RiskLabel, confidence: f64 },
    Generative { label: RiskLabel, rationale: String },
}

impl PredictionOutcome {
    pub fn label(&self) -> RiskLabel {
        match self {
            PredictionOutcome::Statistical { label, .. } => *label,
            PredictionOutcome::Generative { label, .. } => *label,
        }
    }

    pub fn kind(&self) -> PredictorKind {
        match self {
            PredictionOutcome::Statistical { .. } => PredictorKind::Statistical,
            PredictionOutcome::Generative { .. } => PredictorKind::Generative,
        }
    }
}

/// One prediction outcome record, immutable once ingested
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionEvent {
    /// Unique event id (generated when the serving layer omits one)
    #[serde(default = "Uuid::new_v4")]
    pub event_id: Uuid,
    /// When the prediction was made
    pub timestamp: DateTime<Utc>,
    /// Opaque correlation key from the serving layer
    pub request_fingerprint: String,
    /// Statistical classifier outcome, if the classifier ran
    #[serde(default)]
    pub statistical_prediction: Option<PredictionOutcome>,
    /// Generative predictor outcome, absent when the generative call failed
    #[serde(default)]
    pub generative_prediction: Option<PredictionOutcome>,
    /// True label, arrives later or never
    #[serde(default)]
    pub ground_truth: Option<RiskLabel>,
    #[serde(default)]
    pub statistical_latency_ms: Option<u64>,
    #[serde(default)]
    pub generative_latency_ms: Option<u64>,
    pub generative_call_succeeded: bool,
}

impl PredictionEvent {
    /// Whether the two predictors produced the same label
    ///
    /// An absent outcome counts as disagreement, so agree + disagree always
    /// partitions the accepted volume.
    pub fn predictors_agree(&self) -> bool {
        match (&self.statistical_prediction, &self.generative_prediction) {
            (Some(s), Some(g)) => s.label() == g.label(),
            _ => false,
        }
    }

    /// Combined routing recommendation, mirroring the serving layer's policy
    pub fn recommendation(&self) -> Recommendation {
        match (&self.statistical_prediction, &self.generative_prediction) {
            (Some(s), Some(g)) if s.label() == g.label() => match s.label() {
                RiskLabel::Bad => Recommendation::Reject,
                RiskLabel::Good => Recommendation::Approve,
            },
            _ => Recommendation::ManualReview,
        }
    }

    /// Whether the given predictor matched the ground truth, if both exist
    pub fn correct(&self, kind: PredictorKind) -> Option<bool> {
        let truth = self.ground_truth?;
        let outcome = match kind {
            PredictorKind::Statistical => self.statistical_prediction.as_ref(),
            PredictorKind::Generative => self.generative_prediction.as_ref(),
        }?;
        Some(outcome.label() == truth)
    }
}

/// What the serving layer should do with the request, given both predictors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    /// Both predictors agree on low risk
    Approve,
    /// Both predictors agree on high risk
    Reject,
    /// Predictors disagree or one is missing
    ManualReview,
}
