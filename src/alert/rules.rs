// Alert rule definitions
// Declarative threshold conditions, read-only after startup

use serde::{Deserialize, Serialize};

use crate::window::MetricKind;

/// Comparison direction for a rule's threshold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompareOp {
    GreaterThan,
    LessThan,
}

/// One declarative degradation condition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertRule {
    /// Stable identifier, unique within the rule set
    pub id: String,
    pub metric: MetricKind,
    pub op: CompareOp,
    pub threshold: f64,
    /// Minimum window sample count before the rule is evaluated at all
    #[serde(default = "default_min_samples")]
    pub min_samples: u64,
    /// Consecutive breaching cycles required to fire, and consecutive
    /// cleared cycles required to return to inactive
    #[serde(default = "default_debounce_cycles")]
    pub debounce_cycles: u32,
    /// Gap below the threshold a metric must reach before clearing counts
    #[serde(default = "default_hysteresis_margin")]
    pub hysteresis_margin: f64,
    /// Evaluation order: lower priority value runs first, declaration
    /// order breaks ties
    #[serde(default)]
    pub priority: u32,
}

fn default_min_samples() -> u64 {
    10
}

fn default_debounce_cycles() -> u32 {
    3
}

fn default_hysteresis_margin() -> f64 {
    0.05
}

impl AlertRule {
    /// Whether a metric value breaches the firing condition
    pub fn breaches(&self, value: f64) -> bool {
        match self.op {
            CompareOp::GreaterThan => value > self.threshold,
            CompareOp::LessThan => value < self.threshold,
        }
    }

    /// Whether a metric value is far enough past the threshold, in the
    /// recovering direction, to count toward clearing
    pub fn cleared(&self, value: f64) -> bool {
        match self.op {
            CompareOp::GreaterThan => value < self.threshold - self.hysteresis_margin,
            CompareOp::LessThan => value > self.threshold + self.hysteresis_margin,
        }
    }
}
