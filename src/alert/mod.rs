// Alerting
// Threshold rules, debounce/hysteresis state machines, and the per-cycle
// evaluation pass

mod evaluator;
mod rules;
mod state;

pub use evaluator::{AlertEvaluator, AlertEvent, AlertView};
pub use rules::{AlertRule, CompareOp};
pub use state::{AlertPhase, AlertTransition, RuleState};
