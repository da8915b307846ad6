// Alert evaluation pass
//
// Runs once per rotation cycle against the latest rollup. Rules are walked
// in a stable order (priority, then declaration order) so ties are never
// left to iteration chance. A rule whose window is too sparse, or whose
// metric is undefined, is skipped with its state untouched: skipped cycles
// count neither toward debounce nor toward clearing.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::window::{MetricValue, RollupWindow};

use super::rules::AlertRule;
use super::state::{AlertPhase, AlertTransition, RuleState};

/// One observed state transition, the unit consumers see
#[derive(Debug, Clone, Serialize)]
pub struct AlertEvent {
    pub rule_id: String,
    pub transition: AlertTransition,
    pub metric_value: f64,
    pub timestamp: DateTime<Utc>,
}

/// Point-in-time view of one rule for the snapshot
#[derive(Debug, Clone, Serialize)]
pub struct AlertView {
    pub rule_id: String,
    pub state: AlertPhase,
    pub since: DateTime<Utc>,
    pub metric_value: Option<f64>,
}

pub struct AlertEvaluator {
    /// Rules in evaluation order, fixed at startup
    rules: Vec<AlertRule>,
    states: Vec<RuleState>,
    history: VecDeque<AlertEvent>,
    history_limit: usize,
}

impl AlertEvaluator {
    pub fn new(mut rules: Vec<AlertRule>, history_limit: usize, now: DateTime<Utc>) -> Self {
        // Stable sort preserves declaration order within a priority
        rules.sort_by_key(|r| r.priority);
        let states = rules.iter().map(|_| RuleState::new(now)).collect();
        Self {
            rules,
            states,
            history: VecDeque::with_capacity(history_limit),
            history_limit,
        }
    }

    /// Evaluate every rule against the rollup, advancing state machines and
    /// recording transitions. Returns the transitions emitted this cycle.
    pub fn evaluate(&mut self, rollup: &RollupWindow, now: DateTime<Utc>) -> Vec<AlertEvent> {
        let mut emitted = Vec::new();

        for (rule, state) in self.rules.iter().zip(self.states.iter_mut()) {
            if rollup.total_count < rule.min_samples {
                tracing::debug!(
                    rule_id = %rule.id,
                    samples = rollup.total_count,
                    min_samples = rule.min_samples,
                    "Skipping rule on sparse window"
                );
                continue;
            }

            let value = match rollup.metric(rule.metric) {
                MetricValue::Ok { value } => value,
                MetricValue::InsufficientData => {
                    tracing::debug!(
                        rule_id = %rule.id,
                        metric = rule.metric.as_str(),
                        "Skipping rule, metric undefined for window"
                    );
                    continue;
                }
            };

            for transition in state.step(rule, value, now) {
                tracing::info!(
                    rule_id = %rule.id,
                    ?transition,
                    value,
                    "Alert transition"
                );
                emitted.push(AlertEvent {
                    rule_id: rule.id.clone(),
                    transition,
                    metric_value: value,
                    timestamp: now,
                });
            }
        }

        for event in &emitted {
            if self.history.len() >= self.history_limit {
                self.history.pop_back();
            }
            self.history.push_front(event.clone());
        }

        emitted
    }

    /// Per-rule view for the published snapshot
    pub fn views(&self) -> Vec<AlertView> {
        self.rules
            .iter()
            .zip(self.states.iter())
            .map(|(rule, state)| AlertView {
                rule_id: rule.id.clone(),
                state: state.phase,
                since: state.since,
                metric_value: state.last_value,
            })
            .collect()
    }

    /// Bounded transition history, most recent first
    pub fn history(&self, limit: usize) -> Vec<AlertEvent> {
        self.history.iter().take(limit).cloned().collect()
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }
}
