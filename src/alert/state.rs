// Per-rule alert state machine
//
// Inactive -> Firing requires the condition to hold for debounce_cycles
// consecutive evaluations; Firing -> Clearing -> Inactive requires the
// metric to stay past threshold - hysteresis for the same count. A breach
// while clearing re-arms the alert without a fresh debounce.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::rules::AlertRule;

/// Observable phase of one rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertPhase {
    Inactive,
    Firing,
    Clearing,
}

/// State transition kinds emitted to consumers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertTransition {
    /// Inactive -> Firing after a full debounce streak
    Fired,
    /// Firing -> Clearing, metric dropped past the hysteresis margin
    ClearStarted,
    /// Clearing -> Firing, condition returned before clearing completed
    Rearmed,
    /// Clearing -> Inactive after a full clearing streak
    Cleared,
}

/// Mutable evaluation state for one rule
#[derive(Debug, Clone)]
pub struct RuleState {
    pub phase: AlertPhase,
    /// When the current phase was entered
    pub since: DateTime<Utc>,
    /// Metric value at the last evaluation that touched this rule
    pub last_value: Option<f64>,
    /// Consecutive qualifying cycles toward the next transition
    streak: u32,
}

impl RuleState {
    pub fn new(since: DateTime<Utc>) -> Self {
        Self {
            phase: AlertPhase::Inactive,
            since,
            last_value: None,
            streak: 0,
        }
    }

    /// Advance the machine by one evaluation cycle. Returns the transitions
    /// taken this cycle, in order (re-arm then fire is impossible, but a
    /// debounce of one can clear-start and clear in the same cycle).
    pub fn step(&mut self, rule: &AlertRule, value: f64, now: DateTime<Utc>) -> Vec<AlertTransition> {
        self.last_value = Some(value);
        let mut transitions = Vec::new();

        match self.phase {
            AlertPhase::Inactive => {
                if rule.breaches(value) {
                    self.streak += 1;
                    if self.streak >= rule.debounce_cycles {
                        self.enter(AlertPhase::Firing, now);
                        transitions.push(AlertTransition::Fired);
                    }
                } else {
                    self.streak = 0;
                }
            }
            AlertPhase::Firing => {
                if rule.cleared(value) {
                    self.enter(AlertPhase::Clearing, now);
                    transitions.push(AlertTransition::ClearStarted);
                    self.streak = 1;
                    if self.streak >= rule.debounce_cycles {
                        self.enter(AlertPhase::Inactive, now);
                        transitions.push(AlertTransition::Cleared);
                    }
                }
            }
            AlertPhase::Clearing => {
                if rule.breaches(value) {
                    self.enter(AlertPhase::Firing, now);
                    transitions.push(AlertTransition::Rearmed);
                } else if rule.cleared(value) {
                    self.streak += 1;
                    if self.streak >= rule.debounce_cycles {
                        self.enter(AlertPhase::Inactive, now);
                        transitions.push(AlertTransition::Cleared);
                    }
                } else {
                    // Hysteresis dead zone: not recovered, not breaching.
                    // The clearing streak restarts.
                    self.streak = 0;
                }
            }
        }

        transitions
    }

    fn enter(&mut self, phase: AlertPhase, now: DateTime<Utc>) {
        self.phase = phase;
        self.since = now;
        self.streak = 0;
    }
}
