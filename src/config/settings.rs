// Configuration structs
// Read-only after startup; rotation cadence, windows and the rule set all
// come from here

use serde::Deserialize;

use crate::alert::{AlertRule, CompareOp};
use crate::window::MetricKind;

/// Engine-side tunables
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Bucket span in seconds; also the rotation cadence
    pub bucket_span_secs: i64,
    /// Closed buckets combined into a rollup, on top of the open bucket
    pub rollup_buckets: i64,
    /// Closed buckets older than this are released
    pub retention_secs: i64,
    /// Tolerated clock skew for event timestamps ahead of the engine
    pub skew_tolerance_secs: i64,
    /// Bound on the alert transition history
    pub history_limit: usize,
    /// Threshold rules, evaluated by priority then declaration order
    pub rules: Vec<AlertRule>,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            bucket_span_secs: 60,
            rollup_buckets: 15,
            retention_secs: 3600,
            skew_tolerance_secs: 5,
            history_limit: 256,
            rules: default_rules(),
        }
    }
}

/// HTTP surface tunables
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address (e.g., "127.0.0.1:8600")
    pub bind_address: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:8600".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub monitor: MonitorConfig,
    pub server: ServerConfig,
}

impl Config {
    /// Reject configurations that would break the retention invariant or
    /// make rule evaluation ambiguous
    pub fn validate(&self) -> anyhow::Result<()> {
        use anyhow::bail;

        if self.monitor.bucket_span_secs <= 0 {
            bail!("bucket_span_secs must be positive");
        }
        if self.monitor.rollup_buckets < 1 {
            bail!("rollup_buckets must be at least 1");
        }
        if self.monitor.retention_secs < self.monitor.bucket_span_secs {
            bail!("retention_secs must cover at least one bucket span");
        }
        if self.monitor.retention_secs
            < self.monitor.rollup_buckets * self.monitor.bucket_span_secs
        {
            bail!("retention_secs must cover the full rollup window");
        }

        let mut seen = std::collections::HashSet::new();
        for rule in &self.monitor.rules {
            if rule.id.trim().is_empty() {
                bail!("alert rule with empty id");
            }
            if !seen.insert(rule.id.as_str()) {
                bail!("duplicate alert rule id: {}", rule.id);
            }
            if rule.debounce_cycles == 0 {
                bail!("rule {}: debounce_cycles must be at least 1", rule.id);
            }
            if rule.hysteresis_margin < 0.0 {
                bail!("rule {}: hysteresis_margin must be non-negative", rule.id);
            }
        }
        Ok(())
    }
}

/// Default degradation rules; thresholds are operator policy, adjust in
/// config rather than here
fn default_rules() -> Vec<AlertRule> {
    vec![
        AlertRule {
            id: "disagreement-high".to_string(),
            metric: MetricKind::DisagreementRate,
            op: CompareOp::GreaterThan,
            threshold: 0.3,
            min_samples: 10,
            debounce_cycles: 3,
            hysteresis_margin: 0.05,
            priority: 10,
        },
        AlertRule {
            id: "generative-failures-high".to_string(),
            metric: MetricKind::GenerativeFailureRate,
            op: CompareOp::GreaterThan,
            threshold: 0.2,
            min_samples: 10,
            debounce_cycles: 3,
            hysteresis_margin: 0.05,
            priority: 10,
        },
        AlertRule {
            id: "statistical-accuracy-low".to_string(),
            metric: MetricKind::StatisticalAccuracy,
            op: CompareOp::LessThan,
            threshold: 0.7,
            min_samples: 20,
            debounce_cycles: 3,
            hysteresis_margin: 0.05,
            priority: 20,
        },
        AlertRule {
            id: "generative-accuracy-low".to_string(),
            metric: MetricKind::GenerativeAccuracy,
            op: CompareOp::LessThan,
            threshold: 0.7,
            min_samples: 20,
            debounce_cycles: 3,
            hysteresis_margin: 0.05,
            priority: 20,
        },
        AlertRule {
            id: "generative-latency-high".to_string(),
            metric: MetricKind::GenerativeP95LatencyMs,
            op: CompareOp::GreaterThan,
            threshold: 5000.0,
            min_samples: 10,
            debounce_cycles: 3,
            hysteresis_margin: 500.0,
            priority: 30,
        },
    ]
}
