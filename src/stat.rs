use serde::{Deserialize, Serialize};

/// One observation window of an HTTP transport policy
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyMetric {
    pub request_count: u64,
    pub failure_count: u64,
    pub duration_ms: u64,
    /// Caller-defined format, carried as-is
    pub timestamp: String,
}

/// Payloads known to the bundled exporters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Stat {
    Policy(PolicyMetric),
    CpuUsage(String),
    MemoryUsage(String),
    NetworkUsage(String),
}

impl From<PolicyMetric> for Stat {
    fn from(metric: PolicyMetric) -> Self {
        Stat::Policy(metric)
    }
}

/// A stat tagged with its origin and observation time.
///
/// The payload is never inspected or transformed by the envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportedStat<S = Stat> {
    pub timestamp: String,
    pub monitor_name: String,
    pub stat: S,
}

impl<S> ExportedStat<S> {
    pub fn new(monitor_name: impl Into<String>, timestamp: impl Into<String>, stat: S) -> Self {
        Self {
            timestamp: timestamp.into(),
            monitor_name: monitor_name.into(),
            stat,
        }
    }
}
