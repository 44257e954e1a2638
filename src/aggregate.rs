use crate::metrics::{Counter, Histogram, DEFAULT_RETENTION};
use crate::{PolicyMetric, Stat, StatsExporter};
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;

/// Running totals for one monitor
pub struct MonitorStats {
    pub(crate) requests: Counter,
    pub(crate) failures: Counter,
    pub(crate) duration_ms: Histogram,
}

impl MonitorStats {
    fn new(retention: Duration) -> Self {
        Self {
            requests: Counter::new(),
            failures: Counter::new(),
            duration_ms: Histogram::new(retention),
        }
    }

    fn record(&self, metric: &PolicyMetric) {
        self.requests.increment(metric.request_count);
        self.failures.increment(metric.failure_count);
        self.duration_ms.insert(metric.duration_ms as f64);
    }
}

/// Point-in-time copy of a monitor's totals
#[derive(Debug, Clone, PartialEq)]
pub struct MonitorSnapshot {
    pub request_count: u64,
    pub failure_count: u64,
    /// Window durations observed within the retention period
    pub durations_ms: Vec<f64>,
}

/// Exporter keeping per-monitor totals in memory.
///
/// Policy metrics are summed per monitor name. Usage samples only keep the
/// latest value received for each monitor.
pub struct AggregatingExporter {
    monitors: DashMap<String, Arc<MonitorStats>>,
    latest: DashMap<String, Stat>,
    retention: Duration,
}

impl Default for AggregatingExporter {
    fn default() -> Self {
        Self::with_retention(DEFAULT_RETENTION)
    }
}

impl AggregatingExporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep duration samples for `retention` before starting a new window
    pub fn with_retention(retention: Duration) -> Self {
        Self {
            monitors: DashMap::new(),
            latest: DashMap::new(),
            retention,
        }
    }

    /// Names of every monitor that reported a policy metric, sorted
    pub fn monitors(&self) -> Vec<String> {
        let mut names: Vec<String> = self.monitors.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    pub fn snapshot(&self, monitor_name: &str) -> Option<MonitorSnapshot> {
        self.stats(monitor_name).map(|stats| MonitorSnapshot {
            request_count: stats.requests.read(),
            failure_count: stats.failures.read(),
            durations_ms: stats.duration_ms.read(),
        })
    }

    /// Latest non-policy stat reported by `monitor_name`
    pub fn latest(&self, monitor_name: &str) -> Option<Stat> {
        self.latest.get(monitor_name).map(|e| e.value().clone())
    }

    pub(crate) fn stats(&self, monitor_name: &str) -> Option<Arc<MonitorStats>> {
        self.monitors.get(monitor_name).map(|e| e.value().clone())
    }

    /// Latest usage stats, sorted by monitor name
    pub(crate) fn latest_sorted(&self) -> Vec<(String, Stat)> {
        let mut all: Vec<(String, Stat)> = self
            .latest
            .iter()
            .map(|e| (e.key().clone(), e.value().clone()))
            .collect();
        all.sort_by(|a, b| a.0.cmp(&b.0));
        all
    }
}

impl StatsExporter for AggregatingExporter {
    fn add_monitor_stats(&self, monitor_name: &str, _timestamp: &str, stat: Stat) {
        match stat {
            Stat::Policy(metric) => {
                // Clone the Arc so the shard lock is not held while recording
                let stats = self
                    .monitors
                    .entry(monitor_name.to_string())
                    .or_insert_with(|| Arc::new(MonitorStats::new(self.retention)))
                    .value()
                    .clone();
                stats.record(&metric);
            }
            other => {
                self.latest.insert(monitor_name.to_string(), other);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metric(requests: u64, failures: u64, duration_ms: u64) -> Stat {
        Stat::Policy(PolicyMetric {
            request_count: requests,
            failure_count: failures,
            duration_ms,
            timestamp: "t".to_string(),
        })
    }

    #[test]
    fn sums_per_monitor() {
        let exporter = AggregatingExporter::new();
        exporter.add_monitor_stats("retry", "t1", metric(10, 2, 150));
        exporter.add_monitor_stats("retry", "t2", metric(5, 0, 50));
        exporter.add_monitor_stats("auth", "t1", metric(1, 1, 0));

        let retry = exporter.snapshot("retry").unwrap();
        assert_eq!(retry.request_count, 15);
        assert_eq!(retry.failure_count, 2);
        assert_eq!(retry.durations_ms.len(), 2);

        let auth = exporter.snapshot("auth").unwrap();
        assert_eq!(auth.request_count, 1);
        assert_eq!(auth.failure_count, 1);

        assert_eq!(exporter.monitors(), vec!["auth", "retry"]);
    }

    #[test]
    fn sub_second_retention_keeps_durations() {
        let exporter = AggregatingExporter::with_retention(Duration::from_millis(500));
        exporter.add_monitor_stats("retry", "t1", metric(1, 0, 40));
        exporter.add_monitor_stats("retry", "t1", metric(1, 0, 60));
        let mut durations = exporter.snapshot("retry").unwrap().durations_ms;
        durations.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert_eq!(durations, vec![40.0, 60.0]);
    }

    #[test]
    fn usage_keeps_latest() {
        let exporter = AggregatingExporter::new();
        exporter.add_monitor_stats("cpu", "t1", Stat::CpuUsage("10%".into()));
        exporter.add_monitor_stats("cpu", "t2", Stat::CpuUsage("12%".into()));
        assert_eq!(exporter.latest("cpu"), Some(Stat::CpuUsage("12%".into())));
        assert!(exporter.snapshot("cpu").is_none());
        assert!(exporter.monitors().is_empty());
    }

    #[test]
    fn unknown_monitor() {
        let exporter = AggregatingExporter::new();
        assert!(exporter.snapshot("missing").is_none());
        assert!(exporter.latest("missing").is_none());
    }
}
