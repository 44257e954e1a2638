//! Prometheus text exposition of an [`AggregatingExporter`].

use crate::metrics::{Counter, Histogram};
use crate::prometheus::utils::{label, write_metric_line, write_type_line};
use crate::{AggregatingExporter, Stat};
use metrics_util::Summary;
use std::sync::Arc;

mod server;
mod utils;

pub use server::Server;

const QUANTILES: [f64; 4] = [0.0, 0.5, 0.9, 0.99];

pub const REQUEST_COUNT: &str = "monitor_request_count";
pub const FAILURE_COUNT: &str = "monitor_failure_count";
pub const DURATION_MS: &str = "monitor_duration_ms";
pub const USAGE_INFO: &str = "monitor_usage_info";

/// Renders a full exposition page
pub trait StringRender {
    fn render(&self, s: &mut String);
}

impl<T: StringRender + ?Sized> StringRender for Arc<T> {
    fn render(&self, s: &mut String) {
        (**self).render(s)
    }
}

/// Renders the sample lines of a single metric
pub trait Render {
    fn render(&self, name: &str, labels: &[String], s: &mut String);
}

impl Render for Counter {
    fn render(&self, name: &str, labels: &[String], s: &mut String) {
        write_metric_line::<&str, u64>(s, name, None, labels, None, self.read());
    }
}

impl Render for Histogram {
    fn render(&self, name: &str, labels: &[String], s: &mut String) {
        let mut summary = Summary::with_defaults();
        let samples = self.read();
        let mut sum = 0.0;
        let count = samples.len();
        for sample in samples {
            summary.add(sample);
            sum += sample;
        }
        for q in QUANTILES {
            let value = summary.quantile(q).unwrap_or(0.0);
            write_metric_line(s, name, None, labels, Some(("quantile", q)), value);
        }
        write_metric_line::<&str, f64>(s, name, Some("sum"), labels, None, sum);
        write_metric_line::<&str, u64>(s, name, Some("count"), labels, None, count as u64);
    }
}

impl StringRender for AggregatingExporter {
    fn render(&self, s: &mut String) {
        let monitors: Vec<_> = self
            .monitors()
            .into_iter()
            .filter_map(|name| {
                let stats = self.stats(&name)?;
                Some((vec![label("monitor", &name)], stats))
            })
            .collect();

        write_type_line(s, REQUEST_COUNT, "counter");
        for (labels, stats) in &monitors {
            stats.requests.render(REQUEST_COUNT, labels, s);
        }
        s.push('\n');

        write_type_line(s, FAILURE_COUNT, "counter");
        for (labels, stats) in &monitors {
            stats.failures.render(FAILURE_COUNT, labels, s);
        }
        s.push('\n');

        write_type_line(s, DURATION_MS, "summary");
        for (labels, stats) in &monitors {
            stats.duration_ms.render(DURATION_MS, labels, s);
        }
        s.push('\n');

        let latest = self.latest_sorted();
        if !latest.is_empty() {
            write_type_line(s, USAGE_INFO, "gauge");
            for (monitor, stat) in latest {
                let (kind, value) = match &stat {
                    Stat::CpuUsage(v) => ("cpu_usage", v),
                    Stat::MemoryUsage(v) => ("memory_usage", v),
                    Stat::NetworkUsage(v) => ("network_usage", v),
                    Stat::Policy(_) => continue,
                };
                let labels = [
                    label("monitor", &monitor),
                    label("kind", kind),
                    label("value", value),
                ];
                write_metric_line::<&str, u8>(s, USAGE_INFO, None, &labels, None, 1);
            }
            s.push('\n');
        }
    }
}
