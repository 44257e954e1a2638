use crate::{Stat, StatsExporter};
use ::metrics::{Key, Recorder};

pub const REQUEST_COUNT_SUFFIX: &str = "request_count";
pub const FAILURE_COUNT_SUFFIX: &str = "failure_count";
pub const DURATION_MS_SUFFIX: &str = "duration_ms";

/// Forwards policy metrics into a [`Recorder`] from the `metrics` crate.
///
/// Each monitor gets `<monitor>.request_count` and `<monitor>.failure_count`
/// counters and a `<monitor>.duration_ms` histogram.
pub struct RecorderExporter<R> {
    recorder: R,
}

impl<R: Recorder> RecorderExporter<R> {
    pub fn new(recorder: R) -> Self {
        Self { recorder }
    }

    pub fn recorder(&self) -> &R {
        &self.recorder
    }
}

#[inline]
fn key(monitor_name: &str, suffix: &str) -> Key {
    Key::from_name(format!("{}.{}", monitor_name, suffix))
}

impl<R> StatsExporter for RecorderExporter<R>
where
    R: Recorder + Send + Sync,
{
    fn add_monitor_stats(&self, monitor_name: &str, _timestamp: &str, stat: Stat) {
        match stat {
            Stat::Policy(metric) => {
                self.recorder.increment_counter(
                    &key(monitor_name, REQUEST_COUNT_SUFFIX),
                    metric.request_count,
                );
                self.recorder.increment_counter(
                    &key(monitor_name, FAILURE_COUNT_SUFFIX),
                    metric.failure_count,
                );
                self.recorder.record_histogram(
                    &key(monitor_name, DURATION_MS_SUFFIX),
                    metric.duration_ms as f64,
                );
            }
            other => {
                tracing::trace!(monitor = monitor_name, stat = ?other, "ignoring non-policy stat");
            }
        }
    }
}
