use crate::Stat;
use std::sync::Arc;

/// Sink for named, timestamped stats.
///
/// Calls are notifications: implementations must return promptly and keep
/// their own failures to themselves.
pub trait StatsExporter<S = Stat>: Send + Sync {
    fn add_monitor_stats(&self, monitor_name: &str, timestamp: &str, stat: S);
}

impl<S, E> StatsExporter<S> for Arc<E>
where
    E: StatsExporter<S> + ?Sized,
{
    #[inline]
    fn add_monitor_stats(&self, monitor_name: &str, timestamp: &str, stat: S) {
        (**self).add_monitor_stats(monitor_name, timestamp, stat)
    }
}
