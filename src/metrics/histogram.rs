use metrics_util::AtomicBucket;
use once_cell::sync::OnceCell;
use std::convert::TryFrom;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime};

pub const DEFAULT_RETENTION: Duration = Duration::from_secs(60);

/// Samples observed within the current retention window.
///
/// Once the window has elapsed the next access discards every sample and
/// starts a new window.
pub struct Histogram {
    bucket: OnceCell<AtomicBucket<f64>>,
    /// Milliseconds since the epoch
    window_start: AtomicU64,
    retention: Duration,
}

impl Default for Histogram {
    fn default() -> Self {
        Self::new(DEFAULT_RETENTION)
    }
}

impl Histogram {
    pub fn new(retention: Duration) -> Self {
        Self {
            bucket: OnceCell::new(),
            window_start: AtomicU64::new(now_millis()),
            retention,
        }
    }

    /// Adds a sample to the [`Histogram`]
    #[inline]
    pub fn insert(&self, val: f64) {
        self.clear_if_expired();
        self.bucket.get_or_init(AtomicBucket::new).push(val)
    }

    /// Samples of the current window
    #[inline]
    pub fn read(&self) -> Vec<f64> {
        self.clear_if_expired();
        self.bucket.get_or_init(AtomicBucket::new).data()
    }

    fn clear_if_expired(&self) {
        let started = self.window_start.load(Ordering::Acquire);
        let now = now_millis();
        let retention = u64::try_from(self.retention.as_millis()).unwrap_or(u64::MAX);
        if now.saturating_sub(started) < retention {
            return;
        }
        // Only the thread winning the exchange clears
        if self
            .window_start
            .compare_exchange(started, now, Ordering::AcqRel, Ordering::Relaxed)
            .is_ok()
        {
            if let Some(bucket) = self.bucket.get() {
                bucket.clear();
            }
        }
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .ok()
        .and_then(|d| u64::try_from(d.as_millis()).ok())
        .unwrap_or(0)
}
