use std::sync::atomic::{AtomicU64, Ordering};

/// Monotonically increasing total shared between producers
#[derive(Debug, Default)]
pub struct Counter(AtomicU64);

impl Counter {
    pub const fn new() -> Self {
        Self(AtomicU64::new(0))
    }

    #[inline]
    pub fn increment(&self, val: u64) {
        self.0.fetch_add(val, Ordering::AcqRel);
    }

    #[inline]
    pub fn read(&self) -> u64 {
        self.0.load(Ordering::Acquire)
    }
}
