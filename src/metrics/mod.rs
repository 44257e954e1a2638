mod counter;
mod histogram;

pub use counter::Counter;
pub use histogram::{Histogram, DEFAULT_RETENTION};
