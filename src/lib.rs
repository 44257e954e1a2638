//! Hand-off point between code producing monitor stats and whichever
//! exporter the host application installs.
//!
//! Producers look up the exporter through an [`ExporterRegistry`], either one
//! injected at wiring time or the process-wide one behind
//! [`register_exporter`] and [`registered_exporter`]. No exporter installed is
//! a normal state: reporting is then skipped.

mod aggregate;
mod config;
mod error;
mod exporter;
mod file;
mod metrics;
mod recorder;
mod registry;
mod stat;

#[cfg(feature = "prometheus")]
pub mod prometheus;

/// Export stat shapes
pub use crate::stat::{ExportedStat, PolicyMetric, Stat};
/// Export metrics types
pub use crate::metrics::{Counter, Histogram, DEFAULT_RETENTION};
/// Re-export metrics crate
pub use ::metrics as facade;

pub use aggregate::{AggregatingExporter, MonitorSnapshot};
pub use config::FileExporterConfig;
pub use error::{ExportError, Result};
pub use exporter::StatsExporter;
pub use file::{JsonFileExporter, OutputRecord};
pub use recorder::RecorderExporter;
pub use registry::{global, register_exporter, registered_exporter, ExporterRegistry, SharedExporter};
