use crate::{Stat, StatsExporter};
use once_cell::sync::Lazy;
use std::sync::{Arc, PoisonError, RwLock};

/// Handle to an installed exporter
pub type SharedExporter<S = Stat> = Arc<dyn StatsExporter<S>>;

/// Single slot holding the exporter metric producers should report to.
///
/// The slot starts empty and every [`ExporterRegistry::register`] replaces its
/// content. An empty slot is a normal state: producers skip reporting.
pub struct ExporterRegistry<S = Stat> {
    slot: RwLock<Option<SharedExporter<S>>>,
}

impl<S> Default for ExporterRegistry<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> ExporterRegistry<S> {
    pub fn new() -> Self {
        Self {
            slot: RwLock::new(None),
        }
    }

    /// Installs `exporter`, replacing any previous one
    pub fn register(&self, exporter: SharedExporter<S>) {
        let previous = self
            .slot
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(exporter);
        if previous.is_some() {
            tracing::debug!("replaced registered stats exporter");
        } else {
            tracing::debug!("registered stats exporter");
        }
    }

    /// Currently installed exporter, if any
    pub fn registered(&self) -> Option<SharedExporter<S>> {
        self.slot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn is_registered(&self) -> bool {
        self.slot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Forwards a stat to the installed exporter.
    ///
    /// Returns `false` when no exporter is installed; the stat is dropped.
    pub fn add_monitor_stats(&self, monitor_name: &str, timestamp: &str, stat: S) -> bool {
        // Release the lock before calling out
        match self.registered() {
            Some(exporter) => {
                exporter.add_monitor_stats(monitor_name, timestamp, stat);
                true
            }
            None => {
                tracing::trace!(monitor = monitor_name, "no stats exporter registered");
                false
            }
        }
    }
}

static DEFAULT_REGISTRY: Lazy<ExporterRegistry> = Lazy::new(ExporterRegistry::new);

/// Process-wide registry for code that cannot have one injected
pub fn global() -> &'static ExporterRegistry {
    &DEFAULT_REGISTRY
}

/// Installs `exporter` in the process-wide registry
pub fn register_exporter(exporter: SharedExporter) {
    DEFAULT_REGISTRY.register(exporter)
}

/// Exporter installed in the process-wide registry, if any
pub fn registered_exporter() -> Option<SharedExporter> {
    DEFAULT_REGISTRY.registered()
}
