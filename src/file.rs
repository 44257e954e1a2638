//! Exporter writing stats to rotating JSON files.
//!
//! Stats are queued and handled by a dedicated thread. Stats sharing a
//! timestamp are merged into one [`OutputRecord`]; a bounded number of records
//! is kept in memory and the oldest is written out when a new timestamp shows
//! up. Each file holds a JSON array of records.

use crate::{ExportedStat, FileExporterConfig, PolicyMetric, Result, Stat, StatsExporter};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError, RwLock};
use std::thread::{self, JoinHandle};
use tokio::sync::broadcast::{self, error::RecvError};

/// Largest queue the writer accepts
pub const MAX_CHANNEL_CAPACITY: usize = 1 << 16;

/// Stats of every monitor observed at one timestamp
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputRecord {
    pub timestamp: String,
    /// Every window a policy reported at this timestamp, in arrival order
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub policies: BTreeMap<String, Vec<PolicyMetric>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cpu_usage: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory_usage: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network_usage: Option<String>,
}

impl OutputRecord {
    fn new(timestamp: String) -> Self {
        Self {
            timestamp,
            ..Default::default()
        }
    }

    fn merge(&mut self, monitor_name: String, stat: Stat) {
        match stat {
            Stat::Policy(metric) => {
                self.policies.entry(monitor_name).or_default().push(metric);
            }
            Stat::CpuUsage(v) => self.cpu_usage = Some(v),
            Stat::MemoryUsage(v) => self.memory_usage = Some(v),
            Stat::NetworkUsage(v) => self.network_usage = Some(v),
        }
    }
}

/// Stats exporter persisting everything it receives as JSON.
///
/// [`StatsExporter::add_monitor_stats`] never blocks: when the queue is full
/// the oldest queued stat is dropped.
pub struct JsonFileExporter {
    sender: RwLock<Option<broadcast::Sender<ExportedStat>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl JsonFileExporter {
    /// Opens the first output file and starts the writer thread
    pub fn new(config: FileExporterConfig) -> Result<Self> {
        let capacity = config.channel_capacity.clamp(1, MAX_CHANNEL_CAPACITY);
        if capacity != config.channel_capacity {
            tracing::warn!(
                requested = config.channel_capacity,
                capacity,
                "stats queue capacity out of range, clamped"
            );
        }
        let (sender, receiver) = broadcast::channel(capacity);
        let writer = OutputWriter::new(config)?;
        let worker = thread::Builder::new()
            .name("monitor-stats-writer".to_string())
            .spawn(move || writer.run(receiver))?;

        Ok(Self {
            sender: RwLock::new(Some(sender)),
            worker: Mutex::new(Some(worker)),
        })
    }

    /// Flushes pending records, terminates the current file and stops the
    /// writer thread. Stats added afterwards are dropped.
    pub fn close(&self) {
        // Dropping the only sender lets the writer drain the queue and exit
        self.sender
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        let worker = self
            .worker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(worker) = worker {
            if worker.join().is_err() {
                tracing::error!("stats writer thread panicked");
            }
        }
    }
}

impl Drop for JsonFileExporter {
    fn drop(&mut self) {
        self.close();
    }
}

impl StatsExporter for JsonFileExporter {
    fn add_monitor_stats(&self, monitor_name: &str, timestamp: &str, stat: Stat) {
        let sender = self.sender.read().unwrap_or_else(PoisonError::into_inner);
        match sender.as_ref() {
            Some(sender) => {
                if sender
                    .send(ExportedStat::new(monitor_name, timestamp, stat))
                    .is_err()
                {
                    tracing::warn!(monitor = monitor_name, "stats writer is gone, dropping stat");
                }
            }
            None => tracing::debug!(monitor = monitor_name, "exporter closed, dropping stat"),
        }
    }
}

struct OutputWriter {
    config: FileExporterConfig,
    pid: u32,
    pending: VecDeque<OutputRecord>,
    file: Option<File>,
    records_in_file: usize,
    file_index: u64,
    files: VecDeque<PathBuf>,
}

impl OutputWriter {
    fn new(config: FileExporterConfig) -> Result<Self> {
        fs::create_dir_all(&config.output_dir)?;
        let mut writer = Self {
            config,
            pid: std::process::id(),
            pending: VecDeque::new(),
            file: None,
            records_in_file: 0,
            file_index: 0,
            files: VecDeque::new(),
        };
        writer.open_next_file()?;
        Ok(writer)
    }

    fn run(mut self, mut receiver: broadcast::Receiver<ExportedStat>) {
        loop {
            match receiver.blocking_recv() {
                Ok(stat) => self.add(stat),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "stats queue full, oldest stats dropped");
                }
                Err(RecvError::Closed) => break,
            }
        }
        self.finish();
    }

    fn add(&mut self, stat: ExportedStat) {
        let ExportedStat {
            timestamp,
            monitor_name,
            stat,
        } = stat;

        if let Some(record) = self.pending.iter_mut().find(|r| r.timestamp == timestamp) {
            record.merge(monitor_name, stat);
            return;
        }

        if self.pending.len() >= self.config.max_pending_timestamps.max(1) {
            if let Some(oldest) = self.pending.pop_front() {
                self.write_logged(&oldest);
            }
        }
        let mut record = OutputRecord::new(timestamp);
        record.merge(monitor_name, stat);
        self.pending.push_back(record);
    }

    fn finish(&mut self) {
        while let Some(record) = self.pending.pop_front() {
            self.write_logged(&record);
        }
        if let Err(err) = self.close_file() {
            tracing::error!(error = %err, "unable to terminate stats file");
        }
    }

    fn write_logged(&mut self, record: &OutputRecord) {
        if let Err(err) = self.write_record(record) {
            tracing::error!(error = %err, timestamp = %record.timestamp, "unable to write stats record");
        }
    }

    fn write_record(&mut self, record: &OutputRecord) -> Result<()> {
        if self.file.is_none() {
            self.open_next_file()?;
        }
        let mut buffer = if self.records_in_file > 0 {
            b",\n".to_vec()
        } else {
            Vec::new()
        };
        serde_json::to_writer_pretty(&mut buffer, record)?;
        let file = self.file.as_mut().ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::Other, "no stats file open")
        })?;
        // Separator and record go out together so a failed write cannot leave
        // a dangling comma
        file.write_all(&buffer)?;
        let full = file.metadata()?.len() >= self.config.max_file_size;
        self.records_in_file += 1;

        if full {
            self.close_file()?;
            self.open_next_file()?;
        }
        Ok(())
    }

    fn close_file(&mut self) -> Result<()> {
        if let Some(mut file) = self.file.take() {
            file.write_all(b"\n]")?;
            file.flush()?;
        }
        Ok(())
    }

    /// Opens the next free index; files of other writers sharing the
    /// directory and prefix are skipped, never truncated
    fn open_next_file(&mut self) -> Result<()> {
        let (mut file, path) = loop {
            self.file_index += 1;
            let name = format!(
                "{}_{}_{}.json",
                self.config.file_prefix, self.pid, self.file_index
            );
            let path = self.config.output_dir.join(name);
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(file) => break (file, path),
                Err(err) if err.kind() == std::io::ErrorKind::AlreadyExists => {
                    tracing::debug!(path = %path.display(), "stats file taken, trying next index");
                }
                Err(err) => return Err(err.into()),
            }
        };
        file.write_all(b"[")?;
        tracing::debug!(path = %path.display(), "opened stats file");

        self.file = Some(file);
        self.records_in_file = 0;
        self.files.push_back(path);
        while self.files.len() > self.config.max_files.max(1) {
            if let Some(old) = self.files.pop_front() {
                match fs::remove_file(&old) {
                    Ok(()) => tracing::debug!(path = %old.display(), "deleted stats file"),
                    Err(err) => {
                        tracing::warn!(path = %old.display(), error = %err, "unable to delete stats file")
                    }
                }
            }
        }
        Ok(())
    }
}
