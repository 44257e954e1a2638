use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Settings for [`JsonFileExporter`](crate::JsonFileExporter).
///
/// Every field has a default so hosts can embed this in their own config
/// files and only override what they need.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileExporterConfig {
    /// Directory receiving the output files; created when missing
    pub output_dir: PathBuf,
    /// Files are named `{file_prefix}_{pid}_{index}.json`
    pub file_prefix: String,
    /// Queued stats before the oldest ones are dropped
    pub channel_capacity: usize,
    /// Timestamps merged in memory before the oldest is written out
    pub max_pending_timestamps: usize,
    /// Size in bytes after which a new file is started
    pub max_file_size: u64,
    /// Output files kept on disk
    pub max_files: usize,
}

impl Default for FileExporterConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            file_prefix: "monitor_stats".to_string(),
            channel_capacity: 10_000,
            max_pending_timestamps: 4,
            max_file_size: 10 * 1024 * 1024,
            max_files: 10,
        }
    }
}

impl FileExporterConfig {
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_uses_defaults() {
        let config: FileExporterConfig =
            serde_json::from_str(r#"{"output_dir":"/tmp/stats","max_files":3}"#).unwrap();
        assert_eq!(config.output_dir, PathBuf::from("/tmp/stats"));
        assert_eq!(config.max_files, 3);
        assert_eq!(config.max_pending_timestamps, 4);
        assert_eq!(config.max_file_size, 10 * 1024 * 1024);
        assert_eq!(config.channel_capacity, 10_000);
    }
}
