use monitor_stats::{
    FileExporterConfig, JsonFileExporter, OutputRecord, PolicyMetric, Stat, StatsExporter,
};
use std::fs;
use std::path::Path;
use tempfile::TempDir;
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn policy(requests: u64, timestamp: &str) -> Stat {
    Stat::Policy(PolicyMetric {
        request_count: requests,
        failure_count: 0,
        duration_ms: 20,
        timestamp: timestamp.to_string(),
    })
}

fn output_files(dir: &Path) -> Vec<std::path::PathBuf> {
    let mut files: Vec<_> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().path())
        .filter(|p| p.extension().map(|e| e == "json").unwrap_or(false))
        .collect();
    files.sort();
    files
}

fn read_records(dir: &Path) -> Vec<OutputRecord> {
    output_files(dir)
        .iter()
        .flat_map(|path| {
            let text = fs::read_to_string(path).unwrap();
            serde_json::from_str::<Vec<OutputRecord>>(&text)
                .unwrap_or_else(|e| panic!("{} is not a JSON array: {}", path.display(), e))
        })
        .collect()
}

#[test]
fn merges_stats_by_timestamp() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let exporter =
        JsonFileExporter::new(FileExporterConfig::default().with_output_dir(dir.path())).unwrap();

    exporter.add_monitor_stats("retry", "t1", policy(10, "t1"));
    exporter.add_monitor_stats("cpu_profiler", "t1", Stat::CpuUsage("12%".into()));
    exporter.add_monitor_stats("auth", "t1", policy(3, "t1"));
    exporter.add_monitor_stats("retry", "t2", policy(4, "t2"));
    exporter.close();

    let records = read_records(dir.path());
    assert_eq!(records.len(), 2);

    assert_eq!(records[0].timestamp, "t1");
    assert_eq!(records[0].policies["retry"][0].request_count, 10);
    assert_eq!(records[0].policies["auth"][0].request_count, 3);
    assert_eq!(records[0].cpu_usage.as_deref(), Some("12%"));

    assert_eq!(records[1].timestamp, "t2");
    assert_eq!(records[1].policies.len(), 1);
    assert!(records[1].cpu_usage.is_none());
}

#[test]
fn pending_timestamps_are_bounded() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let config = FileExporterConfig {
        max_pending_timestamps: 2,
        ..FileExporterConfig::default().with_output_dir(dir.path())
    };
    let exporter = JsonFileExporter::new(config).unwrap();

    exporter.add_monitor_stats("retry", "t1", policy(1, "t1"));
    exporter.add_monitor_stats("retry", "t2", policy(2, "t2"));
    exporter.add_monitor_stats("retry", "t3", policy(3, "t3"));
    // t1 was written out when t3 arrived, so this opens a new record
    exporter.add_monitor_stats("cpu_profiler", "t1", Stat::CpuUsage("5%".into()));
    exporter.close();

    let timestamps: Vec<_> = read_records(dir.path())
        .into_iter()
        .map(|r| r.timestamp)
        .collect();
    assert_eq!(timestamps, vec!["t1", "t2", "t3", "t1"]);
}

#[test]
fn rotates_and_keeps_newest_files() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let config = FileExporterConfig {
        max_pending_timestamps: 1,
        max_file_size: 1,
        max_files: 2,
        file_prefix: "rotation".to_string(),
        ..FileExporterConfig::default().with_output_dir(dir.path())
    };
    let exporter = JsonFileExporter::new(config).unwrap();

    for i in 1..=5 {
        let ts = format!("t{}", i);
        exporter.add_monitor_stats("retry", &ts, policy(i, &ts));
    }
    exporter.close();

    let files = output_files(dir.path());
    assert_eq!(files.len(), 2);
    for file in &files {
        let name = file.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with(&format!("rotation_{}_", std::process::id())));
    }

    let records = read_records(dir.path());
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].timestamp, "t5");
}

#[test]
fn empty_exporter_writes_empty_array() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let exporter =
        JsonFileExporter::new(FileExporterConfig::default().with_output_dir(dir.path())).unwrap();
    drop(exporter);

    assert_eq!(output_files(dir.path()).len(), 1);
    assert!(read_records(dir.path()).is_empty());
}

#[test]
fn stats_after_close_are_dropped() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let exporter =
        JsonFileExporter::new(FileExporterConfig::default().with_output_dir(dir.path())).unwrap();
    exporter.close();
    exporter.add_monitor_stats("retry", "t1", policy(1, "t1"));
    exporter.close();

    assert!(read_records(dir.path()).is_empty());
}

#[test]
fn creates_missing_output_dir() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let nested = dir.path().join("a").join("b");
    let exporter =
        JsonFileExporter::new(FileExporterConfig::default().with_output_dir(&nested)).unwrap();
    exporter.close();
    assert_eq!(output_files(&nested).len(), 1);
}

#[test]
fn output_dir_that_is_a_file_fails() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let blocker = dir.path().join("blocker");
    fs::write(&blocker, b"not a directory").unwrap();
    let result = JsonFileExporter::new(FileExporterConfig::default().with_output_dir(&blocker));
    assert!(matches!(result, Err(monitor_stats::ExportError::Io(_))));
}
