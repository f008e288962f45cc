//! File logger for the `log` facade.
//!
//! The dashboard owns the terminal, so log output goes to a file instead of
//! stderr. Lines have the form `seq|timestamp|LEVEL|target|message`.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use anyhow::{Context, Result};
use log::{LevelFilter, Log, Metadata, Record};

/// Logger writing one line per record to a file
pub struct FileLogger {
    file: Mutex<File>,
    level: LevelFilter,
    seq: AtomicU64,
}

impl FileLogger {
    /// Open (append) the log file, creating parent directories as needed
    pub fn open(path: &Path, level: LevelFilter) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create log directory: {parent:?}"))?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("Failed to open log file: {path:?}"))?;
        Ok(FileLogger {
            file: Mutex::new(file),
            level,
            seq: AtomicU64::new(0),
        })
    }

    fn format_line(&self, record: &Record) -> String {
        let seq = self.seq.fetch_add(1, Ordering::SeqCst) + 1;
        format!(
            "{}|{}|{}|{}|{}",
            seq,
            chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f"),
            record.level(),
            record.target(),
            record.args()
        )
    }
}

impl Log for FileLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = self.format_line(record);
        if let Ok(mut file) = self.file.lock() {
            // Nowhere to report a failed log write while the TUI is up
            let _ = writeln!(file, "{line}");
        }
    }

    fn flush(&self) {
        if let Ok(mut file) = self.file.lock() {
            let _ = file.flush();
        }
    }
}

/// Install the file logger as the global `log` backend
pub fn init(path: &Path, level: LevelFilter) -> Result<()> {
    let logger = FileLogger::open(path, level)?;
    log::set_boxed_logger(Box::new(logger)).context("Logger already initialized")?;
    log::set_max_level(level);
    log::info!("gym-report-tui {} started", env!("CARGO_PKG_VERSION"));
    Ok(())
}

/// Default log file location: `<cache dir>/gym-report-tui/gym-report-tui.log`
pub fn default_log_path() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("gym-report-tui")
        .join("gym-report-tui.log")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_logger_writes_enabled_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("test.log");
        let logger = FileLogger::open(&path, LevelFilter::Info).unwrap();

        logger.log(
            &Record::builder()
                .level(log::Level::Info)
                .target("controller")
                .args(format_args!("loaded {} records", 3))
                .build(),
        );
        logger.log(
            &Record::builder()
                .level(log::Level::Debug)
                .target("controller")
                .args(format_args!("hidden"))
                .build(),
        );
        logger.flush();

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 1);
        let fields: Vec<&str> = lines[0].split('|').collect();
        assert_eq!(fields[0], "1");
        assert_eq!(fields[2], "INFO");
        assert_eq!(fields[3], "controller");
        assert_eq!(fields[4], "loaded 3 records");
    }

    #[test]
    fn test_default_log_path_file_name() {
        assert!(default_log_path().ends_with("gym-report-tui/gym-report-tui.log"));
    }
}
