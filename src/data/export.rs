//! Report downloads in JSON or CSV form.

use std::fs;
use std::io::Write;
use std::path::PathBuf;

use clap::ValueEnum;
use tempfile::NamedTempFile;

use super::error::ReportError;
use super::models::{display_value, ExportFormat, RecordSet, ReportKind};
use super::source::ReportSource;

/// Where CSV downloads come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum CsvMode {
    /// Fetch CSV bytes from the report source, unmodified
    #[default]
    Remote,
    /// Write CSV from the records already held
    Local,
}

/// Capability to store named bytes somewhere the user can get them
pub trait SaveTarget: Send + Sync {
    fn save(&self, filename: &str, bytes: &[u8]) -> Result<PathBuf, ReportError>;
}

/// Saves downloads into a directory
#[derive(Debug, Clone)]
pub struct DirectoryTarget {
    dir: PathBuf,
}

impl DirectoryTarget {
    pub fn new(dir: PathBuf) -> Self {
        DirectoryTarget { dir }
    }
}

impl SaveTarget for DirectoryTarget {
    fn save(&self, filename: &str, bytes: &[u8]) -> Result<PathBuf, ReportError> {
        let path = self.dir.join(filename);
        let save_err = |source: std::io::Error| ReportError::Save {
            path: path.clone(),
            source,
        };

        fs::create_dir_all(&self.dir).map_err(save_err)?;

        // Each save gets its own temp file beside the target; it is removed on
        // drop unless persisted, so the final name never holds a partial write
        let mut partial = NamedTempFile::new_in(&self.dir).map_err(save_err)?;
        partial.write_all(bytes).map_err(save_err)?;
        partial.as_file().sync_all().map_err(save_err)?;
        partial.persist(&path).map_err(|e| save_err(e.error))?;

        log::info!("Saved {} bytes to {path:?}", bytes.len());
        Ok(path)
    }
}

/// A completed download
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedFile {
    pub filename: String,
    pub path: PathBuf,
    pub bytes: usize,
}

/// Download filename, e.g. `activity.csv`
pub fn filename(kind: ReportKind, format: ExportFormat) -> String {
    format!("{}.{}", kind.as_str(), format.extension())
}

/// Pretty-printed JSON of the held records
pub fn encode_json(records: &RecordSet) -> Result<Vec<u8>, ReportError> {
    Ok(serde_json::to_vec_pretty(records)?)
}

/// CSV of the held records, using the first record's keys as the header row
pub fn encode_csv(records: &RecordSet) -> Result<Vec<u8>, ReportError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    if let Some(first) = records.first() {
        let keys: Vec<&String> = first.keys().collect();
        writer.write_record(&keys)?;
        for record in records {
            writer.write_record(keys.iter().map(|k| display_value(record.get(k.as_str()))))?;
        }
    }
    writer
        .into_inner()
        .map_err(|e| ReportError::Decode(e.to_string()))
}

/// Produce the download bytes for `format` and hand them to `target`.
///
/// JSON always comes from the held records. CSV is fetched fresh from
/// `source` unless `csv_mode` is [`CsvMode::Local`].
pub fn export(
    records: &RecordSet,
    kind: ReportKind,
    format: ExportFormat,
    csv_mode: CsvMode,
    source: &dyn ReportSource,
    target: &dyn SaveTarget,
) -> Result<SavedFile, ReportError> {
    let bytes = match (format, csv_mode) {
        (ExportFormat::Json, _) => encode_json(records)?,
        (ExportFormat::Csv, CsvMode::Local) => encode_csv(records)?,
        (ExportFormat::Csv, CsvMode::Remote) => source.fetch_csv(kind)?,
    };

    let filename = filename(kind, format);
    let path = target.save(&filename, &bytes)?;
    Ok(SavedFile {
        filename,
        path,
        bytes: bytes.len(),
    })
}
