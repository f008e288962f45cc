//! Data layer: report records, the report source, and the pure transforms
//! that turn records into chart series, tables, and downloads.

mod error;
pub mod export;
mod models;
pub mod pivot;
mod source;
pub mod table;

pub use error::ReportError;
pub use export::{CsvMode, DirectoryTarget, SaveTarget, SavedFile};
pub use models::{ChartSeries, ExportFormat, RecordSet, ReportKind, SeriesColor};
pub use pivot::{DuplicatePolicy, HuePicker, PivotOptions};
pub use source::{HttpReportSource, ReportSource};
pub use table::Table;
