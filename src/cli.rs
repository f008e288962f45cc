//! Command-line interface argument parsing for gym-report-tui.
//!
//! - `gym-report-tui show --report activity`
//! - `gym-report-tui show --api-url http://reports.local:8000`
//! - `gym-report-tui export --report popular-exercises --format csv --out-dir ./reports`

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use log::LevelFilter;

use crate::data::{CsvMode, DuplicatePolicy, ExportFormat, ReportKind};
use crate::logging;

/// Default address of the report service
pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8000";

/// A terminal dashboard for visualizing and exporting gym activity reports.
#[derive(Parser, Debug)]
#[command(name = "gym-report-tui")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Launch the TUI dashboard to visualize reports
    Show {
        #[command(flatten)]
        common: CommonArgs,

        /// Report shown when the dashboard opens
        #[arg(short, long, value_enum, default_value = "activity")]
        report: ReportKind,

        /// Initially selected download format
        #[arg(short, long, value_enum, default_value = "json")]
        format: ExportFormat,
    },

    /// Fetch a report and save it without opening the dashboard
    Export {
        #[command(flatten)]
        common: CommonArgs,

        /// Report to download
        #[arg(short, long, value_enum)]
        report: ReportKind,

        /// Download format
        #[arg(short, long, value_enum, default_value = "json")]
        format: ExportFormat,
    },
}

/// Options shared by every subcommand
#[derive(Args, Debug, Clone)]
pub struct CommonArgs {
    /// Base URL of the report service
    #[arg(long, env = "GYM_REPORT_API_URL", default_value = DEFAULT_API_URL)]
    pub api_url: String,

    /// Where CSV downloads come from: the service, or the fetched records
    #[arg(long, value_enum, default_value = "remote")]
    pub csv_mode: CsvMode,

    /// How duplicate (club, month) records are charted
    #[arg(long, value_enum, default_value = "last-wins")]
    pub duplicates: DuplicatePolicy,

    /// Directory downloads are saved into.
    /// Defaults to the user's download directory
    #[arg(short, long)]
    pub out_dir: Option<PathBuf>,

    /// HTTP timeout in seconds
    #[arg(long, default_value = "30")]
    pub timeout: u64,

    /// Path of the log file.
    /// Defaults to <cache dir>/gym-report-tui/gym-report-tui.log
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    pub log_level: LevelFilter,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}

/// Configuration derived from CLI arguments
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api_url: String,
    pub report: ReportKind,
    pub format: ExportFormat,
    pub csv_mode: CsvMode,
    pub duplicates: DuplicatePolicy,
    pub out_dir: PathBuf,
    pub timeout: Duration,
    pub log_file: PathBuf,
    pub log_level: LevelFilter,
}

impl AppConfig {
    /// Create AppConfig from shared arguments plus the command's report and format
    pub fn from_args(common: CommonArgs, report: ReportKind, format: ExportFormat) -> Self {
        let out_dir = common.out_dir.unwrap_or_else(|| {
            dirs::download_dir().unwrap_or_else(|| PathBuf::from("."))
        });

        AppConfig {
            api_url: common.api_url,
            report,
            format,
            csv_mode: common.csv_mode,
            duplicates: common.duplicates,
            out_dir,
            timeout: Duration::from_secs(common.timeout),
            log_file: common.log_file.unwrap_or_else(logging::default_log_path),
            log_level: common.log_level,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn test_show_defaults() {
        let cli = parse(&["gym-report-tui", "show"]);
        let Commands::Show {
            common,
            report,
            format,
        } = cli.command
        else {
            panic!("expected show");
        };
        let config = AppConfig::from_args(common, report, format);
        assert_eq!(config.report, ReportKind::Activity);
        assert_eq!(config.format, ExportFormat::Json);
        assert_eq!(config.csv_mode, CsvMode::Remote);
        assert_eq!(config.duplicates, DuplicatePolicy::LastWins);
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.log_level, LevelFilter::Info);
        assert!(config.log_file.ends_with("gym-report-tui.log"));
    }

    #[test]
    fn test_export_options() {
        let cli = parse(&[
            "gym-report-tui",
            "export",
            "--report",
            "popular-exercises",
            "--format",
            "csv",
            "--csv-mode",
            "local",
            "--duplicates",
            "sum",
            "--out-dir",
            "/tmp/reports",
            "--api-url",
            "http://reports.local:9000",
        ]);
        let Commands::Export {
            common,
            report,
            format,
        } = cli.command
        else {
            panic!("expected export");
        };
        let config = AppConfig::from_args(common, report, format);
        assert_eq!(config.report, ReportKind::PopularExercises);
        assert_eq!(config.format, ExportFormat::Csv);
        assert_eq!(config.csv_mode, CsvMode::Local);
        assert_eq!(config.duplicates, DuplicatePolicy::Sum);
        assert_eq!(config.out_dir, PathBuf::from("/tmp/reports"));
        assert_eq!(config.api_url, "http://reports.local:9000");
    }

    #[test]
    fn test_export_requires_report() {
        assert!(Cli::try_parse_from(["gym-report-tui", "export"]).is_err());
    }
}
