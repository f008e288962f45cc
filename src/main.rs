//! gym-report-tui: a terminal dashboard for gym reports
//!
//! Fetches ad-hoc reports from the report service, shows them as a grouped
//! bar chart and a data table, and downloads them as JSON or CSV.

mod app;
mod cli;
mod controller;
mod data;
mod logging;
mod ui;

use anyhow::Result;
use cli::{AppConfig, Cli, Commands};

fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse_args();

    match cli.command {
        Commands::Show {
            common,
            report,
            format,
        } => {
            let config = AppConfig::from_args(common, report, format);
            logging::init(&config.log_file, config.log_level)?;

            // Run the TUI application
            app::run(config)?;
        }
        Commands::Export {
            common,
            report,
            format,
        } => {
            let config = AppConfig::from_args(common, report, format);
            logging::init(&config.log_file, config.log_level)?;

            let saved = app::run_export(config)?;
            println!("{}", saved.path.display());
        }
    }

    Ok(())
}
