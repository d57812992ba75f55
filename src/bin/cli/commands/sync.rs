use anyhow::{Context, Result};

use cardsmith::sync::SyncReport;

use crate::app::App;
use crate::OutputFormat;

fn print_report(report: &SyncReport, format: &OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(report)?),
        OutputFormat::Plain => {
            println!("Decks:     {} up, {} down", report.decks_uploaded, report.decks_downloaded);
            println!("Templates: {} up, {} down", report.templates_uploaded, report.templates_downloaded);
            if report.failed > 0 {
                println!("{} items failed (run with RUST_LOG=warn for details)", report.failed);
            }
        }
    }
    Ok(())
}

pub fn run_upload(app: &App, format: &OutputFormat) -> Result<()> {
    let report = app.sync_manager()?.upload().context("Sync upload failed")?;
    print_report(&report, format)
}

pub fn run_download(app: &App, format: &OutputFormat) -> Result<()> {
    let report = app.sync_manager()?.download().context("Sync download failed")?;
    print_report(&report, format)
}
