mod config;
mod main_lib;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use config::Settings;
use main_lib::{init_tracing, run_report, write_report};

/// Exit status when the report was written but contains error diagnostics.
const EXIT_REPORT_HAS_ERRORS: u8 = 2;

#[derive(Parser)]
#[command(name = "capgains")]
#[command(about = "FIFO cost basis and realized gains for one tax year", long_about = None)]
struct Cli {
    /// Run request (JSON): owner, taxYear, operations, exchangeRates, sources
    input: PathBuf,

    /// Reporting currency (overrides CAPGAINS_REPORTING_CURRENCY and the request)
    #[arg(long)]
    reporting_currency: Option<String>,

    /// Maximum conversions tried for a single sale
    #[arg(long)]
    max_conversion_attempts: Option<u32>,

    /// Days a missing rate may borrow the nearest publication from
    #[arg(long)]
    alias_window_days: Option<i64>,

    /// Write the report here instead of stdout
    #[arg(long, short)]
    output: Option<PathBuf>,

    /// Pretty-print the JSON report
    #[arg(long, default_value_t = false)]
    pretty: bool,

    /// Exit with status 0 even when the report has error diagnostics
    #[arg(long, default_value_t = false)]
    allow_errors: bool,
}

fn main() -> Result<ExitCode> {
    // Local .env is optional
    let _ = dotenvy::dotenv();
    init_tracing();

    let cli = Cli::parse();
    let flags = Settings {
        reporting_currency: cli.reporting_currency.clone(),
        max_conversion_attempts: cli.max_conversion_attempts,
        alias_window_days: cli.alias_window_days,
    };
    let settings = Settings::from_env()?.overridden_by(flags);

    let report = run_report(&cli.input, &settings)?;
    write_report(&report, cli.output.as_deref(), cli.pretty)?;

    if report.had_error {
        tracing::warn!(
            "Report for {} ({}) has {} diagnostics, some of them errors",
            report.owner,
            report.tax_year,
            report.diagnostics.len()
        );
        if !cli.allow_errors {
            return Ok(ExitCode::from(EXIT_REPORT_HAS_ERRORS));
        }
    }
    Ok(ExitCode::SUCCESS)
}
