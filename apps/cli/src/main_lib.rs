use std::fs;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use capgains_core::{CostBasisService, CostBasisServiceTrait, RunReport, RunRequest};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{Settings, ENV_LOG_FORMAT};

/// Logs go to stderr so the report on stdout stays machine-readable.
pub fn init_tracing() {
    let log_format = std::env::var(ENV_LOG_FORMAT).unwrap_or_else(|_| "text".to_string());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    if log_format.eq_ignore_ascii_case("json") {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_line_number(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

pub fn load_request(path: &Path) -> Result<RunRequest> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read run request {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse run request {}", path.display()))
}

/// Loads the request, settles it and returns the report.
pub fn run_report(input: &Path, settings: &Settings) -> Result<RunReport> {
    let request = load_request(input)?;
    let config = settings.engine_config(request.reporting_currency.as_deref())?;
    tracing::info!(
        "Reporting in {} (max {} conversion attempts, {}-day rate alias window)",
        config.reporting_currency,
        config.max_conversion_attempts,
        config.alias_window_days
    );

    let service = CostBasisService::new(config);
    let report = service.run(request).context("Cost-basis run failed")?;
    Ok(report)
}

/// Writes the report as JSON to `output`, or stdout when `None`.
pub fn write_report(report: &RunReport, output: Option<&Path>, pretty: bool) -> Result<()> {
    let json = if pretty {
        serde_json::to_string_pretty(report)?
    } else {
        serde_json::to_string(report)?
    };

    match output {
        Some(path) => fs::write(path, json + "\n")
            .with_context(|| format!("Failed to write report to {}", path.display()))?,
        None => {
            let mut stdout = std::io::stdout().lock();
            writeln!(stdout, "{}", json).context("Failed to write report to stdout")?;
        }
    }
    Ok(())
}
