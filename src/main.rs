use anyhow::{Context, Result};
use clap::Parser;
use class_lister::bytecode::{BytecodeResolver, VersionFieldResolver};
use class_lister::cli::{Cli, OutputFormat};
use class_lister::config::{LOG_ENV, ListConfig};
use class_lister::pipeline::{self, Outcome, Report};
use class_lister::record::ClassRecord;
use std::path::Path;
use std::process::ExitCode;

/// Exit status for a run that finished without records to show.
const EMPTY_RESULT_EXIT: u8 = 3;

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let config = ListConfig::from_cli(&cli);
    init_tracing(config.log_level())?;

    tracing::info!(
        "{} started - Version {}",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION")
    );

    let bytecode = BytecodeResolver::new();
    let resolver: Option<&dyn VersionFieldResolver> = if config.serial_version_uid {
        Some(&bytecode)
    } else {
        None
    };

    let report = pipeline::run(&config.request, resolver)?;
    let code = match &report.outcome {
        Outcome::Records(_) => ExitCode::SUCCESS,
        Outcome::Empty(_) => ExitCode::from(EMPTY_RESULT_EXIT),
    };
    write_report(&report, config.format, config.output.as_deref())?;

    tracing::info!(
        archives = report.archives,
        scanned = report.scanned,
        filtered = report.filtered,
        "{} ended (Elapsed time {} ms)",
        env!("CARGO_PKG_NAME"),
        report.duration_ms
    );
    Ok(code)
}

fn init_tracing(level: &str) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|error| anyhow::anyhow!("failed to initialize tracing subscriber: {error}"))?;

    Ok(())
}

fn render(report: &Report, format: OutputFormat) -> Result<String> {
    let records: &[ClassRecord] = match &report.outcome {
        Outcome::Records(records) => records,
        Outcome::Empty(reason) => return Ok(format!("{}\n", reason.notice())),
    };

    let content = match format {
        OutputFormat::Text => {
            let mut out = String::new();
            for record in records {
                out.push_str(&record.line());
                out.push('\n');
            }
            out
        }
        OutputFormat::Json => {
            let mut out = serde_json::to_string_pretty(records)?;
            out.push('\n');
            out
        }
    };
    Ok(content)
}

fn write_report(report: &Report, format: OutputFormat, output: Option<&Path>) -> Result<()> {
    let content = render(report, format)?;

    if let Some(path) = output {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write report: {}", path.display()))?;
    } else {
        print!("{content}");
    }

    Ok(())
}
