//! CLI listing the most active users of a bike-sharing system.

use anyhow::{Context, Result};
use bizi::{Config, Report, aggregator::aggregate_file, config::DEFAULT_LOG_FILTER};
use clap::Parser;
use env_logger::Env;
use log::info;
use rustyline::DefaultEditor;
use std::{fs::File, path::PathBuf};

const PROMPT: &str = "Enter the name of a bike usage file: ";

/// Ask for the name of a usage log and resolve it in the data directory.
fn prompt_for_file(config: &Config) -> Result<PathBuf> {
    let mut editor = DefaultEditor::new().context("failed to start the prompt")?;
    let name = editor
        .readline(PROMPT)
        .context("no usage file name was entered")?;
    Ok(config.data_file(&name))
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or(DEFAULT_LOG_FILTER))
        .format_target(false)
        .format_timestamp(None)
        .init();
    let config = Config::parse();

    let path = match &config.file {
        Some(path) => path.clone(),
        None => prompt_for_file(&config)?,
    };
    info!("reading usage data from {}", path.display());

    let aggregation = aggregate_file(&path, &config.parse_options(), config.registry)
        .with_context(|| format!("failed to aggregate usage data from {}", path.display()))?;
    info!(
        "selecting the top {} of {} users ({} events)",
        config.top,
        aggregation.distinct_users(),
        aggregation.events
    );

    let report = Report::new(aggregation.records, config.top);
    print!("{report}");

    if let Some(csv_file) = &config.output_csv {
        let file = File::create(csv_file)
            .with_context(|| format!("failed to open {} for writing", csv_file.display()))?;
        report
            .write_csv(file)
            .with_context(|| format!("failed to write the report to {}", csv_file.display()))?;
        info!("report stored in {}", csv_file.display());
    }

    Ok(())
}
