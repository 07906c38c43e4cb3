mod cli;
mod config;
mod cost;
mod dataproc;
mod error;
mod estimator;
mod history;
mod pricing;
mod report;

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Command};
use config::CostConfig;
use pricing::PriceTable;
use report::Report;

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(cli: &Cli, report: &Report) -> Result<ExitCode> {
    let mut config =
        CostConfig::load(cli.config.as_deref()).context("failed to load configuration")?;
    config.apply_overrides(cli.overrides());

    let result = match &cli.command {
        Command::Prices => {
            let prices = PriceTable::load(&config.price_list).with_context(|| {
                format!("failed to load price list {}", config.price_list.display())
            })?;
            println!("{}", report.render_prices(&prices));
            return Ok(ExitCode::SUCCESS);
        }
        Command::LastJob => estimator::get_cost_for_last_job(&config).await?,
        Command::Job { job_id } => estimator::get_cost_for_job(&config, job_id).await?,
    };

    match result {
        Some(result) => {
            println!("{}", report.render_cost(&result));
            Ok(ExitCode::SUCCESS)
        }
        None => {
            eprintln!("{}", report.render_unavailable());
            Ok(ExitCode::FAILURE)
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let report = Report::new(cli.json);

    match run(&cli, &report).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}", report.render_error(&format!("{e:#}")));
            ExitCode::FAILURE
        }
    }
}
