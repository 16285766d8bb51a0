mod cases;
mod command;
mod config;
mod controller;
mod device;
mod testbed;

use anyhow::{Context, Result};
use cases::VerificationCase;
use clap::Parser;
use config::{Cli, JobConfig};
use controller::ExecutionModeController;
use ospf_verify_shared::{
    aggregate_status, ExecutionMode, JobReport, ParameterStore, ResultCollector, ResultStatus,
};
use std::process;
use std::sync::Arc;
use testbed::Testbed;

use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    let config = JobConfig::from(Cli::parse());
    info!("Running in {} mode", config.mode);
    info!("  Testbed: {}", config.testbed_path.display());
    info!("  Parameters: {}", config.parameters_dir.display());

    match run_job(&config).await {
        Ok(ResultStatus::Passed) => info!("Job finished: PASSED"),
        Ok(status) => {
            warn!("Job finished: {}", status);
            process::exit(1);
        }
        Err(e) => {
            error!("Job aborted: {:#}", e);
            process::exit(2);
        }
    }
}

/// Run every configured case against the testbed and fold their statuses
async fn run_job(config: &JobConfig) -> Result<ResultStatus> {
    let testbed = Arc::new(Testbed::load(&config.testbed_path).await?);
    if testbed.is_empty() {
        warn!("Testbed '{}' has no devices", testbed.name());
    } else {
        info!("Testbed '{}' has {} devices", testbed.name(), testbed.len());
    }
    let store = ParameterStore::new(&config.parameters_dir);

    // Common setup
    let setup = ResultCollector::new();
    testbed.connect_all().await;
    testbed.verify_connected(&setup);
    if let Err(e) = store.ensure_dir() {
        testbed.disconnect_all().await;
        return Err(e).context("Failed to create parameters directory");
    }

    let mut statuses = vec![setup.status()];
    for kind in &config.cases {
        let case = kind.case();
        let controller = ExecutionModeController::new(
            testbed.clone(),
            store.clone(),
            Arc::new(ResultCollector::new()),
        );

        let outcome = controller.run(&case, config.mode).await;
        let results = controller.results();
        let status = results.status();
        info!(
            "[{}] {}: {} ({} results)",
            status,
            case.title(),
            outcome.verdict.message,
            results.len()
        );

        if config.mode == ExecutionMode::Testing {
            let report = JobReport::from_collector(
                case.id(),
                case.title(),
                config.mode,
                results,
                outcome.baseline,
            );
            if let Err(e) = report.write_to(&config.results_dir) {
                error!("Failed to write report for {}: {}", case.id(), e);
            }
        }

        statuses.push(status);
    }

    // Common cleanup
    testbed.disconnect_all().await;

    Ok(aggregate_status(statuses))
}
