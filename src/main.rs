//! Fraud Scoring Pipeline - Main Entry Point
//!
//! Scores a CSV file (or a single JSON-encoded manual entry) and logs the job
//! report, the first page of flagged transactions and the final status.
//!
//! Usage:
//!   fraud-scoring-pipeline <transactions.csv>
//!   fraud-scoring-pipeline --manual '{"time": 3600, "amount": 1500.0}'

use anyhow::{bail, Context, Result};
use fraud_scoring_pipeline::{
    config::AppConfig, BulkSource, JobController, ManualEntry, OutcomeFilter,
};
use std::path::Path;
use tracing::{error, info, warn};

const DEFAULT_CONFIG_PATH: &str = "config/config.toml";

fn init_logging(config: &AppConfig) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().or_else(|_| {
        tracing_subscriber::EnvFilter::try_new(format!(
            "fraud_scoring_pipeline={}",
            config.logging.level
        ))
    })?;

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if config.logging.format == "json" {
        builder.json().init();
    } else {
        builder.init();
    }
    Ok(())
}

fn load_config() -> Result<AppConfig> {
    let path = std::env::var("FRAUD_SCORING_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.into());
    if Path::new(&path).exists() {
        AppConfig::load_from_path(&path)
    } else {
        Ok(AppConfig::default())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = load_config()?;
    init_logging(&config)?;

    info!("Starting Fraud Scoring Pipeline");
    info!(
        "Detection threshold: {:.2}, Risk levels: low<{:.2}, medium<{:.2}, high<{:.2}",
        config.classifier.threshold,
        config.classifier.risk_levels.medium,
        config.classifier.risk_levels.high,
        config.classifier.risk_levels.critical
    );

    let args: Vec<String> = std::env::args().skip(1).collect();
    let controller = JobController::from_config(&config);

    let ticket = match args.as_slice() {
        [flag, json] if flag == "--manual" => {
            let entry = ManualEntry::from_json(json)?;
            controller.submit_manual(entry)?
        }
        [path] => {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path))?;
            let name = Path::new(path)
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.clone());
            controller.submit_bulk(BulkSource::new(name, contents))?
        }
        _ => bail!("usage: fraud-scoring-pipeline <file.csv> | --manual '<json>'"),
    };

    info!(job_id = %ticket.job_id(), "Job submitted, waiting for results");

    match ticket.wait().await {
        Ok(job) => {
            job.log_report();

            let flagged = job
                .store
                .filter_and_page(&OutcomeFilter::Fraud, 1, config.pipeline.page_size);
            info!(
                "Flagged transactions (page {}/{}, {} total):",
                flagged.page_index, flagged.total_pages, flagged.total_items
            );
            for result in &flagged.items {
                info!(
                    sequence = result.sequence(),
                    amount = result.transaction().amount(),
                    confidence = format!("{:.4}", result.confidence()),
                    risk_level = ?result.risk_level(),
                    "Flagged"
                );
            }
            if flagged.total_pages > 1 {
                warn!("{} more page(s) not shown", flagged.total_pages - 1);
            }
        }
        Err(e) => {
            error!(kind = ?e.kind(), error = %e, "Job failed");
        }
    }

    let status = controller.status();
    info!(
        state = %status.state,
        message = status.message.as_deref().unwrap_or("-"),
        "Final status"
    );

    Ok(())
}
