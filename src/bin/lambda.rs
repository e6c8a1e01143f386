//! AWS Lambda entry point for waitlog
//!
//! Deploy with `cargo lambda build --release --features lambda`. Schedule it
//! with an EventBridge rule; the event payload is ignored. Settings are read
//! from the file named by `WAITLOG_CONFIG` (default `waitlog.toml`); the
//! year mapping and credentials come from the environment.

use chrono::Local;
use lambda_runtime::{Error as LambdaError, LambdaEvent, service_fn};
use serde_json::{Value, json};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use waitlog::{
    models::Config,
    pipeline::{self, DefaultBackends, RunFailure},
};

const CONFIG_ENV: &str = "WAITLOG_CONFIG";
const DEFAULT_CONFIG: &str = "waitlog.toml";

/// Main entry point for the AWS Lambda function.
#[tokio::main]
async fn main() -> Result<(), LambdaError> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    info!("waitlog Lambda starting...");
    lambda_runtime::run(service_fn(handler)).await
}

/// Handler for scheduled invocations.
async fn handler(event: LambdaEvent<Value>) -> Result<Value, LambdaError> {
    info!("Received event: {:?}", event.payload);

    match run_lambda_pipeline().await {
        Ok(summary) => {
            info!("{}", summary);
            Ok(json!({
                "status": "success",
                "year": summary.target.year,
                "ledger_id": summary.target.ledger_id,
                "rows_written": summary.write.rows_written,
            }))
        }
        Err(failure) => {
            error!("{}", failure);
            Ok(json!({
                "status": "error",
                "stage": failure.state.as_str(),
                "category": failure.cause.category(),
                "message": failure.to_string(),
            }))
        }
    }
}

async fn run_lambda_pipeline() -> Result<pipeline::RunSummary, RunFailure> {
    let config = match std::env::var(CONFIG_ENV) {
        Ok(path) => Config::load_or_default(&path),
        Err(_) => Config::load_or_default(DEFAULT_CONFIG),
    };

    let now = Local::now().fixed_offset();
    pipeline::run_once(
        &config,
        |key: &str| std::env::var(key).ok(),
        &DefaultBackends,
        now,
    )
    .await
}
