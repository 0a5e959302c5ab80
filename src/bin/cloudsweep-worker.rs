//! # CloudSweep Worker
//!
//! Reads newline-delimited task envelopes from stdin, dispatches each one, and
//! writes one JSON outcome line per task to stdout. Exits on EOF or Ctrl-C.
//!
//! Concrete cloud connectors are registered by embedding crates; this binary
//! starts with an empty provider registry, so scans and cleanups report
//! `provider not supported` until one is plugged in.

use anyhow::Context;
use cloudsweep_core::config::CloudSweepConfig;
use cloudsweep_core::events::EventPublisher;
use cloudsweep_core::logging::init_structured_logging;
use cloudsweep_core::messaging::{LoggingNotifier, TaskDispatcher, TaskEnvelope};
use cloudsweep_core::orchestration::{CleanupOrchestrator, PolicyApplier, ScanOrchestrator};
use cloudsweep_core::providers::{InMemoryCredentialResolver, ProviderRegistry};
use cloudsweep_core::repository::PgRepository;
use serde_json::json;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = CloudSweepConfig::load().context("failed to load configuration")?;
    init_structured_logging(&config.environment, &config.logging);
    info!(
        version = env!("CARGO_PKG_VERSION"),
        environment = %config.environment,
        "Starting CloudSweep worker"
    );

    let repository = Arc::new(
        PgRepository::connect(&config.database)
            .await
            .context("failed to connect to database")?,
    );
    repository
        .migrate()
        .await
        .context("failed to run database migrations")?;

    let dispatcher = build_dispatcher(&config, repository);
    run(dispatcher).await?;

    info!("Worker exited properly");
    Ok(())
}

fn build_dispatcher(config: &CloudSweepConfig, repository: Arc<PgRepository>) -> TaskDispatcher {
    let registry = Arc::new(ProviderRegistry::empty());
    let events = EventPublisher::from_config(&config.events);
    let credentials = Arc::new(InMemoryCredentialResolver::new());
    let notifier = Arc::new(LoggingNotifier);

    let scans = Arc::new(ScanOrchestrator::with_config(
        registry.clone(),
        repository.clone(),
        repository.clone(),
        events.clone(),
        config.scan.clone(),
    ));
    let cleanup = Arc::new(
        CleanupOrchestrator::with_config(
            registry,
            repository.clone(),
            events.clone(),
            config.cleanup.clone(),
        )
        .with_credential_resolver(credentials.clone()),
    );
    let policies = Arc::new(PolicyApplier::new(
        repository.clone(),
        repository,
        cleanup.clone(),
        notifier.clone(),
        events,
    ));

    TaskDispatcher::new(scans, cleanup, policies, notifier, credentials)
}

async fn run(dispatcher: TaskDispatcher) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();
    info!("Worker started, waiting for tasks...");

    loop {
        let line = tokio::select! {
            line = lines.next_line() => line.context("failed to read from stdin")?,
            _ = tokio::signal::ctrl_c() => {
                info!("Shutting down worker...");
                break;
            }
        };
        let Some(line) = line else {
            info!("Input closed");
            break;
        };
        if line.trim().is_empty() {
            continue;
        }

        let outcome = match serde_json::from_str::<TaskEnvelope>(&line) {
            Ok(envelope) => match dispatcher.dispatch(&envelope).await {
                Ok(result) => json!({
                    "task_id": envelope.id,
                    "task_type": envelope.task_type,
                    "status": "ok",
                    "result": result,
                }),
                Err(e) => {
                    error!(task_id = %envelope.id, error = %e, "Task failed");
                    json!({
                        "task_id": envelope.id,
                        "task_type": envelope.task_type,
                        "status": "error",
                        "error": e.to_string(),
                        "retryable": e.is_transient(),
                    })
                }
            },
            Err(e) => {
                warn!(error = %e, "Discarding malformed task envelope");
                json!({ "status": "error", "error": format!("malformed envelope: {e}"), "retryable": false })
            }
        };

        let mut encoded = serde_json::to_vec(&outcome).context("failed to encode outcome")?;
        encoded.push(b'\n');
        stdout
            .write_all(&encoded)
            .await
            .context("failed to write outcome")?;
        stdout.flush().await.context("failed to flush stdout")?;
    }
    Ok(())
}
