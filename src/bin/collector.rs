//! Entry point for `moniflow-collector`: runs `CollectorAPI` plus its ingest queues and batch
//! flushers. Mirrors `knhk-sidecar`'s `main.rs` startup shape: load config, init telemetry, bind,
//! serve.

use std::sync::Arc;

use moniflow::api::collector::{router, CollectorState};
use moniflow::config::CollectorConfig;
use moniflow::ingest::{BatchConfig, IngestQueues, LoggingSink};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    moniflow::telemetry::init("moniflow-collector");
    let config = CollectorConfig::from_env();

    let (queues, metrics_rx, logs_rx) = IngestQueues::new(1024);
    let queues = Arc::new(queues);
    let state = Arc::new(CollectorState::new(queues));

    let metrics_flusher = tokio::spawn(moniflow::ingest::flusher::run(
        metrics_rx,
        BatchConfig {
            max_batch_size: config.metric_batch_size,
            flush_interval: config.metric_flush_interval,
        },
        LoggingSink { label: "metrics" },
    ));
    let logs_flusher = tokio::spawn(moniflow::ingest::flusher::run(
        logs_rx,
        BatchConfig {
            max_batch_size: config.log_batch_size,
            flush_interval: config.log_flush_interval,
        },
        LoggingSink { label: "logs" },
    ));

    let app = router(state);
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    tracing::info!(address = %config.bind_address, "moniflow-collector listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(moniflow::telemetry::shutdown_signal())
        .await?;

    // `app` (and the `Arc<CollectorState>`/`Arc<IngestQueues>` it held) is dropped above,
    // which closes both ingest channels; the flushers drain whatever is left and exit.
    tracing::info!("moniflow-collector draining ingest queues before exit");
    let _ = metrics_flusher.await;
    let _ = logs_flusher.await;
    Ok(())
}
