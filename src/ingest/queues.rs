//! Bounded ingestion queues feeding `CollectorAPI`'s durable-write path (spec §4.F).
//!
//! Each queue is a `tokio::mpsc` pair; producers never block past a short timeout, so a
//! saturated queue degrades to `StorageUnavailable` (503) instead of stalling the request.

use std::time::Duration;
use tokio::sync::mpsc;

use crate::error::MoniflowError;
use crate::model::{ValidatedLogEvent, ValidatedMetricSample};

const SEND_TIMEOUT: Duration = Duration::from_millis(500);

pub struct IngestQueues {
    metrics_tx: mpsc::Sender<ValidatedMetricSample>,
    logs_tx: mpsc::Sender<ValidatedLogEvent>,
}

impl IngestQueues {
    pub fn new(
        capacity: usize,
    ) -> (Self, mpsc::Receiver<ValidatedMetricSample>, mpsc::Receiver<ValidatedLogEvent>) {
        let (metrics_tx, metrics_rx) = mpsc::channel(capacity);
        let (logs_tx, logs_rx) = mpsc::channel(capacity);
        (
            Self {
                metrics_tx,
                logs_tx,
            },
            metrics_rx,
            logs_rx,
        )
    }

    pub async fn submit_metric(&self, sample: ValidatedMetricSample) -> Result<(), MoniflowError> {
        tokio::time::timeout(SEND_TIMEOUT, self.metrics_tx.send(sample))
            .await
            .map_err(|_| MoniflowError::StorageUnavailable("metric ingest queue is full".to_string()))?
            .map_err(|_| MoniflowError::StorageUnavailable("metric ingest queue is closed".to_string()))
    }

    pub async fn submit_log(&self, event: ValidatedLogEvent) -> Result<(), MoniflowError> {
        tokio::time::timeout(SEND_TIMEOUT, self.logs_tx.send(event))
            .await
            .map_err(|_| MoniflowError::StorageUnavailable("log ingest queue is full".to_string()))?
            .map_err(|_| MoniflowError::StorageUnavailable("log ingest queue is closed".to_string()))
    }
}
