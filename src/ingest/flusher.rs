//! Size-or-age batch draining, grounded directly on `knhk-sidecar`'s `batch.rs`
//! (`BatchCollector`/`BatchProcessor`/`BatchManager` shape), generalized to drain a plain
//! `mpsc::Receiver<T>` into a pluggable `Sink<T>` instead of routing per-request oneshot replies.

use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;

use crate::error::MoniflowError;

#[derive(Debug, Clone, Copy)]
pub struct BatchConfig {
    pub max_batch_size: usize,
    pub flush_interval: Duration,
}

/// The out-of-scope durable backend (InfluxDB-equivalent in the source system): a typed
/// interface the core consumes, per spec §1.
#[async_trait::async_trait]
pub trait Sink<T: Send>: Send + Sync {
    async fn write_batch(&self, items: Vec<T>) -> Result<(), MoniflowError>;
}

/// Logs each batch instead of persisting it; the default/reference sink.
pub struct LoggingSink {
    pub label: &'static str,
}

#[async_trait::async_trait]
impl<T: Send + std::fmt::Debug> Sink<T> for LoggingSink {
    async fn write_batch(&self, items: Vec<T>) -> Result<(), MoniflowError> {
        tracing::info!(sink = self.label, count = items.len(), "flushed batch");
        Ok(())
    }
}

/// Drain up to `max_batch_size` items from `rx`, stopping early once `flush_interval` has
/// elapsed since `last_flush` (the previous successful flush, or loop start). Polls for the
/// first item in at-most-1s slices so the caller can keep checking `rx.is_closed()` while idle.
async fn collect_batch<T>(
    rx: &mut mpsc::Receiver<T>,
    config: &BatchConfig,
    last_flush: Instant,
) -> Vec<T> {
    let mut batch = Vec::new();
    let deadline = last_flush + config.flush_interval;

    let first_wait = deadline.saturating_duration_since(Instant::now()).min(Duration::from_secs(1));
    let first = match tokio::time::timeout(first_wait, rx.recv()).await {
        Ok(Some(item)) => item,
        Ok(None) | Err(_) => return batch,
    };
    batch.push(first);

    while batch.len() < config.max_batch_size {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            break;
        }
        match tokio::time::timeout(remaining, rx.recv()).await {
            Ok(Some(item)) => batch.push(item),
            Ok(None) | Err(_) => break,
        }
    }
    batch
}

/// Runs the drain-and-flush loop until the channel is closed, flushing whatever remains on exit.
pub async fn run<T: Send + 'static>(
    mut rx: mpsc::Receiver<T>,
    config: BatchConfig,
    sink: impl Sink<T>,
) {
    let mut last_flush = Instant::now();
    loop {
        let batch = collect_batch(&mut rx, &config, last_flush).await;
        if batch.is_empty() {
            if rx.is_closed() {
                return;
            }
            if Instant::now() >= last_flush + config.flush_interval {
                last_flush = Instant::now();
            }
            continue;
        }
        last_flush = Instant::now();
        let len = batch.len();
        if let Err(err) = sink.write_batch(batch).await {
            tracing::warn!(error = %err, count = len, "dropping batch after flush failure");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct CountingSink {
        total: Arc<AtomicUsize>,
    }

    #[async_trait::async_trait]
    impl Sink<u32> for CountingSink {
        async fn write_batch(&self, items: Vec<u32>) -> Result<(), MoniflowError> {
            self.total.fetch_add(items.len(), Ordering::SeqCst);
            Ok(())
        }
    }

    #[tokio::test]
    async fn drains_remaining_items_then_exits_on_channel_close() {
        let (tx, rx) = mpsc::channel(16);
        let total = Arc::new(AtomicUsize::new(0));
        let sink = CountingSink {
            total: total.clone(),
        };
        for i in 0..5u32 {
            tx.send(i).await.unwrap();
        }
        drop(tx);

        run(
            rx,
            BatchConfig {
                max_batch_size: 10,
                flush_interval: Duration::from_millis(50),
            },
            sink,
        )
        .await;

        assert_eq!(total.load(Ordering::SeqCst), 5);
    }

    #[tokio::test]
    async fn respects_max_batch_size() {
        let (tx, mut rx) = mpsc::channel(16);
        for i in 0..20u32 {
            tx.send(i).await.unwrap();
        }
        let config = BatchConfig {
            max_batch_size: 7,
            flush_interval: Duration::from_millis(50),
        };
        let batch = collect_batch(&mut rx, &config, Instant::now()).await;
        assert_eq!(batch.len(), 7);
    }
}
