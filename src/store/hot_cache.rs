//! Hot metric cache: a sorted-by-time store per cache key, backing alert evaluation.
//!
//! Grounded on `redis_metrics.py`'s `store_metric_in_cache` (ZADD with the timestamp as score)
//! and `get_metric_values` (ZRANGEBYSCORE). The in-memory implementation reproduces that
//! sorted-set behaviour with a plain `Vec` kept sorted by timestamp.

use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::{Arc, Mutex};

use crate::error::MoniflowError;
use crate::store::KvBackend;

#[async_trait]
pub trait HotCache: Send + Sync {
    async fn push(&self, key: &str, timestamp_seconds: i64, value: f64) -> Result<(), MoniflowError>;

    /// Values recorded at or after `since_seconds`, oldest first.
    async fn query_since(&self, key: &str, since_seconds: i64) -> Result<Vec<f64>, MoniflowError>;
}

#[derive(Default)]
pub struct InMemoryHotCache {
    series: DashMap<String, Mutex<Vec<(i64, f64)>>>,
}

impl InMemoryHotCache {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl HotCache for InMemoryHotCache {
    async fn push(&self, key: &str, timestamp_seconds: i64, value: f64) -> Result<(), MoniflowError> {
        let entry = self.series.entry(key.to_string()).or_default();
        let mut points = entry.lock().expect("hot cache lock poisoned");
        let pos = points.partition_point(|(ts, _)| *ts <= timestamp_seconds);
        points.insert(pos, (timestamp_seconds, value));
        Ok(())
    }

    async fn query_since(&self, key: &str, since_seconds: i64) -> Result<Vec<f64>, MoniflowError> {
        let Some(entry) = self.series.get(key) else {
            return Ok(Vec::new());
        };
        let points = entry.lock().expect("hot cache lock poisoned");
        Ok(points
            .iter()
            .filter(|(ts, _)| *ts >= since_seconds)
            .map(|(_, v)| *v)
            .collect())
    }
}

/// Wraps a generic `KvBackend` the way `redis_metrics.py` wraps a raw Redis connection: a
/// point is a sorted-set member `"{timestamp}:{value}"` scored by its own timestamp, so
/// `ZRANGEBYSCORE` already returns points oldest-first.
pub struct RedisHotCache {
    backend: Arc<dyn KvBackend>,
}

impl RedisHotCache {
    pub fn new(backend: Arc<dyn KvBackend>) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl HotCache for RedisHotCache {
    async fn push(&self, key: &str, timestamp_seconds: i64, value: f64) -> Result<(), MoniflowError> {
        let member = format!("{timestamp_seconds}:{value}");
        self.backend.zadd(key, timestamp_seconds, &member).await
    }

    async fn query_since(&self, key: &str, since_seconds: i64) -> Result<Vec<f64>, MoniflowError> {
        let members = self.backend.zrangebyscore(key, since_seconds).await?;
        members
            .iter()
            .map(|m| {
                m.rsplit_once(':')
                    .and_then(|(_, v)| v.parse::<f64>().ok())
                    .ok_or_else(|| MoniflowError::StorageUnavailable(format!("malformed hot cache member: {m}")))
            })
            .collect()
    }
}
