//! Alert/recovery state markers, keyed by rule id, each living for a TTL.
//!
//! Grounded on `dao/redis/alert_state.py`'s `RedisAlertState`: existence of a key is the
//! signal, `EXPIRE` gives auto-clearing. `duration_seconds` is already normalized (Open
//! Question (c)) so the floor here is `max(duration_seconds, 60)`, not a `*60` reinterpretation.

use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::error::MoniflowError;
use crate::key_schema::{alert_state_key, recovery_state_key};
use crate::store::KvBackend;

const MIN_TTL: Duration = Duration::from_secs(60);

#[async_trait]
pub trait AlertStateStore: Send + Sync {
    async fn set_alert_state(&self, rule_id: &str, duration_seconds: i64) -> Result<(), MoniflowError>;
    async fn get_alert_state(&self, rule_id: &str) -> Result<bool, MoniflowError>;
    async fn set_recovery_state(&self, rule_id: &str, recovery_seconds: i64) -> Result<(), MoniflowError>;
    async fn get_recovery_state(&self, rule_id: &str) -> Result<bool, MoniflowError>;
}

#[derive(Default)]
pub struct InMemoryAlertStateStore {
    alert: DashMap<String, Instant>,
    recovery: DashMap<String, Instant>,
}

impl InMemoryAlertStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn ttl(seconds: i64) -> Duration {
        let requested = Duration::from_secs(seconds.max(0) as u64);
        requested.max(MIN_TTL)
    }

    fn is_live(map: &DashMap<String, Instant>, key: &str) -> bool {
        match map.get(key) {
            Some(expiry) => Instant::now() < *expiry,
            None => false,
        }
    }
}

#[async_trait]
impl AlertStateStore for InMemoryAlertStateStore {
    async fn set_alert_state(&self, rule_id: &str, duration_seconds: i64) -> Result<(), MoniflowError> {
        let expiry = Instant::now() + Self::ttl(duration_seconds);
        self.alert.insert(rule_id.to_string(), expiry);
        Ok(())
    }

    async fn get_alert_state(&self, rule_id: &str) -> Result<bool, MoniflowError> {
        Ok(Self::is_live(&self.alert, rule_id))
    }

    async fn set_recovery_state(&self, rule_id: &str, recovery_seconds: i64) -> Result<(), MoniflowError> {
        let expiry = Instant::now() + Self::ttl(recovery_seconds);
        self.recovery.insert(rule_id.to_string(), expiry);
        Ok(())
    }

    async fn get_recovery_state(&self, rule_id: &str) -> Result<bool, MoniflowError> {
        Ok(Self::is_live(&self.recovery, rule_id))
    }
}

/// Wraps a generic `KvBackend` the way `dao/redis/alert_state.py` wraps a raw Redis
/// connection: `SET key 1 EX ttl` to mark, `EXISTS key` to observe.
pub struct KvAlertStateStore {
    backend: Arc<dyn KvBackend>,
}

impl KvAlertStateStore {
    pub fn new(backend: Arc<dyn KvBackend>) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl AlertStateStore for KvAlertStateStore {
    async fn set_alert_state(&self, rule_id: &str, duration_seconds: i64) -> Result<(), MoniflowError> {
        self.backend
            .set_with_expiry(&alert_state_key(rule_id), "1", InMemoryAlertStateStore::ttl(duration_seconds))
            .await
    }

    async fn get_alert_state(&self, rule_id: &str) -> Result<bool, MoniflowError> {
        self.backend.exists(&alert_state_key(rule_id)).await
    }

    async fn set_recovery_state(&self, rule_id: &str, recovery_seconds: i64) -> Result<(), MoniflowError> {
        self.backend
            .set_with_expiry(&recovery_state_key(rule_id), "1", InMemoryAlertStateStore::ttl(recovery_seconds))
            .await
    }

    async fn get_recovery_state(&self, rule_id: &str) -> Result<bool, MoniflowError> {
        self.backend.exists(&recovery_state_key(rule_id)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn alert_state_is_set_and_observable() {
        let store = InMemoryAlertStateStore::new();
        assert!(!store.get_alert_state("r1").await.unwrap());
        store.set_alert_state("r1", 300).await.unwrap();
        assert!(store.get_alert_state("r1").await.unwrap());
    }

    #[tokio::test]
    async fn short_durations_floor_at_sixty_seconds() {
        assert_eq!(InMemoryAlertStateStore::ttl(5), MIN_TTL);
        assert_eq!(InMemoryAlertStateStore::ttl(300), Duration::from_secs(300));
    }

    #[tokio::test]
    async fn recovery_state_is_independent_of_alert_state() {
        let store = InMemoryAlertStateStore::new();
        store.set_recovery_state("r1", 60).await.unwrap();
        assert!(store.get_recovery_state("r1").await.unwrap());
        assert!(!store.get_alert_state("r1").await.unwrap());
    }

    #[derive(Default)]
    struct FakeKvBackend {
        entries: DashMap<String, String>,
    }

    #[async_trait]
    impl KvBackend for FakeKvBackend {
        async fn zadd(&self, _key: &str, _score: i64, _member: &str) -> Result<(), MoniflowError> {
            unimplemented!("not exercised by AlertStateStore")
        }

        async fn zrangebyscore(&self, _key: &str, _min_score: i64) -> Result<Vec<String>, MoniflowError> {
            unimplemented!("not exercised by AlertStateStore")
        }

        async fn set_with_expiry(&self, key: &str, value: &str, _ttl: Duration) -> Result<(), MoniflowError> {
            self.entries.insert(key.to_string(), value.to_string());
            Ok(())
        }

        async fn exists(&self, key: &str) -> Result<bool, MoniflowError> {
            Ok(self.entries.contains_key(key))
        }
    }

    #[tokio::test]
    async fn kv_alert_state_store_marks_through_a_backend() {
        let store = KvAlertStateStore::new(Arc::new(FakeKvBackend::default()));
        assert!(!store.get_alert_state("r1").await.unwrap());
        store.set_alert_state("r1", 120).await.unwrap();
        assert!(store.get_alert_state("r1").await.unwrap());
        assert!(!store.get_recovery_state("r1").await.unwrap());
    }
}
