//! Storage abstractions. Persistent backends are out of scope (spec §1); these are the typed
//! interfaces plus in-memory reference implementations the binaries run against.
//!
//! `KvBackend` and `DocumentBackend` are the seams a real Redis/Mongo client would be wired in
//! behind, the same way spec §1 treats the hot cache, document store, and key-value store as
//! external collaborators. Nothing in this crate depends on the `redis` or `mongodb` crates
//! directly; a deployment provides its own `KvBackend`/`DocumentBackend` impl.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::MoniflowError;

pub mod alert_state;
pub mod hot_cache;
pub mod rule_store;

pub use alert_state::{AlertStateStore, InMemoryAlertStateStore, KvAlertStateStore};
pub use hot_cache::{HotCache, InMemoryHotCache, RedisHotCache};
pub use rule_store::{DocumentBackend, DocumentRuleStore, InMemoryRuleStore, RuleStore};

/// A sorted-set-and-string key/value backend, shaped after the Redis commands the original
/// system issues directly (`ZADD`, `ZRANGEBYSCORE`, `SET ... EX`, `EXISTS`).
#[async_trait]
pub trait KvBackend: Send + Sync {
    async fn zadd(&self, key: &str, score: i64, member: &str) -> Result<(), MoniflowError>;
    async fn zrangebyscore(&self, key: &str, min_score: i64) -> Result<Vec<String>, MoniflowError>;
    async fn set_with_expiry(&self, key: &str, value: &str, ttl: Duration) -> Result<(), MoniflowError>;
    async fn exists(&self, key: &str) -> Result<bool, MoniflowError>;
}
