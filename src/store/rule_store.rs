//! Alert rule CRUD and history logging.
//!
//! Grounded on `dao/mongo/mongo_alert_rules.py` (`MongoAlertRule`) and
//! `dao/mongo/mongo_alert_history.py` (`MongoAlertHistory`). The document store itself is out
//! of scope (spec §1 names only a typed interface); `InMemoryRuleStore` is the reference
//! implementation the binaries run against.

use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::MoniflowError;
use crate::model::{AlertHistoryEntry, AlertRule, AlertRuleCreate};

#[async_trait]
pub trait RuleStore: Send + Sync {
    async fn create_rule(&self, create: AlertRuleCreate) -> Result<AlertRule, MoniflowError>;
    async fn get_rule(&self, rule_id: &str) -> Result<Option<AlertRule>, MoniflowError>;
    async fn list_rules(&self) -> Result<Vec<AlertRule>, MoniflowError>;
    async fn delete_rule(&self, rule_id: &str) -> Result<bool, MoniflowError>;
    async fn append_history(&self, entry: AlertHistoryEntry) -> Result<(), MoniflowError>;

    /// Idempotent index setup, called once at startup. A no-op on backends with nothing to
    /// index (in-memory); issues the TTL-index creation call on a real document store.
    async fn setup_indexes(&self) -> Result<(), MoniflowError> {
        Ok(())
    }
}

/// The document-store seam `RuleStore` implementations that aren't purely in-memory wrap,
/// mirroring how `KvBackend` stands in for Redis.
#[async_trait]
pub trait DocumentBackend: Send + Sync {
    async fn insert_rule(&self, rule: &AlertRule) -> Result<(), MoniflowError>;
    async fn find_rule(&self, rule_id: &str) -> Result<Option<AlertRule>, MoniflowError>;
    async fn find_all_rules(&self) -> Result<Vec<AlertRule>, MoniflowError>;
    async fn delete_rule(&self, rule_id: &str) -> Result<bool, MoniflowError>;
    async fn insert_history(&self, entry: &AlertHistoryEntry) -> Result<(), MoniflowError>;
    async fn setup_indexes(&self) -> Result<(), MoniflowError>;
}

#[derive(Default)]
pub struct InMemoryRuleStore {
    rules: DashMap<String, AlertRule>,
    history: DashMap<String, Vec<AlertHistoryEntry>>,
}

impl InMemoryRuleStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// History entries recorded for a rule, oldest first. Not part of the trait because the
    /// evaluator never needs to read history back; this is test/diagnostic-only.
    pub fn history_for(&self, rule_id: &str) -> Vec<AlertHistoryEntry> {
        self.history.get(rule_id).map(|v| v.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl RuleStore for InMemoryRuleStore {
    async fn create_rule(&self, create: AlertRuleCreate) -> Result<AlertRule, MoniflowError> {
        create.validate()?;
        let id = Uuid::new_v4().to_string();
        let rule = AlertRule::from_create(id.clone(), create);
        self.rules.insert(id, rule.clone());
        Ok(rule)
    }

    async fn get_rule(&self, rule_id: &str) -> Result<Option<AlertRule>, MoniflowError> {
        Ok(self.rules.get(rule_id).map(|r| r.clone()))
    }

    async fn list_rules(&self) -> Result<Vec<AlertRule>, MoniflowError> {
        Ok(self.rules.iter().map(|r| r.value().clone()).collect())
    }

    async fn delete_rule(&self, rule_id: &str) -> Result<bool, MoniflowError> {
        Ok(self.rules.remove(rule_id).is_some())
    }

    async fn append_history(&self, entry: AlertHistoryEntry) -> Result<(), MoniflowError> {
        self.history.entry(entry.rule_id.clone()).or_default().push(entry);
        Ok(())
    }
}

/// `RuleStore` backed by a `DocumentBackend`, matching `MongoAlertRule`/`MongoAlertHistory`'s
/// split between the rule collection and the history collection.
pub struct DocumentRuleStore {
    backend: Arc<dyn DocumentBackend>,
}

impl DocumentRuleStore {
    pub fn new(backend: Arc<dyn DocumentBackend>) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl RuleStore for DocumentRuleStore {
    async fn create_rule(&self, create: AlertRuleCreate) -> Result<AlertRule, MoniflowError> {
        create.validate()?;
        let id = Uuid::new_v4().to_string();
        let rule = AlertRule::from_create(id, create);
        self.backend.insert_rule(&rule).await?;
        Ok(rule)
    }

    async fn get_rule(&self, rule_id: &str) -> Result<Option<AlertRule>, MoniflowError> {
        self.backend.find_rule(rule_id).await
    }

    async fn list_rules(&self) -> Result<Vec<AlertRule>, MoniflowError> {
        self.backend.find_all_rules().await
    }

    async fn delete_rule(&self, rule_id: &str) -> Result<bool, MoniflowError> {
        self.backend.delete_rule(rule_id).await
    }

    async fn append_history(&self, entry: AlertHistoryEntry) -> Result<(), MoniflowError> {
        self.backend.insert_history(&entry).await
    }

    async fn setup_indexes(&self) -> Result<(), MoniflowError> {
        self.backend.setup_indexes().await
    }
}
