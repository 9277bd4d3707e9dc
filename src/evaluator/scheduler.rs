//! Two independent periodic loops (spec §4.H): `fetch_alert_rules` (60s) is the alerting core —
//! each tick lists every rule from the rule store and evaluates it in the same pass, exactly as
//! spec's pseudocode describes (`for rule in RuleStore.list(): ... evaluate ...`). `process_metrics`
//! (30s) is the auxiliary task: draining whatever sits in a residual hot-cache ingest queue, which
//! in this implementation has nothing to drain (`AlertAPI::post_metrics` already writes the hot
//! cache directly). Grounded on the source system's Celery beat schedule, where `process_metrics`
//! is a pure log-draining no-op and `fetch_alert_rules` carries the full algorithm.

use std::sync::Arc;

use crate::config::EvaluatorConfig;
use crate::error::MoniflowError;
use crate::evaluator::eval;
use crate::evaluator::notifier::{NotificationEvent, Notifier};
use crate::key_schema;
use crate::model::{AlertHistoryEntry, AlertRule, AlertStatus, RuleStatus};
use crate::store::{AlertStateStore, HotCache, RuleStore};
use crate::timestamp;

pub struct Evaluator {
    hot_cache: Arc<dyn HotCache>,
    alert_state: Arc<dyn AlertStateStore>,
    rule_store: Arc<dyn RuleStore>,
    notifier: Arc<dyn Notifier>,
    config: EvaluatorConfig,
}

impl Evaluator {
    pub fn new(
        hot_cache: Arc<dyn HotCache>,
        alert_state: Arc<dyn AlertStateStore>,
        rule_store: Arc<dyn RuleStore>,
        notifier: Arc<dyn Notifier>,
        config: EvaluatorConfig,
    ) -> Self {
        Self {
            hot_cache,
            alert_state,
            rule_store,
            notifier,
            config,
        }
    }

    /// Runs both loops until the process is terminated; neither loop returns in normal operation.
    pub async fn run(self: Arc<Self>) {
        let metrics_loop = {
            let this = self.clone();
            tokio::spawn(async move { this.process_metrics_loop().await })
        };
        let rules_loop = {
            let this = self.clone();
            tokio::spawn(async move { this.fetch_alert_rules_loop().await })
        };
        let _ = tokio::join!(metrics_loop, rules_loop);
    }

    /// The alerting core: list every rule and evaluate it, all within the same tick.
    async fn fetch_alert_rules_loop(&self) {
        let mut interval = tokio::time::interval(self.config.fetch_rules_interval);
        loop {
            interval.tick().await;
            if let Err(err) = self.evaluate_all_rules().await {
                tracing::warn!(error = %err, "failed to list alert rules");
            }
        }
    }

    async fn evaluate_all_rules(&self) -> Result<(), MoniflowError> {
        let rules = self.rule_store.list_rules().await?;
        for rule in &rules {
            if let Err(err) = self.evaluate_rule(rule).await {
                tracing::warn!(rule_id = %rule.id, error = %err, "rule evaluation failed");
            }
        }
        Ok(())
    }

    /// Auxiliary task: nothing to drain here, since the hot cache is written synchronously by
    /// `AlertAPI::post_metrics` rather than through a residual ingest queue.
    async fn process_metrics_loop(&self) {
        let mut interval = tokio::time::interval(self.config.process_metrics_interval);
        loop {
            interval.tick().await;
            tracing::debug!("process_metrics tick: no residual queue to drain");
        }
    }

    async fn evaluate_rule(&self, rule: &AlertRule) -> Result<(), MoniflowError> {
        if rule.status != RuleStatus::Active {
            return Ok(());
        }

        let key = key_schema::metric_key(&rule.metric_name, &rule.tags, &rule.field_name);
        let since = timestamp::now_seconds() - rule.duration_seconds;
        let values = self.hot_cache.query_since(&key, since).await?;
        let is_triggered = eval::evaluate(rule.comparison, rule.threshold, &values);

        if is_triggered {
            self.handle_triggered(rule).await
        } else {
            self.handle_not_triggered(rule).await
        }
    }

    async fn handle_triggered(&self, rule: &AlertRule) -> Result<(), MoniflowError> {
        if self.alert_state.get_alert_state(&rule.id).await? {
            return Ok(());
        }
        self.alert_state
            .set_alert_state(&rule.id, rule.duration_seconds)
            .await?;
        self.notifier.send(rule, NotificationEvent::Triggered).await?;
        self.rule_store
            .append_history(AlertHistoryEntry {
                rule_id: rule.id.clone(),
                metric_name: rule.metric_name.clone(),
                tags: rule.tags.clone(),
                field_name: rule.field_name.clone(),
                status: AlertStatus::Triggered,
                timestamp: chrono::Utc::now(),
            })
            .await
    }

    /// Open Question (b): recovery writes only the recovery marker, never re-touching the
    /// alert-state marker. `alert_state` clears itself once its own TTL (`duration_seconds`)
    /// elapses, which is what lets the rule re-trigger later.
    async fn handle_not_triggered(&self, rule: &AlertRule) -> Result<(), MoniflowError> {
        if !rule.use_recovery_alert {
            return Ok(());
        }
        if !self.alert_state.get_alert_state(&rule.id).await? {
            return Ok(());
        }
        if self.alert_state.get_recovery_state(&rule.id).await? {
            return Ok(());
        }

        let recovery_seconds = rule.recovery_seconds.unwrap_or(rule.duration_seconds);
        self.alert_state
            .set_recovery_state(&rule.id, recovery_seconds)
            .await?;
        self.notifier.send(rule, NotificationEvent::Recovered).await?;
        self.rule_store
            .append_history(AlertHistoryEntry {
                rule_id: rule.id.clone(),
                metric_name: rule.metric_name.clone(),
                tags: rule.tags.clone(),
                field_name: rule.field_name.clone(),
                status: AlertStatus::Recovered,
                timestamp: chrono::Utc::now(),
            })
            .await
    }

    /// Test/diagnostic hook: run one `fetch_alert_rules` tick (list + evaluate) without waiting
    /// for the interval.
    pub async fn evaluate_once(&self) -> Result<(), MoniflowError> {
        self.evaluate_all_rules().await
    }
}
