//! Notification transport: a typed interface (spec §1), grounded on `notifiers/notifier.py`'s
//! `Notifier` ABC and its Telegram/email subclasses, neither of which is in scope here.

use async_trait::async_trait;

use crate::error::MoniflowError;
use crate::model::AlertRule;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationEvent {
    Triggered,
    Recovered,
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, rule: &AlertRule, event: NotificationEvent) -> Result<(), MoniflowError>;
}

/// Reference implementation standing in for the out-of-scope Telegram/email transports.
pub struct LoggingNotifier;

#[async_trait]
impl Notifier for LoggingNotifier {
    async fn send(&self, rule: &AlertRule, event: NotificationEvent) -> Result<(), MoniflowError> {
        tracing::info!(
            rule_id = %rule.id,
            metric = %rule.metric_name,
            event = ?event,
            channels = ?rule.notification_channels,
            "alert notification"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Comparison, RuleStatus};
    use chrono::Utc;
    use std::collections::BTreeMap;

    fn rule() -> AlertRule {
        AlertRule {
            id: "r1".into(),
            metric_name: "cpu".into(),
            tags: BTreeMap::new(),
            field_name: "usage".into(),
            threshold: 80.0,
            duration_seconds: 300,
            comparison: Comparison::Gt,
            notification_channels: vec!["telegram".into()],
            recipients: BTreeMap::new(),
            use_recovery_alert: false,
            recovery_seconds: None,
            status: RuleStatus::Active,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn logging_notifier_never_errors() {
        let notifier = LoggingNotifier;
        notifier.send(&rule(), NotificationEvent::Triggered).await.unwrap();
        notifier.send(&rule(), NotificationEvent::Recovered).await.unwrap();
    }
}
