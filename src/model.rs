//! Wire and domain data model (spec §3, §6).

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::error::MoniflowError;
use crate::timestamp;

/// Resolve a raw JSON timestamp field per spec §4.B: a string with an explicit timezone parses,
/// absence defaults to wall-clock UTC, anything else (number, bool, missing zone) is rejected.
fn resolve_timestamp(raw: &Option<JsonValue>) -> Result<(String, i64), MoniflowError> {
    match raw {
        None => {
            let now = timestamp::now();
            let secs = timestamp::parse(&now)?;
            Ok((now, secs))
        }
        Some(JsonValue::String(s)) => {
            let secs = timestamp::parse(s)?;
            Ok((s.clone(), secs))
        }
        Some(other) => Err(MoniflowError::InvalidTimestamp(format!(
            "timestamp must be a string, got {other}"
        ))),
    }
}

// ---------------------------------------------------------------------------------------------
// Metric sample
// ---------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MetricSample {
    pub measurement: String,
    pub tags: BTreeMap<String, String>,
    pub fields: BTreeMap<String, f64>,
    #[serde(default)]
    pub timestamp: Option<JsonValue>,
}

/// A `MetricSample` that has passed invariant validation: non-empty tags/fields, and a
/// timestamp that either parsed or was defaulted to receipt time.
#[derive(Debug, Clone, Serialize)]
pub struct ValidatedMetricSample {
    pub measurement: String,
    pub tags: BTreeMap<String, String>,
    pub fields: BTreeMap<String, f64>,
    pub timestamp: String,
    pub timestamp_seconds: i64,
}

impl MetricSample {
    pub fn validate(self) -> Result<ValidatedMetricSample, MoniflowError> {
        if self.measurement.trim().is_empty() {
            return Err(MoniflowError::SchemaInvalid(
                "measurement must be a non-empty string".to_string(),
            ));
        }
        if self.tags.is_empty() {
            return Err(MoniflowError::SchemaInvalid(
                "tags must be a non-empty mapping".to_string(),
            ));
        }
        if self.fields.is_empty() {
            return Err(MoniflowError::SchemaInvalid(
                "fields must be a non-empty mapping".to_string(),
            ));
        }
        let (timestamp, timestamp_seconds) = resolve_timestamp(&self.timestamp)?;
        Ok(ValidatedMetricSample {
            measurement: self.measurement,
            tags: self.tags,
            fields: self.fields,
            timestamp,
            timestamp_seconds,
        })
    }
}

// ---------------------------------------------------------------------------------------------
// Log event
// ---------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
    Critical,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LogEvent {
    pub message: String,
    pub level: JsonValue,
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
    #[serde(default)]
    pub timestamp: Option<JsonValue>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ValidatedLogEvent {
    pub message: String,
    pub level: LogLevel,
    pub tags: BTreeMap<String, String>,
    pub timestamp: String,
    pub timestamp_seconds: i64,
}

impl LogEvent {
    pub fn validate(self) -> Result<ValidatedLogEvent, MoniflowError> {
        let level: LogLevel = serde_json::from_value(self.level.clone()).map_err(|_| {
            MoniflowError::InvalidLogLevel(format!(
                "level must be one of DEBUG, INFO, WARNING, ERROR, CRITICAL, got {}",
                self.level
            ))
        })?;
        let (timestamp, timestamp_seconds) = resolve_timestamp(&self.timestamp)?;
        Ok(ValidatedLogEvent {
            message: self.message,
            level,
            tags: self.tags,
            timestamp,
            timestamp_seconds,
        })
    }
}

// ---------------------------------------------------------------------------------------------
// Comparison operator
// ---------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub enum Comparison {
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "==")]
    Eq,
    #[serde(rename = ">=")]
    Ge,
    #[serde(rename = "<=")]
    Le,
    #[serde(rename = "!=")]
    Ne,
}

impl Comparison {
    pub fn apply(self, value: f64, threshold: f64) -> bool {
        match self {
            Comparison::Gt => value > threshold,
            Comparison::Lt => value < threshold,
            Comparison::Eq => value == threshold,
            Comparison::Ge => value >= threshold,
            Comparison::Le => value <= threshold,
            Comparison::Ne => value != threshold,
        }
    }
}

impl std::fmt::Display for Comparison {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Comparison::Gt => ">",
            Comparison::Lt => "<",
            Comparison::Eq => "==",
            Comparison::Ge => ">=",
            Comparison::Le => "<=",
            Comparison::Ne => "!=",
        };
        write!(f, "{s}")
    }
}

// ---------------------------------------------------------------------------------------------
// Alert rule
// ---------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DurationUnit {
    Seconds,
    Minutes,
    Hours,
}

impl DurationUnit {
    pub fn to_seconds(self, value: i64) -> i64 {
        let multiplier = match self {
            DurationUnit::Seconds => 1,
            DurationUnit::Minutes => 60,
            DurationUnit::Hours => 3600,
        };
        value * multiplier
    }
}

/// Wire payload accepted by `POST /alerts` (spec §6).
#[derive(Debug, Clone, Deserialize)]
pub struct AlertRuleCreate {
    pub metric_name: String,
    pub tags: BTreeMap<String, String>,
    pub field_name: String,
    pub threshold: f64,
    pub duration_value: i64,
    #[serde(default = "default_duration_unit")]
    pub duration_unit: DurationUnit,
    pub comparison: Comparison,
    #[serde(default)]
    pub use_recovery_alert: bool,
    #[serde(default)]
    pub recovery_time_value: Option<i64>,
    #[serde(default)]
    pub recovery_time_unit: Option<DurationUnit>,
    #[serde(default = "default_channels")]
    pub notification_channels: Vec<String>,
    #[serde(default)]
    pub recipients: BTreeMap<String, Vec<String>>,
}

fn default_duration_unit() -> DurationUnit {
    DurationUnit::Seconds
}

fn default_channels() -> Vec<String> {
    vec!["telegram".to_string()]
}

impl AlertRuleCreate {
    pub fn validate(&self) -> Result<(), MoniflowError> {
        if self.metric_name.trim().is_empty() {
            return Err(MoniflowError::SchemaInvalid("metric_name must not be empty".into()));
        }
        if self.field_name.trim().is_empty() {
            return Err(MoniflowError::SchemaInvalid("field_name must not be empty".into()));
        }
        if self.tags.is_empty() {
            return Err(MoniflowError::SchemaInvalid("tags must be a non-empty mapping".into()));
        }
        if self.duration_value <= 0 {
            return Err(MoniflowError::SchemaInvalid("duration_value must be > 0".into()));
        }
        if let Some(v) = self.recovery_time_value {
            if v < 0 {
                return Err(MoniflowError::SchemaInvalid("recovery_time_value must be >= 0".into()));
            }
        }
        Ok(())
    }
}

/// Status of a stored rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleStatus {
    Active,
    Disabled,
}

/// Normalized, persisted alert rule (spec §3: duration/recovery stored in seconds).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AlertRule {
    pub id: String,
    pub metric_name: String,
    pub tags: BTreeMap<String, String>,
    pub field_name: String,
    pub threshold: f64,
    pub duration_seconds: i64,
    pub comparison: Comparison,
    pub notification_channels: Vec<String>,
    pub recipients: BTreeMap<String, Vec<String>>,
    pub use_recovery_alert: bool,
    pub recovery_seconds: Option<i64>,
    pub status: RuleStatus,
    pub created_at: DateTime<Utc>,
}

impl AlertRule {
    /// Normalize a create payload into a stored rule (Open Question (c): seconds only, never
    /// duration_value/duration_unit pairs).
    pub fn from_create(id: String, create: AlertRuleCreate) -> Self {
        let duration_seconds = create.duration_unit.to_seconds(create.duration_value);
        let recovery_seconds = if create.use_recovery_alert {
            match (create.recovery_time_value, create.recovery_time_unit) {
                (Some(v), Some(u)) => Some(u.to_seconds(v)),
                (Some(v), None) => Some(DurationUnit::Seconds.to_seconds(v)),
                _ => None,
            }
        } else {
            None
        };
        Self {
            id,
            metric_name: create.metric_name,
            tags: create.tags,
            field_name: create.field_name,
            threshold: create.threshold,
            duration_seconds,
            comparison: create.comparison,
            notification_channels: create.notification_channels,
            recipients: create.recipients,
            use_recovery_alert: create.use_recovery_alert,
            recovery_seconds,
            status: RuleStatus::Active,
            created_at: Utc::now(),
        }
    }
}

// ---------------------------------------------------------------------------------------------
// Alert history
// ---------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertStatus {
    Triggered,
    Recovered,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AlertHistoryEntry {
    pub rule_id: String,
    pub metric_name: String,
    pub tags: BTreeMap<String, String>,
    pub field_name: String,
    pub status: AlertStatus,
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn metric_sample_rejects_empty_tags() {
        let sample = MetricSample {
            measurement: "cpu".into(),
            tags: BTreeMap::new(),
            fields: BTreeMap::from([("usage".to_string(), 1.0)]),
            timestamp: None,
        };
        assert!(sample.validate().is_err());
    }

    #[test]
    fn metric_sample_defaults_timestamp_to_now() {
        let sample = MetricSample {
            measurement: "cpu".into(),
            tags: BTreeMap::from([("host".to_string(), "s1".to_string())]),
            fields: BTreeMap::from([("usage".to_string(), 1.0)]),
            timestamp: None,
        };
        let validated = sample.validate().unwrap();
        assert!(validated.timestamp_seconds > 0);
    }

    #[test]
    fn metric_sample_rejects_integer_timestamp() {
        let sample = MetricSample {
            measurement: "cpu".into(),
            tags: BTreeMap::from([("host".to_string(), "s1".to_string())]),
            fields: BTreeMap::from([("usage".to_string(), 1.0)]),
            timestamp: Some(json!(1740571200)),
        };
        assert!(sample.validate().is_err());
    }

    #[test]
    fn rule_create_normalizes_to_seconds() {
        let create = AlertRuleCreate {
            metric_name: "cpu".into(),
            tags: BTreeMap::from([("host".to_string(), "s1".to_string())]),
            field_name: "usage".into(),
            threshold: 80.0,
            duration_value: 5,
            duration_unit: DurationUnit::Minutes,
            comparison: Comparison::Gt,
            use_recovery_alert: true,
            recovery_time_value: Some(10),
            recovery_time_unit: Some(DurationUnit::Minutes),
            notification_channels: vec!["telegram".into()],
            recipients: BTreeMap::new(),
        };
        let rule = AlertRule::from_create("r1".into(), create);
        assert_eq!(rule.duration_seconds, 300);
        assert_eq!(rule.recovery_seconds, Some(600));
    }

    #[test]
    fn recovery_seconds_absent_unless_recovery_enabled() {
        let create = AlertRuleCreate {
            metric_name: "cpu".into(),
            tags: BTreeMap::from([("host".to_string(), "s1".to_string())]),
            field_name: "usage".into(),
            threshold: 80.0,
            duration_value: 5,
            duration_unit: DurationUnit::Seconds,
            comparison: Comparison::Gt,
            use_recovery_alert: false,
            recovery_time_value: Some(10),
            recovery_time_unit: Some(DurationUnit::Minutes),
            notification_channels: vec!["telegram".into()],
            recipients: BTreeMap::new(),
        };
        let rule = AlertRule::from_create("r1".into(), create);
        assert_eq!(rule.recovery_seconds, None);
    }
}
