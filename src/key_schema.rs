//! Deterministic key fingerprinting (spec §4.A).
//!
//! Canonical string format: `moniflow:metrics:{measurement}:{k1=v1,k2=v2,...}:{field_name}`,
//! with tag pairs sorted lexicographically by key. `BTreeMap`'s iteration order gives us the
//! sort for free and matches Python's `sorted(tags.items())` byte-for-byte for ASCII keys.

use std::collections::BTreeMap;

/// Build the canonical hot-cache key for a (measurement, tags, field) triple.
pub fn metric_key(measurement: &str, tags: &BTreeMap<String, String>, field_name: &str) -> String {
    let sorted_tags = tags
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join(",");
    format!("moniflow:metrics:{measurement}:{sorted_tags}:{field_name}")
}

/// Key whose existence marks a rule as currently triggered.
pub fn alert_state_key(rule_id: &str) -> String {
    format!("moniflow:alert_state:{rule_id}")
}

/// Key whose existence marks that a recovery notification has already been emitted.
pub fn recovery_state_key(rule_id: &str) -> String {
    format!("moniflow:recovery_state:{rule_id}")
}
