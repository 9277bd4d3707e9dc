//! Integration coverage across `AlertAPI` and the `Evaluator`, exercising the three end-to-end
//! scenarios through the public HTTP surface rather than calling internal methods directly.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use moniflow::api::alert::{router, AlertApiState};
use moniflow::config::EvaluatorConfig;
use moniflow::evaluator::{Evaluator, LoggingNotifier};
use moniflow::store::{InMemoryAlertStateStore, InMemoryHotCache, InMemoryRuleStore};
use tower::ServiceExt;

fn rule_payload() -> serde_json::Value {
    serde_json::json!({
        "metric_name": "cpu",
        "tags": {"host": "s1"},
        "field_name": "usage",
        "threshold": 85.0,
        "duration_value": 60,
        "duration_unit": "seconds",
        "comparison": ">"
    })
}

fn metric_payload(value: f64) -> serde_json::Value {
    serde_json::json!({
        "measurement": "cpu",
        "tags": {"host": "s1"},
        "fields": {"usage": value},
        "timestamp": "2025-02-26T12:00:00Z"
    })
}

#[tokio::test]
async fn ingress_then_rule_then_tick_produces_triggered_history() {
    let rule_store = Arc::new(InMemoryRuleStore::new());
    let hot_cache: Arc<InMemoryHotCache> = Arc::new(InMemoryHotCache::new());
    let state = Arc::new(AlertApiState {
        rule_store: rule_store.clone(),
        hot_cache: hot_cache.clone(),
    });
    let app = router(state);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/metrics")
                .header("content-type", "application/json")
                .body(Body::from(metric_payload(90.0).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/alerts")
                .header("content-type", "application/json")
                .body(Body::from(rule_payload().to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let alert_state = Arc::new(InMemoryAlertStateStore::new());
    let evaluator = Evaluator::new(
        hot_cache,
        alert_state.clone(),
        rule_store.clone(),
        Arc::new(LoggingNotifier),
        EvaluatorConfig::default(),
    );
    evaluator.evaluate_once().await.unwrap();

    let rules = rule_store.list_rules().await.unwrap();
    assert_eq!(rules.len(), 1);
    assert!(alert_state.get_alert_state(&rules[0].id).await.unwrap());
    assert_eq!(rule_store.history_for(&rules[0].id).len(), 1);
}

#[tokio::test]
async fn deleting_a_rule_stops_future_alerts() {
    let rule_store = Arc::new(InMemoryRuleStore::new());
    let hot_cache: Arc<InMemoryHotCache> = Arc::new(InMemoryHotCache::new());
    let state = Arc::new(AlertApiState {
        rule_store: rule_store.clone(),
        hot_cache,
    });
    let app = router(state);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/alerts")
                .header("content-type", "application/json")
                .body(Body::from(rule_payload().to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let created: serde_json::Value = serde_json::from_slice(&body).unwrap();
    let rule_id = created["rule_id"].as_str().unwrap().to_string();

    let response = app
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/alerts/{}", rule_id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    assert!(rule_store.get_rule(&rule_id).await.unwrap().is_none());
}
