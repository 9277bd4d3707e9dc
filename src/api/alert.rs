//! `AlertAPI` (spec §4.J): rule CRUD plus the hot-cache write path used for real-time alerting.
//! Per Open Question (a), this is a write path independent of `CollectorAPI`'s durable queue.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::Value as JsonValue;

use crate::error::MoniflowError;
use crate::key_schema;
use crate::model::{AlertRule, AlertRuleCreate, MetricSample};
use crate::store::{HotCache, RuleStore};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
struct CreateRuleResponse {
    message: &'static str,
    rule_id: String,
}

pub struct AlertApiState {
    pub rule_store: Arc<dyn RuleStore>,
    pub hot_cache: Arc<dyn HotCache>,
}

pub fn router(state: Arc<AlertApiState>) -> Router {
    tracing::info!("mounting AlertAPI routes");
    Router::new()
        .route("/alerts", post(create_rule).get(list_rules))
        .route("/alerts/:id", get(get_rule).delete(delete_rule))
        .route("/metrics", post(post_metrics))
        .with_state(state)
}

async fn create_rule(
    State(state): State<Arc<AlertApiState>>,
    Json(payload): Json<AlertRuleCreate>,
) -> Result<(StatusCode, Json<CreateRuleResponse>), MoniflowError> {
    let rule = state.rule_store.create_rule(payload).await?;
    Ok((
        StatusCode::CREATED,
        Json(CreateRuleResponse {
            message: "Alert rule created",
            rule_id: rule.id,
        }),
    ))
}

async fn list_rules(
    State(state): State<Arc<AlertApiState>>,
) -> Result<Json<Vec<AlertRule>>, MoniflowError> {
    Ok(Json(state.rule_store.list_rules().await?))
}

async fn get_rule(
    State(state): State<Arc<AlertApiState>>,
    Path(id): Path<String>,
) -> Result<Json<AlertRule>, MoniflowError> {
    state
        .rule_store
        .get_rule(&id)
        .await?
        .map(Json)
        .ok_or_else(|| MoniflowError::RuleNotFound(id))
}

async fn delete_rule(
    State(state): State<Arc<AlertApiState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, MoniflowError> {
    if state.rule_store.delete_rule(&id).await? {
        Ok(StatusCode::OK)
    } else {
        Err(MoniflowError::RuleNotFound(id))
    }
}

/// The wire payload is `Metric | Metric[]`, mirroring the source system's
/// `Union[Metric, List[Metric]]` request body.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum MetricsPayload {
    One(MetricSample),
    Many(Vec<MetricSample>),
}

async fn post_metrics(
    State(state): State<Arc<AlertApiState>>,
    body: axum::extract::Json<JsonValue>,
) -> Result<StatusCode, MoniflowError> {
    let payload: MetricsPayload = serde_json::from_value(body.0)
        .map_err(|e| MoniflowError::SchemaInvalid(e.to_string()))?;
    let samples = match payload {
        MetricsPayload::One(m) => vec![m],
        MetricsPayload::Many(ms) => ms,
    };
    if samples.is_empty() {
        return Err(MoniflowError::SchemaInvalid(
            "metric list must not be empty".to_string(),
        ));
    }
    for sample in samples {
        let validated = sample.validate()?;
        for (field_name, value) in &validated.fields {
            let key = key_schema::metric_key(&validated.measurement, &validated.tags, field_name);
            state
                .hot_cache
                .push(&key, validated.timestamp_seconds, *value)
                .await?;
        }
    }
    Ok(StatusCode::OK)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{InMemoryHotCache, InMemoryRuleStore};
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    fn state() -> Arc<AlertApiState> {
        Arc::new(AlertApiState {
            rule_store: Arc::new(InMemoryRuleStore::new()),
            hot_cache: Arc::new(InMemoryHotCache::new()),
        })
    }

    fn create_payload() -> serde_json::Value {
        serde_json::json!({
            "metric_name": "cpu",
            "tags": {"host": "s1"},
            "field_name": "usage",
            "threshold": 80.0,
            "duration_value": 5,
            "duration_unit": "minutes",
            "comparison": ">"
        })
    }

    #[tokio::test]
    async fn create_then_get_rule() {
        let app = router(state());
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/alerts")
                    .header("content-type", "application/json")
                    .body(Body::from(create_payload().to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let created: CreateRuleResponse = serde_json::from_slice(&body).unwrap();

        let response = app
            .oneshot(
                Request::builder()
                    .uri(format!("/alerts/{}", created.rule_id))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn get_missing_rule_returns_404() {
        let app = router(state());
        let response = app
            .oneshot(Request::builder().uri("/alerts/missing").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn post_metrics_accepts_single_and_list() {
        let app = router(state());
        let single = serde_json::json!({
            "measurement": "cpu",
            "tags": {"host": "s1"},
            "fields": {"usage": 10.0}
        });
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/metrics")
                    .header("content-type", "application/json")
                    .body(Body::from(single.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let list = serde_json::json!([
            {"measurement": "cpu", "tags": {"host": "s1"}, "fields": {"usage": 11.0}}
        ]);
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/metrics")
                    .header("content-type", "application/json")
                    .body(Body::from(list.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
