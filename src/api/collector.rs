//! `CollectorAPI` (spec §4.I): accepts metrics and logs onto the durable ingest path, and serves
//! the query/grouping passthrough endpoints. Router shape follows `knhk-sidecar`'s
//! `rest_api.rs` (one `Arc<State>`, routes wired in `router()`, `tracing::info!` per mount).

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::error::MoniflowError;
use crate::model::{
    DurationUnit, LogEvent, MetricSample, ValidatedLogEvent, ValidatedMetricSample,
};
use crate::ingest::IngestQueues;

/// How many recently-flushed items the query/grouping endpoints keep around. The real durable
/// backend (InfluxDB-equivalent) is out of scope (spec §1); this buffer is the reference
/// `TimeSeriesStore`/`LogStore` implementation the query endpoints read from.
const BUFFER_CAPACITY: usize = 10_000;

pub struct CollectorState {
    pub queues: Arc<IngestQueues>,
    metrics_buffer: Mutex<Vec<ValidatedMetricSample>>,
    logs_buffer: Mutex<Vec<ValidatedLogEvent>>,
}

impl CollectorState {
    pub fn new(queues: Arc<IngestQueues>) -> Self {
        Self {
            queues,
            metrics_buffer: Mutex::new(Vec::new()),
            logs_buffer: Mutex::new(Vec::new()),
        }
    }

    pub async fn record_metric(&self, sample: ValidatedMetricSample) {
        let mut buf = self.metrics_buffer.lock().await;
        buf.push(sample);
        if buf.len() > BUFFER_CAPACITY {
            let overflow = buf.len() - BUFFER_CAPACITY;
            buf.drain(0..overflow);
        }
    }

    pub async fn record_log(&self, event: ValidatedLogEvent) {
        let mut buf = self.logs_buffer.lock().await;
        buf.push(event);
        if buf.len() > BUFFER_CAPACITY {
            let overflow = buf.len() - BUFFER_CAPACITY;
            buf.drain(0..overflow);
        }
    }
}

pub fn router(state: Arc<CollectorState>) -> Router {
    tracing::info!("mounting CollectorAPI routes");
    Router::new()
        .route("/metrics", post(post_metrics).get(get_metrics))
        .route("/logs", post(post_logs).get(get_logs))
        .route("/health/live", get(health_live))
        .route("/health/ready", get(health_ready))
        .with_state(state)
}

async fn post_metrics(
    State(state): State<Arc<CollectorState>>,
    Json(payload): Json<MetricSample>,
) -> Result<StatusCode, MoniflowError> {
    let validated = payload.validate()?;
    state.queues.submit_metric(validated.clone()).await?;
    state.record_metric(validated).await;
    Ok(StatusCode::OK)
}

async fn post_logs(
    State(state): State<Arc<CollectorState>>,
    Json(payload): Json<LogEvent>,
) -> Result<StatusCode, MoniflowError> {
    let validated = payload.validate()?;
    state.queues.submit_log(validated.clone()).await?;
    state.record_log(validated).await;
    Ok(StatusCode::OK)
}

#[derive(Debug, Deserialize)]
struct MetricsQuery {
    measurement: String,
    field_name: String,
    #[serde(default)]
    tags: Option<String>,
    duration_value: i64,
    #[serde(default)]
    duration_unit: Option<DurationUnit>,
}

#[derive(Debug, Serialize)]
struct MetricsQueryResponse {
    query: String,
    results: Vec<ValidatedMetricSample>,
}

async fn get_metrics(
    State(state): State<Arc<CollectorState>>,
    Query(params): Query<MetricsQuery>,
) -> Result<Json<MetricsQueryResponse>, MoniflowError> {
    let unit = params.duration_unit.unwrap_or(DurationUnit::Seconds);
    if params.duration_value <= 0 {
        return Err(MoniflowError::InvalidQuery(
            "duration_value must be > 0".to_string(),
        ));
    }
    let tags: BTreeMap<String, String> = match &params.tags {
        Some(raw) => serde_json::from_str(raw)
            .map_err(|e| MoniflowError::InvalidQuery(format!("invalid tags: {e}")))?,
        None => BTreeMap::new(),
    };
    let since = crate::timestamp::now_seconds() - unit.to_seconds(params.duration_value);

    let buf = state.metrics_buffer.lock().await;
    let results: Vec<ValidatedMetricSample> = buf
        .iter()
        .filter(|m| {
            m.measurement == params.measurement
                && m.fields.contains_key(&params.field_name)
                && m.timestamp_seconds >= since
                && tags.iter().all(|(k, v)| m.tags.get(k) == Some(v))
        })
        .cloned()
        .collect();

    let query = format!(
        "measurement={} field_name={} duration={}s",
        params.measurement,
        params.field_name,
        unit.to_seconds(params.duration_value)
    );
    Ok(Json(MetricsQueryResponse { query, results }))
}

#[derive(Debug, Serialize)]
struct LogsGrouped(BTreeMap<String, BTreeMap<String, Vec<ValidatedLogEvent>>>);

async fn get_logs(
    State(state): State<Arc<CollectorState>>,
) -> Result<Json<LogsGrouped>, MoniflowError> {
    let buf = state.logs_buffer.lock().await;
    let mut grouped: BTreeMap<String, BTreeMap<String, Vec<ValidatedLogEvent>>> = BTreeMap::new();
    for event in buf.iter() {
        let service = event
            .tags
            .get("service")
            .cloned()
            .unwrap_or_else(|| "unknown".to_string());
        let level = format!("{:?}", event.level).to_uppercase();
        grouped
            .entry(service)
            .or_default()
            .entry(level)
            .or_default()
            .push(event.clone());
    }
    Ok(Json(LogsGrouped(grouped)))
}

async fn health_live() -> StatusCode {
    StatusCode::OK
}

async fn health_ready(State(_state): State<Arc<CollectorState>>) -> StatusCode {
    StatusCode::OK
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    fn state() -> Arc<CollectorState> {
        let (queues, _metrics_rx, _logs_rx) = IngestQueues::new(16);
        Arc::new(CollectorState::new(Arc::new(queues)))
    }

    #[tokio::test]
    async fn post_metrics_accepts_valid_payload() {
        let app = router(state());
        let body = serde_json::json!({
            "measurement": "cpu",
            "tags": {"host": "s1"},
            "fields": {"usage": 91.2}
        });
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/metrics")
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn post_metrics_rejects_empty_tags() {
        let app = router(state());
        let body = serde_json::json!({
            "measurement": "cpu",
            "tags": {},
            "fields": {"usage": 91.2}
        });
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/metrics")
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn health_live_always_ok() {
        let app = router(state());
        let response = app
            .oneshot(Request::builder().uri("/health/live").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
