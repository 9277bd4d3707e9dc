//! Authenticating reverse-proxy forwarding (spec §4.K), grounded on `gateway/main.py`'s
//! `proxy_request`/`forward_request`. Body bytes pass through unchanged with their original
//! `content-type` preserved, which reproduces the source's "re-emit as JSON/form/raw" behaviour
//! without re-serializing an already-well-formed body.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{OriginalUri, Path, State};
use axum::http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::any;
use axum::{body::Bytes, Router};

use crate::config::{AuthConfig, GatewayConfig};
use crate::error::MoniflowError;
use crate::gateway::auth;
use crate::gateway::rate_limit::RateLimiter;

pub const PUBLIC_PREFIXES: &[&str] = &["user_management/token", "user_management/refresh", "health"];

pub fn default_routes() -> HashMap<String, String> {
    HashMap::from([
        ("user_management".to_string(), "http://localhost:8004".to_string()),
        ("collector".to_string(), "http://localhost:8001".to_string()),
        ("alert_service".to_string(), "http://localhost:8003".to_string()),
        ("dashboard_service".to_string(), "http://localhost:8002".to_string()),
    ])
}

pub struct GatewayState {
    pub client: reqwest::Client,
    pub routes: HashMap<String, String>,
    pub auth_config: AuthConfig,
    pub rate_limiter: RateLimiter,
    pub request_timeout: Duration,
}

impl GatewayState {
    pub fn new(auth_config: AuthConfig, config: &GatewayConfig, routes: HashMap<String, String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            routes,
            auth_config,
            rate_limiter: RateLimiter::new(config.rate_limit_per_minute),
            request_timeout: config.request_timeout,
        }
    }
}

pub fn router(state: Arc<GatewayState>) -> Router {
    Router::new()
        .route("/health", axum::routing::get(health))
        .route("/:service/*rest", any(proxy))
        .route("/:service", any(proxy_no_rest))
        .with_state(state)
}

async fn health() -> impl IntoResponse {
    axum::Json(serde_json::json!({"status": "ok"}))
}

fn normalize(path: &str) -> String {
    path.trim_end_matches('/').to_string()
}

fn client_key(headers: &HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .map(|v| v.split(',').next().unwrap_or(v).trim().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

async fn proxy_no_rest(
    state: State<Arc<GatewayState>>,
    method: Method,
    headers: HeaderMap,
    uri: OriginalUri,
    Path(service): Path<String>,
    body: Bytes,
) -> Response {
    proxy_impl(state, method, headers, uri, service, String::new(), body).await
}

async fn proxy(
    state: State<Arc<GatewayState>>,
    method: Method,
    headers: HeaderMap,
    uri: OriginalUri,
    Path((service, rest)): Path<(String, String)>,
    body: Bytes,
) -> Response {
    proxy_impl(state, method, headers, uri, service, rest, body).await
}

async fn proxy_impl(
    State(state): State<Arc<GatewayState>>,
    method: Method,
    headers: HeaderMap,
    OriginalUri(uri): OriginalUri,
    service: String,
    rest: String,
    body: Bytes,
) -> Response {
    if !state.rate_limiter.check(&client_key(&headers)) {
        return (
            StatusCode::TOO_MANY_REQUESTS,
            axum::Json(serde_json::json!({"detail": "Rate limit exceeded"})),
        )
            .into_response();
    }

    let Some(base_url) = state.routes.get(&service) else {
        return MoniflowError::UnknownService(service).into_response();
    };

    let full_path = normalize(&format!("{service}/{rest}"));
    let is_public = PUBLIC_PREFIXES.iter().any(|p| full_path.starts_with(p));

    let mut user_header: Option<String> = None;
    if !is_public {
        match auth::extract_bearer(headers.get("authorization").and_then(|v| v.to_str().ok())) {
            Ok(token) => match auth::verify_token(token, &state.auth_config) {
                Ok(claims) => user_header = Some(claims.sub),
                Err(err) => return err.into_response(),
            },
            Err(err) => return err.into_response(),
        }
    }

    let query = uri.query().map(|q| format!("?{q}")).unwrap_or_default();
    let target = format!("{base_url}/{rest}{query}");

    let mut forward_headers = reqwest::header::HeaderMap::new();
    for (name, value) in headers.iter() {
        if matches!(name.as_str(), "host" | "content-length") {
            continue;
        }
        forward_headers.insert(name.clone(), value.clone());
    }
    if let Some(user) = user_header {
        if let Ok(value) = HeaderValue::from_str(&user) {
            forward_headers.insert(HeaderName::from_static("user"), value);
        }
    }

    let reqwest_method = reqwest::Method::from_bytes(method.as_str().as_bytes()).unwrap_or(reqwest::Method::GET);
    let request = state
        .client
        .request(reqwest_method, &target)
        .headers(forward_headers)
        .body(body.to_vec())
        .timeout(state.request_timeout);

    match request.send().await {
        Ok(upstream) => translate_response(upstream).await,
        Err(err) if err.is_timeout() => MoniflowError::UpstreamTimeout.into_response(),
        Err(_) => MoniflowError::UpstreamUnreachable.into_response(),
    }
}

async fn translate_response(upstream: reqwest::Response) -> Response {
    let status = StatusCode::from_u16(upstream.status().as_u16()).unwrap_or(StatusCode::BAD_GATEWAY);
    let mut builder = Response::builder().status(status);
    for (name, value) in upstream.headers().iter() {
        if name.as_str() == "content-length" {
            continue;
        }
        builder = builder.header(name, value);
    }
    let body = upstream.bytes().await.unwrap_or_default();
    builder.body(axum::body::Body::from(body)).unwrap_or_else(|_| {
        (StatusCode::BAD_GATEWAY, "upstream response malformed").into_response()
    })
}
