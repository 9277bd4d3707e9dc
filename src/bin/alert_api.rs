//! Entry point for `moniflow-alert-api`: rule CRUD and the real-time hot-cache write path.

use std::sync::Arc;

use moniflow::api::alert::{router, AlertApiState};
use moniflow::config::AlertApiConfig;
use moniflow::store::{InMemoryHotCache, InMemoryRuleStore, RuleStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    moniflow::telemetry::init("moniflow-alert-api");
    let config = AlertApiConfig::from_env();

    let rule_store = Arc::new(InMemoryRuleStore::new());
    rule_store.setup_indexes().await?;
    let state = Arc::new(AlertApiState {
        rule_store,
        hot_cache: Arc::new(InMemoryHotCache::new()),
    });

    let app = router(state);
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    tracing::info!(address = %config.bind_address, "moniflow-alert-api listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(moniflow::telemetry::shutdown_signal())
        .await?;
    Ok(())
}
