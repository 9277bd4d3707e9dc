//! Entry point for `moniflow-gateway`: the authenticating reverse proxy (spec §4.K).

use std::sync::Arc;

use moniflow::config::{AuthConfig, GatewayConfig};
use moniflow::gateway::{default_routes, router, GatewayState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    moniflow::telemetry::init("moniflow-gateway");
    let auth_config = AuthConfig::from_env()?;
    let config = GatewayConfig::from_env();

    let state = Arc::new(GatewayState::new(auth_config, &config, default_routes()));
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    tracing::info!(address = %config.bind_address, "moniflow-gateway listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(moniflow::telemetry::shutdown_signal())
        .await?;
    Ok(())
}
