//! Entry point for `moniflow-evaluator`: the scheduled alert evaluation loop (spec §4.H).
//!
//! The hot cache, rule store, and alert-state store are external collaborators (spec §1); this
//! binary runs entirely against in-process reference implementations, which is sufficient for
//! this repository's scope but means it does not yet share state across a process boundary with
//! `moniflow-alert-api`. A real deployment wires all three through a shared KV/document backend.

use std::sync::Arc;

use moniflow::config::EvaluatorConfig;
use moniflow::evaluator::{Evaluator, LoggingNotifier};
use moniflow::store::{InMemoryAlertStateStore, InMemoryHotCache, InMemoryRuleStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    moniflow::telemetry::init("moniflow-evaluator");
    let config = EvaluatorConfig::from_env();

    let evaluator = Arc::new(Evaluator::new(
        Arc::new(InMemoryHotCache::new()),
        Arc::new(InMemoryAlertStateStore::new()),
        Arc::new(InMemoryRuleStore::new()),
        Arc::new(LoggingNotifier),
        config,
    ));

    tracing::info!("moniflow-evaluator running");
    tokio::select! {
        _ = evaluator.run() => {},
        _ = moniflow::telemetry::shutdown_signal() => {
            tracing::info!("moniflow-evaluator shutting down");
        },
    }
    Ok(())
}
