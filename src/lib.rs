//! MoniFlow: multi-tenant metrics-and-logs observability backend.
//!
//! The library crate holds every shared type and subsystem; the four binaries in `src/bin/`
//! each run one network-facing process against this shared core, the same relationship
//! `knhk-sidecar`'s `lib.rs` has to its own `main.rs`/`rest_api.rs`.

pub mod api;
pub mod config;
pub mod error;
pub mod evaluator;
pub mod gateway;
pub mod ingest;
pub mod key_schema;
pub mod model;
pub mod store;
pub mod telemetry;
pub mod timestamp;

pub use error::{MoniflowError, MoniflowResult};
