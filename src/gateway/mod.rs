//! Authenticating reverse-proxy gateway (spec §4.K).

pub mod auth;
pub mod proxy;
pub mod rate_limit;

pub use proxy::{default_routes, router, GatewayState};
