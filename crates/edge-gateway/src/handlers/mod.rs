//! HTTP request handlers for the edge gateway.

pub mod gateway;
pub mod health;
pub mod metrics;

pub use gateway::gateway_handler;
pub use health::health_check;
pub use metrics::metrics_handler;
