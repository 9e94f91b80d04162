//! HTTP surface of the box office: router, shared state and metrics.

pub mod api;
pub mod metrics;
pub mod state;
