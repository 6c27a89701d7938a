//! Logging and metrics.
//!
//! Provides:
//! - Structured tracing with `tracing-subscriber`
//! - OpenTelemetry metrics for mutations, fan-out and dispatch

pub mod metrics;
pub mod tracing;
