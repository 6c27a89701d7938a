//! OTLP metrics for reservation traffic.
//!
//! Key metrics:
//! - tablecast_mutations_total: Counter of accepted mutations by kind
//! - tablecast_mutation_latency_seconds: Histogram of store round trips
//! - tablecast_broadcast_deliveries_total: Counter of slot deliveries
//! - tablecast_subscribers: Gauge of registered subscribers
//! - tablecast_dispatch_total: Counter of notification jobs by outcome

use opentelemetry::metrics::{Counter, Gauge, Histogram, Meter};
use opentelemetry::{global, KeyValue};
use opentelemetry_sdk::metrics::{ManualReader, SdkMeterProvider};
use std::sync::OnceLock;

static METRICS: OnceLock<Metrics> = OnceLock::new();

/// Tablecast metrics registry.
#[derive(Debug)]
pub struct Metrics {
    pub mutations_total: Counter<u64>,
    pub mutation_latency: Histogram<f64>,
    pub broadcast_deliveries: Counter<u64>,
    pub subscribers: Gauge<i64>,
    pub dispatch_total: Counter<u64>,
}

impl Metrics {
    fn new(meter: &Meter) -> Self {
        Self {
            mutations_total: meter
                .u64_counter("tablecast_mutations_total")
                .with_description("Accepted reservation mutations")
                .with_unit("1")
                .init(),
            mutation_latency: meter
                .f64_histogram("tablecast_mutation_latency_seconds")
                .with_description("Mutation latency from request to commit")
                .with_unit("s")
                .init(),
            broadcast_deliveries: meter
                .u64_counter("tablecast_broadcast_deliveries_total")
                .with_description("Events placed into subscriber slots")
                .with_unit("1")
                .init(),
            subscribers: meter
                .i64_gauge("tablecast_subscribers")
                .with_description("Registered subscribers")
                .with_unit("1")
                .init(),
            dispatch_total: meter
                .u64_counter("tablecast_dispatch_total")
                .with_description("Notification jobs by outcome")
                .with_unit("1")
                .init(),
        }
    }
}

fn manual_provider() -> SdkMeterProvider {
    let reader = ManualReader::builder().build();
    SdkMeterProvider::builder().with_reader(reader).build()
}

/// Initialize the metrics system.
///
/// Subsequent calls are ignored. With an endpoint, metrics are exported
/// over OTLP; otherwise they are recorded and never exported.
pub fn init_metrics_with_endpoint(otel_endpoint: Option<&str>) {
    METRICS.get_or_init(|| {
        if let Some(endpoint) = otel_endpoint {
            use opentelemetry_otlp::{Protocol, WithExportConfig};

            let exporter = opentelemetry_otlp::new_exporter()
                .tonic()
                .with_endpoint(endpoint)
                .with_protocol(Protocol::Grpc);

            match opentelemetry_otlp::new_pipeline()
                .metrics(opentelemetry_sdk::runtime::Tokio)
                .with_exporter(exporter)
                .with_period(std::time::Duration::from_secs(10))
                .build()
            {
                Ok(provider) => {
                    global::set_meter_provider(provider);
                    tracing::info!(endpoint, "OTLP metrics exporter configured");
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to create OTLP exporter, metrics stay local");
                    global::set_meter_provider(manual_provider());
                }
            }
        } else {
            global::set_meter_provider(manual_provider());
        }

        Metrics::new(&global::meter("tablecast"))
    });
}

pub fn init_metrics() {
    init_metrics_with_endpoint(None);
}

/// The global registry, if initialized.
pub fn metrics() -> Option<&'static Metrics> {
    METRICS.get()
}

/// Record an accepted mutation and its latency.
pub fn record_mutation(kind: &str, latency_seconds: f64) {
    if let Some(m) = METRICS.get() {
        let attrs = [KeyValue::new("kind", kind.to_string())];
        m.mutations_total.add(1, &attrs);
        m.mutation_latency.record(latency_seconds, &attrs);
    }
}

pub fn record_broadcast_deliveries(delivered: usize) {
    if let Some(m) = METRICS.get() {
        m.broadcast_deliveries.add(delivered as u64, &[]);
    }
}

pub fn set_subscribers(count: usize) {
    if let Some(m) = METRICS.get() {
        m.subscribers
            .record(i64::try_from(count).unwrap_or(i64::MAX), &[]);
    }
}

/// Record a notification job outcome: delivered, failed or dropped.
pub fn record_dispatch(outcome: &'static str) {
    if let Some(m) = METRICS.get() {
        m.dispatch_total
            .add(1, &[KeyValue::new("outcome", outcome)]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_metrics_is_idempotent() {
        init_metrics();
        init_metrics();
        assert!(metrics().is_some());
    }

    #[test]
    fn test_recording_does_not_panic() {
        init_metrics();
        record_mutation("create", 0.002);
        record_broadcast_deliveries(3);
        set_subscribers(2);
        record_dispatch("delivered");
        record_dispatch("dropped");
    }
}
