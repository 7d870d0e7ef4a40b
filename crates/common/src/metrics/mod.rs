//! Metrics and observability utilities
//!
//! Prometheus metrics behind the `metrics` facade, with standardized
//! naming under the service prefix.

use metrics::{counter, describe_counter, describe_histogram, histogram, Unit};
use std::time::Instant;

/// Metrics prefix for all TenantGrid metrics
pub const METRICS_PREFIX: &str = "tenantgrid";

/// Histogram buckets for request latency (seconds).
pub const LATENCY_BUCKETS: &[f64] = &[
    0.001, 0.005, 0.010, 0.025, 0.050, 0.100, 0.250, 0.500, 1.000, 2.500, 5.000, 10.00,
];

/// Provisioning runs migrations and DDL; much slower than a request.
pub const PROVISIONING_BUCKETS: &[f64] = &[
    0.050, 0.100, 0.250, 0.500, 1.000, 2.500, 5.000, 10.00, 30.00, 60.00,
];

/// Register all metric descriptions.
pub fn register_metrics() {
    describe_counter!(
        format!("{METRICS_PREFIX}_requests_total"),
        Unit::Count,
        "Total number of HTTP requests"
    );

    describe_histogram!(
        format!("{METRICS_PREFIX}_request_duration_seconds"),
        Unit::Seconds,
        "HTTP request latency in seconds"
    );

    describe_counter!(
        format!("{METRICS_PREFIX}_lifecycle_operations_total"),
        Unit::Count,
        "Tenant lifecycle operations by type and outcome"
    );

    describe_histogram!(
        format!("{METRICS_PREFIX}_provisioning_duration_seconds"),
        Unit::Seconds,
        "End-to-end tenant schema provisioning latency"
    );

    describe_counter!(
        format!("{METRICS_PREFIX}_events_published_total"),
        Unit::Count,
        "Lifecycle events handed to the publisher"
    );

    describe_counter!(
        format!("{METRICS_PREFIX}_events_failed_total"),
        Unit::Count,
        "Lifecycle event publishes that reported failure"
    );

    tracing::info!("Metrics registered");
}

/// Helper to record request metrics
pub struct RequestMetrics {
    start: Instant,
    endpoint: String,
    method: String,
}

impl RequestMetrics {
    pub fn start(method: &str, endpoint: &str) -> Self {
        Self {
            start: Instant::now(),
            endpoint: endpoint.to_string(),
            method: method.to_string(),
        }
    }

    pub fn finish(self, status: u16) {
        let duration = self.start.elapsed().as_secs_f64();

        counter!(
            format!("{METRICS_PREFIX}_requests_total"),
            "method" => self.method.clone(),
            "endpoint" => self.endpoint.clone(),
            "status" => status.to_string()
        )
        .increment(1);

        histogram!(
            format!("{METRICS_PREFIX}_request_duration_seconds"),
            "method" => self.method,
            "endpoint" => self.endpoint
        )
        .record(duration);
    }
}

/// Record a lifecycle operation (create, suspend, activate, delete, update).
pub fn record_lifecycle_operation(operation: &str, success: bool) {
    let outcome = if success { "success" } else { "error" };
    counter!(
        format!("{METRICS_PREFIX}_lifecycle_operations_total"),
        "operation" => operation.to_string(),
        "outcome" => outcome.to_string()
    )
    .increment(1);
}

/// Record an end-to-end provisioning duration.
pub fn record_provisioning(duration_secs: f64) {
    histogram!(format!("{METRICS_PREFIX}_provisioning_duration_seconds")).record(duration_secs);
}

/// Record an event publish outcome.
pub fn record_event_publish(event_type: &str, success: bool) {
    if success {
        counter!(
            format!("{METRICS_PREFIX}_events_published_total"),
            "event_type" => event_type.to_string()
        )
        .increment(1);
    } else {
        counter!(
            format!("{METRICS_PREFIX}_events_failed_total"),
            "event_type" => event_type.to_string()
        )
        .increment(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buckets_are_sorted() {
        for buckets in [LATENCY_BUCKETS, PROVISIONING_BUCKETS] {
            let mut prev = 0.0;
            for &b in buckets {
                assert!(b > prev);
                prev = b;
            }
        }
    }

    #[test]
    fn test_request_metrics() {
        let m = RequestMetrics::start("POST", "/api/v1/tenants");
        m.finish(201);
        record_lifecycle_operation("create", true);
        record_provisioning(0.25);
        record_event_publish("tenant.created", true);
        // Just verify the recording paths run without panic.
    }
}
