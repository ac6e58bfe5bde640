//! Metrics helper structs for convenient metric recording

use std::time::Duration;

use prometheus::{Encoder, TextEncoder};

use super::{
    DISPATCH_LATENCY, DISPATCH_TOTAL, REDIS_RECONNECTIONS_TOTAL, TRIGGER_EVENTS_TOTAL,
    TRIGGER_MALFORMED_TOTAL,
};

/// Encode all metrics to Prometheus text format
pub fn encode_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8(buffer).unwrap_or_default())
}

/// Helper struct for recording dispatch metrics
pub struct DispatchMetrics;

impl DispatchMetrics {
    /// Record one dispatch result and how long it took
    pub fn record(outcome: &str, elapsed: Duration) {
        DISPATCH_TOTAL.with_label_values(&[outcome]).inc();
        DISPATCH_LATENCY
            .with_label_values(&[outcome])
            .observe(elapsed.as_secs_f64());
    }
}

/// Helper struct for recording trigger metrics
pub struct TriggerMetrics;

impl TriggerMetrics {
    /// Record an event received over Redis Pub/Sub
    pub fn record_redis_event() {
        TRIGGER_EVENTS_TOTAL.with_label_values(&["redis"]).inc();
    }

    /// Record an event received over the HTTP webhook
    pub fn record_http_event() {
        TRIGGER_EVENTS_TOTAL.with_label_values(&["http"]).inc();
    }

    /// Record a message that could not be parsed
    pub fn record_malformed() {
        TRIGGER_MALFORMED_TOTAL.inc();
    }

    /// Record a Redis subscription reconnect
    pub fn record_reconnect() {
        REDIS_RECONNECTIONS_TOTAL.inc();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_includes_recorded_dispatch() {
        DispatchMetrics::record("sent", Duration::from_millis(12));
        TriggerMetrics::record_http_event();

        let output = encode_metrics().unwrap();
        assert!(output.contains("push_dispatcher_dispatch_total"));
        assert!(output.contains("push_dispatcher_trigger_events_total"));
    }
}
