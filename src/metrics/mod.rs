//! Prometheus metrics for the dispatcher.
//!
//! - Dispatch outcomes (sent, already read, no token, failures)
//! - Dispatch latency
//! - Trigger intake (Redis messages received, malformed messages)

mod helpers;

pub use helpers::{encode_metrics, DispatchMetrics, TriggerMetrics};

use lazy_static::lazy_static;
use prometheus::{
    register_histogram_vec, register_int_counter, register_int_counter_vec, HistogramVec,
    IntCounter, IntCounterVec,
};

/// Prefix for all metrics
const METRIC_PREFIX: &str = "push_dispatcher";

lazy_static! {
    // ============================================================================
    // Dispatch Metrics
    // ============================================================================

    /// Dispatch results by outcome
    pub static ref DISPATCH_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_dispatch_total", METRIC_PREFIX),
        "Total dispatches by outcome",
        &["outcome"]
    ).unwrap();

    /// Time from event intake to dispatch result, by outcome
    pub static ref DISPATCH_LATENCY: HistogramVec = register_histogram_vec!(
        format!("{}_dispatch_latency_seconds", METRIC_PREFIX),
        "Dispatch latency in seconds",
        &["outcome"],
        vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]
    ).unwrap();

    // ============================================================================
    // Trigger Metrics
    // ============================================================================

    /// Events received per trigger source
    pub static ref TRIGGER_EVENTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_trigger_events_total", METRIC_PREFIX),
        "Notification created events received",
        &["source"]
    ).unwrap();

    /// Messages that could not be parsed into an event
    pub static ref TRIGGER_MALFORMED_TOTAL: IntCounter = register_int_counter!(
        format!("{}_trigger_malformed_total", METRIC_PREFIX),
        "Trigger messages dropped because they could not be parsed"
    ).unwrap();

    /// Redis subscription reconnect attempts
    pub static ref REDIS_RECONNECTIONS_TOTAL: IntCounter = register_int_counter!(
        format!("{}_redis_reconnections_total", METRIC_PREFIX),
        "Total Redis subscription reconnection attempts"
    ).unwrap();
}
