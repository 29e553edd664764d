//! Metrics module for billing-service.
//! Provides Prometheus counters for subscription use-cases and charges.

use prometheus::{opts, register_int_counter_vec, Encoder, IntCounterVec, TextEncoder};
use std::sync::OnceLock;

/// Subscription use-case outcomes by operation and status
pub static SUBSCRIPTION_OPERATIONS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();

/// Charge attempts by mode (single or batch) and status
pub static CHARGES_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();

/// Initialize all metrics. Call once at startup.
pub fn init_metrics() {
    SUBSCRIPTION_OPERATIONS_TOTAL.get_or_init(|| {
        register_int_counter_vec!(
            opts!(
                "billing_subscription_operations_total",
                "Total subscription operations by operation type and status"
            ),
            &["operation", "status"]
        )
        .expect("Failed to register SUBSCRIPTION_OPERATIONS_TOTAL")
    });

    CHARGES_TOTAL.get_or_init(|| {
        register_int_counter_vec!(
            opts!("billing_charges_total", "Total subscription charges"),
            &["mode", "status"]
        )
        .expect("Failed to register CHARGES_TOTAL")
    });

    // Force initialization of lazy statics
    let _ = &*service_core::observability::DB_QUERY_DURATION;
}

/// Get metrics in Prometheus text format.
pub fn get_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!(error = %e, "Failed to encode metrics");
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}

/// Record a subscription operation.
pub fn record_subscription_operation(operation: &str, status: &str) {
    if let Some(counter) = SUBSCRIPTION_OPERATIONS_TOTAL.get() {
        counter.with_label_values(&[operation, status]).inc();
    }
}

/// Record a charge attempt.
pub fn record_charge(mode: &str, status: &str) {
    if let Some(counter) = CHARGES_TOTAL.get() {
        counter.with_label_values(&[mode, status]).inc();
    }
}
