//! Prometheus metrics for condo-billing-service.

use once_cell::sync::Lazy;
use prometheus::{
    register_counter, register_counter_vec, register_histogram_vec, Counter, CounterVec, Encoder,
    HistogramVec, TextEncoder,
};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

/// Histogram for database query duration by operation.
pub static DB_QUERY_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "condo_billing_db_query_duration_seconds",
        "Database query duration in seconds",
        &["operation"],
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5]
    )
    .expect("Failed to register DB_QUERY_DURATION")
});

/// Counter for HTTP requests by route and status.
pub static HTTP_REQUESTS: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "condo_billing_http_requests_total",
        "Total number of HTTP requests",
        &["method", "path", "status"]
    )
    .expect("Failed to register HTTP_REQUESTS")
});

/// Histogram for HTTP request duration by route.
pub static HTTP_REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "condo_billing_http_request_duration_seconds",
        "HTTP request duration in seconds",
        &["method", "path"],
        vec![0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]
    )
    .expect("Failed to register HTTP_REQUEST_DURATION")
});

/// Counter for billing runs by final status.
pub static BILLING_RUNS: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "condo_billing_runs_total",
        "Total number of billing runs",
        &["status"]
    )
    .expect("Failed to register BILLING_RUNS")
});

/// Counter for per-subscription outcomes within billing runs.
pub static BILLING_OUTCOMES: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "condo_billing_subscription_outcomes_total",
        "Billing outcomes per subscription",
        &["outcome"]
    )
    .expect("Failed to register BILLING_OUTCOMES")
});

/// Sum of generated invoice totals.
pub static INVOICED_AMOUNT: Lazy<Counter> = Lazy::new(|| {
    register_counter!(
        "condo_billing_invoiced_amount_total",
        "Total amount of generated invoices"
    )
    .expect("Failed to register INVOICED_AMOUNT")
});

/// Counter for manual invoice status changes.
pub static INVOICE_TRANSITIONS: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "condo_billing_invoice_transitions_total",
        "Invoice status transitions",
        &["status"]
    )
    .expect("Failed to register INVOICE_TRANSITIONS")
});

/// Counter for errors.
pub static ERRORS: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "condo_billing_errors_total",
        "Total number of errors",
        &["error_type"]
    )
    .expect("Failed to register ERRORS")
});

/// Initialize all metrics (forces lazy initialization).
pub fn init_metrics() {
    Lazy::force(&DB_QUERY_DURATION);
    Lazy::force(&HTTP_REQUESTS);
    Lazy::force(&HTTP_REQUEST_DURATION);
    Lazy::force(&BILLING_RUNS);
    Lazy::force(&BILLING_OUTCOMES);
    Lazy::force(&INVOICED_AMOUNT);
    Lazy::force(&INVOICE_TRANSITIONS);
    Lazy::force(&ERRORS);
}

/// Get all metrics as Prometheus text format.
pub fn get_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::warn!(error = %e, "Failed to encode metrics");
    }
    String::from_utf8(buffer).unwrap_or_default()
}

/// Record a served HTTP request.
pub fn record_http_request(method: &str, path: &str, status: u16, duration_secs: f64) {
    HTTP_REQUESTS
        .with_label_values(&[method, path, &status.to_string()])
        .inc();
    HTTP_REQUEST_DURATION
        .with_label_values(&[method, path])
        .observe(duration_secs);
}

/// Record a finished or aborted billing run.
pub fn record_billing_run(status: &str) {
    BILLING_RUNS.with_label_values(&[status]).inc();
}

/// Record the outcome for one subscription.
pub fn record_billing_outcome(outcome: &str) {
    BILLING_OUTCOMES.with_label_values(&[outcome]).inc();
}

/// Add a generated invoice total to the invoiced amount.
pub fn record_invoice_amount(amount: Decimal) {
    if let Some(value) = amount.to_f64().filter(|v| *v >= 0.0) {
        INVOICED_AMOUNT.inc_by(value);
    }
}

/// Record a manual invoice status change.
pub fn record_invoice_transition(status: &str) {
    INVOICE_TRANSITIONS.with_label_values(&[status]).inc();
}

/// Record an error.
pub fn record_error(error_type: &str) {
    ERRORS.with_label_values(&[error_type]).inc();
}
