//! Services module for condo-billing-service.

pub mod database;
pub mod metrics;

pub use database::Database;
pub use metrics::{
    get_metrics, init_metrics, record_billing_outcome, record_billing_run, record_error,
    record_http_request, record_invoice_amount, record_invoice_transition,
};
