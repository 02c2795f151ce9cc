//! Errors raised while generating invoices.

use service_core::error::AppError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BillingError {
    /// A non-cancelled invoice already covers the unit, service and period.
    #[error("Period already invoiced")]
    AlreadyInvoiced,

    /// The generated invoice number collided with an existing one.
    #[error("Invoice number '{0}' already exists")]
    DuplicateNumber(String),

    #[error(transparent)]
    Store(#[from] AppError),
}
