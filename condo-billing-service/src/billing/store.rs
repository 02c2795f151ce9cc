//! Storage seam for the billing run.

use super::error::BillingError;
use super::schedule::BillingPeriod;
use crate::models::{BillableSubscription, Invoice, NewInvoice};
use async_trait::async_trait;
use service_core::error::AppError;
use uuid::Uuid;

/// Storage operations the billing run depends on.
///
/// `Database` implements this against PostgreSQL; tests substitute an
/// in-memory store.
#[async_trait]
pub trait BillingStore: Send + Sync {
    /// Active subscriptions to optional services, across all complexes.
    async fn billable_subscriptions(&self) -> Result<Vec<BillableSubscription>, AppError>;

    /// Whether a non-cancelled invoice item already exists for the unit,
    /// service and period.
    async fn period_invoiced(
        &self,
        unit_id: Uuid,
        service_id: Uuid,
        period: BillingPeriod,
    ) -> Result<bool, AppError>;

    /// Persist the invoice and its single item atomically.
    ///
    /// Returns `BillingError::AlreadyInvoiced` when a concurrent writer got
    /// there first and `BillingError::DuplicateNumber` when the number is
    /// taken.
    async fn create_period_invoice(&self, invoice: &NewInvoice) -> Result<Invoice, BillingError>;
}
