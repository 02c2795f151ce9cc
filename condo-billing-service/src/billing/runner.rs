//! The recurring billing run: scan, check, generate.

use super::error::BillingError;
use super::generator::build_invoice;
use super::number;
use super::schedule::{eligibility, BillingPeriod, Eligibility};
use super::store::BillingStore;
use crate::models::{BillableSubscription, Invoice};
use crate::services::{record_billing_outcome, record_billing_run, record_invoice_amount};
use chrono::NaiveDate;
use serde::Serialize;
use service_core::error::AppError;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, instrument, warn};

/// Counters returned to the scheduler that triggered the run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BillingRunSummary {
    pub processed: u32,
    pub skipped: u32,
    pub errors: u32,
}

/// Why a subscription was left alone this run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    AlreadyInvoiced,
    NotYetDue,
    NotStarted,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkipReason::AlreadyInvoiced => "already_invoiced",
            SkipReason::NotYetDue => "not_yet_due",
            SkipReason::NotStarted => "not_started",
        }
    }
}

/// Result of billing a single subscription.
#[derive(Debug, Clone)]
pub enum BillingOutcome {
    Billed(Box<Invoice>),
    Skipped(SkipReason),
}

/// Runs the monthly billing pass over every billable subscription.
#[derive(Clone)]
pub struct BillingRunner {
    store: Arc<dyn BillingStore>,
    number_attempts: u32,
}

impl BillingRunner {
    pub fn new(store: Arc<dyn BillingStore>, number_attempts: u32) -> Self {
        Self {
            store,
            number_attempts: number_attempts.max(1),
        }
    }

    /// Bill every subscription that is due on `today`.
    ///
    /// Fails only if the subscriptions cannot be listed. Errors on a single
    /// subscription are logged and counted, and the scan moves on.
    #[instrument(skip(self), fields(period = %BillingPeriod::containing(today)))]
    pub async fn run(&self, today: NaiveDate) -> Result<BillingRunSummary, AppError> {
        let start = Instant::now();
        let period = BillingPeriod::containing(today);

        let subscriptions = self.store.billable_subscriptions().await.map_err(|e| {
            error!(error = %e, "Failed to load billable subscriptions");
            record_billing_run("failed");
            e
        })?;

        info!(
            subscriptions = subscriptions.len(),
            today = %today,
            "Starting billing run"
        );

        let mut summary = BillingRunSummary::default();

        for subscription in &subscriptions {
            match self.bill_subscription(subscription, period, today).await {
                Ok(BillingOutcome::Billed(invoice)) => {
                    summary.processed += 1;
                    record_billing_outcome("billed");
                    record_invoice_amount(invoice.total_amount);
                    info!(
                        unit_service_id = %subscription.unit_service_id,
                        invoice_id = %invoice.invoice_id,
                        number = %invoice.number,
                        total = %invoice.total_amount,
                        "Invoice generated"
                    );
                }
                Ok(BillingOutcome::Skipped(reason)) => {
                    summary.skipped += 1;
                    record_billing_outcome(reason.as_str());
                    debug!(
                        unit_service_id = %subscription.unit_service_id,
                        reason = reason.as_str(),
                        "Subscription skipped"
                    );
                }
                Err(e) => {
                    summary.errors += 1;
                    record_billing_outcome("error");
                    error!(
                        unit_service_id = %subscription.unit_service_id,
                        error = %e,
                        "Failed to bill subscription"
                    );
                }
            }
        }

        record_billing_run(if summary.errors == 0 {
            "completed"
        } else {
            "completed_with_errors"
        });

        info!(
            processed = summary.processed,
            skipped = summary.skipped,
            errors = summary.errors,
            duration_ms = start.elapsed().as_millis() as u64,
            "Billing run completed"
        );

        Ok(summary)
    }

    /// Bill one subscription for `period` if it is due and not yet invoiced.
    pub async fn bill_subscription(
        &self,
        subscription: &BillableSubscription,
        period: BillingPeriod,
        today: NaiveDate,
    ) -> Result<BillingOutcome, BillingError> {
        match eligibility(subscription.start_date, today) {
            Eligibility::Due => {}
            Eligibility::NotYetDue { .. } => {
                return Ok(BillingOutcome::Skipped(SkipReason::NotYetDue))
            }
            Eligibility::NotStarted => return Ok(BillingOutcome::Skipped(SkipReason::NotStarted)),
        }

        if self
            .store
            .period_invoiced(subscription.unit_id, subscription.service_id, period)
            .await?
        {
            return Ok(BillingOutcome::Skipped(SkipReason::AlreadyInvoiced));
        }

        let mut attempt = 1;
        loop {
            let invoice = build_invoice(
                subscription,
                period,
                number::generate(period, &subscription.unit_number),
            );

            match self.store.create_period_invoice(&invoice).await {
                Ok(created) => return Ok(BillingOutcome::Billed(Box::new(created))),
                Err(BillingError::AlreadyInvoiced) => {
                    return Ok(BillingOutcome::Skipped(SkipReason::AlreadyInvoiced))
                }
                Err(BillingError::DuplicateNumber(taken)) if attempt < self.number_attempts => {
                    warn!(
                        unit_service_id = %subscription.unit_service_id,
                        number = %taken,
                        attempt = attempt,
                        "Invoice number collision, retrying"
                    );
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
