//! Recurring billing of optional unit-service subscriptions.
//!
//! Once a month, on or after each subscription's billing day, one invoice
//! with a single line item is generated per unit and service. Runs are
//! stateless and idempotent within a month: every decision is derived from
//! the store and the date passed in.

pub mod error;
pub mod generator;
pub mod number;
pub mod runner;
pub mod schedule;
pub mod store;

pub use error::BillingError;
pub use runner::{BillingOutcome, BillingRunSummary, BillingRunner, SkipReason};
pub use schedule::{billing_day, eligibility, BillingPeriod, Eligibility};
pub use store::BillingStore;
