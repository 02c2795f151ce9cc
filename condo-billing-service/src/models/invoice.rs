//! Invoice model.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Invoice status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    Pending,
    Paid,
    Overdue,
    Cancelled,
}

impl InvoiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Pending => "pending",
            InvoiceStatus::Paid => "paid",
            InvoiceStatus::Overdue => "overdue",
            InvoiceStatus::Cancelled => "cancelled",
        }
    }

    pub fn from_string(s: &str) -> Self {
        match s {
            "paid" => InvoiceStatus::Paid,
            "overdue" => InvoiceStatus::Overdue,
            "cancelled" => InvoiceStatus::Cancelled,
            _ => InvoiceStatus::Pending,
        }
    }

    /// Whether an invoice in this status may move to `next`.
    ///
    /// Only open invoices (pending or overdue) can be settled or cancelled.
    pub fn can_transition_to(&self, next: InvoiceStatus) -> bool {
        matches!(
            (self, next),
            (
                InvoiceStatus::Pending | InvoiceStatus::Overdue,
                InvoiceStatus::Paid | InvoiceStatus::Cancelled
            )
        )
    }
}

/// Invoice document for one unit and one billing period.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Invoice {
    pub invoice_id: Uuid,
    pub complex_id: Uuid,
    pub unit_id: Uuid,
    pub number: String,
    pub period_month: i32,
    pub period_year: i32,
    pub total_amount: Decimal,
    pub status: String,
    pub due_date: NaiveDate,
    pub created_utc: DateTime<Utc>,
    pub paid_utc: Option<DateTime<Utc>>,
    pub cancelled_utc: Option<DateTime<Utc>>,
}

/// Line item on an invoice.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct InvoiceItem {
    pub item_id: Uuid,
    pub invoice_id: Uuid,
    pub service_id: Uuid,
    pub description: String,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub amount: Decimal,
    pub created_utc: DateTime<Utc>,
}

/// Invoice together with its line items.
#[derive(Debug, Clone, Serialize)]
pub struct InvoiceWithItems {
    #[serde(flatten)]
    pub invoice: Invoice,
    pub items: Vec<InvoiceItem>,
}

/// Input for persisting a generated invoice and its single line item.
#[derive(Debug, Clone)]
pub struct NewInvoice {
    pub complex_id: Uuid,
    pub unit_id: Uuid,
    pub number: String,
    pub period_month: i32,
    pub period_year: i32,
    pub total_amount: Decimal,
    pub due_date: NaiveDate,
    pub item: NewInvoiceItem,
}

/// Input for the line item of a generated invoice.
#[derive(Debug, Clone)]
pub struct NewInvoiceItem {
    pub service_id: Uuid,
    pub description: String,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub amount: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_invoices_can_be_paid_or_cancelled() {
        for from in [InvoiceStatus::Pending, InvoiceStatus::Overdue] {
            assert!(from.can_transition_to(InvoiceStatus::Paid));
            assert!(from.can_transition_to(InvoiceStatus::Cancelled));
        }
    }

    #[test]
    fn settled_invoices_are_final() {
        assert!(!InvoiceStatus::Paid.can_transition_to(InvoiceStatus::Cancelled));
        assert!(!InvoiceStatus::Cancelled.can_transition_to(InvoiceStatus::Paid));
        assert!(!InvoiceStatus::Pending.can_transition_to(InvoiceStatus::Pending));
    }
}
