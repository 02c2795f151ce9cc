//! Builds the invoice for one due subscription.

use super::schedule::BillingPeriod;
use crate::models::{BillableSubscription, NewInvoice, NewInvoiceItem};

/// One invoice with one line item covering `subscription` for `period`.
pub fn build_invoice(
    subscription: &BillableSubscription,
    period: BillingPeriod,
    number: String,
) -> NewInvoice {
    let total = subscription.total();

    NewInvoice {
        complex_id: subscription.complex_id,
        unit_id: subscription.unit_id,
        number,
        period_month: period.month_i32(),
        period_year: period.year,
        total_amount: total,
        due_date: period.last_day(),
        item: NewInvoiceItem {
            service_id: subscription.service_id,
            description: format!("{} - {}", subscription.service_name, period),
            quantity: subscription.billed_quantity(),
            unit_price: subscription.unit_price(),
            amount: total,
        },
    }
}
