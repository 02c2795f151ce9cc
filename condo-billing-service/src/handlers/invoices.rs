//! Invoice handlers.

use axum::{
    extract::{Path, State},
    Json,
};
use service_core::error::AppError;
use uuid::Uuid;

use super::units::find_unit;
use crate::{
    middleware::ComplexContext,
    models::{Invoice, InvoiceStatus, InvoiceWithItems},
    services::record_invoice_transition,
    startup::AppState,
};

/// Invoices of a unit, newest period first.
pub async fn list_unit_invoices(
    State(state): State<AppState>,
    ctx: ComplexContext,
    Path(unit_id): Path<Uuid>,
) -> Result<Json<Vec<Invoice>>, AppError> {
    find_unit(&state, ctx, unit_id).await?;
    let invoices = state.db.list_unit_invoices(ctx.complex_id, unit_id).await?;
    Ok(Json(invoices))
}

pub async fn get_invoice(
    State(state): State<AppState>,
    ctx: ComplexContext,
    Path(invoice_id): Path<Uuid>,
) -> Result<Json<InvoiceWithItems>, AppError> {
    let invoice = state
        .db
        .get_invoice(ctx.complex_id, invoice_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Invoice not found")))?;

    let items = state.db.get_invoice_items(invoice.invoice_id).await?;

    Ok(Json(InvoiceWithItems { invoice, items }))
}

pub async fn pay_invoice(
    State(state): State<AppState>,
    ctx: ComplexContext,
    Path(invoice_id): Path<Uuid>,
) -> Result<Json<Invoice>, AppError> {
    transition(&state, ctx, invoice_id, InvoiceStatus::Paid).await
}

/// Cancelling frees the invoice's period for the next billing run.
pub async fn cancel_invoice(
    State(state): State<AppState>,
    ctx: ComplexContext,
    Path(invoice_id): Path<Uuid>,
) -> Result<Json<Invoice>, AppError> {
    transition(&state, ctx, invoice_id, InvoiceStatus::Cancelled).await
}

async fn transition(
    state: &AppState,
    ctx: ComplexContext,
    invoice_id: Uuid,
    next: InvoiceStatus,
) -> Result<Json<Invoice>, AppError> {
    tracing::info!(
        complex_id = %ctx.complex_id,
        invoice_id = %invoice_id,
        status = next.as_str(),
        "Changing invoice status"
    );

    let invoice = state
        .db
        .transition_invoice(ctx.complex_id, invoice_id, next)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Invoice not found")))?;

    record_invoice_transition(next.as_str());

    Ok(Json(invoice))
}
