//! Unit and subscription handlers.
//!
//! All operations are scoped to the complex from the request context.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use service_core::error::AppError;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dtos::{AssignServiceRequest, CreateUnitRequest, UpdateUnitServiceStatusRequest},
    middleware::ComplexContext,
    models::{AssignService, CreateUnit, Unit, UnitService},
    startup::AppState,
};

pub async fn create_unit(
    State(state): State<AppState>,
    ctx: ComplexContext,
    Json(payload): Json<CreateUnitRequest>,
) -> Result<(StatusCode, Json<Unit>), AppError> {
    payload.validate()?;

    let unit = state
        .db
        .create_unit(&CreateUnit {
            complex_id: ctx.complex_id,
            number: payload.number,
            floor: payload.floor,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(unit)))
}

pub async fn list_units(
    State(state): State<AppState>,
    ctx: ComplexContext,
) -> Result<Json<Vec<Unit>>, AppError> {
    let units = state.db.list_units(ctx.complex_id).await?;
    Ok(Json(units))
}

pub async fn get_unit(
    State(state): State<AppState>,
    ctx: ComplexContext,
    Path(unit_id): Path<Uuid>,
) -> Result<Json<Unit>, AppError> {
    let unit = find_unit(&state, ctx, unit_id).await?;
    Ok(Json(unit))
}

/// Subscribe a unit to a catalog service of the same complex.
pub async fn assign_service(
    State(state): State<AppState>,
    ctx: ComplexContext,
    Path(unit_id): Path<Uuid>,
    Json(payload): Json<AssignServiceRequest>,
) -> Result<(StatusCode, Json<UnitService>), AppError> {
    payload.check()?;

    tracing::info!(
        complex_id = %ctx.complex_id,
        unit_id = %unit_id,
        service_id = %payload.service_id,
        start_date = %payload.start_date,
        "Assigning service to unit"
    );

    let unit_service = state
        .db
        .assign_service(&AssignService {
            complex_id: ctx.complex_id,
            unit_id,
            service_id: payload.service_id,
            start_date: payload.start_date,
            custom_price: payload.custom_price,
            quantity: payload.quantity,
        })
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Unit or service not found")))?;

    Ok((StatusCode::CREATED, Json(unit_service)))
}

pub async fn list_unit_services(
    State(state): State<AppState>,
    ctx: ComplexContext,
    Path(unit_id): Path<Uuid>,
) -> Result<Json<Vec<UnitService>>, AppError> {
    find_unit(&state, ctx, unit_id).await?;
    let unit_services = state.db.list_unit_services(ctx.complex_id, unit_id).await?;
    Ok(Json(unit_services))
}

pub async fn update_unit_service_status(
    State(state): State<AppState>,
    ctx: ComplexContext,
    Path(unit_service_id): Path<Uuid>,
    Json(payload): Json<UpdateUnitServiceStatusRequest>,
) -> Result<Json<UnitService>, AppError> {
    tracing::info!(
        complex_id = %ctx.complex_id,
        unit_service_id = %unit_service_id,
        status = payload.status.as_str(),
        "Updating unit service status"
    );

    let unit_service = state
        .db
        .update_unit_service_status(ctx.complex_id, unit_service_id, payload.status)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Unit service not found")))?;

    Ok(Json(unit_service))
}

pub(crate) async fn find_unit(
    state: &AppState,
    ctx: ComplexContext,
    unit_id: Uuid,
) -> Result<Unit, AppError> {
    state
        .db
        .get_unit(ctx.complex_id, unit_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Unit not found")))
}
