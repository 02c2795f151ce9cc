//! Service catalog handlers.

use axum::{extract::State, http::StatusCode, Json};
use service_core::error::AppError;
use validator::Validate;

use crate::{
    dtos::CreateServiceRequest,
    middleware::ComplexContext,
    models::{CatalogService, CreateCatalogService},
    startup::AppState,
};

pub async fn create_service(
    State(state): State<AppState>,
    ctx: ComplexContext,
    Json(payload): Json<CreateServiceRequest>,
) -> Result<(StatusCode, Json<CatalogService>), AppError> {
    payload.validate()?;

    tracing::info!(
        complex_id = %ctx.complex_id,
        name = %payload.name,
        is_required = payload.is_required,
        "Creating catalog service"
    );

    let service = state
        .db
        .create_service(&CreateCatalogService {
            complex_id: ctx.complex_id,
            name: payload.name,
            description: payload.description,
            base_price: payload.base_price,
            is_required: payload.is_required,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(service)))
}

pub async fn list_services(
    State(state): State<AppState>,
    ctx: ComplexContext,
) -> Result<Json<Vec<CatalogService>>, AppError> {
    let services = state.db.list_services(ctx.complex_id).await?;
    Ok(Json(services))
}
