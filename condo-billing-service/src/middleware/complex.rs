//! Complex (tenant) context for the administration endpoints.
//!
//! Every administration request is scoped to one residential complex,
//! identified by the `X-Complex-ID` header set by the portal's gateway.
//! Queries filter on it so one complex never sees another's records.

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use service_core::error::AppError;
use uuid::Uuid;

pub const COMPLEX_ID_HEADER: &str = "x-complex-id";

/// Complex the request operates on.
#[derive(Debug, Clone, Copy)]
pub struct ComplexContext {
    pub complex_id: Uuid,
}

#[async_trait]
impl<S> FromRequestParts<S> for ComplexContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(COMPLEX_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AppError::Unauthorized(anyhow::anyhow!("Missing X-Complex-ID header")))?;

        let complex_id = Uuid::parse_str(raw.trim()).map_err(|_| {
            AppError::Unauthorized(anyhow::anyhow!("Invalid X-Complex-ID header"))
        })?;

        tracing::Span::current().record("complex_id", tracing::field::display(complex_id));

        Ok(ComplexContext { complex_id })
    }
}
