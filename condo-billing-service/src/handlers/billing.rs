//! Scheduler-facing billing trigger.

use crate::dtos::BillingRunResponse;
use crate::services::record_error;
use crate::startup::AppState;
use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use secrecy::ExposeSecret;
use serde_json::json;
use service_core::utils::secret::{bearer_token, secrets_match};

/// `GET /api/cron/billing`
///
/// Runs one billing pass for today's date (UTC) and reports the tallies.
/// A failure before the scan starts yields 500 with `{ "error": ... }`.
pub async fn run_billing(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if let Some(secret) = &state.config.billing.cron_secret {
        let authorized = bearer_token(&headers)
            .map(|token| secrets_match(secret.expose_secret(), token))
            .unwrap_or(false);

        if !authorized {
            tracing::warn!("Rejected billing trigger with missing or invalid secret");
            record_error("cron_unauthorized");
            return (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "error": "Unauthorized" })),
            )
                .into_response();
        }
    }

    let today = Utc::now().date_naive();

    match state.billing.run(today).await {
        Ok(summary) => (StatusCode::OK, Json(BillingRunResponse::from(summary))).into_response(),
        Err(e) => {
            record_error("billing_run");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": e.to_string() })),
            )
                .into_response()
        }
    }
}
