//! Application startup and lifecycle management.

use crate::billing::{BillingRunner, BillingStore};
use crate::config::CondoBillingConfig;
use crate::handlers;
use crate::middleware::metrics_middleware;
use crate::services::{init_metrics, Database};
use axum::{
    middleware,
    routing::{get, patch, post},
    Router,
};
use secrecy::ExposeSecret;
use service_core::error::AppError;
use service_core::middleware::tracing::{http_request_span, request_id_middleware};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: CondoBillingConfig,
    pub db: Arc<Database>,
    pub billing: BillingRunner,
}

/// Build the HTTP router for the given state.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::readiness_check))
        .route("/metrics", get(handlers::metrics_handler))
        // Scheduler trigger
        .route("/api/cron/billing", get(handlers::billing::run_billing))
        // Administration (complex-scoped)
        .route(
            "/api/units",
            post(handlers::units::create_unit).get(handlers::units::list_units),
        )
        .route("/api/units/:id", get(handlers::units::get_unit))
        .route(
            "/api/units/:id/services",
            post(handlers::units::assign_service).get(handlers::units::list_unit_services),
        )
        .route(
            "/api/unit-services/:id/status",
            patch(handlers::units::update_unit_service_status),
        )
        .route(
            "/api/services",
            post(handlers::catalog::create_service).get(handlers::catalog::list_services),
        )
        .route(
            "/api/units/:id/invoices",
            get(handlers::invoices::list_unit_invoices),
        )
        .route("/api/invoices/:id", get(handlers::invoices::get_invoice))
        .route("/api/invoices/:id/pay", post(handlers::invoices::pay_invoice))
        .route(
            "/api/invoices/:id/cancel",
            post(handlers::invoices::cancel_invoice),
        )
        .route_layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http().make_span_with(http_request_span))
        .layer(middleware::from_fn(request_id_middleware))
        .with_state(state)
}

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    state: AppState,
}

impl Application {
    /// Build the application with the given configuration.
    pub async fn build(config: CondoBillingConfig) -> Result<Self, AppError> {
        Self::build_internal(config, true).await
    }

    /// Build the application without running migrations.
    /// Use this in tests when migrations are already applied by the test harness.
    pub async fn build_without_migrations(config: CondoBillingConfig) -> Result<Self, AppError> {
        Self::build_internal(config, false).await
    }

    async fn build_internal(
        config: CondoBillingConfig,
        run_migrations: bool,
    ) -> Result<Self, AppError> {
        init_metrics();

        let db = Database::new(
            config.database.url.expose_secret(),
            config.database.max_connections,
            config.database.min_connections,
        )
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to connect to PostgreSQL");
            e
        })?;

        if run_migrations {
            db.run_migrations().await.map_err(|e| {
                tracing::error!(error = %e, "Failed to run migrations");
                e
            })?;
        }

        let db = Arc::new(db);
        let store: Arc<dyn BillingStore> = db.clone();
        let billing = BillingRunner::new(store, config.billing.invoice_number_attempts);

        if config.billing.cron_secret.is_none() {
            tracing::warn!("CRON_SECRET not configured - billing trigger is unauthenticated");
        }

        let state = AppState {
            config: config.clone(),
            db,
            billing,
        };

        // Port 0 binds a random port for testing
        let addr = config.common.socket_addr();
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!(error = %e, addr = %addr, "Failed to bind HTTP listener");
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!(port = port, "Condo billing service listener bound");

        Ok(Self {
            port,
            listener,
            state,
        })
    }

    /// Get the port the server is listening on.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Get a reference to the database.
    pub fn db(&self) -> &Database {
        &self.state.db
    }

    /// Run the application until stopped.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        let router = build_router(self.state);

        tracing::info!(
            service = "condo-billing-service",
            version = env!("CARGO_PKG_VERSION"),
            port = self.port,
            "Service ready to accept connections"
        );

        axum::serve(self.listener, router).await.map_err(|e| {
            tracing::error!(error = %e, "HTTP server error");
            std::io::Error::other(format!("HTTP server error: {}", e))
        })
    }
}
