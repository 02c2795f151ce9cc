//! Database service for condo-billing-service.

use crate::billing::{BillingError, BillingPeriod, BillingStore};
use crate::models::{
    AssignService, BillableSubscription, CatalogService, CreateCatalogService, CreateUnit,
    Invoice, InvoiceItem, InvoiceStatus, NewInvoice, Unit, UnitService, UnitServiceStatus,
};
use crate::services::metrics::DB_QUERY_DURATION;
use async_trait::async_trait;
use service_core::error::AppError;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use tracing::{info, instrument};
use uuid::Uuid;

const PERIOD_INVOICED_SQL: &str = r#"
    SELECT EXISTS (
        SELECT 1
        FROM invoice_items ii
        JOIN invoices i ON i.invoice_id = ii.invoice_id
        WHERE i.unit_id = $1
          AND ii.service_id = $2
          AND i.period_month = $3
          AND i.period_year = $4
          AND i.status <> 'cancelled'
    )
"#;

/// Database connection pool wrapper.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Create a new database connection pool.
    #[instrument(skip(database_url), fields(service = "condo-billing-service"))]
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self, AppError> {
        info!(
            max_connections = max_connections,
            min_connections = min_connections,
            "Connecting to PostgreSQL"
        );

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(Duration::from_secs(30))
            .idle_timeout(Duration::from_secs(600))
            .connect(database_url)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to connect: {}", e)))?;

        info!("PostgreSQL connection pool established");

        Ok(Self { pool })
    }

    /// Create a pool that opens connections on first use.
    pub fn connect_lazy(database_url: &str, max_connections: u32) -> Result<Self, AppError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(5))
            .connect_lazy(database_url)
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Invalid database URL: {}", e))
            })?;

        Ok(Self { pool })
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Check database health.
    #[instrument(skip(self))]
    pub async fn health_check(&self) -> Result<(), AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["health_check"])
            .start_timer();

        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Health check failed: {}", e)))?;

        timer.observe_duration();
        Ok(())
    }

    /// Run database migrations.
    #[instrument(skip(self))]
    pub async fn run_migrations(&self) -> Result<(), AppError> {
        info!("Running database migrations");
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Migration failed: {}", e)))?;
        info!("Database migrations completed");
        Ok(())
    }

    // =========================================================================
    // Unit Operations
    // =========================================================================

    #[instrument(skip(self, input), fields(complex_id = %input.complex_id))]
    pub async fn create_unit(&self, input: &CreateUnit) -> Result<Unit, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["create_unit"])
            .start_timer();

        let unit = sqlx::query_as::<_, Unit>(
            r#"
            INSERT INTO units (unit_id, complex_id, number, floor)
            VALUES ($1, $2, $3, $4)
            RETURNING unit_id, complex_id, number, floor, created_utc
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(input.complex_id)
        .bind(&input.number)
        .bind(&input.floor)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                AppError::Conflict(anyhow::anyhow!("Unit '{}' already exists", input.number))
            }
            _ => AppError::DatabaseError(anyhow::anyhow!("Failed to create unit: {}", e)),
        })?;

        timer.observe_duration();
        info!(unit_id = %unit.unit_id, number = %unit.number, "Unit created");

        Ok(unit)
    }

    #[instrument(skip(self), fields(complex_id = %complex_id, unit_id = %unit_id))]
    pub async fn get_unit(&self, complex_id: Uuid, unit_id: Uuid) -> Result<Option<Unit>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_unit"])
            .start_timer();

        let unit = sqlx::query_as::<_, Unit>(
            r#"
            SELECT unit_id, complex_id, number, floor, created_utc
            FROM units
            WHERE complex_id = $1 AND unit_id = $2
            "#,
        )
        .bind(complex_id)
        .bind(unit_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get unit: {}", e)))?;

        timer.observe_duration();

        Ok(unit)
    }

    #[instrument(skip(self), fields(complex_id = %complex_id))]
    pub async fn list_units(&self, complex_id: Uuid) -> Result<Vec<Unit>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_units"])
            .start_timer();

        let units = sqlx::query_as::<_, Unit>(
            r#"
            SELECT unit_id, complex_id, number, floor, created_utc
            FROM units
            WHERE complex_id = $1
            ORDER BY number
            "#,
        )
        .bind(complex_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to list units: {}", e)))?;

        timer.observe_duration();

        Ok(units)
    }

    // =========================================================================
    // Catalog Operations
    // =========================================================================

    #[instrument(skip(self, input), fields(complex_id = %input.complex_id))]
    pub async fn create_service(
        &self,
        input: &CreateCatalogService,
    ) -> Result<CatalogService, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["create_service"])
            .start_timer();

        let service = sqlx::query_as::<_, CatalogService>(
            r#"
            INSERT INTO services (service_id, complex_id, name, description, base_price, is_required)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING service_id, complex_id, name, description, base_price, is_required, created_utc
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(input.complex_id)
        .bind(&input.name)
        .bind(&input.description)
        .bind(input.base_price)
        .bind(input.is_required)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                AppError::Conflict(anyhow::anyhow!("Service '{}' already exists", input.name))
            }
            _ => AppError::DatabaseError(anyhow::anyhow!("Failed to create service: {}", e)),
        })?;

        timer.observe_duration();
        info!(service_id = %service.service_id, name = %service.name, "Catalog service created");

        Ok(service)
    }

    #[instrument(skip(self), fields(complex_id = %complex_id))]
    pub async fn list_services(&self, complex_id: Uuid) -> Result<Vec<CatalogService>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_services"])
            .start_timer();

        let services = sqlx::query_as::<_, CatalogService>(
            r#"
            SELECT service_id, complex_id, name, description, base_price, is_required, created_utc
            FROM services
            WHERE complex_id = $1
            ORDER BY name
            "#,
        )
        .bind(complex_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to list services: {}", e)))?;

        timer.observe_duration();

        Ok(services)
    }

    // =========================================================================
    // Subscription Operations
    // =========================================================================

    /// Subscribe a unit to a catalog service. Returns `None` when the unit or
    /// the service does not belong to the complex.
    #[instrument(skip(self, input), fields(complex_id = %input.complex_id, unit_id = %input.unit_id))]
    pub async fn assign_service(
        &self,
        input: &AssignService,
    ) -> Result<Option<UnitService>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["assign_service"])
            .start_timer();

        let unit_service = sqlx::query_as::<_, UnitService>(
            r#"
            INSERT INTO unit_services (unit_service_id, unit_id, service_id, status, start_date, custom_price, quantity)
            SELECT $1, u.unit_id, s.service_id, 'active', $5, $6, COALESCE($7, 1)
            FROM units u
            JOIN services s ON s.complex_id = u.complex_id
            WHERE u.complex_id = $2 AND u.unit_id = $3 AND s.service_id = $4
            RETURNING unit_service_id, unit_id, service_id, status, start_date, custom_price, quantity, created_utc, updated_utc
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(input.complex_id)
        .bind(input.unit_id)
        .bind(input.service_id)
        .bind(input.start_date)
        .bind(input.custom_price)
        .bind(input.quantity)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to assign service: {}", e)))?;

        timer.observe_duration();

        if let Some(ref us) = unit_service {
            info!(unit_service_id = %us.unit_service_id, service_id = %us.service_id, "Service assigned to unit");
        }

        Ok(unit_service)
    }

    #[instrument(skip(self), fields(complex_id = %complex_id, unit_id = %unit_id))]
    pub async fn list_unit_services(
        &self,
        complex_id: Uuid,
        unit_id: Uuid,
    ) -> Result<Vec<UnitService>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_unit_services"])
            .start_timer();

        let unit_services = sqlx::query_as::<_, UnitService>(
            r#"
            SELECT us.unit_service_id, us.unit_id, us.service_id, us.status, us.start_date,
                us.custom_price, us.quantity, us.created_utc, us.updated_utc
            FROM unit_services us
            JOIN units u ON u.unit_id = us.unit_id
            WHERE u.complex_id = $1 AND us.unit_id = $2
            ORDER BY us.created_utc
            "#,
        )
        .bind(complex_id)
        .bind(unit_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to list unit services: {}", e))
        })?;

        timer.observe_duration();

        Ok(unit_services)
    }

    #[instrument(skip(self), fields(complex_id = %complex_id, unit_service_id = %unit_service_id))]
    pub async fn update_unit_service_status(
        &self,
        complex_id: Uuid,
        unit_service_id: Uuid,
        status: UnitServiceStatus,
    ) -> Result<Option<UnitService>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["update_unit_service_status"])
            .start_timer();

        let unit_service = sqlx::query_as::<_, UnitService>(
            r#"
            UPDATE unit_services us
            SET status = $3, updated_utc = NOW()
            FROM units u
            WHERE u.unit_id = us.unit_id AND u.complex_id = $1 AND us.unit_service_id = $2
            RETURNING us.unit_service_id, us.unit_id, us.service_id, us.status, us.start_date,
                us.custom_price, us.quantity, us.created_utc, us.updated_utc
            "#,
        )
        .bind(complex_id)
        .bind(unit_service_id)
        .bind(status.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to update unit service: {}", e))
        })?;

        timer.observe_duration();

        if unit_service.is_some() {
            info!(status = status.as_str(), "Unit service status updated");
        }

        Ok(unit_service)
    }

    // =========================================================================
    // Invoice Operations
    // =========================================================================

    #[instrument(skip(self), fields(complex_id = %complex_id, unit_id = %unit_id))]
    pub async fn list_unit_invoices(
        &self,
        complex_id: Uuid,
        unit_id: Uuid,
    ) -> Result<Vec<Invoice>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_unit_invoices"])
            .start_timer();

        let invoices = sqlx::query_as::<_, Invoice>(
            r#"
            SELECT invoice_id, complex_id, unit_id, number, period_month, period_year, total_amount,
                status, due_date, created_utc, paid_utc, cancelled_utc
            FROM invoices
            WHERE complex_id = $1 AND unit_id = $2
            ORDER BY period_year DESC, period_month DESC, created_utc DESC
            "#,
        )
        .bind(complex_id)
        .bind(unit_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to list invoices: {}", e)))?;

        timer.observe_duration();

        Ok(invoices)
    }

    #[instrument(skip(self), fields(complex_id = %complex_id, invoice_id = %invoice_id))]
    pub async fn get_invoice(
        &self,
        complex_id: Uuid,
        invoice_id: Uuid,
    ) -> Result<Option<Invoice>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_invoice"])
            .start_timer();

        let invoice = sqlx::query_as::<_, Invoice>(
            r#"
            SELECT invoice_id, complex_id, unit_id, number, period_month, period_year, total_amount,
                status, due_date, created_utc, paid_utc, cancelled_utc
            FROM invoices
            WHERE complex_id = $1 AND invoice_id = $2
            "#,
        )
        .bind(complex_id)
        .bind(invoice_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get invoice: {}", e)))?;

        timer.observe_duration();

        Ok(invoice)
    }

    #[instrument(skip(self), fields(invoice_id = %invoice_id))]
    pub async fn get_invoice_items(&self, invoice_id: Uuid) -> Result<Vec<InvoiceItem>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_invoice_items"])
            .start_timer();

        let items = sqlx::query_as::<_, InvoiceItem>(
            r#"
            SELECT item_id, invoice_id, service_id, description, quantity, unit_price, amount, created_utc
            FROM invoice_items
            WHERE invoice_id = $1
            ORDER BY created_utc
            "#,
        )
        .bind(invoice_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to get invoice items: {}", e))
        })?;

        timer.observe_duration();

        Ok(items)
    }

    /// Move an open invoice to `paid` or `cancelled`.
    #[instrument(skip(self), fields(complex_id = %complex_id, invoice_id = %invoice_id))]
    pub async fn transition_invoice(
        &self,
        complex_id: Uuid,
        invoice_id: Uuid,
        next: InvoiceStatus,
    ) -> Result<Option<Invoice>, AppError> {
        let existing = self.get_invoice(complex_id, invoice_id).await?;
        match existing {
            Some(inv) if InvoiceStatus::from_string(&inv.status).can_transition_to(next) => {}
            Some(inv) => {
                return Err(AppError::BadRequest(anyhow::anyhow!(
                    "Invoice in status '{}' cannot become '{}'",
                    inv.status,
                    next.as_str()
                )))
            }
            None => return Ok(None),
        };

        let timer = DB_QUERY_DURATION
            .with_label_values(&["transition_invoice"])
            .start_timer();

        let invoice = sqlx::query_as::<_, Invoice>(
            r#"
            UPDATE invoices
            SET status = $3,
                paid_utc = CASE WHEN $3 = 'paid' THEN NOW() ELSE paid_utc END,
                cancelled_utc = CASE WHEN $3 = 'cancelled' THEN NOW() ELSE cancelled_utc END
            WHERE complex_id = $1 AND invoice_id = $2 AND status IN ('pending', 'overdue')
            RETURNING invoice_id, complex_id, unit_id, number, period_month, period_year, total_amount,
                status, due_date, created_utc, paid_utc, cancelled_utc
            "#,
        )
        .bind(complex_id)
        .bind(invoice_id)
        .bind(next.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to update invoice: {}", e)))?;

        timer.observe_duration();

        match invoice {
            Some(inv) => {
                info!(invoice_id = %inv.invoice_id, status = %inv.status, "Invoice status changed");
                Ok(Some(inv))
            }
            // Another request settled the invoice between the read and the update.
            None => Err(AppError::Conflict(anyhow::anyhow!(
                "Invoice status changed concurrently"
            ))),
        }
    }
}

#[async_trait]
impl BillingStore for Database {
    #[instrument(skip(self))]
    async fn billable_subscriptions(&self) -> Result<Vec<BillableSubscription>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["billable_subscriptions"])
            .start_timer();

        let subscriptions = sqlx::query_as::<_, BillableSubscription>(
            r#"
            SELECT us.unit_service_id, u.complex_id, u.unit_id, u.number AS unit_number,
                s.service_id, s.name AS service_name, s.base_price, us.custom_price,
                us.quantity, us.start_date
            FROM unit_services us
            JOIN units u ON u.unit_id = us.unit_id
            JOIN services s ON s.service_id = us.service_id
            WHERE us.status = 'active' AND s.is_required = FALSE
            ORDER BY u.complex_id, u.number, s.name
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!(
                "Failed to load billable subscriptions: {}",
                e
            ))
        })?;

        timer.observe_duration();

        Ok(subscriptions)
    }

    #[instrument(skip(self), fields(period = %period))]
    async fn period_invoiced(
        &self,
        unit_id: Uuid,
        service_id: Uuid,
        period: BillingPeriod,
    ) -> Result<bool, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["period_invoiced"])
            .start_timer();

        let exists: bool = sqlx::query_scalar(PERIOD_INVOICED_SQL)
            .bind(unit_id)
            .bind(service_id)
            .bind(period.month_i32())
            .bind(period.year)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to check invoice period: {}", e))
            })?;

        timer.observe_duration();

        Ok(exists)
    }

    /// Serialises writers for the same unit, service and period with a
    /// transaction-scoped advisory lock, then re-checks the period before
    /// inserting.
    #[instrument(skip(self, invoice), fields(unit_id = %invoice.unit_id, number = %invoice.number))]
    async fn create_period_invoice(&self, invoice: &NewInvoice) -> Result<Invoice, BillingError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["create_period_invoice"])
            .start_timer();

        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to begin transaction: {}", e))
        })?;

        let lock_key = format!(
            "invoice:{}:{}:{}-{:02}",
            invoice.unit_id, invoice.item.service_id, invoice.period_year, invoice.period_month
        );
        sqlx::query("SELECT pg_advisory_xact_lock(hashtextextended($1, 0))")
            .bind(&lock_key)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to acquire period lock: {}", e))
            })?;

        let exists: bool = sqlx::query_scalar(PERIOD_INVOICED_SQL)
            .bind(invoice.unit_id)
            .bind(invoice.item.service_id)
            .bind(invoice.period_month)
            .bind(invoice.period_year)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to check invoice period: {}", e))
            })?;

        if exists {
            return Err(BillingError::AlreadyInvoiced);
        }

        let created = sqlx::query_as::<_, Invoice>(
            r#"
            INSERT INTO invoices (invoice_id, complex_id, unit_id, number, period_month, period_year,
                total_amount, status, due_date)
            VALUES ($1, $2, $3, $4, $5, $6, $7, 'pending', $8)
            RETURNING invoice_id, complex_id, unit_id, number, period_month, period_year, total_amount,
                status, due_date, created_utc, paid_utc, cancelled_utc
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(invoice.complex_id)
        .bind(invoice.unit_id)
        .bind(&invoice.number)
        .bind(invoice.period_month)
        .bind(invoice.period_year)
        .bind(invoice.total_amount)
        .bind(invoice.due_date)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                BillingError::DuplicateNumber(invoice.number.clone())
            }
            _ => BillingError::Store(AppError::DatabaseError(anyhow::anyhow!(
                "Failed to create invoice: {}",
                e
            ))),
        })?;

        sqlx::query(
            r#"
            INSERT INTO invoice_items (item_id, invoice_id, service_id, description, quantity, unit_price, amount)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(created.invoice_id)
        .bind(invoice.item.service_id)
        .bind(&invoice.item.description)
        .bind(invoice.item.quantity)
        .bind(invoice.item.unit_price)
        .bind(invoice.item.amount)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to create invoice item: {}", e))
        })?;

        tx.commit().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to commit invoice: {}", e))
        })?;

        timer.observe_duration();

        Ok(created)
    }
}
