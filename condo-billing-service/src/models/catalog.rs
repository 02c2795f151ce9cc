//! Service catalog model.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A billable offering (parking, gym, storage) that units can subscribe to.
///
/// Required services are billed when they are assigned and never pass
/// through the recurring scanner.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CatalogService {
    pub service_id: Uuid,
    pub complex_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub base_price: Decimal,
    pub is_required: bool,
    pub created_utc: DateTime<Utc>,
}

/// Input for creating a catalog service.
#[derive(Debug, Clone)]
pub struct CreateCatalogService {
    pub complex_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub base_price: Decimal,
    pub is_required: bool,
}
