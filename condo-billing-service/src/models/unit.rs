//! Unit model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A residential or commercial space within a complex.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Unit {
    pub unit_id: Uuid,
    pub complex_id: Uuid,
    pub number: String,
    pub floor: Option<String>,
    pub created_utc: DateTime<Utc>,
}

/// Input for creating a unit.
#[derive(Debug, Clone)]
pub struct CreateUnit {
    pub complex_id: Uuid,
    pub number: String,
    pub floor: Option<String>,
}
