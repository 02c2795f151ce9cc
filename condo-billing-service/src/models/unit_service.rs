//! Unit-service subscription model.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Subscription status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitServiceStatus {
    Active,
    Inactive,
}

impl UnitServiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnitServiceStatus::Active => "active",
            UnitServiceStatus::Inactive => "inactive",
        }
    }
}

/// Subscription of a unit to a catalog service.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UnitService {
    pub unit_service_id: Uuid,
    pub unit_id: Uuid,
    pub service_id: Uuid,
    pub status: String,
    pub start_date: NaiveDate,
    pub custom_price: Option<Decimal>,
    pub quantity: Option<i32>,
    pub created_utc: DateTime<Utc>,
    pub updated_utc: DateTime<Utc>,
}

/// Input for assigning a service to a unit.
#[derive(Debug, Clone)]
pub struct AssignService {
    pub complex_id: Uuid,
    pub unit_id: Uuid,
    pub service_id: Uuid,
    pub start_date: NaiveDate,
    pub custom_price: Option<Decimal>,
    pub quantity: Option<i32>,
}

/// An active, optional subscription joined with the unit and catalog
/// columns the billing run needs.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct BillableSubscription {
    pub unit_service_id: Uuid,
    pub complex_id: Uuid,
    pub unit_id: Uuid,
    pub unit_number: String,
    pub service_id: Uuid,
    pub service_name: String,
    pub base_price: Decimal,
    pub custom_price: Option<Decimal>,
    pub quantity: Option<i32>,
    pub start_date: NaiveDate,
}

impl BillableSubscription {
    /// Price per unit: the subscription override, else the catalog price.
    pub fn unit_price(&self) -> Decimal {
        self.custom_price.unwrap_or(self.base_price)
    }

    pub fn billed_quantity(&self) -> i32 {
        self.quantity.unwrap_or(1)
    }

    pub fn total(&self) -> Decimal {
        self.unit_price() * Decimal::from(self.billed_quantity())
    }
}
