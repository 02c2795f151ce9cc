//! Request and response bodies for the HTTP API.

use crate::billing::BillingRunSummary;
use crate::models::UnitServiceStatus;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use service_core::error::AppError;
use uuid::Uuid;
use validator::{Validate, ValidationError};

fn non_negative(value: &Decimal) -> Result<(), ValidationError> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(ValidationError::new("non_negative"));
    }
    Ok(())
}

fn non_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("non_blank"));
    }
    Ok(())
}

fn trimmed<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = String::deserialize(deserializer)?;
    Ok(value.trim().to_string())
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateUnitRequest {
    /// Surrounding whitespace is stripped before validation.
    #[serde(deserialize_with = "trimmed")]
    #[validate(
        length(min = 1, max = 32, message = "Unit number must be 1-32 characters"),
        custom(function = "non_blank", message = "Unit number cannot be blank")
    )]
    pub number: String,

    #[validate(length(max = 32, message = "Floor must be at most 32 characters"))]
    pub floor: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateServiceRequest {
    #[validate(length(min = 1, max = 128, message = "Service name is required"))]
    pub name: String,

    pub description: Option<String>,

    #[validate(custom(function = "non_negative", message = "Base price cannot be negative"))]
    pub base_price: Decimal,

    #[serde(default)]
    pub is_required: bool,
}

#[derive(Debug, Deserialize, Validate)]
pub struct AssignServiceRequest {
    pub service_id: Uuid,

    pub start_date: NaiveDate,

    pub custom_price: Option<Decimal>,

    #[validate(range(min = 1, message = "Quantity must be at least 1"))]
    pub quantity: Option<i32>,
}

impl AssignServiceRequest {
    /// Field validation plus the price override range.
    pub fn check(&self) -> Result<(), AppError> {
        self.validate()?;
        if let Some(price) = self.custom_price {
            non_negative(&price).map_err(|_| {
                AppError::BadRequest(anyhow::anyhow!("Custom price cannot be negative"))
            })?;
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateUnitServiceStatusRequest {
    pub status: UnitServiceStatus,
}

/// Body returned to the scheduler after a billing run.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct BillingRunResponse {
    pub status: String,
    pub processed: u32,
    pub skipped: u32,
    pub errors: u32,
}

impl From<BillingRunSummary> for BillingRunResponse {
    fn from(summary: BillingRunSummary) -> Self {
        Self {
            status: "success".to_string(),
            processed: summary.processed,
            skipped: summary.skipped,
            errors: summary.errors,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn rejects_negative_base_price() {
        let req: CreateServiceRequest = serde_json::from_value(json!({
            "name": "Parking",
            "base_price": "-1.00"
        }))
        .unwrap();

        assert!(req.validate().is_err());
    }

    #[test]
    fn accepts_free_service() {
        let req: CreateServiceRequest = serde_json::from_value(json!({
            "name": "Bike rack",
            "base_price": "0"
        }))
        .unwrap();

        assert!(req.validate().is_ok());
        assert!(!req.is_required);
    }

    #[test]
    fn rejects_zero_quantity() {
        let req: AssignServiceRequest = serde_json::from_value(json!({
            "service_id": Uuid::new_v4(),
            "start_date": "2025-01-31",
            "quantity": 0
        }))
        .unwrap();

        assert!(req.validate().is_err());
    }

    #[test]
    fn rejects_negative_custom_price() {
        let req: AssignServiceRequest = serde_json::from_value(json!({
            "service_id": Uuid::new_v4(),
            "start_date": "2025-01-31",
            "custom_price": "-5"
        }))
        .unwrap();

        assert!(matches!(req.check(), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn rejects_empty_unit_number() {
        let req = CreateUnitRequest {
            number: String::new(),
            floor: None,
        };

        assert!(req.validate().is_err());
    }

    #[test]
    fn whitespace_only_unit_number_is_rejected() {
        let req: CreateUnitRequest = serde_json::from_value(json!({ "number": "   " })).unwrap();
        assert_eq!(req.number, "");
        assert!(req.validate().is_err());

        let req = CreateUnitRequest {
            number: "   ".to_string(),
            floor: None,
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn unit_number_is_trimmed_before_length_check() {
        let padded = format!("  {}  ", "A".repeat(32));
        let req: CreateUnitRequest = serde_json::from_value(json!({ "number": padded })).unwrap();

        assert_eq!(req.number.len(), 32);
        assert!(req.validate().is_ok());
    }

    #[test]
    fn run_response_reports_success() {
        let body = BillingRunResponse::from(BillingRunSummary {
            processed: 2,
            skipped: 1,
            errors: 0,
        });

        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({ "status": "success", "processed": 2, "skipped": 1, "errors": 0 })
        );
    }
}
