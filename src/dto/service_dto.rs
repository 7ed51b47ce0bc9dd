use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::models::service::Service;

fn validate_price(price: &Decimal) -> Result<(), ValidationError> {
    if price.is_sign_negative() {
        return Err(ValidationError::new("negative_price"));
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateServicePayload {
    #[validate(length(min = 1))]
    pub title: String,
    pub description: Option<String>,
    #[validate(custom(function = "validate_price"))]
    pub price: Decimal,
    #[validate(range(min = 1))]
    pub duration_minutes: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UpdateServicePayload {
    #[validate(length(min = 1))]
    pub title: Option<String>,
    pub description: Option<String>,
    #[validate(custom(function = "validate_price"))]
    pub price: Option<Decimal>,
    #[validate(range(min = 1))]
    pub duration_minutes: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceResponse {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub duration_minutes: i32,
    pub is_active: bool,
    pub owner_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl From<Service> for ServiceResponse {
    fn from(service: Service) -> Self {
        Self {
            id: service.id,
            title: service.title,
            description: service.description,
            price: service.price,
            duration_minutes: service.duration_minutes,
            is_active: service.is_active,
            owner_id: service.owner_id,
            created_at: service.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ServiceListQuery {
    pub skip: Option<i64>,
    pub limit: Option<i64>,
    pub q: Option<String>,
    pub price_min: Option<Decimal>,
    pub price_max: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AdminServiceListQuery {
    pub skip: Option<i64>,
    pub limit: Option<i64>,
    pub q: Option<String>,
    pub price_min: Option<Decimal>,
    pub price_max: Option<Decimal>,
    pub active: Option<bool>,
    pub owner_id: Option<Uuid>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_rejects_negative_price() {
        let payload = CreateServicePayload {
            title: "Babysitting".into(),
            description: None,
            price: Decimal::new(-100, 2),
            duration_minutes: 60,
        };
        assert!(payload.validate().is_err());
    }

    #[test]
    fn create_rejects_zero_duration() {
        let payload = CreateServicePayload {
            title: "Babysitting".into(),
            description: None,
            price: Decimal::new(5000, 2),
            duration_minutes: 0,
        };
        assert!(payload.validate().is_err());
    }
}
