use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::review::Review;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateReviewPayload {
    pub booking_id: Uuid,
    #[validate(range(min = 1, max = 5))]
    pub rating: i32,
    #[validate(length(max = 1000))]
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, Default)]
pub struct UpdateReviewPayload {
    #[validate(range(min = 1, max = 5))]
    pub rating: Option<i32>,
    #[validate(length(max = 1000))]
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewResponse {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub rating: i32,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<Review> for ReviewResponse {
    fn from(review: Review) -> Self {
        Self {
            id: review.id,
            booking_id: review.booking_id,
            rating: review.rating,
            comment: review.comment,
            created_at: review.created_at,
        }
    }
}

/// Aggregates over all reviews attached to a service's bookings.
/// An empty set yields count 0 and nulls for the rating fields.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ReviewStats {
    pub total_reviews: i64,
    pub average_rating: Option<f64>,
    pub min_rating: Option<i32>,
    pub max_rating: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ReviewListQuery {
    pub skip: Option<i64>,
    pub limit: Option<i64>,
    pub min_rating: Option<i32>,
    pub max_rating: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AdminReviewListQuery {
    pub skip: Option<i64>,
    pub limit: Option<i64>,
    pub user_id: Option<Uuid>,
    pub service_id: Option<Uuid>,
    pub min_rating: Option<i32>,
    pub max_rating: Option<i32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rating_must_stay_within_bounds() {
        for rating in [0, 6, -1] {
            let payload = CreateReviewPayload {
                booking_id: Uuid::new_v4(),
                rating,
                comment: None,
            };
            assert!(payload.validate().is_err(), "rating {} accepted", rating);
        }
        let ok = CreateReviewPayload {
            booking_id: Uuid::new_v4(),
            rating: 5,
            comment: Some("great".into()),
        };
        assert!(ok.validate().is_ok());
    }

    #[test]
    fn update_allows_partial_patch() {
        let payload = UpdateReviewPayload {
            rating: None,
            comment: Some("edited".into()),
        };
        assert!(payload.validate().is_ok());

        let bad = UpdateReviewPayload {
            rating: Some(9),
            comment: None,
        };
        assert!(bad.validate().is_err());
    }
}
