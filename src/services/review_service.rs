use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::info;
use uuid::Uuid;

use crate::dto::review_dto::{AdminReviewListQuery, CreateReviewPayload, ReviewStats, UpdateReviewPayload};
use crate::error::{Error, Result};
use crate::models::booking::Booking;
use crate::models::review::Review;
use crate::models::user::User;

const REVIEW_COLUMNS: &str = "id, booking_id, rating, comment, created_at";

/// Reviews attach 1:1 to completed bookings; the review's author is the
/// booking's user, derived rather than denormalized.
#[derive(Clone)]
pub struct ReviewService {
    pool: PgPool,
}

impl ReviewService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, user_id: Uuid, payload: CreateReviewPayload) -> Result<Review> {
        // The booking must exist AND belong to the caller; the two cases
        // are deliberately indistinguishable.
        let booking = sqlx::query_as::<_, Booking>(
            "SELECT id, user_id, service_id, start_time, end_time, status, created_at
             FROM bookings WHERE id = $1 AND user_id = $2",
        )
        .bind(payload.booking_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        let Some(booking) = booking else {
            return Err(Error::NotFound(
                "Booking not found or does not belong to you".to_string(),
            ));
        };

        if booking.status != "completed" {
            return Err(Error::BadRequest(
                "Can only review completed bookings".to_string(),
            ));
        }

        let already_reviewed = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM reviews WHERE booking_id = $1)",
        )
        .bind(booking.id)
        .fetch_one(&self.pool)
        .await?;
        if already_reviewed {
            return Err(Error::Conflict(
                "A review already exists for this booking".to_string(),
            ));
        }

        // unique(booking_id) backstops the check above under races.
        let review = sqlx::query_as::<_, Review>(&format!(
            "INSERT INTO reviews (booking_id, rating, comment)
             VALUES ($1, $2, $3)
             RETURNING {REVIEW_COLUMNS}"
        ))
        .bind(booking.id)
        .bind(payload.rating)
        .bind(&payload.comment)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match Error::from(e) {
            Error::Conflict(_) => {
                Error::Conflict("A review already exists for this booking".to_string())
            }
            other => other,
        })?;
        info!("Review created: {} for booking {}", review.id, booking.id);
        Ok(review)
    }

    pub async fn get_by_id(&self, review_id: Uuid) -> Result<Review> {
        let review = sqlx::query_as::<_, Review>(&format!(
            "SELECT {REVIEW_COLUMNS} FROM reviews WHERE id = $1"
        ))
        .bind(review_id)
        .fetch_optional(&self.pool)
        .await?;
        review.ok_or_else(|| Error::NotFound("Review not found".to_string()))
    }

    pub async fn get_by_booking(&self, booking_id: Uuid) -> Result<Review> {
        let review = sqlx::query_as::<_, Review>(&format!(
            "SELECT {REVIEW_COLUMNS} FROM reviews WHERE booking_id = $1"
        ))
        .bind(booking_id)
        .fetch_optional(&self.pool)
        .await?;
        review.ok_or_else(|| Error::NotFound("Review not found for this booking".to_string()))
    }

    /// Filtered listing. User and service filters reach through the
    /// booking relation; the join is only added when needed.
    pub async fn list(&self, query: AdminReviewListQuery) -> Result<Vec<Review>> {
        let limit = query.limit.unwrap_or(100).clamp(1, 100);
        let skip = query.skip.unwrap_or(0).max(0);
        let needs_booking_join = query.user_id.is_some() || query.service_id.is_some();

        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(
            "SELECT r.id, r.booking_id, r.rating, r.comment, r.created_at FROM reviews r",
        );
        if needs_booking_join {
            builder.push(" JOIN bookings b ON r.booking_id = b.id");
        }
        builder.push(" WHERE 1=1");
        if let Some(user_id) = query.user_id {
            builder.push(" AND b.user_id = ");
            builder.push_bind(user_id);
        }
        if let Some(service_id) = query.service_id {
            builder.push(" AND b.service_id = ");
            builder.push_bind(service_id);
        }
        if let Some(min_rating) = query.min_rating {
            builder.push(" AND r.rating >= ");
            builder.push_bind(min_rating);
        }
        if let Some(max_rating) = query.max_rating {
            builder.push(" AND r.rating <= ");
            builder.push_bind(max_rating);
        }
        builder.push(" ORDER BY r.created_at DESC, r.id LIMIT ");
        builder.push_bind(limit);
        builder.push(" OFFSET ");
        builder.push_bind(skip);

        let reviews = builder
            .build_query_as::<Review>()
            .fetch_all(&self.pool)
            .await?;
        Ok(reviews)
    }

    async fn owns_review(&self, review: &Review, user_id: Uuid) -> Result<bool> {
        let owner = sqlx::query_scalar::<_, Uuid>(
            "SELECT user_id FROM bookings WHERE id = $1",
        )
        .bind(review.booking_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(owner == Some(user_id))
    }

    /// Only the derived owner may update a review; admins get no bypass
    /// here, unlike delete.
    pub async fn update(
        &self,
        caller: &User,
        review_id: Uuid,
        payload: UpdateReviewPayload,
    ) -> Result<Review> {
        let review = self.get_by_id(review_id).await?;
        if !self.owns_review(&review, caller.id).await? {
            return Err(Error::Forbidden(
                "Not authorized to update this review".to_string(),
            ));
        }

        let updated = sqlx::query_as::<_, Review>(&format!(
            "UPDATE reviews
             SET rating = COALESCE($2, rating),
                 comment = COALESCE($3, comment)
             WHERE id = $1
             RETURNING {REVIEW_COLUMNS}"
        ))
        .bind(review.id)
        .bind(payload.rating)
        .bind(payload.comment)
        .fetch_one(&self.pool)
        .await?;
        info!("Review updated: {}", review_id);
        Ok(updated)
    }

    /// Removal is permanent; reviews have no soft-delete.
    pub async fn delete(&self, caller: &User, review_id: Uuid) -> Result<Review> {
        let review = self.get_by_id(review_id).await?;
        if !caller.is_admin() && !self.owns_review(&review, caller.id).await? {
            return Err(Error::Forbidden(
                "Not authorized to delete this review".to_string(),
            ));
        }

        sqlx::query("DELETE FROM reviews WHERE id = $1")
            .bind(review.id)
            .execute(&self.pool)
            .await?;
        info!("Review deleted: {}", review_id);
        Ok(review)
    }

    pub async fn service_stats(&self, service_id: Uuid) -> Result<ReviewStats> {
        let stats = sqlx::query_as::<_, ReviewStats>(
            "SELECT COUNT(r.id) AS total_reviews,
                    AVG(r.rating)::float8 AS average_rating,
                    MIN(r.rating) AS min_rating,
                    MAX(r.rating) AS max_rating
             FROM reviews r
             JOIN bookings b ON r.booking_id = b.id
             WHERE b.service_id = $1",
        )
        .bind(service_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(stats)
    }
}
