use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder, Transaction};
use tracing::info;
use uuid::Uuid;

use crate::dto::booking_dto::{AdminBookingListQuery, CreateBookingPayload, UpdateBookingPayload};
use crate::error::{Error, Result};
use crate::models::booking::{Booking, BookingStatus};
use crate::models::user::User;
use crate::utils::time;

const BOOKING_COLUMNS: &str =
    "id, user_id, service_id, start_time, end_time, status, created_at";

/// Validates a requested time window: the interval must be non-empty and
/// must start strictly in the future.
fn validate_window(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Result<()> {
    if end <= start {
        return Err(Error::Validation(
            "end_time must be after start_time".to_string(),
        ));
    }
    if start <= now {
        return Err(Error::Validation(
            "start_time must be in the future".to_string(),
        ));
    }
    Ok(())
}

/// Status transitions a booking's own user may perform. Everything else
/// is reserved for admins, who may force any status regardless of the
/// current state (a deliberate escape hatch, not validated against the
/// lifecycle graph).
fn self_service_transition_allowed(from: BookingStatus, to: BookingStatus) -> bool {
    to == BookingStatus::Cancelled && from.is_active()
}

/// The booking lifecycle and conflict-resolution engine. The overlap
/// invariant (no two pending/confirmed bookings of one service may
/// intersect on [start, end)) is checked inside a transaction and
/// guaranteed at the store by an exclusion constraint, so racing writers
/// cannot both commit; the loser sees a conflict.
#[derive(Clone)]
pub struct BookingService {
    pool: PgPool,
}

impl BookingService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Half-open interval intersection: [a, b) and [c, d) overlap iff
    /// a < d and c < b. Only pending and confirmed bookings block.
    async fn has_time_conflict(
        tx: &mut Transaction<'_, Postgres>,
        service_id: Uuid,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        exclude_booking_id: Option<Uuid>,
    ) -> Result<bool> {
        let conflict = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(
                 SELECT 1 FROM bookings
                 WHERE service_id = $1
                   AND status IN ('pending', 'confirmed')
                   AND start_time < $3
                   AND end_time > $2
                   AND ($4::uuid IS NULL OR id <> $4)
             )",
        )
        .bind(service_id)
        .bind(start_time)
        .bind(end_time)
        .bind(exclude_booking_id)
        .fetch_one(&mut **tx)
        .await?;
        Ok(conflict)
    }

    pub async fn create(&self, user_id: Uuid, payload: CreateBookingPayload) -> Result<Booking> {
        validate_window(payload.start_time, payload.end_time, time::now())?;

        let mut tx = self.pool.begin().await?;

        // Inactive and missing services are indistinguishable so that
        // unpublished services leak nothing.
        let service_exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM services WHERE id = $1 AND is_active = TRUE)",
        )
        .bind(payload.service_id)
        .fetch_one(&mut *tx)
        .await?;
        if !service_exists {
            return Err(Error::NotFound(
                "Service not found or is inactive".to_string(),
            ));
        }

        if Self::has_time_conflict(
            &mut tx,
            payload.service_id,
            payload.start_time,
            payload.end_time,
            None,
        )
        .await?
        {
            return Err(Error::Conflict(
                "Time slot is already booked for this service".to_string(),
            ));
        }

        let booking = sqlx::query_as::<_, Booking>(&format!(
            "INSERT INTO bookings (user_id, service_id, start_time, end_time, status)
             VALUES ($1, $2, $3, $4, 'pending')
             RETURNING {BOOKING_COLUMNS}"
        ))
        .bind(user_id)
        .bind(payload.service_id)
        .bind(payload.start_time)
        .bind(payload.end_time)
        .fetch_one(&mut *tx)
        .await?;
        tx.commit().await?;

        info!("Booking created: {} by user {}", booking.id, user_id);
        Ok(booking)
    }

    async fn fetch(&self, booking_id: Uuid) -> Result<Booking> {
        let booking = sqlx::query_as::<_, Booking>(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = $1"
        ))
        .bind(booking_id)
        .fetch_optional(&self.pool)
        .await?;
        booking.ok_or_else(|| Error::NotFound("Booking not found".to_string()))
    }

    pub async fn get(&self, caller: &User, booking_id: Uuid) -> Result<Booking> {
        let booking = self.fetch(booking_id).await?;
        if !caller.is_admin() && booking.user_id != caller.id {
            return Err(Error::Forbidden(
                "Not authorized to access this booking".to_string(),
            ));
        }
        Ok(booking)
    }

    pub async fn list(&self, query: AdminBookingListQuery) -> Result<Vec<Booking>> {
        let limit = query.limit.unwrap_or(100).clamp(1, 100);
        let skip = query.skip.unwrap_or(0).max(0);

        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE 1=1"
        ));
        if let Some(user_id) = query.user_id {
            builder.push(" AND user_id = ");
            builder.push_bind(user_id);
        }
        if let Some(service_id) = query.service_id {
            builder.push(" AND service_id = ");
            builder.push_bind(service_id);
        }
        if let Some(status) = query.status {
            builder.push(" AND status = ");
            builder.push_bind(status.as_str());
        }
        if let Some(from_date) = query.from_date {
            builder.push(" AND start_time >= ");
            builder.push_bind(from_date);
        }
        if let Some(to_date) = query.to_date {
            builder.push(" AND start_time <= ");
            builder.push_bind(to_date);
        }
        // id tiebreaker keeps offset pagination stable for equal timestamps
        builder.push(" ORDER BY start_time DESC, id LIMIT ");
        builder.push_bind(limit);
        builder.push(" OFFSET ");
        builder.push_bind(skip);

        let bookings = builder
            .build_query_as::<Booking>()
            .fetch_all(&self.pool)
            .await?;
        Ok(bookings)
    }

    pub async fn update(
        &self,
        caller: &User,
        booking_id: Uuid,
        payload: UpdateBookingPayload,
    ) -> Result<Booking> {
        let booking = self.fetch(booking_id).await?;
        let is_admin = caller.is_admin();
        if !is_admin && booking.user_id != caller.id {
            return Err(Error::Forbidden(
                "Not authorized to update this booking".to_string(),
            ));
        }

        let current_status: BookingStatus = booking
            .status
            .parse()
            .map_err(Error::Internal)?;

        if payload.reschedules() && !is_admin && !current_status.is_active() {
            return Err(Error::BadRequest(
                "Can only reschedule pending or confirmed bookings".to_string(),
            ));
        }

        let new_status = match payload.status {
            Some(target) if !is_admin => {
                if !self_service_transition_allowed(current_status, target) {
                    if target != BookingStatus::Cancelled {
                        return Err(Error::Forbidden(
                            "Only admins can set this booking status".to_string(),
                        ));
                    }
                    return Err(Error::BadRequest(
                        "Can only cancel pending or confirmed bookings".to_string(),
                    ));
                }
                Some(target)
            }
            other => other,
        };

        let new_start = payload.start_time.unwrap_or(booking.start_time);
        let new_end = payload.end_time.unwrap_or(booking.end_time);

        let mut tx = self.pool.begin().await?;
        if payload.reschedules() {
            validate_window(new_start, new_end, time::now())?;
            if Self::has_time_conflict(
                &mut tx,
                booking.service_id,
                new_start,
                new_end,
                Some(booking.id),
            )
            .await?
            {
                return Err(Error::Conflict(
                    "Time slot is already booked for this service".to_string(),
                ));
            }
        }

        let updated = sqlx::query_as::<_, Booking>(&format!(
            "UPDATE bookings
             SET start_time = $2, end_time = $3, status = $4
             WHERE id = $1
             RETURNING {BOOKING_COLUMNS}"
        ))
        .bind(booking.id)
        .bind(new_start)
        .bind(new_end)
        .bind(new_status.map(|s| s.as_str()).unwrap_or(booking.status.as_str()))
        .fetch_one(&mut *tx)
        .await?;
        tx.commit().await?;

        info!("Booking updated: {}", booking_id);
        Ok(updated)
    }

    /// Hard delete. Owners may remove a booking only before it starts;
    /// admins may remove it at any time.
    pub async fn delete(&self, caller: &User, booking_id: Uuid) -> Result<Booking> {
        let booking = self.fetch(booking_id).await?;
        let is_admin = caller.is_admin();
        if !is_admin && booking.user_id != caller.id {
            return Err(Error::Forbidden(
                "Not authorized to delete this booking".to_string(),
            ));
        }
        if !is_admin && booking.start_time <= time::now() {
            return Err(Error::BadRequest(
                "Cannot delete a booking that has already started".to_string(),
            ));
        }

        sqlx::query("DELETE FROM bookings WHERE id = $1")
            .bind(booking.id)
            .execute(&self.pool)
            .await?;
        info!("Booking deleted: {}", booking_id);
        Ok(booking)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn window_must_be_non_empty() {
        let now = Utc::now();
        let start = now + Duration::hours(1);
        assert!(validate_window(start, start, now).is_err());
        assert!(validate_window(start, start - Duration::minutes(1), now).is_err());
        assert!(validate_window(start, start + Duration::hours(2), now).is_ok());
    }

    #[test]
    fn window_must_start_in_the_future() {
        let now = Utc::now();
        let past = now - Duration::hours(1);
        let err = validate_window(past, past + Duration::hours(2), now).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        // exactly-now is not "in the future"
        assert!(validate_window(now, now + Duration::hours(1), now).is_err());
    }

    #[test]
    fn self_service_may_only_cancel_active_bookings() {
        use BookingStatus::*;
        assert!(self_service_transition_allowed(Pending, Cancelled));
        assert!(self_service_transition_allowed(Confirmed, Cancelled));
        assert!(!self_service_transition_allowed(Completed, Cancelled));
        assert!(!self_service_transition_allowed(Cancelled, Cancelled));
        for from in [Pending, Confirmed, Completed, Cancelled] {
            assert!(!self_service_transition_allowed(from, Confirmed));
            assert!(!self_service_transition_allowed(from, Completed));
            assert!(!self_service_transition_allowed(from, Pending));
        }
    }
}
