use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::booking::{Booking, BookingStatus};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateBookingPayload {
    pub service_id: Uuid,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateBookingPayload {
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub status: Option<BookingStatus>,
}

impl UpdateBookingPayload {
    pub fn reschedules(&self) -> bool {
        self.start_time.is_some() || self.end_time.is_some()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateBookingStatusPayload {
    pub status: BookingStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub service_id: Uuid,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl From<Booking> for BookingResponse {
    fn from(booking: Booking) -> Self {
        Self {
            id: booking.id,
            user_id: booking.user_id,
            service_id: booking.service_id,
            start_time: booking.start_time,
            end_time: booking.end_time,
            status: booking.status,
            created_at: booking.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct BookingListQuery {
    pub skip: Option<i64>,
    pub limit: Option<i64>,
    pub status: Option<BookingStatus>,
    pub service_id: Option<Uuid>,
    pub from_date: Option<DateTime<Utc>>,
    pub to_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AdminBookingListQuery {
    pub skip: Option<i64>,
    pub limit: Option<i64>,
    pub status: Option<BookingStatus>,
    pub user_id: Option<Uuid>,
    pub service_id: Option<Uuid>,
    pub from_date: Option<DateTime<Utc>>,
    pub to_date: Option<DateTime<Utc>>,
}
