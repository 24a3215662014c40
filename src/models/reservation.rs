use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::schedule::{Schedule, ScheduleSummary};

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Reservation {
    pub id: i64,
    pub reservation_number: String,
    pub member_id: i64,
    pub schedule_id: i64,
    pub seat_no: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Reservation {
    pub fn is_active(&self) -> bool {
        self.deleted_at.is_none()
    }
}

/// Everything the store needs to claim a seat and record the booking in one unit.
#[derive(Debug, Clone)]
pub struct NewReservation {
    pub member_id: i64,
    pub schedule_id: i64,
    pub seat_no: i32,
    pub reservation_number: String,
}

/// What callers of the reservation core get back; also the cached shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservationView {
    pub id: i64,
    pub reservation_number: String,
    pub member_id: i64,
    pub schedule: ScheduleSummary,
    pub seat_no: i32,
    pub created_at: DateTime<Utc>,
}

impl ReservationView {
    pub fn new(reservation: &Reservation, schedule: &Schedule) -> Self {
        Self {
            id: reservation.id,
            reservation_number: reservation.reservation_number.clone(),
            member_id: reservation.member_id,
            schedule: ScheduleSummary::from(schedule),
            seat_no: reservation.seat_no,
            created_at: reservation.created_at,
        }
    }
}
