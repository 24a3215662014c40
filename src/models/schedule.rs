use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Состояние места на конкретном сеансе.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "seat_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SeatStatus {
    Available,
    Booked,
    Unavailable,
}

/// A movie showing at a theater. Seat rows are loaded separately through
/// `ScheduleDirectory::find_seat_statuses`.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Schedule {
    pub id: i64,
    pub movie_title: String,
    pub theater_name: String,
    /// Physical seats in the theater; one seat-status row is opened per seat.
    pub seat_count: i32,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Schedule {
    pub fn is_active(&self) -> bool {
        self.deleted_at.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleSummary {
    pub id: i64,
    pub movie_title: String,
    pub theater_name: String,
    pub starts_at: DateTime<Utc>,
}

impl From<&Schedule> for ScheduleSummary {
    fn from(schedule: &Schedule) -> Self {
        Self {
            id: schedule.id,
            movie_title: schedule.movie_title.clone(),
            theater_name: schedule.theater_name.clone(),
            starts_at: schedule.starts_at,
        }
    }
}

/// One physical seat of one showing.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ShowtimeSeatStatus {
    pub id: i64,
    pub schedule_id: i64,
    pub seat_no: i32,
    pub status: SeatStatus,
    pub deleted_at: Option<DateTime<Utc>>,
}
