use std::sync::Arc;
use tracing::info;

use crate::error::ReservationError;
use crate::models::ShowtimeSeatStatus;
use crate::store::ScheduleDirectory;

/// Seat inventory of showings: opening seat rows and reading the seat map.
#[derive(Clone)]
pub struct SeatService {
    schedules: Arc<dyn ScheduleDirectory>,
}

impl SeatService {
    pub fn new(schedules: Arc<dyn ScheduleDirectory>) -> Self {
        Self { schedules }
    }

    /// Opens one AVAILABLE row per physical seat of the theater. Safe to re-run.
    pub async fn open_seats(&self, schedule_id: i64) -> Result<u64, ReservationError> {
        let schedule = self
            .schedules
            .find_schedule_by_id(schedule_id)
            .await?
            .ok_or(ReservationError::ScheduleNotFound(schedule_id))?;

        let created = self
            .schedules
            .create_seat_statuses(schedule.id, schedule.seat_count)
            .await?;
        info!(
            schedule_id,
            seat_count = schedule.seat_count,
            created,
            "seat rows opened"
        );
        Ok(created)
    }

    pub async fn seat_map(
        &self,
        schedule_id: i64,
    ) -> Result<Vec<ShowtimeSeatStatus>, ReservationError> {
        self.schedules
            .find_schedule_by_id(schedule_id)
            .await?
            .ok_or(ReservationError::ScheduleNotFound(schedule_id))?;
        self.schedules.find_seat_statuses(schedule_id).await
    }
}
