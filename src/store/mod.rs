//! Narrow capabilities the reservation core needs from persistence.
//!
//! `postgres` is the production backend; `memory` keeps the same semantics in
//! process and backs local runs and the test suite.

use async_trait::async_trait;

use crate::error::ReservationError;
use crate::models::{
    Member, NewReservation, Page, PageRequest, Reservation, Schedule, SeatStatus,
    ShowtimeSeatStatus,
};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[async_trait]
pub trait MemberDirectory: Send + Sync {
    /// Soft-deleted members are never returned.
    async fn find_active_member_by_id(&self, id: i64) -> Result<Option<Member>, ReservationError>;
}

#[async_trait]
pub trait ScheduleDirectory: Send + Sync {
    /// Active schedules only; booking and seat inventory go through this.
    async fn find_schedule_by_id(&self, id: i64) -> Result<Option<Schedule>, ReservationError>;

    /// Ignores `deleted_at`. Existing reservations keep rendering after
    /// their showing is withdrawn.
    async fn find_schedule_with_deleted(
        &self,
        id: i64,
    ) -> Result<Option<Schedule>, ReservationError>;

    /// Active seat rows of a schedule ordered by seat number.
    async fn find_seat_statuses(
        &self,
        schedule_id: i64,
    ) -> Result<Vec<ShowtimeSeatStatus>, ReservationError>;

    /// Creates AVAILABLE rows for seats `1..=seat_count`, skipping existing ones.
    /// Returns how many rows were inserted.
    async fn create_seat_statuses(
        &self,
        schedule_id: i64,
        seat_count: i32,
    ) -> Result<u64, ReservationError>;
}

#[async_trait]
pub trait ReservationStore: Send + Sync {
    /// Claims the seat (AVAILABLE -> BOOKED) and inserts the reservation as
    /// one atomic unit. Nothing is written when any step fails.
    ///
    /// Errors: `SeatNotFound`, `SeatAlreadyBooked`, `SeatUnavailable`,
    /// `DuplicateReservationNumber`.
    async fn create(&self, new: NewReservation) -> Result<Reservation, ReservationError>;

    /// Releases the seat (-> AVAILABLE) and soft-deletes the reservation as
    /// one atomic unit; returns the cancelled row.
    async fn cancel(&self, id: i64) -> Result<Reservation, ReservationError>;

    /// Active reservations only.
    async fn find_by_id(&self, id: i64) -> Result<Option<Reservation>, ReservationError>;

    async fn exists_by_number(&self, number: &str) -> Result<bool, ReservationError>;

    async fn find_all(&self, page: &PageRequest) -> Result<Page<Reservation>, ReservationError>;

    async fn find_all_by_member(
        &self,
        member_id: i64,
        page: &PageRequest,
    ) -> Result<Page<Reservation>, ReservationError>;
}

/// Maps what a failed conditional claim found in the row to the caller-facing error.
pub(crate) fn seat_claim_error(
    current: Option<SeatStatus>,
    schedule_id: i64,
    seat_no: i32,
) -> ReservationError {
    match current {
        None => ReservationError::SeatNotFound { schedule_id, seat_no },
        Some(SeatStatus::Unavailable) => ReservationError::SeatUnavailable { schedule_id, seat_no },
        Some(_) => ReservationError::SeatAlreadyBooked { schedule_id, seat_no },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failed_claim_reports_what_blocked_it() {
        assert!(matches!(
            seat_claim_error(None, 1, 9),
            ReservationError::SeatNotFound { schedule_id: 1, seat_no: 9 }
        ));
        assert!(matches!(
            seat_claim_error(Some(SeatStatus::Booked), 1, 9),
            ReservationError::SeatAlreadyBooked { .. }
        ));
        assert!(matches!(
            seat_claim_error(Some(SeatStatus::Unavailable), 1, 9),
            ReservationError::SeatUnavailable { .. }
        ));
    }
}
