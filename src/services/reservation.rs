//! reservation.rs
//!
//! Booking workflow of the cinema: claim a seat of a showing, issue a
//! reservation number, cancel, and read reservations back.
//!
//! Concurrency model: the seat claim and the reservation insert are one
//! store-level unit (`ReservationStore::create`). Two members racing for the
//! same seat both reach that unit; the store lets exactly one of them flip the
//! seat from AVAILABLE to BOOKED and the other gets `SeatAlreadyBooked`.
//! Nothing is written before the member and the schedule are resolved.

use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use crate::cache::CacheService;
use crate::error::ReservationError;
use crate::models::{NewReservation, Page, PageRequest, Reservation, ReservationView, Schedule};
use crate::services::reservation_number::{
    date_prefix, Clock, ReservationNumberGenerator, SEQUENCE_SPACE,
};
use crate::store::{MemberDirectory, ReservationStore, ScheduleDirectory};

#[derive(Clone)]
pub struct ReservationService {
    members: Arc<dyn MemberDirectory>,
    schedules: Arc<dyn ScheduleDirectory>,
    reservations: Arc<dyn ReservationStore>,
    cache: CacheService,
    numbers: Arc<ReservationNumberGenerator>,
    clock: Arc<dyn Clock>,
}

impl ReservationService {
    pub fn new(
        members: Arc<dyn MemberDirectory>,
        schedules: Arc<dyn ScheduleDirectory>,
        reservations: Arc<dyn ReservationStore>,
        cache: CacheService,
        numbers: Arc<ReservationNumberGenerator>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            members,
            schedules,
            reservations,
            cache,
            numbers,
            clock,
        }
    }

    /// Books `seat_no` of `schedule_id` for `member_id`.
    #[instrument(skip(self))]
    pub async fn create_reservation(
        &self,
        member_id: i64,
        schedule_id: i64,
        seat_no: i32,
    ) -> Result<ReservationView, ReservationError> {
        if seat_no <= 0 {
            return Err(ReservationError::InvalidSeatNumber(seat_no));
        }

        let member = self
            .members
            .find_active_member_by_id(member_id)
            .await?
            .ok_or(ReservationError::MemberNotFound(member_id))?;
        let schedule = self
            .schedules
            .find_schedule_by_id(schedule_id)
            .await?
            .ok_or(ReservationError::ScheduleNotFound(schedule_id))?;

        let reservation = self
            .book_with_fresh_number(member.id, schedule.id, seat_no)
            .await?;

        let view = ReservationView::new(&reservation, &schedule);
        // Бронь уже зафиксирована, ошибку перепроверки только логируем
        if let Err(e) = self.remember(&view).await {
            warn!(error = %e, reservation_id = view.id, "could not confirm cached reservation");
            self.cache.evict_reservation(view.id).await;
        }

        info!(
            reservation_id = view.id,
            number = %view.reservation_number,
            "seat booked"
        );
        Ok(view)
    }

    /// Releases the seat and soft-deletes the reservation.
    #[instrument(skip(self))]
    pub async fn delete_reservation(&self, reservation_id: i64) -> Result<(), ReservationError> {
        let cancelled = self.reservations.cancel(reservation_id).await?;
        self.cache.evict_reservation(reservation_id).await;

        info!(
            number = %cancelled.reservation_number,
            schedule_id = cancelled.schedule_id,
            seat_no = cancelled.seat_no,
            "reservation cancelled, seat released"
        );
        Ok(())
    }

    /// Single reservation, cache first.
    pub async fn verify_reservation(
        &self,
        reservation_id: i64,
    ) -> Result<ReservationView, ReservationError> {
        if let Some(view) = self.cache.get_reservation(reservation_id).await {
            return Ok(view);
        }

        let reservation = self
            .reservations
            .find_by_id(reservation_id)
            .await?
            .ok_or(ReservationError::ReservationNotFound(reservation_id))?;
        let schedule = self.schedule_of(&reservation).await?;

        let view = ReservationView::new(&reservation, &schedule);
        if !self.remember(&view).await? {
            return Err(ReservationError::ReservationNotFound(reservation_id));
        }
        Ok(view)
    }

    pub async fn list_by_member(
        &self,
        member_id: i64,
        page: PageRequest,
    ) -> Result<Page<ReservationView>, ReservationError> {
        self.members
            .find_active_member_by_id(member_id)
            .await?
            .ok_or(ReservationError::MemberNotFound(member_id))?;

        let page = page.normalized();
        let rows = self.reservations.find_all_by_member(member_id, &page).await?;
        self.to_views(rows).await
    }

    pub async fn list_all(
        &self,
        page: PageRequest,
    ) -> Result<Page<ReservationView>, ReservationError> {
        let page = page.normalized();
        let rows = self.reservations.find_all(&page).await?;
        self.to_views(rows).await
    }

    /// Draws candidates until one is free and the store accepts it.
    async fn book_with_fresh_number(
        &self,
        member_id: i64,
        schedule_id: i64,
        seat_no: i32,
    ) -> Result<Reservation, ReservationError> {
        let today = self.clock.today();

        for _ in 0..SEQUENCE_SPACE {
            let number = self.numbers.next_candidate(today);
            if self.reservations.exists_by_number(number.as_str()).await? {
                debug!(number = %number, "reservation number taken, drawing next");
                continue;
            }

            let booking = NewReservation {
                member_id,
                schedule_id,
                seat_no,
                reservation_number: number.into_string(),
            };
            match self.reservations.create(booking).await {
                Err(ReservationError::DuplicateReservationNumber(number)) => {
                    warn!(number = %number, "reservation number collided on insert, retrying");
                }
                other => return other,
            }
        }

        Err(ReservationError::ReservationNumberExhausted(date_prefix(today)))
    }

    /// Writes the view to the cache, then re-reads the row. A cancel that
    /// committed in between has already evicted, so the entry we just wrote
    /// is stale and goes too. Returns whether the reservation is still active.
    async fn remember(&self, view: &ReservationView) -> Result<bool, ReservationError> {
        self.cache.save_reservation(view).await;
        if self.reservations.find_by_id(view.id).await?.is_some() {
            return Ok(true);
        }
        debug!(reservation_id = view.id, "cancelled while caching, evicting");
        self.cache.evict_reservation(view.id).await;
        Ok(false)
    }

    async fn schedule_of(&self, reservation: &Reservation) -> Result<Schedule, ReservationError> {
        self.schedules
            .find_schedule_with_deleted(reservation.schedule_id)
            .await?
            .ok_or(ReservationError::ScheduleNotFound(reservation.schedule_id))
    }

    async fn to_views(
        &self,
        rows: Page<Reservation>,
    ) -> Result<Page<ReservationView>, ReservationError> {
        let mut schedules: HashMap<i64, Schedule> = HashMap::new();
        for reservation in &rows.items {
            if !schedules.contains_key(&reservation.schedule_id) {
                let schedule = self.schedule_of(reservation).await?;
                schedules.insert(schedule.id, schedule);
            }
        }

        let items = rows
            .items
            .iter()
            .map(|reservation| {
                schedules
                    .get(&reservation.schedule_id)
                    .map(|schedule| ReservationView::new(reservation, schedule))
                    .ok_or(ReservationError::ScheduleNotFound(reservation.schedule_id))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows.with_items(items))
    }
}
