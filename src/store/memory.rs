use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::error::ReservationError;
use crate::models::{
    Member, NewReservation, Page, PageRequest, Reservation, Schedule, SeatStatus,
    ShowtimeSeatStatus,
};
use crate::store::{seat_claim_error, MemberDirectory, ReservationStore, ScheduleDirectory};

#[derive(Default)]
struct Tables {
    members: HashMap<i64, Member>,
    schedules: HashMap<i64, Schedule>,
    seats: BTreeMap<(i64, i32), ShowtimeSeatStatus>,
    reservations: BTreeMap<i64, Reservation>,
    next_member_id: i64,
    next_schedule_id: i64,
    next_seat_id: i64,
    next_reservation_id: i64,
}

impl Tables {
    fn active_reservations(&self) -> impl Iterator<Item = &Reservation> {
        self.reservations.values().filter(|r| r.is_active())
    }
}

/// In-process store. Every write runs under one lock, which gives the same
/// all-or-nothing booking unit the Postgres transaction does.
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// One member and one opened 100-seat showing, for local runs without Postgres.
    pub async fn with_demo_data() -> Self {
        let store = Self::new();
        store.insert_member("Demo Member", "demo@cinema.local").await;
        let schedule = store
            .insert_schedule("Demo Movie", "Hall 1", 100, Utc::now() + Duration::hours(2))
            .await;
        let mut tables = store.tables.lock().await;
        open_seats(&mut tables, schedule.id, schedule.seat_count);
        drop(tables);
        store
    }

    pub async fn insert_member(&self, name: &str, email: &str) -> Member {
        let mut tables = self.tables.lock().await;
        tables.next_member_id += 1;
        let member = Member {
            id: tables.next_member_id,
            name: name.to_string(),
            email: email.to_string(),
            deleted_at: None,
        };
        tables.members.insert(member.id, member.clone());
        member
    }

    pub async fn soft_delete_member(&self, id: i64) {
        let mut tables = self.tables.lock().await;
        if let Some(member) = tables.members.get_mut(&id) {
            member.deleted_at = Some(Utc::now());
        }
    }

    /// Registers a showing; its seat rows are opened separately.
    pub async fn insert_schedule(
        &self,
        movie_title: &str,
        theater_name: &str,
        seat_count: i32,
        starts_at: DateTime<Utc>,
    ) -> Schedule {
        let mut tables = self.tables.lock().await;
        tables.next_schedule_id += 1;
        let schedule = Schedule {
            id: tables.next_schedule_id,
            movie_title: movie_title.to_string(),
            theater_name: theater_name.to_string(),
            seat_count,
            starts_at,
            ends_at: starts_at + Duration::minutes(120),
            deleted_at: None,
        };
        tables.schedules.insert(schedule.id, schedule.clone());
        schedule
    }

    pub async fn soft_delete_schedule(&self, id: i64) {
        let mut tables = self.tables.lock().await;
        if let Some(schedule) = tables.schedules.get_mut(&id) {
            schedule.deleted_at = Some(Utc::now());
        }
    }

    pub async fn set_seat_status(&self, schedule_id: i64, seat_no: i32, status: SeatStatus) {
        let mut tables = self.tables.lock().await;
        if let Some(seat) = tables.seats.get_mut(&(schedule_id, seat_no)) {
            seat.status = status;
        }
    }

    /// Rows including soft-deleted reservations.
    pub async fn reservation_rows(&self) -> Vec<Reservation> {
        self.tables.lock().await.reservations.values().cloned().collect()
    }
}

fn open_seats(tables: &mut Tables, schedule_id: i64, seat_count: i32) -> u64 {
    let mut inserted = 0;
    for seat_no in 1..=seat_count {
        if tables.seats.contains_key(&(schedule_id, seat_no)) {
            continue;
        }
        tables.next_seat_id += 1;
        let seat = ShowtimeSeatStatus {
            id: tables.next_seat_id,
            schedule_id,
            seat_no,
            status: SeatStatus::Available,
            deleted_at: None,
        };
        tables.seats.insert((schedule_id, seat_no), seat);
        inserted += 1;
    }
    inserted
}

fn newest_first(mut rows: Vec<Reservation>, page: &PageRequest) -> Page<Reservation> {
    rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
    let total = rows.len() as u64;
    let items = rows
        .into_iter()
        .skip(page.offset() as usize)
        .take(page.limit() as usize)
        .collect();
    Page::new(items, page, total)
}

#[async_trait]
impl MemberDirectory for MemoryStore {
    async fn find_active_member_by_id(&self, id: i64) -> Result<Option<Member>, ReservationError> {
        let tables = self.tables.lock().await;
        Ok(tables.members.get(&id).filter(|m| m.is_active()).cloned())
    }
}

#[async_trait]
impl ScheduleDirectory for MemoryStore {
    async fn find_schedule_by_id(&self, id: i64) -> Result<Option<Schedule>, ReservationError> {
        let tables = self.tables.lock().await;
        Ok(tables.schedules.get(&id).filter(|s| s.is_active()).cloned())
    }

    async fn find_schedule_with_deleted(
        &self,
        id: i64,
    ) -> Result<Option<Schedule>, ReservationError> {
        let tables = self.tables.lock().await;
        Ok(tables.schedules.get(&id).cloned())
    }

    async fn find_seat_statuses(
        &self,
        schedule_id: i64,
    ) -> Result<Vec<ShowtimeSeatStatus>, ReservationError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .seats
            .range((schedule_id, i32::MIN)..=(schedule_id, i32::MAX))
            .map(|(_, seat)| seat)
            .filter(|seat| seat.deleted_at.is_none())
            .cloned()
            .collect())
    }

    async fn create_seat_statuses(
        &self,
        schedule_id: i64,
        seat_count: i32,
    ) -> Result<u64, ReservationError> {
        let mut tables = self.tables.lock().await;
        Ok(open_seats(&mut tables, schedule_id, seat_count))
    }
}

#[async_trait]
impl ReservationStore for MemoryStore {
    async fn create(&self, new: NewReservation) -> Result<Reservation, ReservationError> {
        let mut tables = self.tables.lock().await;
        let key = (new.schedule_id, new.seat_no);

        let current = tables
            .seats
            .get(&key)
            .filter(|seat| seat.deleted_at.is_none())
            .map(|seat| seat.status);
        if current != Some(SeatStatus::Available) {
            return Err(seat_claim_error(current, new.schedule_id, new.seat_no));
        }
        // Проверки до любой записи: при ошибке ничего не меняется
        if tables
            .active_reservations()
            .any(|r| r.reservation_number == new.reservation_number)
        {
            return Err(ReservationError::DuplicateReservationNumber(
                new.reservation_number,
            ));
        }

        if let Some(seat) = tables.seats.get_mut(&key) {
            seat.status = SeatStatus::Booked;
        }
        tables.next_reservation_id += 1;
        let now = Utc::now();
        let reservation = Reservation {
            id: tables.next_reservation_id,
            reservation_number: new.reservation_number,
            member_id: new.member_id,
            schedule_id: new.schedule_id,
            seat_no: new.seat_no,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        tables.reservations.insert(reservation.id, reservation.clone());
        Ok(reservation)
    }

    async fn cancel(&self, id: i64) -> Result<Reservation, ReservationError> {
        let mut tables = self.tables.lock().await;
        let reservation = tables
            .reservations
            .get(&id)
            .filter(|r| r.is_active())
            .cloned()
            .ok_or(ReservationError::ReservationNotFound(id))?;

        let seat = tables
            .seats
            .get_mut(&(reservation.schedule_id, reservation.seat_no))
            .filter(|seat| seat.deleted_at.is_none())
            .ok_or(ReservationError::SeatNotFound {
                schedule_id: reservation.schedule_id,
                seat_no: reservation.seat_no,
            })?;
        seat.status = SeatStatus::Available;

        let now = Utc::now();
        let row = tables
            .reservations
            .get_mut(&id)
            .ok_or(ReservationError::ReservationNotFound(id))?;
        row.deleted_at = Some(now);
        row.updated_at = now;
        Ok(row.clone())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Reservation>, ReservationError> {
        let tables = self.tables.lock().await;
        Ok(tables.reservations.get(&id).filter(|r| r.is_active()).cloned())
    }

    async fn exists_by_number(&self, number: &str) -> Result<bool, ReservationError> {
        let tables = self.tables.lock().await;
        let exists = tables
            .active_reservations()
            .any(|r| r.reservation_number == number);
        Ok(exists)
    }

    async fn find_all(&self, page: &PageRequest) -> Result<Page<Reservation>, ReservationError> {
        let tables = self.tables.lock().await;
        let rows = tables.active_reservations().cloned().collect();
        Ok(newest_first(rows, page))
    }

    async fn find_all_by_member(
        &self,
        member_id: i64,
        page: &PageRequest,
    ) -> Result<Page<Reservation>, ReservationError> {
        let tables = self.tables.lock().await;
        let rows = tables
            .active_reservations()
            .filter(|r| r.member_id == member_id)
            .cloned()
            .collect();
        Ok(newest_first(rows, page))
    }
}
