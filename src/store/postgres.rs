use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{debug, warn};

use crate::database::Database;
use crate::error::ReservationError;
use crate::models::{
    Member, NewReservation, Page, PageRequest, Reservation, Schedule, SeatStatus,
    ShowtimeSeatStatus,
};
use crate::store::{seat_claim_error, MemberDirectory, ReservationStore, ScheduleDirectory};

/// Partial unique index over active reservation numbers.
const NUMBER_UNIQUE_INDEX: &str = "uq_reservations_number_active";
/// Partial unique index over active (schedule_id, seat_no) pairs.
const SEAT_UNIQUE_INDEX: &str = "uq_reservations_seat_active";

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(db: &Database) -> Self {
        Self {
            pool: db.pool.clone(),
        }
    }
}

#[async_trait]
impl MemberDirectory for PgStore {
    async fn find_active_member_by_id(&self, id: i64) -> Result<Option<Member>, ReservationError> {
        let member = sqlx::query_as::<_, Member>(
            "SELECT id, name, email, deleted_at
             FROM members
             WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(member)
    }
}

#[async_trait]
impl ScheduleDirectory for PgStore {
    async fn find_schedule_by_id(&self, id: i64) -> Result<Option<Schedule>, ReservationError> {
        let schedule = sqlx::query_as::<_, Schedule>(
            r#"
            SELECT s.id, m.title AS movie_title, t.name AS theater_name, t.seat_count,
                   s.starts_at, s.ends_at, s.deleted_at
            FROM schedules s
            JOIN movies m ON m.id = s.movie_id
            JOIN theaters t ON t.id = s.theater_id
            WHERE s.id = $1 AND s.deleted_at IS NULL
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(schedule)
    }

    async fn find_schedule_with_deleted(
        &self,
        id: i64,
    ) -> Result<Option<Schedule>, ReservationError> {
        let schedule = sqlx::query_as::<_, Schedule>(
            r#"
            SELECT s.id, m.title AS movie_title, t.name AS theater_name, t.seat_count,
                   s.starts_at, s.ends_at, s.deleted_at
            FROM schedules s
            JOIN movies m ON m.id = s.movie_id
            JOIN theaters t ON t.id = s.theater_id
            WHERE s.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(schedule)
    }

    async fn find_seat_statuses(
        &self,
        schedule_id: i64,
    ) -> Result<Vec<ShowtimeSeatStatus>, ReservationError> {
        let seats = sqlx::query_as::<_, ShowtimeSeatStatus>(
            "SELECT id, schedule_id, seat_no, status, deleted_at
             FROM showtime_seat_status
             WHERE schedule_id = $1 AND deleted_at IS NULL
             ORDER BY seat_no",
        )
        .bind(schedule_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(seats)
    }

    async fn create_seat_statuses(
        &self,
        schedule_id: i64,
        seat_count: i32,
    ) -> Result<u64, ReservationError> {
        let inserted = sqlx::query(
            r#"
            INSERT INTO showtime_seat_status (schedule_id, seat_no, status)
            SELECT $1, seat_no, 'AVAILABLE'
            FROM generate_series(1, $2) AS seat_no
            ON CONFLICT (schedule_id, seat_no) DO NOTHING
            "#,
        )
        .bind(schedule_id)
        .bind(seat_count)
        .execute(&self.pool)
        .await?
        .rows_affected();
        Ok(inserted)
    }
}

#[async_trait]
impl ReservationStore for PgStore {
    async fn create(&self, new: NewReservation) -> Result<Reservation, ReservationError> {
        let mut tx = self.pool.begin().await?;

        // Условный UPDATE берёт блокировку строки: второй покупатель ждёт
        // коммита первого и затем не проходит по status = 'AVAILABLE'.
        let claimed: Option<i64> = sqlx::query_scalar(
            r#"
            UPDATE showtime_seat_status
            SET status = 'BOOKED', updated_at = NOW()
            WHERE schedule_id = $1 AND seat_no = $2
              AND status = 'AVAILABLE' AND deleted_at IS NULL
            RETURNING id
            "#,
        )
        .bind(new.schedule_id)
        .bind(new.seat_no)
        .fetch_optional(&mut *tx)
        .await?;

        if claimed.is_none() {
            let current: Option<SeatStatus> = sqlx::query_scalar(
                "SELECT status FROM showtime_seat_status
                 WHERE schedule_id = $1 AND seat_no = $2 AND deleted_at IS NULL",
            )
            .bind(new.schedule_id)
            .bind(new.seat_no)
            .fetch_optional(&mut *tx)
            .await?;
            tx.rollback().await?;

            return Err(seat_claim_error(current, new.schedule_id, new.seat_no));
        }

        let inserted = sqlx::query_as::<_, Reservation>(
            r#"
            INSERT INTO reservations (reservation_number, member_id, schedule_id, seat_no)
            VALUES ($1, $2, $3, $4)
            RETURNING id, reservation_number, member_id, schedule_id, seat_no,
                      created_at, updated_at, deleted_at
            "#,
        )
        .bind(&new.reservation_number)
        .bind(new.member_id)
        .bind(new.schedule_id)
        .bind(new.seat_no)
        .fetch_one(&mut *tx)
        .await;

        let reservation = match inserted {
            Ok(reservation) => reservation,
            Err(sqlx::Error::Database(db)) if db.constraint() == Some(NUMBER_UNIQUE_INDEX) => {
                tx.rollback().await?;
                debug!(number = %new.reservation_number, "reservation number lost a race");
                return Err(ReservationError::DuplicateReservationNumber(
                    new.reservation_number,
                ));
            }
            Err(sqlx::Error::Database(db)) if db.constraint() == Some(SEAT_UNIQUE_INDEX) => {
                tx.rollback().await?;
                warn!(
                    schedule_id = new.schedule_id,
                    seat_no = new.seat_no,
                    "active reservation already exists for an AVAILABLE seat row"
                );
                return Err(ReservationError::SeatAlreadyBooked {
                    schedule_id: new.schedule_id,
                    seat_no: new.seat_no,
                });
            }
            Err(e) => return Err(e.into()),
        };

        tx.commit().await?;
        Ok(reservation)
    }

    async fn cancel(&self, id: i64) -> Result<Reservation, ReservationError> {
        let mut tx = self.pool.begin().await?;

        let reservation = sqlx::query_as::<_, Reservation>(
            "SELECT id, reservation_number, member_id, schedule_id, seat_no,
                    created_at, updated_at, deleted_at
             FROM reservations
             WHERE id = $1 AND deleted_at IS NULL
             FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(ReservationError::ReservationNotFound(id))?;

        let released = sqlx::query(
            "UPDATE showtime_seat_status
             SET status = 'AVAILABLE', updated_at = NOW()
             WHERE schedule_id = $1 AND seat_no = $2 AND deleted_at IS NULL",
        )
        .bind(reservation.schedule_id)
        .bind(reservation.seat_no)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if released == 0 {
            tx.rollback().await?;
            return Err(ReservationError::SeatNotFound {
                schedule_id: reservation.schedule_id,
                seat_no: reservation.seat_no,
            });
        }

        let cancelled = sqlx::query_as::<_, Reservation>(
            r#"
            UPDATE reservations
            SET deleted_at = NOW(), updated_at = NOW()
            WHERE id = $1
            RETURNING id, reservation_number, member_id, schedule_id, seat_no,
                      created_at, updated_at, deleted_at
            "#,
        )
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(cancelled)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Reservation>, ReservationError> {
        let reservation = sqlx::query_as::<_, Reservation>(
            "SELECT id, reservation_number, member_id, schedule_id, seat_no,
                    created_at, updated_at, deleted_at
             FROM reservations
             WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(reservation)
    }

    async fn exists_by_number(&self, number: &str) -> Result<bool, ReservationError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(
               SELECT 1 FROM reservations
               WHERE reservation_number = $1 AND deleted_at IS NULL
             )",
        )
        .bind(number)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn find_all(&self, page: &PageRequest) -> Result<Page<Reservation>, ReservationError> {
        let total: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM reservations WHERE deleted_at IS NULL")
                .fetch_one(&self.pool)
                .await?;

        let items = sqlx::query_as::<_, Reservation>(
            "SELECT id, reservation_number, member_id, schedule_id, seat_no,
                    created_at, updated_at, deleted_at
             FROM reservations
             WHERE deleted_at IS NULL
             ORDER BY created_at DESC, id DESC
             LIMIT $1 OFFSET $2",
        )
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok(Page::new(items, page, total.max(0) as u64))
    }

    async fn find_all_by_member(
        &self,
        member_id: i64,
        page: &PageRequest,
    ) -> Result<Page<Reservation>, ReservationError> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM reservations WHERE member_id = $1 AND deleted_at IS NULL",
        )
        .bind(member_id)
        .fetch_one(&self.pool)
        .await?;

        let items = sqlx::query_as::<_, Reservation>(
            "SELECT id, reservation_number, member_id, schedule_id, seat_no,
                    created_at, updated_at, deleted_at
             FROM reservations
             WHERE member_id = $1 AND deleted_at IS NULL
             ORDER BY created_at DESC, id DESC
             LIMIT $2 OFFSET $3",
        )
        .bind(member_id)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok(Page::new(items, page, total.max(0) as u64))
    }
}
