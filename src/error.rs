use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Failures of the reservation core. Each variant maps to one client-facing status.
#[derive(Debug, Error)]
pub enum ReservationError {
    #[error("member {0} not found")]
    MemberNotFound(i64),

    #[error("schedule {0} not found")]
    ScheduleNotFound(i64),

    #[error("seat {seat_no} not found for schedule {schedule_id}")]
    SeatNotFound { schedule_id: i64, seat_no: i32 },

    #[error("reservation {0} not found")]
    ReservationNotFound(i64),

    #[error("seat {seat_no} of schedule {schedule_id} is already booked")]
    SeatAlreadyBooked { schedule_id: i64, seat_no: i32 },

    #[error("seat {seat_no} of schedule {schedule_id} is not for sale")]
    SeatUnavailable { schedule_id: i64, seat_no: i32 },

    #[error("seat number must be positive, got {0}")]
    InvalidSeatNumber(i32),

    #[error("invalid request: {0}")]
    Validation(String),

    /// Another booking took the number between the existence check and the insert.
    #[error("reservation number {0} is already taken")]
    DuplicateReservationNumber(String),

    #[error("no free reservation number left for {0}")]
    ReservationNumberExhausted(String),

    #[error("database error: {0}")]
    Store(#[from] sqlx::Error),
}

impl ReservationError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MemberNotFound(_) => "MEMBER_NOT_FOUND",
            Self::ScheduleNotFound(_) => "SCHEDULE_NOT_FOUND",
            Self::SeatNotFound { .. } => "SEAT_NOT_FOUND",
            Self::ReservationNotFound(_) => "RESERVATION_NOT_FOUND",
            Self::SeatAlreadyBooked { .. } => "SEAT_ALREADY_BOOKED",
            Self::SeatUnavailable { .. } => "SEAT_UNAVAILABLE",
            Self::InvalidSeatNumber(_) | Self::Validation(_) => "VALIDATION",
            Self::DuplicateReservationNumber(_) => "DUPLICATE_RESERVATION_NUMBER",
            Self::ReservationNumberExhausted(_) => "RESERVATION_NUMBER_EXHAUSTED",
            Self::Store(_) => "STORE",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::MemberNotFound(_)
            | Self::ScheduleNotFound(_)
            | Self::SeatNotFound { .. }
            | Self::ReservationNotFound(_) => StatusCode::NOT_FOUND,
            Self::SeatAlreadyBooked { .. } | Self::SeatUnavailable { .. } => StatusCode::CONFLICT,
            Self::InvalidSeatNumber(_) | Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::DuplicateReservationNumber(_) | Self::ReservationNumberExhausted(_) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            Self::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<validator::ValidationErrors> for ReservationError {
    fn from(errors: validator::ValidationErrors) -> Self {
        Self::Validation(errors.to_string())
    }
}

impl From<PathRejection> for ReservationError {
    fn from(rejection: PathRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for ReservationError {
    fn from(rejection: QueryRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

impl From<JsonRejection> for ReservationError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

impl IntoResponse for ReservationError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        // Детали ошибок БД наружу не отдаём
        let message = match &self {
            Self::Store(e) => {
                tracing::error!(error = ?e, "reservation store failure");
                "internal storage error".to_string()
            }
            other => other.to_string(),
        };

        (status, Json(json!({ "error": self.kind(), "message": message }))).into_response()
    }
}
