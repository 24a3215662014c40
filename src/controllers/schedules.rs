use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;

use crate::controllers::ApiPath;
use crate::error::ReservationError;
use crate::models::SeatStatus;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/schedules/{id}/seats", get(seat_map).post(open_seats))
}

#[derive(Debug, Serialize)]
struct SeatResponse {
    seat_no: i32,
    status: SeatStatus,
}

// GET /api/schedules/{id}/seats
async fn seat_map(
    State(state): State<Arc<AppState>>,
    ApiPath(schedule_id): ApiPath<i64>,
) -> Result<impl IntoResponse, ReservationError> {
    let seats = state.seats.seat_map(schedule_id).await?;
    let payload: Vec<SeatResponse> = seats
        .into_iter()
        .map(|seat| SeatResponse {
            seat_no: seat.seat_no,
            status: seat.status,
        })
        .collect();
    Ok(Json(payload))
}

// POST /api/schedules/{id}/seats
async fn open_seats(
    State(state): State<Arc<AppState>>,
    ApiPath(schedule_id): ApiPath<i64>,
) -> Result<impl IntoResponse, ReservationError> {
    let created = state.seats.open_seats(schedule_id).await?;
    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "schedule_id": schedule_id, "created": created })),
    ))
}
