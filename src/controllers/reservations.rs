use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use validator::Validate;

use crate::controllers::{ApiJson, ApiPath, ApiQuery};
use crate::error::ReservationError;
use crate::models::PageRequest;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/reservations", get(list_reservations).post(create_reservation))
        .route(
            "/reservations/{id}",
            get(get_reservation).delete(cancel_reservation),
        )
        .route("/members/{id}/reservations", get(list_member_reservations))
}

/* ---------- RESERVATIONS ---------- */

// POST /api/reservations
#[derive(Debug, Deserialize, Validate)]
struct CreateReservationRequest {
    #[validate(range(min = 1, message = "member_id must be > 0"))]
    member_id: i64,
    #[validate(range(min = 1, message = "schedule_id must be > 0"))]
    schedule_id: i64,
    #[validate(range(min = 1, message = "seat_no must be > 0"))]
    seat_no: i32,
}

async fn create_reservation(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<CreateReservationRequest>,
) -> Result<impl IntoResponse, ReservationError> {
    req.validate()?;

    let view = state
        .reservations
        .create_reservation(req.member_id, req.schedule_id, req.seat_no)
        .await?;
    Ok((StatusCode::CREATED, Json(view)))
}

// GET /api/reservations/{id}
async fn get_reservation(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<i64>,
) -> Result<impl IntoResponse, ReservationError> {
    let view = state.reservations.verify_reservation(id).await?;
    Ok(Json(view))
}

// DELETE /api/reservations/{id}
async fn cancel_reservation(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<i64>,
) -> Result<impl IntoResponse, ReservationError> {
    state.reservations.delete_reservation(id).await?;
    Ok(Json(serde_json::json!({ "id": id, "message": "reservation cancelled" })))
}

// GET /api/reservations?page=&size=
async fn list_reservations(
    State(state): State<Arc<AppState>>,
    ApiQuery(page): ApiQuery<PageRequest>,
) -> Result<impl IntoResponse, ReservationError> {
    let page = state.reservations.list_all(page).await?;
    Ok(Json(page))
}

// GET /api/members/{id}/reservations?page=&size=
async fn list_member_reservations(
    State(state): State<Arc<AppState>>,
    ApiPath(member_id): ApiPath<i64>,
    ApiQuery(page): ApiQuery<PageRequest>,
) -> Result<impl IntoResponse, ReservationError> {
    let page = state.reservations.list_by_member(member_id, page).await?;
    Ok(Json(page))
}
