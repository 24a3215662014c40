pub mod reservations;
pub mod schedules;

use axum::{
    extract::{FromRequest, FromRequestParts},
    routing::get,
    Router,
};
use std::sync::Arc;

use crate::error::ReservationError;
use crate::AppState;

// Экстракторы с ошибками в общем JSON-формате вместо текстовых ответов axum

#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ReservationError))]
pub struct ApiPath<T>(pub T);

#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ReservationError))]
pub struct ApiQuery<T>(pub T);

#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ReservationError))]
pub struct ApiJson<T>(pub T);

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .merge(reservations::routes())
        .merge(schedules::routes())
}

/// Full application router with state attached.
pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(|| async { "Cinema Booking API v1.0" }))
        .route("/health", get(|| async { "OK" }))
        .nest("/api", routes())
        .with_state(state)
}
