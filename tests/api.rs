mod common;

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use cinema_booking::controllers;

use common::{fixture, Fixture};

fn app(f: &Fixture) -> Router {
    controllers::app(f.state.clone())
}

async fn send(app: Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

#[tokio::test]
async fn health_check_responds() {
    let f = fixture().await;
    let response = app(&f)
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn booking_twice_conflicts() {
    let f = fixture().await;
    let body = json!({ "member_id": f.member.id, "schedule_id": f.schedule.id, "seat_no": 5 });

    let (status, created) = send(app(&f), Method::POST, "/api/reservations", Some(body.clone())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["reservation_number"], "03050000");
    assert_eq!(created["seat_no"], 5);
    assert_eq!(created["schedule"]["movie_title"], "Spirited Away");

    let (status, error) = send(app(&f), Method::POST, "/api/reservations", Some(body)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(error["error"], "SEAT_ALREADY_BOOKED");
}

#[tokio::test]
async fn invalid_seat_is_a_bad_request() {
    let f = fixture().await;
    let body = json!({ "member_id": f.member.id, "schedule_id": f.schedule.id, "seat_no": 0 });

    let (status, error) = send(app(&f), Method::POST, "/api/reservations", Some(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(error["message"].as_str().unwrap().contains("seat_no"));
}

#[tokio::test]
async fn unknown_ids_are_not_found() {
    let f = fixture().await;

    let (status, error) = send(app(&f), Method::GET, "/api/reservations/404", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error["error"], "RESERVATION_NOT_FOUND");

    let body = json!({ "member_id": f.member.id, "schedule_id": 9_999, "seat_no": 1 });
    let (status, error) = send(app(&f), Method::POST, "/api/reservations", Some(body)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error["error"], "SCHEDULE_NOT_FOUND");
}

#[tokio::test]
async fn cancel_frees_the_seat() {
    let f = fixture().await;
    let body = json!({ "member_id": f.member.id, "schedule_id": f.schedule.id, "seat_no": 8 });
    let (_, created) = send(app(&f), Method::POST, "/api/reservations", Some(body)).await;
    let id = created["id"].as_i64().unwrap();
    let seats_uri = format!("/api/schedules/{}/seats", f.schedule.id);

    let (status, seats) = send(app(&f), Method::GET, &seats_uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(seats[7]["seat_no"], 8);
    assert_eq!(seats[7]["status"], "BOOKED");

    let uri = format!("/api/reservations/{}", id);
    let (status, cancelled) = send(app(&f), Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cancelled["id"], id);

    let (_, seats) = send(app(&f), Method::GET, &seats_uri, None).await;
    assert_eq!(seats[7]["status"], "AVAILABLE");

    let (status, _) = send(app(&f), Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn member_listing_is_paged() {
    let f = fixture().await;
    for seat_no in 1..=3 {
        let body = json!({ "member_id": f.member.id, "schedule_id": f.schedule.id, "seat_no": seat_no });
        let (status, _) = send(app(&f), Method::POST, "/api/reservations", Some(body)).await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let uri = format!("/api/members/{}/reservations?page=1&size=2", f.member.id);
    let (status, page) = send(app(&f), Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["total"], 3);
    assert_eq!(page["items"].as_array().unwrap().len(), 2);

    let (status, page) = send(app(&f), Method::GET, "/api/reservations", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["total"], 3);
    assert_eq!(page["page"], 1);
}

#[tokio::test]
async fn reopening_seats_creates_nothing_new() {
    let f = fixture().await;
    let uri = format!("/api/schedules/{}/seats", f.schedule.id);

    let (status, body) = send(app(&f), Method::POST, &uri, None).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["created"], 0);
}

#[tokio::test]
async fn malformed_requests_get_json_errors() {
    let f = fixture().await;

    let (status, error) = send(app(&f), Method::GET, "/api/reservations/abc", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error["error"], "VALIDATION");
    assert!(error["message"].is_string());

    let (status, error) = send(app(&f), Method::GET, "/api/reservations?page=-1", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error["error"], "VALIDATION");

    let (status, error) = send(app(&f), Method::GET, "/api/schedules/x/seats", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error["error"], "VALIDATION");

    let body = json!({ "member_id": "one", "schedule_id": f.schedule.id, "seat_no": 1 });
    let (status, error) = send(app(&f), Method::POST, "/api/reservations", Some(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error["error"], "VALIDATION");
}
