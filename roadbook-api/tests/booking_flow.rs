use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use chrono::{Duration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use roadbook_api::middleware::auth::Claims;
use roadbook_api::state::{AppState, AuthConfig};
use roadbook_api::app;
use roadbook_core::provider::OfflineProvider;
use roadbook_store::MemoryStore;

const SECRET: &str = "integration-test-secret";

fn test_app() -> Router {
    app(AppState::new(
        MemoryStore::new(),
        Arc::new(OfflineProvider),
        AuthConfig {
            secret: SECRET.to_string(),
            expiration: 3600,
        },
    ))
}

fn token(user_id: Uuid, role: &str) -> String {
    let claims = Claims {
        sub: user_id.to_string(),
        role: role.to_string(),
        exp: (Utc::now() + Duration::hours(1)).timestamp() as usize,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .unwrap()
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

/// Set up reference data and a two-seat trip, returning the trip id.
async fn seeded_trip(app: &Router, admin: &str) -> String {
    let (status, hanoi) = send(
        app,
        "POST",
        "/v1/locations",
        Some(admin),
        Some(json!({ "name": "Ha Noi", "contact_phone": "024-3825-5555" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, danang) = send(
        app,
        "POST",
        "/v1/locations",
        Some(admin),
        Some(json!({ "name": "Da Nang", "contact_phone": "0236-3821-000" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, vehicle) = send(
        app,
        "POST",
        "/v1/vehicles",
        Some(admin),
        Some(json!({ "license_plate": "51B-123.45" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let departure = Utc::now() + Duration::days(3);
    let (status, trip) = send(
        app,
        "POST",
        "/v1/trips",
        Some(admin),
        Some(json!({
            "vehicle_id": vehicle["id"],
            "departure_location": hanoi["id"],
            "arrival_location": danang["id"],
            "departure_time": departure.to_rfc3339(),
            "arrival_time": (departure + Duration::hours(16)).to_rfc3339(),
            "price": 450000,
            "distance": 764,
            "total_seats": 2
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    trip["id"].as_str().unwrap().to_string()
}

async fn seat_number_one(app: &Router, trip_id: &str) -> String {
    let (status, available) = send(
        app,
        "GET",
        &format!("/v1/trips/{}/seats/available", trip_id),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    available["seats"]
        .as_array()
        .unwrap()
        .iter()
        .find(|seat| seat["seat_number"] == 1)
        .map(|seat| seat["id"].as_str().unwrap().to_string())
        .expect("seat #1 should be available")
}

#[tokio::test]
async fn test_reserve_pay_refund_rebook_flow() {
    let app = test_app();
    let admin = token(Uuid::new_v4(), "admin");
    let user_a = Uuid::new_v4();
    let user_a_token = token(user_a, "user");

    let trip_id = seeded_trip(&app, &admin).await;

    let (status, available) = send(
        &app,
        "GET",
        &format!("/v1/trips/{}/seats/available", trip_id),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(available["total"], 2);

    // User A takes seat #1.
    let seat_one = seat_number_one(&app, &trip_id).await;
    let (status, ticket) = send(
        &app,
        "POST",
        "/v1/tickets",
        Some(&user_a_token),
        Some(json!({ "trip_id": trip_id, "seat_id": seat_one })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(ticket["status"], "BOOKED");

    // Booking the same seat again conflicts.
    let intruder = token(Uuid::new_v4(), "user");
    let (status, _) = send(
        &app,
        "POST",
        "/v1/tickets",
        Some(&intruder),
        Some(json!({ "trip_id": trip_id, "seat_id": seat_one })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    // Pay cash, completed at the counter.
    let (status, payment) = send(
        &app,
        "POST",
        "/v1/payments",
        Some(&user_a_token),
        Some(json!({
            "ticket_id": ticket["id"],
            "amount": 450000,
            "payment_method": "cash",
            "payment_status": "COMPLETED"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(payment["payment_status"], "COMPLETED");

    let (status, details) = send(
        &app,
        "GET",
        &format!("/v1/tickets/{}", ticket["id"].as_str().unwrap()),
        Some(&user_a_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(details["ticket"]["status"], "COMPLETED");
    assert_eq!(details["seat_number"], 1);
    assert_eq!(details["departure_location"], "Ha Noi");

    // Refund cascades: payment REFUNDED, ticket CANCELLED, seat AVAILABLE.
    let (status, refunded) = send(
        &app,
        "PUT",
        &format!("/v1/payments/refund/{}", payment["id"].as_str().unwrap()),
        Some(&user_a_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(refunded["payment_status"], "REFUNDED");

    let (_, details) = send(
        &app,
        "GET",
        &format!("/v1/tickets/{}", ticket["id"].as_str().unwrap()),
        Some(&user_a_token),
        None,
    )
    .await;
    assert_eq!(details["ticket"]["status"], "CANCELLED");

    let (_, available) = send(
        &app,
        "GET",
        &format!("/v1/trips/{}/seats/available", trip_id),
        None,
        None,
    )
    .await;
    assert_eq!(available["total"], 2);

    // A second refund attempt conflicts.
    let (status, _) = send(
        &app,
        "PUT",
        &format!("/v1/payments/refund/{}", payment["id"].as_str().unwrap()),
        Some(&user_a_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    // User B can now take seat #1.
    let user_b_token = token(Uuid::new_v4(), "user");
    let (status, rebooked) = send(
        &app,
        "POST",
        "/v1/tickets",
        Some(&user_b_token),
        Some(json!({ "trip_id": trip_id, "seat_id": seat_one })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(rebooked["status"], "BOOKED");
}

#[tokio::test]
async fn test_payment_for_foreign_ticket_is_forbidden() {
    let app = test_app();
    let admin = token(Uuid::new_v4(), "admin");
    let trip_id = seeded_trip(&app, &admin).await;

    let owner_token = token(Uuid::new_v4(), "user");
    let seat_one = seat_number_one(&app, &trip_id).await;
    let (_, ticket) = send(
        &app,
        "POST",
        "/v1/tickets",
        Some(&owner_token),
        Some(json!({ "trip_id": trip_id, "seat_id": seat_one })),
    )
    .await;

    let intruder_token = token(Uuid::new_v4(), "user");
    let (status, _) = send(
        &app,
        "POST",
        "/v1/payments",
        Some(&intruder_token),
        Some(json!({
            "ticket_id": ticket["id"],
            "amount": 450000,
            "payment_method": "cash",
            "payment_status": "COMPLETED"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (_, payments) = send(&app, "GET", "/v1/payments", Some(&admin), None).await;
    assert_eq!(payments.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_trip_search_by_route_and_day() {
    let app = test_app();
    let admin = token(Uuid::new_v4(), "admin");
    seeded_trip(&app, &admin).await;

    let (status, hits) = send(
        &app,
        "POST",
        "/v1/trips/search",
        None,
        Some(json!({ "departure_location": "ha n" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(hits.as_array().unwrap().len(), 1);

    let (status, misses) = send(
        &app,
        "POST",
        "/v1/trips/search",
        None,
        Some(json!({ "departure_location": "saigon" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(misses.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_auth_gates() {
    let app = test_app();

    // No token at all.
    let (status, _) = send(
        &app,
        "POST",
        "/v1/tickets",
        None,
        Some(json!({ "trip_id": Uuid::new_v4(), "seat_id": Uuid::new_v4() })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // A plain user cannot create trips.
    let user = token(Uuid::new_v4(), "user");
    let (status, _) = send(
        &app,
        "POST",
        "/v1/locations",
        Some(&user),
        Some(json!({ "name": "Hue", "contact_phone": "0234-000" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Guest login issues a working token.
    let (status, auth) = send(&app, "POST", "/v1/auth/guest", None, None).await;
    assert_eq!(status, StatusCode::OK);
    let guest_token = auth["token"].as_str().unwrap().to_string();
    let (status, tickets) = send(&app, "GET", "/v1/tickets/mine", Some(&guest_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(tickets.as_array().unwrap().is_empty());
}
