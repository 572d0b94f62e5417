//! End-to-end tests of the HTTP API over the in-memory store

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;

use marketplace::config::{AppConfig, Environment, StorageBackend};
use marketplace::routes::create_router;
use marketplace::state::AppState;
use marketplace::store::MemoryStore;

fn app() -> Router {
    let config = AppConfig {
        environment: Environment::Test,
        storage: StorageBackend::Memory,
        meeting_base_url: "https://meet.example.com".to_string(),
        ..Default::default()
    };
    create_router(AppState::new(Arc::new(MemoryStore::new()), &config))
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

async fn register(app: &Router, mobile: &str) -> String {
    let (status, body) = send(
        app,
        "POST",
        "/api/auth/register",
        Some(json!({
            "firstName": "Ada",
            "lastName": "Lovelace",
            "mobile": mobile,
            "password": "Abc12345"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["success"], true);
    body["otp"].as_str().unwrap().to_string()
}

/// Register and verify a creator, returning their user id
async fn verified_creator(app: &Router, mobile: &str) -> String {
    let otp = register(app, mobile).await;
    let (status, body) = send(
        app,
        "POST",
        "/api/auth/verify-otp",
        Some(json!({ "mobile": mobile, "otp": otp })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    body["user"]["id"].as_str().unwrap().to_string()
}

async fn create_package(app: &Router, creator_id: &str, price: &str) -> String {
    let (status, body) = send(
        app,
        "POST",
        "/api/packages",
        Some(json!({
            "creatorId": creator_id,
            "title": "Strategy call",
            "description": "One hour deep dive",
            "duration": 60,
            "price": price
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["id"].as_str().unwrap().to_string()
}

fn booking_body(creator_id: &str, package_id: &str, scheduled_at: &str) -> Value {
    json!({
        "packageId": package_id,
        "creatorId": creator_id,
        "clientMobile": "+15559876543",
        "clientEmail": "client@example.com",
        "scheduledAt": scheduled_at,
        "duration": 60,
        "price": "150.00"
    })
}

#[tokio::test]
async fn test_health_reports_storage() {
    let app = app();
    let (status, body) = send(&app, "GET", "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["storage"], "memory");
}

#[tokio::test]
async fn test_register_verify_login_and_book() {
    let app = app();
    let creator_id = verified_creator(&app, "+15551234567").await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/auth/login",
        Some(json!({ "mobile": "+15551234567", "password": "Abc12345" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["user"]["role"], "creator");
    assert_eq!(body["user"]["firstName"], "Ada");
    assert!(body["user"].get("passwordHash").is_none());

    let package_id = create_package(&app, &creator_id, "150.00").await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/bookings",
        Some(booking_body(&creator_id, &package_id, "2026-06-01T10:00:00Z")),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["booking"]["status"], "pending");
    assert_eq!(body["booking"]["paymentStatus"], "held");
    assert_eq!(body["booking"]["timezone"], "America/New_York");
    assert!(
        body["booking"]["meetingLink"]
            .as_str()
            .unwrap()
            .starts_with("https://meet.example.com/")
    );
    assert_eq!(body["transaction"]["amount"], "150.00");
    assert_eq!(body["transaction"]["platformFee"], "22.50");
    assert_eq!(body["transaction"]["creatorPayout"], "127.50");
    assert_eq!(body["transaction"]["status"], "held");

    let booking_id = body["booking"]["id"].as_str().unwrap().to_string();
    let (status, body) = send(&app, "GET", &format!("/api/bookings/{booking_id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["packageId"], package_id);

    let (status, body) = send(
        &app,
        "GET",
        &format!("/api/bookings/creator/{creator_id}"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_duplicate_mobile_is_rejected() {
    let app = app();
    register(&app, "+15551234567").await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/auth/register",
        Some(json!({
            "firstName": "Grace",
            "lastName": "Hopper",
            "mobile": "+15551234567",
            "password": "Xyz98765"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Mobile number already registered");
}

#[tokio::test]
async fn test_wrong_otp_is_rejected() {
    let app = app();
    let otp = register(&app, "+15551234567").await;
    let wrong = if otp == "123456" { "654321" } else { "123456" };

    let (status, body) = send(
        &app,
        "POST",
        "/api/auth/verify-otp",
        Some(json!({ "mobile": "+15551234567", "otp": wrong })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid or expired OTP");
}

#[tokio::test]
async fn test_unverified_login_is_forbidden() {
    let app = app();
    register(&app, "+15551234567").await;

    let (status, _) = send(
        &app,
        "POST",
        "/api/auth/login",
        Some(json!({ "mobile": "+15551234567", "password": "Abc12345" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_wrong_password_is_unauthorized() {
    let app = app();
    verified_creator(&app, "+15551234567").await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/auth/login",
        Some(json!({ "mobile": "+15551234567", "password": "Wrong1234" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid credentials");
}

#[tokio::test]
async fn test_malformed_json_is_a_validation_error() {
    let app = app();
    let request = Request::builder()
        .method("POST")
        .uri("/api/auth/register")
        .header("content-type", "application/json")
        .body(Body::from("{\"firstName\": "))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["error"], "Validation failed");
    assert_eq!(body["details"][0]["field"], "body");
}

#[tokio::test]
async fn test_invalid_fields_are_listed() {
    let app = app();
    let (status, body) = send(
        &app,
        "POST",
        "/api/auth/register",
        Some(json!({
            "firstName": "",
            "lastName": "Lovelace",
            "mobile": "not-a-number",
            "password": "Abc12345"
        })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let fields: Vec<&str> = body["details"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["field"].as_str().unwrap())
        .collect();
    assert_eq!(fields, vec!["firstName", "mobile"]);
}

#[tokio::test]
async fn test_profile_and_public_page() {
    let app = app();
    let creator_id = verified_creator(&app, "+15551234567").await;

    let (status, body) = send(&app, "GET", &format!("/api/creator/profile/{creator_id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["customUrl"], "15551234567");
    assert_eq!(body["displayName"], "Ada Lovelace");

    let (status, body) = send(
        &app,
        "PUT",
        &format!("/api/creator/profile/{creator_id}"),
        Some(json!({ "professionalTitle": "Mathematician", "customUrl": "ada" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["professionalTitle"], "Mathematician");
    assert_eq!(body["displayName"], "Ada Lovelace");

    let active = create_package(&app, &creator_id, "80").await;
    let hidden = create_package(&app, &creator_id, "120").await;
    let (status, _) = send(
        &app,
        "PUT",
        &format!("/api/packages/{hidden}"),
        Some(json!({ "isActive": false })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, "GET", "/api/creator/public/ada", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["profile"]["userId"], creator_id);
    assert_eq!(body["creator"]["firstName"], "Ada");
    let packages = body["packages"].as_array().unwrap();
    assert_eq!(packages.len(), 1);
    assert_eq!(packages[0]["id"], active);

    let (status, _) = send(&app, "GET", "/api/creator/public/nobody", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_taken_custom_url_conflicts() {
    let app = app();
    let first = verified_creator(&app, "+15551234567").await;
    let second = verified_creator(&app, "+15557654321").await;

    let (status, _) = send(
        &app,
        "PUT",
        &format!("/api/creator/profile/{first}"),
        Some(json!({ "customUrl": "ada" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        &app,
        "PUT",
        &format!("/api/creator/profile/{second}"),
        Some(json!({ "customUrl": "ada" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Custom URL already taken");
}

#[tokio::test]
async fn test_package_delete_keeps_bookings() {
    let app = app();
    let creator_id = verified_creator(&app, "+15551234567").await;
    let package_id = create_package(&app, &creator_id, "150.00").await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/bookings",
        Some(booking_body(&creator_id, &package_id, "2026-06-01T10:00:00Z")),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let booking_id = body["booking"]["id"].as_str().unwrap().to_string();

    let (status, body) = send(&app, "DELETE", &format!("/api/packages/{package_id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);

    let (_, body) = send(&app, "GET", &format!("/api/packages/creator/{creator_id}"), None).await;
    assert!(body.as_array().unwrap().is_empty());

    let (status, _) = send(&app, "GET", &format!("/api/packages/{package_id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, "DELETE", &format!("/api/packages/{package_id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(&app, "GET", &format!("/api/bookings/{booking_id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["packageId"], package_id);
}

#[tokio::test]
async fn test_overlapping_booking_conflicts() {
    let app = app();
    let creator_id = verified_creator(&app, "+15551234567").await;
    let package_id = create_package(&app, &creator_id, "150.00").await;

    let (status, _) = send(
        &app,
        "POST",
        "/api/bookings",
        Some(booking_body(&creator_id, &package_id, "2026-06-01T10:00:00Z")),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(
        &app,
        "POST",
        "/api/bookings",
        Some(booking_body(&creator_id, &package_id, "2026-06-01T10:30:00Z")),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Time slot is no longer available");

    let (status, _) = send(
        &app,
        "POST",
        "/api/bookings",
        Some(booking_body(&creator_id, &package_id, "2026-06-01T11:00:00Z")),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn test_booking_unknown_package_is_not_found() {
    let app = app();
    let creator_id = verified_creator(&app, "+15551234567").await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/bookings",
        Some(booking_body(
            &creator_id,
            "00000000-0000-4000-8000-000000000000",
            "2026-06-01T10:00:00Z",
        )),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Package not found");
}

#[tokio::test]
async fn test_far_future_booking_is_a_validation_error() {
    let app = app();
    let creator_id = verified_creator(&app, "+15551234567").await;
    let package_id = create_package(&app, &creator_id, "150.00").await;

    let mut body = booking_body(&creator_id, &package_id, "+262142-12-31T23:00:00Z");
    body["duration"] = json!(1440);
    let (status, body) = send(&app, "POST", "/api/bookings", Some(body)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
    assert_eq!(body["details"][0]["field"], "scheduledAt");

    // the server is still serving after the rejected request
    let (status, _) = send(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_malformed_ids_are_json_not_found() {
    let app = app();

    for uri in [
        "/api/packages/abc",
        "/api/bookings/not-a-uuid",
        "/api/creator/profile/123",
        "/api/transactions/creator/xyz",
    ] {
        let (status, body) = send(&app, "GET", uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
        assert_eq!(body["error"], "Resource not found", "{uri}");
    }

    let (status, body) = send(
        &app,
        "PUT",
        "/api/packages/abc",
        Some(json!({ "isActive": false })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_transactions_are_listed_newest_first() {
    let app = app();
    let first = verified_creator(&app, "+15551234567").await;
    let second = verified_creator(&app, "+15557654321").await;
    let first_package = create_package(&app, &first, "100").await;
    let second_package = create_package(&app, &second, "33.33").await;

    send(
        &app,
        "POST",
        "/api/bookings",
        Some(booking_body(&first, &first_package, "2026-06-01T09:00:00Z")),
    )
    .await;
    let mut latest = booking_body(&second, &second_package, "2026-06-02T09:00:00Z");
    latest["price"] = json!("33.33");
    send(&app, "POST", "/api/bookings", Some(latest)).await;

    let (status, body) = send(&app, "GET", "/api/admin/transactions", None).await;
    assert_eq!(status, StatusCode::OK);
    let all = body.as_array().unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all[0]["creatorId"], second);
    assert_eq!(all[0]["platformFee"], "5.00");
    assert_eq!(all[0]["creatorPayout"], "28.33");
    assert_eq!(all[1]["creatorId"], first);

    let (status, body) = send(&app, "GET", &format!("/api/transactions/creator/{first}"), None).await;
    assert_eq!(status, StatusCode::OK);
    let mine = body.as_array().unwrap();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0]["amount"], "150.00");
}

#[tokio::test]
async fn test_availability_crud() {
    let app = app();
    let creator_id = verified_creator(&app, "+15551234567").await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/availability",
        Some(json!({
            "creatorId": creator_id,
            "dayOfWeek": 3,
            "startTime": "13:00",
            "endTime": "17:00"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["isEnabled"], true);
    let afternoon = body["id"].as_str().unwrap().to_string();

    let (status, _) = send(
        &app,
        "POST",
        "/api/availability",
        Some(json!({
            "creatorId": creator_id,
            "dayOfWeek": 1,
            "startTime": "09:00",
            "endTime": "12:00"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, body) = send(&app, "GET", &format!("/api/availability/creator/{creator_id}"), None).await;
    let days: Vec<i64> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|w| w["dayOfWeek"].as_i64().unwrap())
        .collect();
    assert_eq!(days, vec![1, 3]);

    let (status, body) = send(
        &app,
        "PUT",
        &format!("/api/availability/{afternoon}"),
        Some(json!({ "isEnabled": false })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["isEnabled"], false);
    assert_eq!(body["startTime"], "13:00");

    let (status, _) = send(
        &app,
        "POST",
        "/api/availability",
        Some(json!({
            "creatorId": creator_id,
            "dayOfWeek": 7,
            "startTime": "09:00",
            "endTime": "12:00"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, "DELETE", &format!("/api/availability/{afternoon}"), None).await;
    assert_eq!(status, StatusCode::OK);
    let (_, body) = send(&app, "GET", &format!("/api/availability/creator/{creator_id}"), None).await;
    assert_eq!(body.as_array().unwrap().len(), 1);
}
