use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::routing::{delete, get, post, put};
use axum::Router;
use tower::ServiceExt;

use salonbook::config::AppConfig;
use salonbook::db;
use salonbook::handlers;
use salonbook::models::ServiceSnapshot;
use salonbook::services::payments::{PaymentPreference, PaymentProvider};
use salonbook::state::AppState;

// ── Mock Payment Provider ──

struct MockPayments {
    configured: bool,
    created: Arc<Mutex<Vec<String>>>,
}

impl MockPayments {
    fn disabled() -> Self {
        Self {
            configured: false,
            created: Arc::new(Mutex::new(vec![])),
        }
    }

    fn enabled() -> Self {
        Self {
            configured: true,
            created: Arc::new(Mutex::new(vec![])),
        }
    }
}

#[async_trait]
impl PaymentProvider for MockPayments {
    fn is_configured(&self) -> bool {
        self.configured
    }

    async fn create_preference(
        &self,
        external_reference: &str,
        _payer_name: &str,
        _items: &[ServiceSnapshot],
    ) -> anyhow::Result<PaymentPreference> {
        self.created
            .lock()
            .unwrap()
            .push(external_reference.to_string());
        Ok(PaymentPreference {
            reference: format!("pref-{external_reference}"),
            checkout_url: "https://pay.example/checkout".to_string(),
        })
    }
}

// ── Helpers ──

fn test_config() -> AppConfig {
    AppConfig {
        port: 3000,
        database_url: ":memory:".to_string(),
        admin_token: "test-token".to_string(),
        slot_granularity_minutes: 30,
        sweep_interval_secs: 60,
        mercado_pago_access_token: String::new(),
    }
}

fn test_state_with(payments: MockPayments) -> Arc<AppState> {
    let conn = db::init_db(":memory:").unwrap();
    Arc::new(AppState {
        db: Arc::new(Mutex::new(conn)),
        config: test_config(),
        payments: Box::new(payments),
    })
}

fn test_state() -> Arc<AppState> {
    test_state_with(MockPayments::disabled())
}

fn test_app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health::health))
        .route("/api/services", get(handlers::catalog::list_services))
        .route("/api/employees", get(handlers::catalog::list_employees))
        .route(
            "/api/availability",
            get(handlers::availability::get_availability),
        )
        .route("/api/bookings", post(handlers::bookings::create_booking))
        .route("/api/profiles/:whatsapp", get(handlers::profiles::get_profile))
        .route(
            "/api/profiles/:whatsapp",
            put(handlers::profiles::update_profile),
        )
        .route("/webhook/payments", post(handlers::webhook::payment_webhook))
        .route("/api/admin/stats", get(handlers::admin::get_stats))
        .route("/api/admin/services", post(handlers::admin::create_service))
        .route(
            "/api/admin/services/:id",
            put(handlers::admin::update_service).delete(handlers::admin::delete_service),
        )
        .route(
            "/api/admin/employees",
            post(handlers::admin::create_employee),
        )
        .route(
            "/api/admin/employees/:id",
            put(handlers::admin::update_employee).delete(handlers::admin::delete_employee),
        )
        .route(
            "/api/admin/employees/:id/services",
            put(handlers::admin::set_employee_services),
        )
        .route("/api/admin/hours", get(handlers::admin::get_hours))
        .route(
            "/api/admin/hours/:weekday",
            put(handlers::admin::update_hours),
        )
        .route(
            "/api/admin/appointments",
            get(handlers::admin::list_appointments).post(handlers::admin::create_appointment),
        )
        .route(
            "/api/admin/appointments/:id",
            get(handlers::admin::get_appointment)
                .put(handlers::admin::update_appointment)
                .delete(handlers::admin::delete_appointment),
        )
        .route(
            "/api/admin/appointments/:id/status",
            post(handlers::admin::set_appointment_status),
        )
        .with_state(state)
}

async fn send(
    state: &Arc<AppState>,
    method: &str,
    uri: &str,
    auth: bool,
    body: Option<serde_json::Value>,
) -> (StatusCode, serde_json::Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if auth {
        builder = builder.header("Authorization", "Bearer test-token");
    }
    let request = match body {
        Some(json) => builder
            .header("Content-Type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = test_app(Arc::clone(state)).oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

// 2030-06-10 is a Monday, comfortably in the future; 2030-06-16 is a Sunday.
const MONDAY: &str = "2030-06-10";
const SUNDAY: &str = "2030-06-16";

/// Creates a 60-minute service, an employee who performs it, and Monday
/// hours 09:00-18:00 with a 12:00-13:00 break. Returns (service_id,
/// employee_id).
async fn setup_salon(state: &Arc<AppState>) -> (String, String) {
    let (status, service) = send(
        state,
        "POST",
        "/api/admin/services",
        true,
        Some(serde_json::json!({
            "name": "Haircut",
            "description": "Classic cut",
            "price_cents": 5000,
            "duration_minutes": 60,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let service_id = service["id"].as_str().unwrap().to_string();

    let (status, employee) = send(
        state,
        "POST",
        "/api/admin/employees",
        true,
        Some(serde_json::json!({ "name": "Bruno", "phone": "+5511988887777" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let employee_id = employee["id"].as_str().unwrap().to_string();

    let (status, _) = send(
        state,
        "PUT",
        &format!("/api/admin/employees/{employee_id}/services"),
        true,
        Some(serde_json::json!({ "service_ids": [service_id] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(
        state,
        "PUT",
        "/api/admin/hours/0",
        true,
        Some(serde_json::json!({
            "is_closed": false,
            "open_time": "09:00",
            "close_time": "18:00",
            "break_start": "12:00",
            "break_end": "13:00",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    (service_id, employee_id)
}

fn booking_body(service_id: &str, employee_id: &str, time: &str) -> serde_json::Value {
    serde_json::json!({
        "client_name": "Alice",
        "client_whatsapp": "+5511999990000",
        "employee_id": employee_id,
        "service_ids": [service_id],
        "date": MONDAY,
        "time": time,
    })
}

async fn slots_for(state: &Arc<AppState>, employee_id: &str, service_id: &str, date: &str) -> Vec<String> {
    let (status, json) = send(
        state,
        "GET",
        &format!("/api/availability?employee_id={employee_id}&date={date}&service_ids={service_id}"),
        false,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    json["slots"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s.as_str().unwrap().to_string())
        .collect()
}

// ── Basic endpoints ──

#[tokio::test]
async fn test_health() {
    let state = test_state();
    let (status, json) = send(&state, "GET", "/health", false, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn test_admin_requires_auth() {
    let state = test_state();
    let (status, _) = send(&state, "GET", "/api/admin/stats", false, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_admin_wrong_token() {
    let state = test_state();
    let request = Request::builder()
        .uri("/api/admin/stats")
        .header("Authorization", "Bearer wrong-token")
        .body(Body::empty())
        .unwrap();
    let response = test_app(state).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

// ── Catalogue ──

#[tokio::test]
async fn test_service_crud() {
    let state = test_state();
    let (service_id, _) = setup_salon(&state).await;

    let (status, services) = send(&state, "GET", "/api/services", false, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(services.as_array().unwrap().len(), 1);
    assert_eq!(services[0]["name"], "Haircut");
    assert_eq!(services[0]["price_cents"], 5000);

    let (status, updated) = send(
        &state,
        "PUT",
        &format!("/api/admin/services/{service_id}"),
        true,
        Some(serde_json::json!({
            "name": "Haircut Deluxe",
            "price_cents": 7500,
            "duration_minutes": 60,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["name"], "Haircut Deluxe");

    let (status, _) = send(
        &state,
        "DELETE",
        &format!("/api/admin/services/{service_id}"),
        true,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, services) = send(&state, "GET", "/api/services", false, None).await;
    assert!(services.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_service_validation() {
    let state = test_state();
    let (status, _) = send(
        &state,
        "POST",
        "/api/admin/services",
        true,
        Some(serde_json::json!({ "name": "", "price_cents": 100 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &state,
        "POST",
        "/api/admin/services",
        true,
        Some(serde_json::json!({ "name": "Cut", "price_cents": -1 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_employee_filter_requires_all_services() {
    let state = test_state();
    let (service_id, employee_id) = setup_salon(&state).await;

    // A second service Bruno does not perform.
    let (_, beard) = send(
        &state,
        "POST",
        "/api/admin/services",
        true,
        Some(serde_json::json!({ "name": "Beard trim", "price_cents": 2500, "duration_minutes": 30 })),
    )
    .await;
    let beard_id = beard["id"].as_str().unwrap();

    let (status, employees) = send(
        &state,
        "GET",
        &format!("/api/employees?service_ids={service_id}"),
        false,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(employees.as_array().unwrap().len(), 1);
    assert_eq!(employees[0]["id"], employee_id.as_str());

    let (status, employees) = send(
        &state,
        "GET",
        &format!("/api/employees?service_ids={service_id},{beard_id}"),
        false,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(employees.as_array().unwrap().is_empty());
}

// ── Operating hours ──

#[tokio::test]
async fn test_hours_validation() {
    let state = test_state();

    // break outside opening hours
    let (status, _) = send(
        &state,
        "PUT",
        "/api/admin/hours/0",
        true,
        Some(serde_json::json!({
            "is_closed": false,
            "open_time": "09:00",
            "close_time": "18:00",
            "break_start": "08:00",
            "break_end": "10:00",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // closed day with time fields
    let (status, _) = send(
        &state,
        "PUT",
        "/api/admin/hours/6",
        true,
        Some(serde_json::json!({ "is_closed": true, "open_time": "09:00" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_hours_listing_has_seven_days() {
    let state = test_state();
    let (status, hours) = send(&state, "GET", "/api/admin/hours", true, None).await;
    assert_eq!(status, StatusCode::OK);
    let hours = hours.as_array().unwrap();
    assert_eq!(hours.len(), 7);
    assert!(hours.iter().all(|h| h["is_closed"] == true));
}

// ── Availability ──

#[tokio::test]
async fn test_availability_open_day_with_break() {
    let state = test_state();
    let (service_id, employee_id) = setup_salon(&state).await;

    let slots = slots_for(&state, &employee_id, &service_id, MONDAY).await;
    assert_eq!(slots.first().map(String::as_str), Some("09:00"));
    assert_eq!(slots.last().map(String::as_str), Some("17:00"));
    assert!(!slots.contains(&"11:30".to_string()));
    assert!(!slots.contains(&"12:00".to_string()));
    assert!(slots.contains(&"11:00".to_string()));
    assert!(slots.contains(&"13:00".to_string()));
}

#[tokio::test]
async fn test_availability_closed_day_is_empty() {
    let state = test_state();
    let (service_id, employee_id) = setup_salon(&state).await;

    let slots = slots_for(&state, &employee_id, &service_id, SUNDAY).await;
    assert!(slots.is_empty());
}

#[tokio::test]
async fn test_availability_rejects_past_date() {
    let state = test_state();
    let (service_id, employee_id) = setup_salon(&state).await;

    let (status, _) = send(
        &state,
        "GET",
        &format!("/api/availability?employee_id={employee_id}&date=2020-01-06&service_ids={service_id}"),
        false,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_availability_unknown_employee() {
    let state = test_state();
    let (service_id, _) = setup_salon(&state).await;

    let (status, _) = send(
        &state,
        "GET",
        &format!("/api/availability?employee_id=nobody&date={MONDAY}&service_ids={service_id}"),
        false,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_availability_ineligible_employee() {
    let state = test_state();
    let (_, employee_id) = setup_salon(&state).await;

    let (_, other) = send(
        &state,
        "POST",
        "/api/admin/services",
        true,
        Some(serde_json::json!({ "name": "Coloring", "price_cents": 12000, "duration_minutes": 90 })),
    )
    .await;
    let other_id = other["id"].as_str().unwrap();

    let (status, _) = send(
        &state,
        "GET",
        &format!("/api/availability?employee_id={employee_id}&date={MONDAY}&service_ids={other_id}"),
        false,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// ── Booking flow ──

#[tokio::test]
async fn test_booking_excludes_taken_slots() {
    let state = test_state();
    let (service_id, employee_id) = setup_salon(&state).await;

    let (status, booking) = send(
        &state,
        "POST",
        "/api/bookings",
        false,
        Some(booking_body(&service_id, &employee_id, "10:00")),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(booking["status"], "pending");

    let slots = slots_for(&state, &employee_id, &service_id, MONDAY).await;
    assert!(!slots.contains(&"10:00".to_string()));
    assert!(!slots.contains(&"10:30".to_string()));
    assert!(!slots.contains(&"09:30".to_string()));
    assert!(slots.contains(&"09:00".to_string()));
    assert!(slots.contains(&"11:00".to_string()));
}

#[tokio::test]
async fn test_double_booking_conflict() {
    let state = test_state();
    let (service_id, employee_id) = setup_salon(&state).await;

    let (status, _) = send(
        &state,
        "POST",
        "/api/bookings",
        false,
        Some(booking_body(&service_id, &employee_id, "10:00")),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, json) = send(
        &state,
        "POST",
        "/api/bookings",
        false,
        Some(booking_body(&service_id, &employee_id, "10:00")),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(json["error"].as_str().unwrap().contains("just taken"));

    // overlapping, not identical
    let (status, _) = send(
        &state,
        "POST",
        "/api/bookings",
        false,
        Some(booking_body(&service_id, &employee_id, "10:30")),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    // adjacent is fine
    let (status, _) = send(
        &state,
        "POST",
        "/api/bookings",
        false,
        Some(booking_body(&service_id, &employee_id, "11:00")),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn test_cancel_frees_slot() {
    let state = test_state();
    let (service_id, employee_id) = setup_salon(&state).await;

    let (_, booking) = send(
        &state,
        "POST",
        "/api/bookings",
        false,
        Some(booking_body(&service_id, &employee_id, "10:00")),
    )
    .await;
    let id = booking["id"].as_str().unwrap();

    let (status, _) = send(
        &state,
        "POST",
        &format!("/api/admin/appointments/{id}/status"),
        true,
        Some(serde_json::json!({ "status": "cancelled" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let slots = slots_for(&state, &employee_id, &service_id, MONDAY).await;
    assert!(slots.contains(&"10:00".to_string()));
    assert!(slots.contains(&"10:30".to_string()));

    let (status, _) = send(
        &state,
        "POST",
        "/api/bookings",
        false,
        Some(booking_body(&service_id, &employee_id, "10:00")),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn test_booking_validation() {
    let state = test_state();
    let (service_id, employee_id) = setup_salon(&state).await;

    let mut body = booking_body(&service_id, &employee_id, "10:00");
    body["client_name"] = serde_json::json!("");
    let (status, _) = send(&state, "POST", "/api/bookings", false, Some(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let mut body = booking_body(&service_id, &employee_id, "10:00");
    body["service_ids"] = serde_json::json!([]);
    let (status, _) = send(&state, "POST", "/api/bookings", false, Some(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let mut body = booking_body(&service_id, &employee_id, "10:00");
    body["service_ids"] = serde_json::json!(["no-such-service"]);
    let (status, _) = send(&state, "POST", "/api/bookings", false, Some(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let mut body = booking_body(&service_id, &employee_id, "10:00");
    body["date"] = serde_json::json!("2020-01-06");
    let (status, _) = send(&state, "POST", "/api/bookings", false, Some(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_booking_snapshot_survives_price_change() {
    let state = test_state();
    let (service_id, employee_id) = setup_salon(&state).await;

    let (_, booking) = send(
        &state,
        "POST",
        "/api/bookings",
        false,
        Some(booking_body(&service_id, &employee_id, "10:00")),
    )
    .await;
    let id = booking["id"].as_str().unwrap().to_string();
    assert_eq!(booking["total_amount_cents"], 5000);

    // Raise the live price; the booked appointment keeps the old one.
    let (status, _) = send(
        &state,
        "PUT",
        &format!("/api/admin/services/{service_id}"),
        true,
        Some(serde_json::json!({ "name": "Haircut", "price_cents": 9900, "duration_minutes": 60 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, appointment) = send(
        &state,
        "GET",
        &format!("/api/admin/appointments/{id}"),
        true,
        None,
    )
    .await;
    assert_eq!(appointment["total_amount_cents"], 5000);
    assert_eq!(appointment["services"][0]["price_cents"], 5000);
}

#[tokio::test]
async fn test_booking_creates_profile() {
    let state = test_state();
    let (service_id, employee_id) = setup_salon(&state).await;

    send(
        &state,
        "POST",
        "/api/bookings",
        false,
        Some(booking_body(&service_id, &employee_id, "10:00")),
    )
    .await;

    let (status, profile) = send(
        &state,
        "GET",
        "/api/profiles/+5511999990000",
        false,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(profile["name"], "Alice");
}

// ── Admin appointments ──

#[tokio::test]
async fn test_admin_manual_entry_defaults_to_confirmed() {
    let state = test_state();
    let (service_id, employee_id) = setup_salon(&state).await;

    let (status, appointment) = send(
        &state,
        "POST",
        "/api/admin/appointments",
        true,
        Some(booking_body(&service_id, &employee_id, "14:00")),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(appointment["status"], "confirmed");
}

#[tokio::test]
async fn test_admin_reschedule_reruns_conflict_guard() {
    let state = test_state();
    let (service_id, employee_id) = setup_salon(&state).await;

    let (_, first) = send(
        &state,
        "POST",
        "/api/bookings",
        false,
        Some(booking_body(&service_id, &employee_id, "10:00")),
    )
    .await;
    let (_, second) = send(
        &state,
        "POST",
        "/api/bookings",
        false,
        Some(booking_body(&service_id, &employee_id, "14:00")),
    )
    .await;
    let second_id = second["id"].as_str().unwrap();

    // moving the second onto the first must conflict
    let (status, _) = send(
        &state,
        "PUT",
        &format!("/api/admin/appointments/{second_id}"),
        true,
        Some(serde_json::json!({ "time": "10:30" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    // moving it elsewhere works
    let (status, moved) = send(
        &state,
        "PUT",
        &format!("/api/admin/appointments/{second_id}"),
        true,
        Some(serde_json::json!({ "time": "15:00" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(moved["start_at"].as_str().unwrap().contains("15:00"));

    // the first appointment is untouched
    let first_id = first["id"].as_str().unwrap();
    let (_, first_now) = send(
        &state,
        "GET",
        &format!("/api/admin/appointments/{first_id}"),
        true,
        None,
    )
    .await;
    assert!(first_now["start_at"].as_str().unwrap().contains("10:00"));
}

#[tokio::test]
async fn test_status_machine_rejects_terminal_transitions() {
    let state = test_state();
    let (service_id, employee_id) = setup_salon(&state).await;

    let (_, booking) = send(
        &state,
        "POST",
        "/api/bookings",
        false,
        Some(booking_body(&service_id, &employee_id, "10:00")),
    )
    .await;
    let id = booking["id"].as_str().unwrap();

    let (status, _) = send(
        &state,
        "POST",
        &format!("/api/admin/appointments/{id}/status"),
        true,
        Some(serde_json::json!({ "status": "completed" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // completed is terminal
    let (status, _) = send(
        &state,
        "POST",
        &format!("/api/admin/appointments/{id}/status"),
        true,
        Some(serde_json::json!({ "status": "pending" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = send(
        &state,
        "POST",
        &format!("/api/admin/appointments/{id}/status"),
        true,
        Some(serde_json::json!({ "status": "nonsense" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_admin_list_and_delete_appointments() {
    let state = test_state();
    let (service_id, employee_id) = setup_salon(&state).await;

    let (_, booking) = send(
        &state,
        "POST",
        "/api/bookings",
        false,
        Some(booking_body(&service_id, &employee_id, "10:00")),
    )
    .await;
    let id = booking["id"].as_str().unwrap();

    let (status, list) = send(
        &state,
        "GET",
        "/api/admin/appointments?status=pending",
        true,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list.as_array().unwrap().len(), 1);

    let (status, _) = send(
        &state,
        "DELETE",
        &format!("/api/admin/appointments/{id}"),
        true,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, list) = send(&state, "GET", "/api/admin/appointments", true, None).await;
    assert!(list.as_array().unwrap().is_empty());
}

// ── Payments ──

#[tokio::test]
async fn test_booking_with_online_payment() {
    let state = test_state_with(MockPayments::enabled());
    let (service_id, employee_id) = setup_salon(&state).await;

    let mut body = booking_body(&service_id, &employee_id, "10:00");
    body["pay_online"] = serde_json::json!(true);
    let (status, booking) = send(&state, "POST", "/api/bookings", false, Some(body)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(booking["payment_checkout_url"], "https://pay.example/checkout");

    let id = booking["id"].as_str().unwrap();
    let (_, appointment) = send(
        &state,
        "GET",
        &format!("/api/admin/appointments/{id}"),
        true,
        None,
    )
    .await;
    assert_eq!(appointment["payment_status"], "pending");
    let reference = appointment["payment_ref"].as_str().unwrap().to_string();

    // provider reports approval via webhook
    let (status, _) = send(
        &state,
        "POST",
        "/webhook/payments",
        false,
        Some(serde_json::json!({ "reference": reference, "status": "approved" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, appointment) = send(
        &state,
        "GET",
        &format!("/api/admin/appointments/{id}"),
        true,
        None,
    )
    .await;
    assert_eq!(appointment["payment_status"], "paid");
}

#[tokio::test]
async fn test_payment_webhook_unknown_reference() {
    let state = test_state();
    let (status, _) = send(
        &state,
        "POST",
        "/webhook/payments",
        false,
        Some(serde_json::json!({ "reference": "missing", "status": "approved" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_booking_without_provider_skips_payment() {
    let state = test_state();
    let (service_id, employee_id) = setup_salon(&state).await;

    let mut body = booking_body(&service_id, &employee_id, "10:00");
    body["pay_online"] = serde_json::json!(true);
    let (status, booking) = send(&state, "POST", "/api/bookings", false, Some(body)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(booking["payment_checkout_url"].is_null());
}

// ── Stats & profiles ──

#[tokio::test]
async fn test_admin_stats_counts_upcoming() {
    let state = test_state();
    let (service_id, employee_id) = setup_salon(&state).await;

    send(
        &state,
        "POST",
        "/api/bookings",
        false,
        Some(booking_body(&service_id, &employee_id, "10:00")),
    )
    .await;

    let (status, stats) = send(&state, "GET", "/api/admin/stats", true, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["upcoming_count"], 1);
}

#[tokio::test]
async fn test_profile_put_and_get() {
    let state = test_state();

    let (status, profile) = send(
        &state,
        "PUT",
        "/api/profiles/+5511911112222",
        false,
        Some(serde_json::json!({ "name": "Carla", "email": "carla@example.com" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(profile["name"], "Carla");

    let (status, profile) = send(&state, "GET", "/api/profiles/+5511911112222", false, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(profile["email"], "carla@example.com");

    let (status, _) = send(&state, "GET", "/api/profiles/+000", false, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
