use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::db::queries;
use crate::errors::AppError;
use crate::models::appointment::{total_amount, total_duration};
use crate::models::{
    Appointment, AppointmentStatus, Employee, OperatingHours, Service, ServiceSnapshot,
};
use crate::services::scheduling;
use crate::state::AppState;

use super::{format_dt, parse_date, parse_time};

fn check_auth(headers: &HeaderMap, expected_token: &str) -> Result<(), AppError> {
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    let token = auth.strip_prefix("Bearer ").unwrap_or("");
    if token != expected_token {
        return Err(AppError::Unauthorized);
    }
    Ok(())
}

// GET /api/admin/stats
#[derive(Serialize)]
pub struct StatsResponse {
    upcoming_count: i64,
    today_count: i64,
    revenue_today_cents: i64,
}

pub async fn get_stats(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<StatsResponse>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let stats = {
        let db = state.db.lock().unwrap();
        queries::get_dashboard_stats(&db, chrono::Local::now().naive_local())?
    };

    Ok(Json(StatsResponse {
        upcoming_count: stats.upcoming_count,
        today_count: stats.today_count,
        revenue_today_cents: stats.revenue_today_cents,
    }))
}

// ── Services ──

#[derive(Deserialize)]
pub struct ServiceRequest {
    pub name: String,
    pub description: Option<String>,
    pub price_cents: i64,
    pub duration_minutes: Option<i32>,
}

fn validate_service(body: &ServiceRequest) -> Result<(), AppError> {
    if body.name.trim().is_empty() {
        return Err(AppError::Validation("name is required".to_string()));
    }
    if body.price_cents < 0 {
        return Err(AppError::Validation("price must not be negative".to_string()));
    }
    if matches!(body.duration_minutes, Some(d) if d <= 0) {
        return Err(AppError::Validation(
            "duration must be positive when set".to_string(),
        ));
    }
    Ok(())
}

// POST /api/admin/services
pub async fn create_service(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<ServiceRequest>,
) -> Result<(StatusCode, Json<Service>), AppError> {
    check_auth(&headers, &state.config.admin_token)?;
    validate_service(&body)?;

    let service = Service {
        id: uuid::Uuid::new_v4().to_string(),
        name: body.name.trim().to_string(),
        description: body.description,
        price_cents: body.price_cents,
        duration_minutes: body.duration_minutes,
    };

    {
        let db = state.db.lock().unwrap();
        queries::create_service(&db, &service)?;
    }

    Ok((StatusCode::CREATED, Json(service)))
}

// PUT /api/admin/services/:id
pub async fn update_service(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<ServiceRequest>,
) -> Result<Json<Service>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;
    validate_service(&body)?;

    let service = Service {
        id,
        name: body.name.trim().to_string(),
        description: body.description,
        price_cents: body.price_cents,
        duration_minutes: body.duration_minutes,
    };

    let updated = {
        let db = state.db.lock().unwrap();
        queries::update_service(&db, &service)?
    };

    if updated {
        Ok(Json(service))
    } else {
        Err(AppError::NotFound(format!("service {}", service.id)))
    }
}

// DELETE /api/admin/services/:id
pub async fn delete_service(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let deleted = {
        let db = state.db.lock().unwrap();
        queries::delete_service(&db, &id)?
    };

    if deleted {
        Ok(Json(serde_json::json!({ "ok": true })))
    } else {
        Err(AppError::NotFound(format!("service {id}")))
    }
}

// ── Employees ──

#[derive(Deserialize)]
pub struct EmployeeRequest {
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
}

// POST /api/admin/employees
pub async fn create_employee(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<EmployeeRequest>,
) -> Result<(StatusCode, Json<Employee>), AppError> {
    check_auth(&headers, &state.config.admin_token)?;
    if body.name.trim().is_empty() {
        return Err(AppError::Validation("name is required".to_string()));
    }

    let employee = Employee {
        id: uuid::Uuid::new_v4().to_string(),
        name: body.name.trim().to_string(),
        phone: body.phone,
        email: body.email,
    };

    {
        let db = state.db.lock().unwrap();
        queries::create_employee(&db, &employee)?;
    }

    Ok((StatusCode::CREATED, Json(employee)))
}

// PUT /api/admin/employees/:id
pub async fn update_employee(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<EmployeeRequest>,
) -> Result<Json<Employee>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;
    if body.name.trim().is_empty() {
        return Err(AppError::Validation("name is required".to_string()));
    }

    let employee = Employee {
        id,
        name: body.name.trim().to_string(),
        phone: body.phone,
        email: body.email,
    };

    let updated = {
        let db = state.db.lock().unwrap();
        queries::update_employee(&db, &employee)?
    };

    if updated {
        Ok(Json(employee))
    } else {
        Err(AppError::NotFound(format!("employee {}", employee.id)))
    }
}

// DELETE /api/admin/employees/:id
pub async fn delete_employee(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let deleted = {
        let db = state.db.lock().unwrap();
        queries::delete_employee(&db, &id)?
    };

    if deleted {
        Ok(Json(serde_json::json!({ "ok": true })))
    } else {
        Err(AppError::NotFound(format!("employee {id}")))
    }
}

// PUT /api/admin/employees/:id/services
#[derive(Deserialize)]
pub struct AssignServicesRequest {
    pub service_ids: Vec<String>,
}

pub async fn set_employee_services(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<AssignServicesRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    {
        let db = state.db.lock().unwrap();

        if queries::get_employee(&db, &id)?.is_none() {
            return Err(AppError::NotFound(format!("employee {id}")));
        }
        for service_id in &body.service_ids {
            if queries::get_service(&db, service_id)?.is_none() {
                return Err(AppError::Validation(format!("unknown service: {service_id}")));
            }
        }

        queries::set_employee_services(&db, &id, &body.service_ids)?;
    }

    Ok(Json(serde_json::json!({ "ok": true })))
}

// ── Operating Hours ──

#[derive(Serialize)]
pub struct HoursResponse {
    weekday: u8,
    is_closed: bool,
    open_time: Option<String>,
    close_time: Option<String>,
    break_start: Option<String>,
    break_end: Option<String>,
}

fn hours_response(h: &OperatingHours) -> HoursResponse {
    let fmt = |t: Option<chrono::NaiveTime>| t.map(|v| v.format("%H:%M").to_string());
    HoursResponse {
        weekday: h.weekday,
        is_closed: h.is_closed,
        open_time: fmt(h.open_time),
        close_time: fmt(h.close_time),
        break_start: fmt(h.break_start),
        break_end: fmt(h.break_end),
    }
}

// GET /api/admin/hours
pub async fn get_hours(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<HoursResponse>>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let hours = {
        let db = state.db.lock().unwrap();
        queries::list_operating_hours(&db)?
    };

    Ok(Json(hours.iter().map(hours_response).collect()))
}

// PUT /api/admin/hours/:weekday
#[derive(Deserialize)]
pub struct HoursRequest {
    pub is_closed: bool,
    pub open_time: Option<String>,
    pub close_time: Option<String>,
    pub break_start: Option<String>,
    pub break_end: Option<String>,
}

pub async fn update_hours(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(weekday): Path<u8>,
    Json(body): Json<HoursRequest>,
) -> Result<Json<HoursResponse>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let parse_opt = |s: &Option<String>| -> Result<Option<chrono::NaiveTime>, AppError> {
        s.as_deref().map(parse_time).transpose()
    };

    let hours = OperatingHours {
        weekday,
        is_closed: body.is_closed,
        open_time: parse_opt(&body.open_time)?,
        close_time: parse_opt(&body.close_time)?,
        break_start: parse_opt(&body.break_start)?,
        break_end: parse_opt(&body.break_end)?,
    };
    hours.validate().map_err(AppError::Validation)?;

    {
        let db = state.db.lock().unwrap();
        queries::upsert_operating_hours(&db, &hours)?;
    }

    Ok(Json(hours_response(&hours)))
}

// ── Appointments ──

#[derive(Serialize)]
pub struct AppointmentResponse {
    id: String,
    client_name: String,
    client_whatsapp: String,
    start_at: String,
    services: Vec<ServiceSnapshot>,
    total_amount_cents: i64,
    total_duration_minutes: i64,
    employee_id: String,
    status: String,
    payment_status: Option<String>,
    payment_ref: Option<String>,
    created_at: String,
    updated_at: String,
}

fn appointment_response(a: Appointment) -> AppointmentResponse {
    AppointmentResponse {
        id: a.id,
        client_name: a.client_name,
        client_whatsapp: a.client_whatsapp,
        start_at: format_dt(&a.start_at),
        services: a.services,
        total_amount_cents: a.total_amount_cents,
        total_duration_minutes: a.total_duration_minutes,
        employee_id: a.employee_id,
        status: a.status.as_str().to_string(),
        payment_status: a.payment_status,
        payment_ref: a.payment_ref,
        created_at: format_dt(&a.created_at),
        updated_at: format_dt(&a.updated_at),
    }
}

// GET /api/admin/appointments
#[derive(Deserialize)]
pub struct AppointmentsQuery {
    pub status: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub limit: Option<i64>,
}

pub async fn list_appointments(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<AppointmentsQuery>,
) -> Result<Json<Vec<AppointmentResponse>>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    if let Some(status) = query.status.as_deref() {
        if AppointmentStatus::try_parse(status).is_none() {
            return Err(AppError::Validation(format!("unknown status: {status}")));
        }
    }
    let from = query.from.as_deref().map(parse_date).transpose()?;
    let to = query.to.as_deref().map(parse_date).transpose()?;
    let limit = query.limit.unwrap_or(100);

    let appointments = {
        let db = state.db.lock().unwrap();
        queries::list_appointments(&db, query.status.as_deref(), from, to, limit)?
    };

    Ok(Json(
        appointments.into_iter().map(appointment_response).collect(),
    ))
}

// GET /api/admin/appointments/:id
pub async fn get_appointment(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<AppointmentResponse>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let appointment = {
        let db = state.db.lock().unwrap();
        queries::get_appointment_by_id(&db, &id)?
    };

    match appointment {
        Some(a) => Ok(Json(appointment_response(a))),
        None => Err(AppError::NotFound(format!("appointment {id}"))),
    }
}

// POST /api/admin/appointments
#[derive(Deserialize)]
pub struct AdminAppointmentRequest {
    pub client_name: String,
    pub client_whatsapp: String,
    pub employee_id: String,
    pub service_ids: Vec<String>,
    pub date: String,
    pub time: String,
    pub status: Option<String>,
}

pub async fn create_appointment(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<AdminAppointmentRequest>,
) -> Result<(StatusCode, Json<AppointmentResponse>), AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    // Manual entries default to confirmed; the admin took the booking.
    let status = match body.status.as_deref() {
        None => AppointmentStatus::Confirmed,
        Some(s) => match AppointmentStatus::try_parse(s) {
            Some(AppointmentStatus::Pending) => AppointmentStatus::Pending,
            Some(AppointmentStatus::Confirmed) => AppointmentStatus::Confirmed,
            _ => {
                return Err(AppError::Validation(
                    "new appointments must start pending or confirmed".to_string(),
                ))
            }
        },
    };

    let request = super::bookings::CreateBookingRequest {
        client_name: body.client_name,
        client_whatsapp: body.client_whatsapp,
        employee_id: body.employee_id,
        service_ids: body.service_ids,
        date: body.date,
        time: body.time,
        pay_online: false,
    };

    let appointment = super::bookings::build_and_insert(&state, &request, status)?;
    Ok((StatusCode::CREATED, Json(appointment_response(appointment))))
}

// PUT /api/admin/appointments/:id
#[derive(Deserialize)]
pub struct UpdateAppointmentRequest {
    pub client_name: Option<String>,
    pub client_whatsapp: Option<String>,
    pub employee_id: Option<String>,
    pub service_ids: Option<Vec<String>>,
    pub date: Option<String>,
    pub time: Option<String>,
}

pub async fn update_appointment(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<UpdateAppointmentRequest>,
) -> Result<Json<AppointmentResponse>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let mut db = state.db.lock().unwrap();

    let mut appointment = queries::get_appointment_by_id(&db, &id)?
        .ok_or_else(|| AppError::NotFound(format!("appointment {id}")))?;

    if appointment.status.is_terminal() {
        return Err(AppError::InvalidTransition(format!(
            "cannot edit a {} appointment",
            appointment.status.as_str()
        )));
    }

    if let Some(name) = body.client_name {
        if name.trim().is_empty() {
            return Err(AppError::Validation("client_name is required".to_string()));
        }
        appointment.client_name = name.trim().to_string();
    }
    if let Some(whatsapp) = body.client_whatsapp {
        if whatsapp.trim().is_empty() {
            return Err(AppError::Validation(
                "client_whatsapp is required".to_string(),
            ));
        }
        appointment.client_whatsapp = whatsapp.trim().to_string();
    }
    if let Some(employee_id) = body.employee_id {
        if queries::get_employee(&db, &employee_id)?.is_none() {
            return Err(AppError::NotFound(format!("employee {employee_id}")));
        }
        appointment.employee_id = employee_id;
    }

    // Changing the service set takes fresh snapshots at current prices;
    // other appointments keep the prices they were booked at.
    if let Some(service_ids) = body.service_ids {
        if service_ids.is_empty() {
            return Err(AppError::Validation("select at least one service".to_string()));
        }
        let mut snapshots = Vec::with_capacity(service_ids.len());
        for service_id in &service_ids {
            match queries::get_service(&db, service_id)? {
                Some(s) => snapshots.push(ServiceSnapshot {
                    id: s.id,
                    name: s.name,
                    price_cents: s.price_cents,
                    duration_minutes: s.duration_minutes,
                }),
                None => {
                    return Err(AppError::Validation(format!("unknown service: {service_id}")))
                }
            }
        }
        appointment.total_amount_cents = total_amount(&snapshots);
        appointment.total_duration_minutes = total_duration(&snapshots);
        appointment.services = snapshots;
    }

    if body.date.is_some() || body.time.is_some() {
        let date = match body.date.as_deref() {
            Some(d) => parse_date(d)?,
            None => appointment.start_at.date(),
        };
        let time = match body.time.as_deref() {
            Some(t) => parse_time(t)?,
            None => appointment.start_at.time(),
        };
        appointment.start_at = date.and_time(time);
    }

    if !queries::employee_performs_all(
        &db,
        &appointment.employee_id,
        &appointment
            .services
            .iter()
            .map(|s| s.id.clone())
            .collect::<Vec<_>>(),
    )? {
        return Err(AppError::Validation(
            "employee does not perform all selected services".to_string(),
        ));
    }

    appointment.updated_at = chrono::Local::now().naive_local();

    if !scheduling::update_checked(&mut db, &appointment)? {
        return Err(AppError::NotFound(format!("appointment {id}")));
    }

    Ok(Json(appointment_response(appointment)))
}

// POST /api/admin/appointments/:id/status
#[derive(Deserialize)]
pub struct SetStatusRequest {
    pub status: String,
}

pub async fn set_appointment_status(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<SetStatusRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let next = AppointmentStatus::try_parse(&body.status)
        .ok_or_else(|| AppError::Validation(format!("unknown status: {}", body.status)))?;

    {
        let db = state.db.lock().unwrap();

        let appointment = queries::get_appointment_by_id(&db, &id)?
            .ok_or_else(|| AppError::NotFound(format!("appointment {id}")))?;

        if !appointment.status.can_transition_to(next) {
            return Err(AppError::InvalidTransition(format!(
                "{} -> {}",
                appointment.status.as_str(),
                next.as_str()
            )));
        }

        queries::update_appointment_status(&db, &id, next, chrono::Local::now().naive_local())?;
    }

    Ok(Json(serde_json::json!({ "ok": true, "status": next.as_str() })))
}

// DELETE /api/admin/appointments/:id
pub async fn delete_appointment(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let deleted = {
        let db = state.db.lock().unwrap();
        queries::delete_appointment(&db, &id)?
    };

    if deleted {
        Ok(Json(serde_json::json!({ "ok": true })))
    } else {
        Err(AppError::NotFound(format!("appointment {id}")))
    }
}
