use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::db::queries;
use crate::errors::AppError;
use crate::models::appointment::{total_amount, total_duration};
use crate::models::{Appointment, AppointmentStatus, Profile, ServiceSnapshot};
use crate::services::scheduling;
use crate::state::AppState;

use super::{format_dt, parse_date, parse_time};

// POST /api/bookings
#[derive(Deserialize)]
pub struct CreateBookingRequest {
    pub client_name: String,
    pub client_whatsapp: String,
    pub employee_id: String,
    pub service_ids: Vec<String>,
    pub date: String,
    pub time: String,
    #[serde(default)]
    pub pay_online: bool,
}

#[derive(Serialize)]
pub struct BookingResponse {
    pub id: String,
    pub status: String,
    pub start_at: String,
    pub total_amount_cents: i64,
    pub payment_checkout_url: Option<String>,
    pub payment_error: Option<String>,
}

pub async fn create_booking(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateBookingRequest>,
) -> Result<(StatusCode, Json<BookingResponse>), AppError> {
    // Customer-created bookings start out pending.
    let appointment = build_and_insert(&state, &body, AppointmentStatus::Pending)?;

    // Online payment is attempted after the slot is secured. A provider
    // failure leaves the appointment unpaid so staff can follow up; it never
    // rolls back the booking.
    let mut payment_checkout_url = None;
    let mut payment_error = None;
    if body.pay_online && state.payments.is_configured() {
        match state
            .payments
            .create_preference(&appointment.id, &appointment.client_name, &appointment.services)
            .await
        {
            Ok(pref) => {
                let db = state.db.lock().unwrap();
                queries::set_payment_ref(
                    &db,
                    &appointment.id,
                    &pref.reference,
                    "pending",
                    chrono::Local::now().naive_local(),
                )?;
                payment_checkout_url = Some(pref.checkout_url);
            }
            Err(e) => {
                tracing::warn!(appointment_id = %appointment.id, error = %e, "payment preference failed");
                payment_error = Some(e.to_string());
            }
        }
    }

    Ok((
        StatusCode::CREATED,
        Json(BookingResponse {
            id: appointment.id,
            status: appointment.status.as_str().to_string(),
            start_at: format_dt(&appointment.start_at),
            total_amount_cents: appointment.total_amount_cents,
            payment_checkout_url,
            payment_error,
        }),
    ))
}

/// Validates the request, snapshots the selected services and inserts the
/// appointment through the conflict guard. Shared with the admin
/// manual-entry flow, which differs only in the initial status.
pub(crate) fn build_and_insert(
    state: &AppState,
    body: &CreateBookingRequest,
    status: AppointmentStatus,
) -> Result<Appointment, AppError> {
    if body.client_name.trim().is_empty() {
        return Err(AppError::Validation("client_name is required".to_string()));
    }
    if body.client_whatsapp.trim().is_empty() {
        return Err(AppError::Validation(
            "client_whatsapp is required".to_string(),
        ));
    }
    if body.employee_id.is_empty() {
        return Err(AppError::Validation("select an employee".to_string()));
    }
    if body.service_ids.is_empty() {
        return Err(AppError::Validation("select at least one service".to_string()));
    }

    let date = parse_date(&body.date)?;
    let time = parse_time(&body.time)?;
    let start_at = date.and_time(time);

    let now = chrono::Local::now().naive_local();
    if start_at <= now {
        return Err(AppError::Validation(
            "appointment time must be in the future".to_string(),
        ));
    }

    let mut db = state.db.lock().unwrap();

    if queries::get_employee(&db, &body.employee_id)?.is_none() {
        return Err(AppError::NotFound(format!("employee {}", body.employee_id)));
    }

    let mut snapshots: Vec<ServiceSnapshot> = Vec::with_capacity(body.service_ids.len());
    for id in &body.service_ids {
        match queries::get_service(&db, id)? {
            Some(s) => snapshots.push(ServiceSnapshot {
                id: s.id,
                name: s.name,
                price_cents: s.price_cents,
                duration_minutes: s.duration_minutes,
            }),
            None => return Err(AppError::Validation(format!("unknown service: {id}"))),
        }
    }

    if !queries::employee_performs_all(&db, &body.employee_id, &body.service_ids)? {
        return Err(AppError::Validation(
            "employee does not perform all selected services".to_string(),
        ));
    }

    let appointment = Appointment {
        id: uuid::Uuid::new_v4().to_string(),
        client_name: body.client_name.trim().to_string(),
        client_whatsapp: body.client_whatsapp.trim().to_string(),
        start_at,
        total_amount_cents: total_amount(&snapshots),
        total_duration_minutes: total_duration(&snapshots),
        services: snapshots,
        employee_id: body.employee_id.clone(),
        status,
        payment_status: None,
        payment_ref: None,
        created_at: now,
        updated_at: now,
    };

    scheduling::insert_checked(&mut db, &appointment)?;

    // Prefill data for the customer's next visit; failure here must not
    // undo a committed booking.
    let profile = Profile {
        whatsapp: appointment.client_whatsapp.clone(),
        name: appointment.client_name.clone(),
        email: None,
    };
    if let Err(e) = queries::upsert_profile(&db, &profile) {
        tracing::warn!(error = %e, "failed to upsert customer profile");
    }

    Ok(appointment)
}
