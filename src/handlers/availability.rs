use std::sync::Arc;

use axum::extract::{Query, State};
use axum::Json;
use chrono::Datelike;
use serde::{Deserialize, Serialize};

use crate::db::queries;
use crate::errors::AppError;
use crate::services::availability::compute_slots;
use crate::state::AppState;

use super::parse_date;

// GET /api/availability?employee_id&date&service_ids=a,b
#[derive(Deserialize)]
pub struct AvailabilityQuery {
    pub employee_id: String,
    pub date: String,
    pub service_ids: String,
}

#[derive(Serialize)]
pub struct AvailabilityResponse {
    pub employee_id: String,
    pub date: String,
    pub slots: Vec<String>,
}

pub async fn get_availability(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<Json<AvailabilityResponse>, AppError> {
    let date = parse_date(&query.date)?;

    let service_ids: Vec<String> = query
        .service_ids
        .split(',')
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();
    if service_ids.is_empty() {
        return Err(AppError::Validation("select at least one service".to_string()));
    }

    let now = chrono::Local::now().naive_local();
    if date < now.date() {
        return Err(AppError::Validation("date must not be in the past".to_string()));
    }

    let slots = {
        let db = state.db.lock().unwrap();

        if queries::get_employee(&db, &query.employee_id)?.is_none() {
            return Err(AppError::NotFound(format!(
                "employee {}",
                query.employee_id
            )));
        }

        let mut total_duration: i64 = 0;
        for id in &service_ids {
            match queries::get_service(&db, id)? {
                Some(s) => total_duration += s.duration_minutes.unwrap_or(0) as i64,
                None => return Err(AppError::Validation(format!("unknown service: {id}"))),
            }
        }

        if !queries::employee_performs_all(&db, &query.employee_id, &service_ids)? {
            return Err(AppError::Validation(
                "employee does not perform all selected services".to_string(),
            ));
        }

        let weekday = date.weekday().num_days_from_monday() as u8;
        let hours = match queries::get_operating_hours(&db, weekday)? {
            Some(h) => h,
            None => {
                return Ok(Json(AvailabilityResponse {
                    employee_id: query.employee_id,
                    date: query.date,
                    slots: vec![],
                }))
            }
        };

        let booked: Vec<_> = queries::appointments_for_employee_on_date(&db, &query.employee_id, date)?
            .into_iter()
            .map(|a| (a.start_at, a.total_duration_minutes))
            .collect();

        compute_slots(
            &hours,
            &booked,
            date,
            total_duration,
            state.config.slot_granularity_minutes,
            Some(now),
        )
    };

    Ok(Json(AvailabilityResponse {
        employee_id: query.employee_id,
        date: query.date,
        slots: slots
            .iter()
            .map(|s| s.format("%H:%M").to_string())
            .collect(),
    }))
}
