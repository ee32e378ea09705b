use std::sync::Arc;

use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::{Employee, Service};
use crate::state::AppState;

// GET /api/services
pub async fn list_services(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Service>>, AppError> {
    let services = {
        let db = state.db.lock().unwrap();
        queries::list_services(&db)?
    };
    Ok(Json(services))
}

// GET /api/employees?service_ids=a,b
#[derive(Deserialize)]
pub struct EmployeesQuery {
    pub service_ids: Option<String>,
}

pub async fn list_employees(
    State(state): State<Arc<AppState>>,
    Query(query): Query<EmployeesQuery>,
) -> Result<Json<Vec<Employee>>, AppError> {
    let service_ids: Vec<String> = query
        .service_ids
        .as_deref()
        .unwrap_or("")
        .split(',')
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();

    let employees = {
        let db = state.db.lock().unwrap();
        queries::list_employees_for_services(&db, &service_ids)?
    };
    Ok(Json(employees))
}
