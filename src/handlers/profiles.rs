use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::Profile;
use crate::state::AppState;

// GET /api/profiles/:whatsapp
pub async fn get_profile(
    State(state): State<Arc<AppState>>,
    Path(whatsapp): Path<String>,
) -> Result<Json<Profile>, AppError> {
    let profile = {
        let db = state.db.lock().unwrap();
        queries::get_profile(&db, &whatsapp)?
    };

    match profile {
        Some(p) => Ok(Json(p)),
        None => Err(AppError::NotFound(format!("profile {whatsapp}"))),
    }
}

// PUT /api/profiles/:whatsapp
#[derive(Deserialize)]
pub struct UpdateProfileRequest {
    pub name: String,
    pub email: Option<String>,
}

pub async fn update_profile(
    State(state): State<Arc<AppState>>,
    Path(whatsapp): Path<String>,
    Json(body): Json<UpdateProfileRequest>,
) -> Result<Json<Profile>, AppError> {
    if body.name.trim().is_empty() {
        return Err(AppError::Validation("name is required".to_string()));
    }

    let profile = Profile {
        whatsapp,
        name: body.name.trim().to_string(),
        email: body.email,
    };

    {
        let db = state.db.lock().unwrap();
        queries::upsert_profile(&db, &profile)?;
    }

    Ok(Json(profile))
}
