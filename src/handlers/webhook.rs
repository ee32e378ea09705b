use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::Deserialize;

use crate::db::queries;
use crate::errors::AppError;
use crate::state::AppState;

// POST /webhook/payments
//
// Asynchronous status report from the payment provider, keyed by the
// preference reference we stored at checkout time.
#[derive(Deserialize)]
pub struct PaymentWebhookBody {
    pub reference: String,
    pub status: String,
}

pub async fn payment_webhook(
    State(state): State<Arc<AppState>>,
    Json(body): Json<PaymentWebhookBody>,
) -> Result<Json<serde_json::Value>, AppError> {
    let status = normalize_status(&body.status);

    let updated = {
        let db = state.db.lock().unwrap();
        queries::update_payment_status_by_ref(
            &db,
            &body.reference,
            status,
            chrono::Local::now().naive_local(),
        )?
    };

    if !updated {
        tracing::warn!(reference = %body.reference, "payment webhook for unknown reference");
        return Err(AppError::NotFound(format!(
            "payment reference {}",
            body.reference
        )));
    }

    tracing::info!(reference = %body.reference, status, "payment status updated");
    Ok(Json(serde_json::json!({ "ok": true })))
}

fn normalize_status(raw: &str) -> &'static str {
    match raw.to_ascii_lowercase().as_str() {
        "approved" | "paid" => "paid",
        _ => "failed",
    }
}
