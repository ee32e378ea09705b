use serde::{Deserialize, Serialize};

/// A live catalogue entry. Appointments never reference these rows directly;
/// they embed a `ServiceSnapshot` taken at booking time, so later price or
/// duration edits do not rewrite history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Service {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub price_cents: i64,
    /// None = duration unknown; contributes 0 minutes to booking totals.
    pub duration_minutes: Option<i32>,
}
