use std::sync::Arc;
use std::time::Duration;

use crate::db::queries;
use crate::state::AppState;

/// Periodic status promotion: pending/confirmed appointments whose start
/// time has passed become in_progress. Runs for the life of the process.
pub fn spawn(state: Arc<AppState>) -> tokio::task::JoinHandle<()> {
    let interval = Duration::from_secs(state.config.sweep_interval_secs.max(1));

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;

            let now = chrono::Local::now().naive_local();
            let result = {
                let db = state.db.lock().unwrap();
                queries::promote_due_appointments(&db, now)
            };

            match result {
                Ok(0) => {}
                Ok(count) => tracing::info!(count, "promoted appointments to in_progress"),
                Err(e) => tracing::error!(error = %e, "status sweep failed"),
            }
        }
    })
}
