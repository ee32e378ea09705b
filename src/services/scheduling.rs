use chrono::Duration;
use rusqlite::{Connection, TransactionBehavior};

use crate::db::queries;
use crate::errors::AppError;
use crate::models::Appointment;

/// Write-time enforcement of the no-double-booking invariant.
///
/// The slot list handed to customers is advisory; between reading it and
/// submitting, another customer can take the slot. Every insert and every
/// reschedule therefore re-checks for overlap inside an immediate
/// transaction before committing.
pub fn insert_checked(conn: &mut Connection, appt: &Appointment) -> Result<(), AppError> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    check_no_overlap(&tx, appt, None)?;
    queries::create_appointment(&tx, appt)?;
    tx.commit()?;
    Ok(())
}

/// Same guard for edits; the appointment's own previous slot is excluded
/// from the check.
pub fn update_checked(conn: &mut Connection, appt: &Appointment) -> Result<bool, AppError> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    check_no_overlap(&tx, appt, Some(&appt.id))?;
    let updated = queries::update_appointment(&tx, appt)?;
    tx.commit()?;
    Ok(updated)
}

fn check_no_overlap(
    conn: &Connection,
    appt: &Appointment,
    exclude_id: Option<&str>,
) -> Result<(), AppError> {
    // Cancelled appointments free up their interval; the query skips them.
    let existing =
        queries::appointments_for_employee_on_date(conn, &appt.employee_id, appt.start_at.date())?;

    let proposed_end = appt.start_at + Duration::minutes(appt.total_duration_minutes);

    for other in &existing {
        if exclude_id == Some(other.id.as_str()) {
            continue;
        }
        if appt.start_at < other.end_at() && other.start_at < proposed_end {
            return Err(AppError::SlotConflict);
        }
    }
    Ok(())
}
