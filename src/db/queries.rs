use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rusqlite::{params, Connection};

use crate::models::{
    Appointment, AppointmentStatus, Employee, OperatingHours, Profile, Service, ServiceSnapshot,
};

const DATETIME_FMT: &str = "%Y-%m-%d %H:%M:%S";
const TIME_FMT: &str = "%H:%M";

fn fmt_dt(dt: &NaiveDateTime) -> String {
    dt.format(DATETIME_FMT).to_string()
}

fn parse_dt(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, DATETIME_FMT)
        .unwrap_or_else(|_| chrono::Local::now().naive_local())
}

fn parse_time_opt(s: Option<String>) -> Option<NaiveTime> {
    s.and_then(|v| NaiveTime::parse_from_str(&v, TIME_FMT).ok())
}

fn fmt_time_opt(t: Option<NaiveTime>) -> Option<String> {
    t.map(|v| v.format(TIME_FMT).to_string())
}

// ── Services ──

pub fn create_service(conn: &Connection, service: &Service) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO services (id, name, description, price_cents, duration_minutes)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            service.id,
            service.name,
            service.description,
            service.price_cents,
            service.duration_minutes,
        ],
    )?;
    Ok(())
}

pub fn update_service(conn: &Connection, service: &Service) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE services SET name = ?1, description = ?2, price_cents = ?3,
             duration_minutes = ?4, updated_at = datetime('now')
         WHERE id = ?5",
        params![
            service.name,
            service.description,
            service.price_cents,
            service.duration_minutes,
            service.id,
        ],
    )?;
    Ok(count > 0)
}

pub fn delete_service(conn: &Connection, id: &str) -> anyhow::Result<bool> {
    let count = conn.execute("DELETE FROM services WHERE id = ?1", params![id])?;
    Ok(count > 0)
}

pub fn list_services(conn: &Connection) -> anyhow::Result<Vec<Service>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, description, price_cents, duration_minutes
         FROM services ORDER BY name ASC",
    )?;

    let rows = stmt.query_map([], |row| {
        Ok(Service {
            id: row.get(0)?,
            name: row.get(1)?,
            description: row.get(2)?,
            price_cents: row.get(3)?,
            duration_minutes: row.get(4)?,
        })
    })?;

    let mut services = vec![];
    for row in rows {
        services.push(row?);
    }
    Ok(services)
}

pub fn get_service(conn: &Connection, id: &str) -> anyhow::Result<Option<Service>> {
    let result = conn.query_row(
        "SELECT id, name, description, price_cents, duration_minutes
         FROM services WHERE id = ?1",
        params![id],
        |row| {
            Ok(Service {
                id: row.get(0)?,
                name: row.get(1)?,
                description: row.get(2)?,
                price_cents: row.get(3)?,
                duration_minutes: row.get(4)?,
            })
        },
    );

    match result {
        Ok(service) => Ok(Some(service)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Resolves every id or reports the first one that does not exist.
pub fn get_services_by_ids(conn: &Connection, ids: &[String]) -> anyhow::Result<Vec<Service>> {
    let mut services = Vec::with_capacity(ids.len());
    for id in ids {
        match get_service(conn, id)? {
            Some(s) => services.push(s),
            None => anyhow::bail!("unknown service: {id}"),
        }
    }
    Ok(services)
}

// ── Employees ──

pub fn create_employee(conn: &Connection, employee: &Employee) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO employees (id, name, phone, email) VALUES (?1, ?2, ?3, ?4)",
        params![employee.id, employee.name, employee.phone, employee.email],
    )?;
    Ok(())
}

pub fn update_employee(conn: &Connection, employee: &Employee) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE employees SET name = ?1, phone = ?2, email = ?3 WHERE id = ?4",
        params![employee.name, employee.phone, employee.email, employee.id],
    )?;
    Ok(count > 0)
}

pub fn delete_employee(conn: &Connection, id: &str) -> anyhow::Result<bool> {
    let count = conn.execute("DELETE FROM employees WHERE id = ?1", params![id])?;
    Ok(count > 0)
}

pub fn list_employees(conn: &Connection) -> anyhow::Result<Vec<Employee>> {
    let mut stmt =
        conn.prepare("SELECT id, name, phone, email FROM employees ORDER BY name ASC")?;

    let rows = stmt.query_map([], |row| {
        Ok(Employee {
            id: row.get(0)?,
            name: row.get(1)?,
            phone: row.get(2)?,
            email: row.get(3)?,
        })
    })?;

    let mut employees = vec![];
    for row in rows {
        employees.push(row?);
    }
    Ok(employees)
}

pub fn get_employee(conn: &Connection, id: &str) -> anyhow::Result<Option<Employee>> {
    let result = conn.query_row(
        "SELECT id, name, phone, email FROM employees WHERE id = ?1",
        params![id],
        |row| {
            Ok(Employee {
                id: row.get(0)?,
                name: row.get(1)?,
                phone: row.get(2)?,
                email: row.get(3)?,
            })
        },
    );

    match result {
        Ok(employee) => Ok(Some(employee)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Replaces the full set of services this employee can perform.
pub fn set_employee_services(
    conn: &Connection,
    employee_id: &str,
    service_ids: &[String],
) -> anyhow::Result<()> {
    conn.execute(
        "DELETE FROM employee_services WHERE employee_id = ?1",
        params![employee_id],
    )?;
    for service_id in service_ids {
        conn.execute(
            "INSERT INTO employee_services (employee_id, service_id) VALUES (?1, ?2)",
            params![employee_id, service_id],
        )?;
    }
    Ok(())
}

pub fn get_employee_service_ids(
    conn: &Connection,
    employee_id: &str,
) -> anyhow::Result<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT service_id FROM employee_services WHERE employee_id = ?1 ORDER BY service_id",
    )?;
    let rows = stmt.query_map(params![employee_id], |row| row.get::<_, String>(0))?;

    let mut ids = vec![];
    for row in rows {
        ids.push(row?);
    }
    Ok(ids)
}

/// An employee is eligible only if assigned every one of the given services.
pub fn employee_performs_all(
    conn: &Connection,
    employee_id: &str,
    service_ids: &[String],
) -> anyhow::Result<bool> {
    if service_ids.is_empty() {
        return Ok(false);
    }

    let placeholders = vec!["?"; service_ids.len()].join(", ");
    let sql = format!(
        "SELECT COUNT(DISTINCT service_id) FROM employee_services
         WHERE employee_id = ? AND service_id IN ({placeholders})"
    );

    let mut params_vec: Vec<Box<dyn rusqlite::types::ToSql>> =
        vec![Box::new(employee_id.to_string())];
    for id in service_ids {
        params_vec.push(Box::new(id.clone()));
    }
    let params_refs: Vec<&dyn rusqlite::types::ToSql> =
        params_vec.iter().map(|p| p.as_ref()).collect();

    let count: i64 = conn.query_row(&sql, params_refs.as_slice(), |row| row.get(0))?;
    Ok(count as usize == service_ids.len())
}

pub fn list_employees_for_services(
    conn: &Connection,
    service_ids: &[String],
) -> anyhow::Result<Vec<Employee>> {
    if service_ids.is_empty() {
        return list_employees(conn);
    }

    let placeholders = vec!["?"; service_ids.len()].join(", ");
    let sql = format!(
        "SELECT e.id, e.name, e.phone, e.email
         FROM employees e
         JOIN employee_services es ON es.employee_id = e.id
         WHERE es.service_id IN ({placeholders})
         GROUP BY e.id
         HAVING COUNT(DISTINCT es.service_id) = ?
         ORDER BY e.name ASC"
    );

    let mut params_vec: Vec<Box<dyn rusqlite::types::ToSql>> = vec![];
    for id in service_ids {
        params_vec.push(Box::new(id.clone()));
    }
    params_vec.push(Box::new(service_ids.len() as i64));
    let params_refs: Vec<&dyn rusqlite::types::ToSql> =
        params_vec.iter().map(|p| p.as_ref()).collect();

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params_refs.as_slice(), |row| {
        Ok(Employee {
            id: row.get(0)?,
            name: row.get(1)?,
            phone: row.get(2)?,
            email: row.get(3)?,
        })
    })?;

    let mut employees = vec![];
    for row in rows {
        employees.push(row?);
    }
    Ok(employees)
}

// ── Operating Hours ──

fn parse_hours_row(row: &rusqlite::Row) -> rusqlite::Result<OperatingHours> {
    Ok(OperatingHours {
        weekday: row.get::<_, i64>(0)? as u8,
        is_closed: row.get::<_, i64>(1)? != 0,
        open_time: parse_time_opt(row.get(2)?),
        close_time: parse_time_opt(row.get(3)?),
        break_start: parse_time_opt(row.get(4)?),
        break_end: parse_time_opt(row.get(5)?),
    })
}

pub fn list_operating_hours(conn: &Connection) -> anyhow::Result<Vec<OperatingHours>> {
    let mut stmt = conn.prepare(
        "SELECT weekday, is_closed, open_time, close_time, break_start, break_end
         FROM operating_hours ORDER BY weekday ASC",
    )?;
    let rows = stmt.query_map([], parse_hours_row)?;

    let mut hours = vec![];
    for row in rows {
        hours.push(row?);
    }
    Ok(hours)
}

pub fn get_operating_hours(
    conn: &Connection,
    weekday: u8,
) -> anyhow::Result<Option<OperatingHours>> {
    let result = conn.query_row(
        "SELECT weekday, is_closed, open_time, close_time, break_start, break_end
         FROM operating_hours WHERE weekday = ?1",
        params![weekday as i64],
        parse_hours_row,
    );

    match result {
        Ok(hours) => Ok(Some(hours)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn upsert_operating_hours(conn: &Connection, hours: &OperatingHours) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO operating_hours (weekday, is_closed, open_time, close_time, break_start, break_end)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)
         ON CONFLICT(weekday) DO UPDATE SET
           is_closed = excluded.is_closed,
           open_time = excluded.open_time,
           close_time = excluded.close_time,
           break_start = excluded.break_start,
           break_end = excluded.break_end",
        params![
            hours.weekday as i64,
            hours.is_closed as i64,
            fmt_time_opt(hours.open_time),
            fmt_time_opt(hours.close_time),
            fmt_time_opt(hours.break_start),
            fmt_time_opt(hours.break_end),
        ],
    )?;
    Ok(())
}

// ── Appointments ──

const APPOINTMENT_COLUMNS: &str = "id, client_name, client_whatsapp, start_at, services, \
     total_amount_cents, total_duration_minutes, employee_id, status, payment_status, \
     payment_ref, created_at, updated_at";

fn parse_appointment_row(row: &rusqlite::Row) -> anyhow::Result<Appointment> {
    let services_json: String = row.get(4)?;
    let services: Vec<ServiceSnapshot> = serde_json::from_str(&services_json)?;
    let start_at_str: String = row.get(3)?;
    let status_str: String = row.get(8)?;
    let created_at_str: String = row.get(11)?;
    let updated_at_str: String = row.get(12)?;

    Ok(Appointment {
        id: row.get(0)?,
        client_name: row.get(1)?,
        client_whatsapp: row.get(2)?,
        start_at: parse_dt(&start_at_str),
        services,
        total_amount_cents: row.get(5)?,
        total_duration_minutes: row.get(6)?,
        employee_id: row.get(7)?,
        status: AppointmentStatus::parse(&status_str),
        payment_status: row.get(9)?,
        payment_ref: row.get(10)?,
        created_at: parse_dt(&created_at_str),
        updated_at: parse_dt(&updated_at_str),
    })
}

pub fn create_appointment(conn: &Connection, appt: &Appointment) -> anyhow::Result<()> {
    let services_json = serde_json::to_string(&appt.services)?;
    conn.execute(
        "INSERT INTO appointments (id, client_name, client_whatsapp, start_at, services,
             total_amount_cents, total_duration_minutes, employee_id, status, payment_status,
             payment_ref, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
        params![
            appt.id,
            appt.client_name,
            appt.client_whatsapp,
            fmt_dt(&appt.start_at),
            services_json,
            appt.total_amount_cents,
            appt.total_duration_minutes,
            appt.employee_id,
            appt.status.as_str(),
            appt.payment_status,
            appt.payment_ref,
            fmt_dt(&appt.created_at),
            fmt_dt(&appt.updated_at),
        ],
    )?;
    Ok(())
}

pub fn update_appointment(conn: &Connection, appt: &Appointment) -> anyhow::Result<bool> {
    let services_json = serde_json::to_string(&appt.services)?;
    let count = conn.execute(
        "UPDATE appointments SET client_name = ?1, client_whatsapp = ?2, start_at = ?3,
             services = ?4, total_amount_cents = ?5, total_duration_minutes = ?6,
             employee_id = ?7, status = ?8, updated_at = ?9
         WHERE id = ?10",
        params![
            appt.client_name,
            appt.client_whatsapp,
            fmt_dt(&appt.start_at),
            services_json,
            appt.total_amount_cents,
            appt.total_duration_minutes,
            appt.employee_id,
            appt.status.as_str(),
            fmt_dt(&appt.updated_at),
            appt.id,
        ],
    )?;
    Ok(count > 0)
}

pub fn get_appointment_by_id(conn: &Connection, id: &str) -> anyhow::Result<Option<Appointment>> {
    let sql = format!("SELECT {APPOINTMENT_COLUMNS} FROM appointments WHERE id = ?1");
    let result = conn.query_row(&sql, params![id], |row| Ok(parse_appointment_row(row)));

    match result {
        Ok(appt) => Ok(Some(appt?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Non-cancelled appointments of one employee on one calendar date; the set
/// the availability engine and the conflict guard subtract from.
pub fn appointments_for_employee_on_date(
    conn: &Connection,
    employee_id: &str,
    date: NaiveDate,
) -> anyhow::Result<Vec<Appointment>> {
    let day_start = format!("{} 00:00:00", date.format("%Y-%m-%d"));
    let day_end = format!("{} 23:59:59", date.format("%Y-%m-%d"));

    let sql = format!(
        "SELECT {APPOINTMENT_COLUMNS} FROM appointments
         WHERE employee_id = ?1 AND start_at >= ?2 AND start_at <= ?3
           AND status != 'cancelled'
         ORDER BY start_at ASC"
    );

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![employee_id, day_start, day_end], |row| {
        Ok(parse_appointment_row(row))
    })?;

    let mut appointments = vec![];
    for row in rows {
        appointments.push(row??);
    }
    Ok(appointments)
}

pub fn list_appointments(
    conn: &Connection,
    status_filter: Option<&str>,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
    limit: i64,
) -> anyhow::Result<Vec<Appointment>> {
    let mut clauses = vec![];
    let mut params_vec: Vec<Box<dyn rusqlite::types::ToSql>> = vec![];

    if let Some(status) = status_filter {
        clauses.push("status = ?".to_string());
        params_vec.push(Box::new(status.to_string()));
    }
    if let Some(from) = from {
        clauses.push("start_at >= ?".to_string());
        params_vec.push(Box::new(format!("{} 00:00:00", from.format("%Y-%m-%d"))));
    }
    if let Some(to) = to {
        clauses.push("start_at <= ?".to_string());
        params_vec.push(Box::new(format!("{} 23:59:59", to.format("%Y-%m-%d"))));
    }

    let where_clause = if clauses.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", clauses.join(" AND "))
    };
    let sql = format!(
        "SELECT {APPOINTMENT_COLUMNS} FROM appointments {where_clause}
         ORDER BY start_at DESC LIMIT ?"
    );
    params_vec.push(Box::new(limit));

    let params_refs: Vec<&dyn rusqlite::types::ToSql> =
        params_vec.iter().map(|p| p.as_ref()).collect();

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params_refs.as_slice(), |row| {
        Ok(parse_appointment_row(row))
    })?;

    let mut appointments = vec![];
    for row in rows {
        appointments.push(row??);
    }
    Ok(appointments)
}

pub fn update_appointment_status(
    conn: &Connection,
    id: &str,
    status: AppointmentStatus,
    now: NaiveDateTime,
) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE appointments SET status = ?1, updated_at = ?2 WHERE id = ?3",
        params![status.as_str(), fmt_dt(&now), id],
    )?;
    Ok(count > 0)
}

pub fn delete_appointment(conn: &Connection, id: &str) -> anyhow::Result<bool> {
    let count = conn.execute("DELETE FROM appointments WHERE id = ?1", params![id])?;
    Ok(count > 0)
}

pub fn set_payment_ref(
    conn: &Connection,
    id: &str,
    payment_ref: &str,
    payment_status: &str,
    now: NaiveDateTime,
) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE appointments SET payment_ref = ?1, payment_status = ?2, updated_at = ?3
         WHERE id = ?4",
        params![payment_ref, payment_status, fmt_dt(&now), id],
    )?;
    Ok(count > 0)
}

pub fn update_payment_status_by_ref(
    conn: &Connection,
    payment_ref: &str,
    payment_status: &str,
    now: NaiveDateTime,
) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE appointments SET payment_status = ?1, updated_at = ?2 WHERE payment_ref = ?3",
        params![payment_status, fmt_dt(&now), payment_ref],
    )?;
    Ok(count > 0)
}

/// Flips pending/confirmed appointments whose start time has passed to
/// in_progress. Returns the number of rows promoted.
pub fn promote_due_appointments(conn: &Connection, now: NaiveDateTime) -> anyhow::Result<usize> {
    let now_str = fmt_dt(&now);
    let count = conn.execute(
        "UPDATE appointments SET status = 'in_progress', updated_at = ?1
         WHERE status IN ('pending', 'confirmed') AND start_at <= ?1",
        params![now_str],
    )?;
    Ok(count)
}

pub struct DashboardStats {
    pub upcoming_count: i64,
    pub today_count: i64,
    pub revenue_today_cents: i64,
}

pub fn get_dashboard_stats(conn: &Connection, now: NaiveDateTime) -> anyhow::Result<DashboardStats> {
    let now_str = fmt_dt(&now);
    let today = now.date().format("%Y-%m-%d").to_string();

    let upcoming_count: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM appointments
             WHERE start_at > ?1 AND status IN ('pending', 'confirmed')",
            params![now_str],
            |row| row.get(0),
        )
        .unwrap_or(0);

    let today_count: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM appointments
             WHERE date(start_at) = ?1 AND status != 'cancelled'",
            params![today],
            |row| row.get(0),
        )
        .unwrap_or(0);

    let revenue_today_cents: i64 = conn
        .query_row(
            "SELECT COALESCE(SUM(total_amount_cents), 0) FROM appointments
             WHERE date(start_at) = ?1 AND status != 'cancelled'",
            params![today],
            |row| row.get(0),
        )
        .unwrap_or(0);

    Ok(DashboardStats {
        upcoming_count,
        today_count,
        revenue_today_cents,
    })
}

// ── Profiles ──

pub fn get_profile(conn: &Connection, whatsapp: &str) -> anyhow::Result<Option<Profile>> {
    let result = conn.query_row(
        "SELECT whatsapp, name, email FROM profiles WHERE whatsapp = ?1",
        params![whatsapp],
        |row| {
            Ok(Profile {
                whatsapp: row.get(0)?,
                name: row.get(1)?,
                email: row.get(2)?,
            })
        },
    );

    match result {
        Ok(profile) => Ok(Some(profile)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn upsert_profile(conn: &Connection, profile: &Profile) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO profiles (whatsapp, name, email) VALUES (?1, ?2, ?3)
         ON CONFLICT(whatsapp) DO UPDATE SET
           name = excluded.name,
           email = COALESCE(excluded.email, profiles.email),
           updated_at = datetime('now')",
        params![profile.whatsapp, profile.name, profile.email],
    )?;
    Ok(())
}
