pub mod admin;
pub mod availability;
pub mod bookings;
pub mod catalog;
pub mod health;
pub mod profiles;
pub mod webhook;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use crate::errors::AppError;

pub(crate) fn parse_date(s: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|_| AppError::Validation(format!("invalid date: {s}, expected YYYY-MM-DD")))
}

pub(crate) fn parse_time(s: &str) -> Result<NaiveTime, AppError> {
    NaiveTime::parse_from_str(s, "%H:%M")
        .map_err(|_| AppError::Validation(format!("invalid time: {s}, expected HH:MM")))
}

pub(crate) fn format_dt(dt: &NaiveDateTime) -> String {
    dt.format("%Y-%m-%d %H:%M:%S").to_string()
}
