use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A copy of the service's name/price/duration taken at booking time.
/// Price or duration edits to the live `Service` never touch these.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceSnapshot {
    pub id: String,
    pub name: String,
    pub price_cents: i64,
    pub duration_minutes: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: String,
    pub client_name: String,
    pub client_whatsapp: String,
    pub start_at: NaiveDateTime,
    pub services: Vec<ServiceSnapshot>,
    pub total_amount_cents: i64,
    pub total_duration_minutes: i64,
    pub employee_id: String,
    pub status: AppointmentStatus,
    pub payment_status: Option<String>,
    pub payment_ref: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Appointment {
    pub fn end_at(&self) -> NaiveDateTime {
        self.start_at + chrono::Duration::minutes(self.total_duration_minutes)
    }
}

/// Sums taken over snapshots; unknown durations count as zero minutes.
pub fn total_amount(services: &[ServiceSnapshot]) -> i64 {
    services.iter().map(|s| s.price_cents).sum()
}

pub fn total_duration(services: &[ServiceSnapshot]) -> i64 {
    services
        .iter()
        .map(|s| s.duration_minutes.unwrap_or(0) as i64)
        .sum()
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Pending,
    Confirmed,
    InProgress,
    Completed,
    Cancelled,
}

impl AppointmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Pending => "pending",
            AppointmentStatus::Confirmed => "confirmed",
            AppointmentStatus::InProgress => "in_progress",
            AppointmentStatus::Completed => "completed",
            AppointmentStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Self {
        Self::try_parse(s).unwrap_or(AppointmentStatus::Pending)
    }

    /// Strict variant for API input, where an unknown status is an error
    /// rather than a silent default.
    pub fn try_parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(AppointmentStatus::Pending),
            "confirmed" => Some(AppointmentStatus::Confirmed),
            "in_progress" => Some(AppointmentStatus::InProgress),
            "completed" => Some(AppointmentStatus::Completed),
            "cancelled" => Some(AppointmentStatus::Cancelled),
            _ => None,
        }
    }

    /// Completed and Cancelled are terminal. Cancelled appointments no
    /// longer occupy their time interval.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            AppointmentStatus::Completed | AppointmentStatus::Cancelled
        )
    }

    pub fn can_transition_to(&self, next: AppointmentStatus) -> bool {
        !self.is_terminal() && *self != next
    }
}
