pub mod appointment;
pub mod employee;
pub mod operating_hours;
pub mod profile;
pub mod service;

pub use appointment::{Appointment, AppointmentStatus, ServiceSnapshot};
pub use employee::Employee;
pub use operating_hours::OperatingHours;
pub use profile::Profile;
pub use service::Service;
