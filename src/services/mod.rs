pub mod availability;
pub mod payments;
pub mod scheduling;
pub mod sweep;
