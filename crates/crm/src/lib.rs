//! `totes-crm`: customer-facing scheduling and feedback.

pub mod appointment;
pub mod comment;

pub use appointment::{
    Appointment, HourlyCount, MAX_APPOINTMENTS_PER_SLOT, ensure_slot_available, hourly_counts,
    parse_date, parse_date_time,
};
pub use comment::Comment;
