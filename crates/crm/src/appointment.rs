use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

use totes_core::{DomainError, DomainResult, Entity, EntityId};

/// How many appointments may share one exact date-time.
pub const MAX_APPOINTMENTS_PER_SLOT: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Appointment {
    #[serde(default)]
    pub id: EntityId,
    /// Local wall-clock time of the appointment.
    pub date_time: NaiveDateTime,
    #[serde(default)]
    pub customer_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    pub customer_id: EntityId,
    /// `true` while the appointment is open.
    #[serde(default = "open")]
    pub state: bool,
}

fn open() -> bool {
    true
}

impl Entity for Appointment {
    const KIND: &'static str = "appointment";
    const SEARCH_FIELDS: &'static [&'static str] = &["id", "customer_id", "state"];

    fn id(&self) -> EntityId {
        self.id
    }

    fn set_id(&mut self, id: EntityId) {
        self.id = id;
    }

    fn validate(&self) -> DomainResult<()> {
        if !self.customer_id.is_set() {
            return Err(DomainError::MissingField("customer_id"));
        }
        if !self.email.is_empty() && !self.email.contains('@') {
            return Err(DomainError::validation(format!("'{}' is not a valid email", self.email)));
        }
        Ok(())
    }
}

/// Reject a new booking when `existing` appointments already hold the slot.
pub fn ensure_slot_available(existing: usize) -> DomainResult<()> {
    if existing >= MAX_APPOINTMENTS_PER_SLOT {
        return Err(DomainError::validation(format!(
            "the time slot already has {MAX_APPOINTMENTS_PER_SLOT} appointments"
        )));
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HourlyCount {
    pub hour: u32,
    pub count: usize,
}

/// Appointments on `date` grouped by hour; empty hours are omitted.
pub fn hourly_counts(date: NaiveDate, appointments: &[Appointment]) -> Vec<HourlyCount> {
    let mut by_hour: BTreeMap<u32, usize> = BTreeMap::new();
    for a in appointments.iter().filter(|a| a.date_time.date() == date) {
        *by_hour.entry(a.date_time.hour()).or_default() += 1;
    }
    by_hour
        .into_iter()
        .map(|(hour, count)| HourlyCount { hour, count })
        .collect()
}

/// Accepts `YYYY-MM-DDTHH:MM:SS` and `YYYY-MM-DD HH:MM:SS`.
pub fn parse_date_time(raw: &str) -> DomainResult<NaiveDateTime> {
    let raw = raw.trim();
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S"))
        .map_err(|_| DomainError::validation(format!("'{raw}' is not a date-time (YYYY-MM-DDTHH:MM:SS)")))
}

pub fn parse_date(raw: &str) -> DomainResult<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| DomainError::validation(format!("'{raw}' is not a date (YYYY-MM-DD)")))
}
