// libs/schedule-cell/src/services/slots.rs
use chrono::{Duration, NaiveDate, NaiveDateTime};

use shared_models::booking::{Appointment, DEFAULT_SLOT_INCREMENT_MINUTES};

use crate::models::{DaySchedule, TimeSlot};

/// Candidate slots for one date, in chronological order.
///
/// A slot is kept while it ends at or before closing time. Unavailable slots
/// stay in the list with `available: false`. Dates before `now`'s date yield
/// no slots at all.
pub fn generate_slots(
    day: &DaySchedule,
    service_duration_minutes: i64,
    date: NaiveDate,
    now: NaiveDateTime,
    existing_appointments: &[Appointment],
) -> Vec<TimeSlot> {
    let hours = match day {
        DaySchedule::Open(hours) => hours,
        DaySchedule::Closed(_) => return Vec::new(),
    };

    if date < now.date() || service_duration_minutes <= 0 {
        return Vec::new();
    }

    let increment = if hours.slot_increment_minutes > 0 {
        Duration::minutes(hours.slot_increment_minutes)
    } else {
        Duration::minutes(DEFAULT_SLOT_INCREMENT_MINUTES)
    };
    let duration = Duration::minutes(service_duration_minutes);
    let closing = date.and_time(hours.end_time);
    let is_today = date == now.date();

    let mut slots = Vec::new();
    let mut start = date.and_time(hours.start_time);

    while start + duration <= closing {
        let end = start + duration;

        let in_past = is_today && start < now;
        let taken = existing_appointments
            .iter()
            .any(|appointment| appointment.conflicts_with(start, end));

        slots.push(TimeSlot {
            start_time: start.time(),
            end_time: end.time(),
            available: !in_past && !taken,
        });

        start += increment;
    }

    slots
}
