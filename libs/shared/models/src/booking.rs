// libs/shared/models/src/booking.rs
use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const DEFAULT_SLOT_INCREMENT_MINUTES: i64 = 30;

/// Half-open interval overlap. Touching endpoints do not overlap.
pub fn intervals_overlap(
    start1: NaiveDateTime,
    end1: NaiveDateTime,
    start2: NaiveDateTime,
    end2: NaiveDateTime,
) -> bool {
    start1 < end2 && start2 < end1
}

// ==============================================================================
// BUSINESS & SERVICE
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Business {
    pub id: Uuid,
    pub slug: String,
    pub name: String,
    pub owner_id: String,
    pub email: Option<String>,
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Service {
    pub id: Uuid,
    pub business_id: Uuid,
    pub name: String,
    pub duration_minutes: i32,
    pub price: f64,
    pub is_active: bool,
}

impl Service {
    pub fn duration(&self) -> Duration {
        Duration::minutes(self.duration_minutes as i64)
    }
}

// ==============================================================================
// CUSTOMER
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Customer {
    pub id: Uuid,
    pub business_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub total_appointments: i32,
    pub last_appointment_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
}

impl Customer {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Contact details supplied with a booking; customers are resolved by (business, email).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CustomerInfo {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
}

// ==============================================================================
// SCHEDULES
// ==============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DayOfWeek {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl DayOfWeek {
    pub fn of(date: NaiveDate) -> Self {
        date.weekday().into()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DayOfWeek::Monday => "MONDAY",
            DayOfWeek::Tuesday => "TUESDAY",
            DayOfWeek::Wednesday => "WEDNESDAY",
            DayOfWeek::Thursday => "THURSDAY",
            DayOfWeek::Friday => "FRIDAY",
            DayOfWeek::Saturday => "SATURDAY",
            DayOfWeek::Sunday => "SUNDAY",
        }
    }
}

impl From<Weekday> for DayOfWeek {
    fn from(day: Weekday) -> Self {
        match day {
            Weekday::Mon => DayOfWeek::Monday,
            Weekday::Tue => DayOfWeek::Tuesday,
            Weekday::Wed => DayOfWeek::Wednesday,
            Weekday::Thu => DayOfWeek::Thursday,
            Weekday::Fri => DayOfWeek::Friday,
            Weekday::Sat => DayOfWeek::Saturday,
            Weekday::Sun => DayOfWeek::Sunday,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WeeklyScheduleEntry {
    pub id: Uuid,
    pub business_id: Uuid,
    pub day_of_week: DayOfWeek,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub slot_duration_minutes: Option<i32>,
    pub is_active: bool,
}

impl WeeklyScheduleEntry {
    pub fn slot_increment_minutes(&self) -> i64 {
        self.slot_duration_minutes
            .map(|m| m as i64)
            .unwrap_or(DEFAULT_SLOT_INCREMENT_MINUTES)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScheduleException {
    pub id: Uuid,
    pub business_id: Uuid,
    pub exception_date: NaiveDate,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HolidayPeriod {
    pub id: Uuid,
    pub business_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub reason: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl HolidayPeriod {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }

    /// Inclusive date-range overlap.
    pub fn overlaps_dates(&self, start: NaiveDate, end: NaiveDate) -> bool {
        self.start_date <= end && start <= self.end_date
    }

    pub fn closure_window(&self) -> TimeRange {
        TimeRange::covering_dates(self.start_date, self.end_date)
    }
}

/// Half-open `[start, end)` range of local date-times.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl TimeRange {
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self { start, end }
    }

    /// Every instant of the dates `first..=last`.
    pub fn covering_dates(first: NaiveDate, last: NaiveDate) -> Self {
        let end = last.succ_opt().unwrap_or(NaiveDate::MAX);
        Self {
            start: first.and_time(NaiveTime::MIN),
            end: end.and_time(NaiveTime::MIN),
        }
    }

    pub fn day(date: NaiveDate) -> Self {
        Self::covering_dates(date, date)
    }

    pub fn contains(&self, instant: NaiveDateTime) -> bool {
        self.start <= instant && instant < self.end
    }
}

// ==============================================================================
// APPOINTMENTS
// ==============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AppointmentStatus {
    Pending,
    Confirmed,
    Completed,
    Cancelled,
    NoShow,
}

impl AppointmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Pending => "PENDING",
            AppointmentStatus::Confirmed => "CONFIRMED",
            AppointmentStatus::Completed => "COMPLETED",
            AppointmentStatus::Cancelled => "CANCELLED",
            AppointmentStatus::NoShow => "NO_SHOW",
        }
    }
}

impl std::fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CancelledBy {
    Customer,
    Business,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Appointment {
    pub id: Uuid,
    pub business_id: Uuid,
    pub service_id: Uuid,
    pub customer_id: Uuid,
    pub appointment_datetime: NaiveDateTime,
    pub duration_minutes: i32,
    pub price: f64,
    pub status: AppointmentStatus,
    pub notes: Option<String>,
    pub cancellation_token: String,
    pub cancellation_reason: Option<String>,
    pub cancelled_by: Option<CancelledBy>,
    pub confirmed_at: Option<NaiveDateTime>,
    pub cancelled_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Appointment {
    pub fn end_time(&self) -> NaiveDateTime {
        self.appointment_datetime + Duration::minutes(self.duration_minutes as i64)
    }

    /// Whether this appointment occupies its interval on the calendar.
    pub fn is_blocking(&self) -> bool {
        self.status != AppointmentStatus::Cancelled
    }

    pub fn conflicts_with(&self, start: NaiveDateTime, end: NaiveDateTime) -> bool {
        self.is_blocking()
            && intervals_overlap(self.appointment_datetime, self.end_time(), start, end)
    }
}

/// A status change applied to one appointment, with its audit fields.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusChange {
    pub status: AppointmentStatus,
    pub cancelled_by: Option<CancelledBy>,
    pub cancellation_reason: Option<String>,
    pub at: NaiveDateTime,
}

impl StatusChange {
    /// True when applying this change puts a cancelled appointment back on the calendar.
    pub fn reactivates(&self, appointment: &Appointment) -> bool {
        !appointment.is_blocking() && self.status != AppointmentStatus::Cancelled
    }

    pub fn apply(&self, appointment: &mut Appointment) {
        appointment.status = self.status;
        appointment.updated_at = self.at;
        match self.status {
            AppointmentStatus::Confirmed => appointment.confirmed_at = Some(self.at),
            AppointmentStatus::Cancelled => {
                appointment.cancelled_at = Some(self.at);
                appointment.cancelled_by = self.cancelled_by;
                if self.cancellation_reason.is_some() {
                    appointment.cancellation_reason = self.cancellation_reason.clone();
                }
            }
            _ => {}
        }
    }
}
