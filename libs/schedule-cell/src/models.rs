// libs/schedule-cell/src/models.rs
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use shared_database::{HolidayCascade, StoreError};
use shared_models::booking::{DayOfWeek, HolidayPeriod, ScheduleException, WeeklyScheduleEntry};
use shared_models::error::AppError;

// ==============================================================================
// CALENDAR
// ==============================================================================

/// Opening hours that apply to one calendar date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenHours {
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub slot_increment_minutes: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClosedReason {
    Holiday,
    ScheduleException,
    NoWeeklyHours,
    Inactive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DaySchedule {
    Open(OpenHours),
    Closed(ClosedReason),
}

impl DaySchedule {
    pub fn is_open(&self) -> bool {
        matches!(self, DaySchedule::Open(_))
    }
}

// ==============================================================================
// AVAILABILITY
// ==============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityQuery {
    pub service_id: Uuid,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSlot {
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub available: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct AvailabilityResponse {
    pub date: NaiveDate,
    pub slots: Vec<TimeSlot>,
}

// ==============================================================================
// WEEKLY SCHEDULES
// ==============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleRequest {
    pub day_of_week: DayOfWeek,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub slot_duration_minutes: Option<i32>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateScheduleRequest {
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub slot_duration_minutes: Option<i32>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleResponse {
    pub id: Uuid,
    pub day_of_week: DayOfWeek,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub slot_duration_minutes: i64,
    pub is_active: bool,
}

impl From<WeeklyScheduleEntry> for ScheduleResponse {
    fn from(entry: WeeklyScheduleEntry) -> Self {
        Self {
            id: entry.id,
            day_of_week: entry.day_of_week,
            start_time: entry.start_time,
            end_time: entry.end_time,
            slot_duration_minutes: entry.slot_increment_minutes(),
            is_active: entry.is_active,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleExceptionRequest {
    pub date: NaiveDate,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleExceptionResponse {
    pub id: Uuid,
    pub date: NaiveDate,
    pub reason: Option<String>,
}

impl From<ScheduleException> for ScheduleExceptionResponse {
    fn from(exception: ScheduleException) -> Self {
        Self {
            id: exception.id,
            date: exception.exception_date,
            reason: exception.reason,
        }
    }
}

// ==============================================================================
// HOLIDAYS
// ==============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HolidayRequest {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AffectedAppointmentsQuery {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HolidayResponse {
    pub id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub reason: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl From<HolidayPeriod> for HolidayResponse {
    fn from(holiday: HolidayPeriod) -> Self {
        Self {
            id: holiday.id,
            start_date: holiday.start_date,
            end_date: holiday.end_date,
            reason: holiday.reason,
            created_at: holiday.created_at,
            updated_at: holiday.updated_at,
        }
    }
}

/// A created or updated holiday with the appointments it cancelled.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HolidayCascadeResponse {
    #[serde(flatten)]
    pub holiday: HolidayResponse,
    pub cancelled_appointment_ids: Vec<Uuid>,
}

impl From<HolidayCascade> for HolidayCascadeResponse {
    fn from(cascade: HolidayCascade) -> Self {
        Self {
            cancelled_appointment_ids: cascade.cancelled.iter().map(|a| a.id).collect(),
            holiday: cascade.holiday.into(),
        }
    }
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Error, Debug, PartialEq)]
pub enum ScheduleError {
    #[error("Business not found")]
    BusinessNotFound,

    #[error("Service not found")]
    ServiceNotFound,

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<StoreError> for ScheduleError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::NotFound(msg) => ScheduleError::NotFound(msg),
            StoreError::Conflict(msg) => ScheduleError::Conflict(msg),
            StoreError::BadRequest(msg) => ScheduleError::BadRequest(msg),
            StoreError::Backend(msg) => ScheduleError::Database(msg),
        }
    }
}

impl From<ScheduleError> for AppError {
    fn from(error: ScheduleError) -> Self {
        match error {
            ScheduleError::BusinessNotFound | ScheduleError::ServiceNotFound => {
                AppError::NotFound(error.to_string())
            }
            ScheduleError::NotFound(msg) => AppError::NotFound(msg),
            ScheduleError::BadRequest(msg) => AppError::BadRequest(msg),
            ScheduleError::Conflict(msg) => AppError::Conflict(msg),
            ScheduleError::Database(msg) => AppError::Database(msg),
        }
    }
}
