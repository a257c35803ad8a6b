// libs/shared/database/src/store.rs
use async_trait::async_trait;
use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use shared_models::booking::{
    Appointment, AppointmentStatus, Business, Customer, CustomerInfo, DayOfWeek, HolidayPeriod,
    ScheduleException, Service, StatusChange, TimeRange, WeeklyScheduleEntry,
};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("Storage backend failure: {0}")]
    Backend(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

pub const SLOT_TAKEN_MESSAGE: &str = "This time slot is no longer available";
pub const CLOSED_ON_DATE_MESSAGE: &str = "The business is closed on the requested date";
pub const HOLIDAY_OVERLAP_MESSAGE: &str = "Holiday period overlaps an existing holiday";

/// Which appointments a range query returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppointmentFilter {
    All,
    /// Everything except CANCELLED.
    Active,
}

impl AppointmentFilter {
    /// The single predicate behind range reads, holiday previews and the holiday cascade.
    pub fn matches(&self, appointment: &Appointment, range: &TimeRange) -> bool {
        let in_range = range.contains(appointment.appointment_datetime);
        match self {
            AppointmentFilter::All => in_range,
            AppointmentFilter::Active => in_range && appointment.is_blocking(),
        }
    }
}

/// Everything the booking unit of work needs, decided before the lock is taken.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BookingDraft {
    pub appointment_id: Uuid,
    pub business_id: Uuid,
    pub service_id: Uuid,
    pub appointment_datetime: NaiveDateTime,
    pub duration_minutes: i32,
    pub price: f64,
    pub notes: Option<String>,
    pub customer: CustomerInfo,
    pub cancellation_token: String,
    pub created_at: NaiveDateTime,
}

impl BookingDraft {
    pub fn end_time(&self) -> NaiveDateTime {
        self.appointment_datetime + Duration::minutes(self.duration_minutes as i64)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BookedAppointment {
    pub appointment: Appointment,
    pub customer: Customer,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HolidayCascade {
    pub holiday: HolidayPeriod,
    pub cancelled: Vec<Appointment>,
}

/// Cancellation applied to every appointment swept up by a new holiday.
pub fn holiday_cancellation(holiday: &HolidayPeriod, at: NaiveDateTime) -> StatusChange {
    StatusChange {
        status: AppointmentStatus::Cancelled,
        cancelled_by: Some(shared_models::booking::CancelledBy::Business),
        cancellation_reason: Some(
            holiday
                .reason
                .clone()
                .unwrap_or_else(|| "Business closed for holiday".to_string()),
        ),
        at,
    }
}

/// Persistence boundary for the booking engine.
///
/// Every method that both checks and writes runs as one unit of work
/// serialized per business; implementations must not leave partial writes
/// behind when such a method returns an error.
#[async_trait]
pub trait BookingStore: Send + Sync {
    // Businesses, services, customers
    async fn business_by_slug(&self, slug: &str) -> StoreResult<Option<Business>>;
    async fn business_by_owner(&self, owner_id: &str) -> StoreResult<Option<Business>>;
    async fn business_by_id(&self, business_id: Uuid) -> StoreResult<Option<Business>>;
    async fn service(&self, business_id: Uuid, service_id: Uuid) -> StoreResult<Option<Service>>;
    async fn customer(&self, business_id: Uuid, customer_id: Uuid)
        -> StoreResult<Option<Customer>>;

    // Weekly schedule
    async fn weekly_schedule(&self, business_id: Uuid) -> StoreResult<Vec<WeeklyScheduleEntry>>;
    async fn schedule_entry(
        &self,
        business_id: Uuid,
        entry_id: Uuid,
    ) -> StoreResult<Option<WeeklyScheduleEntry>>;
    async fn schedule_entry_for_day(
        &self,
        business_id: Uuid,
        day: DayOfWeek,
    ) -> StoreResult<Option<WeeklyScheduleEntry>>;
    /// Upsert keyed by (business, day of week).
    async fn save_schedule_entry(
        &self,
        entry: WeeklyScheduleEntry,
    ) -> StoreResult<WeeklyScheduleEntry>;

    // Schedule exceptions
    async fn schedule_exceptions(&self, business_id: Uuid) -> StoreResult<Vec<ScheduleException>>;
    async fn has_schedule_exception(&self, business_id: Uuid, date: NaiveDate)
        -> StoreResult<bool>;
    async fn insert_schedule_exception(
        &self,
        exception: ScheduleException,
    ) -> StoreResult<ScheduleException>;
    async fn delete_schedule_exception(&self, business_id: Uuid, exception_id: Uuid)
        -> StoreResult<()>;

    // Holidays
    async fn holidays(&self, business_id: Uuid) -> StoreResult<Vec<HolidayPeriod>>;
    async fn holiday(&self, business_id: Uuid, holiday_id: Uuid)
        -> StoreResult<Option<HolidayPeriod>>;
    async fn holiday_covering(
        &self,
        business_id: Uuid,
        date: NaiveDate,
    ) -> StoreResult<Option<HolidayPeriod>>;
    /// Inserts the holiday and cancels every active appointment inside it, atomically.
    async fn create_holiday(
        &self,
        holiday: HolidayPeriod,
        cancelled_at: NaiveDateTime,
    ) -> StoreResult<HolidayCascade>;
    /// Rewrites the holiday and cancels active appointments on the dates it now covers.
    async fn update_holiday(
        &self,
        holiday: HolidayPeriod,
        cancelled_at: NaiveDateTime,
    ) -> StoreResult<HolidayCascade>;
    async fn delete_holiday(&self, business_id: Uuid, holiday_id: Uuid) -> StoreResult<()>;

    // Appointments
    async fn appointments_in_range(
        &self,
        business_id: Uuid,
        range: TimeRange,
        filter: AppointmentFilter,
    ) -> StoreResult<Vec<Appointment>>;
    async fn appointment(&self, appointment_id: Uuid) -> StoreResult<Option<Appointment>>;
    async fn appointment_by_token(&self, token: &str) -> StoreResult<Option<Appointment>>;
    /// Across all businesses, appointments in `statuses` starting inside `range`.
    async fn appointments_due(
        &self,
        statuses: &[AppointmentStatus],
        range: TimeRange,
    ) -> StoreResult<Vec<Appointment>>;
    /// Conflict check, customer resolution and insert as one serialized unit.
    async fn book_appointment(&self, draft: BookingDraft) -> StoreResult<BookedAppointment>;
    /// Compare-and-set: fails with `Conflict` if the stored status is no longer `expected`.
    /// Moving a cancelled appointment back to an active status re-runs the
    /// booking checks under the business lock.
    async fn transition_appointment(
        &self,
        appointment_id: Uuid,
        expected: AppointmentStatus,
        change: StatusChange,
    ) -> StoreResult<Appointment>;
}
