// libs/shared/database/src/postgrest.rs
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::booking::{
    Appointment, AppointmentStatus, Business, Customer, DayOfWeek, HolidayPeriod,
    ScheduleException, Service, StatusChange, TimeRange, WeeklyScheduleEntry,
};

use crate::store::{
    AppointmentFilter, BookedAppointment, BookingDraft, BookingStore, HolidayCascade, StoreError,
    StoreResult,
};
use crate::supabase::{SupabaseClient, SupabaseError};

const RETURN_REPRESENTATION: &[(&str, &str)] = &[("prefer", "return=representation")];
const UPSERT_REPRESENTATION: &[(&str, &str)] =
    &[("prefer", "resolution=merge-duplicates,return=representation")];

impl From<SupabaseError> for StoreError {
    fn from(error: SupabaseError) -> Self {
        match &error {
            SupabaseError::Api { status, message, .. } => match status {
                404 => StoreError::NotFound(message.clone()),
                409 => StoreError::Conflict(message.clone()),
                400 => StoreError::BadRequest(message.clone()),
                _ => StoreError::Backend(error.to_string()),
            },
            _ => StoreError::Backend(error.to_string()),
        }
    }
}

fn timestamp(value: NaiveDateTime) -> String {
    urlencoding::encode(&value.format("%Y-%m-%dT%H:%M:%S").to_string()).into_owned()
}

/// `BookingStore` over Supabase PostgREST.
///
/// Plain reads and writes use table endpoints. The check-then-write units
/// call the SQL functions in `migrations/0001_booking_engine.sql`, which
/// serialize on a per-business advisory lock inside one transaction.
pub struct SupabaseStore {
    client: SupabaseClient,
    api_token: String,
}

impl SupabaseStore {
    pub fn new(config: &AppConfig) -> Self {
        let api_token = if config.supabase_service_role_key.is_empty() {
            config.supabase_anon_key.clone()
        } else {
            config.supabase_service_role_key.clone()
        };

        Self {
            client: SupabaseClient::new(config),
            api_token,
        }
    }

    async fn select<T: DeserializeOwned>(&self, path: &str) -> StoreResult<Vec<T>> {
        let rows: Vec<T> = self
            .client
            .request(Method::GET, path, Some(&self.api_token), None)
            .await?;
        Ok(rows)
    }

    async fn select_one<T: DeserializeOwned>(&self, path: &str) -> StoreResult<Option<T>> {
        let rows: Vec<T> = self.select(path).await?;
        Ok(rows.into_iter().next())
    }

    async fn write<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        prefer: &[(&'static str, &str)],
    ) -> StoreResult<Vec<T>> {
        let rows: Vec<T> = self
            .client
            .request_with_headers(method, path, Some(&self.api_token), body, Some(prefer))
            .await?;
        Ok(rows)
    }

    fn to_body<T: serde::Serialize>(value: &T) -> StoreResult<Value> {
        serde_json::to_value(value).map_err(|e| StoreError::Backend(e.to_string()))
    }
}

#[async_trait]
impl BookingStore for SupabaseStore {
    async fn business_by_slug(&self, slug: &str) -> StoreResult<Option<Business>> {
        let path = format!(
            "/rest/v1/businesses?slug=eq.{}&limit=1",
            urlencoding::encode(slug)
        );
        self.select_one(&path).await
    }

    async fn business_by_owner(&self, owner_id: &str) -> StoreResult<Option<Business>> {
        let path = format!(
            "/rest/v1/businesses?owner_id=eq.{}&limit=1",
            urlencoding::encode(owner_id)
        );
        self.select_one(&path).await
    }

    async fn business_by_id(&self, business_id: Uuid) -> StoreResult<Option<Business>> {
        let path = format!("/rest/v1/businesses?id=eq.{}&limit=1", business_id);
        self.select_one(&path).await
    }

    async fn service(&self, business_id: Uuid, service_id: Uuid) -> StoreResult<Option<Service>> {
        let path = format!(
            "/rest/v1/services?id=eq.{}&business_id=eq.{}",
            service_id, business_id
        );
        self.select_one(&path).await
    }

    async fn customer(&self, business_id: Uuid, customer_id: Uuid) -> StoreResult<Option<Customer>> {
        let path = format!(
            "/rest/v1/customers?id=eq.{}&business_id=eq.{}",
            customer_id, business_id
        );
        self.select_one(&path).await
    }

    async fn weekly_schedule(&self, business_id: Uuid) -> StoreResult<Vec<WeeklyScheduleEntry>> {
        let path = format!("/rest/v1/weekly_schedules?business_id=eq.{}", business_id);
        let mut entries: Vec<WeeklyScheduleEntry> = self.select(&path).await?;
        entries.sort_by_key(|e| e.day_of_week);
        Ok(entries)
    }

    async fn schedule_entry(
        &self,
        business_id: Uuid,
        entry_id: Uuid,
    ) -> StoreResult<Option<WeeklyScheduleEntry>> {
        let path = format!(
            "/rest/v1/weekly_schedules?id=eq.{}&business_id=eq.{}",
            entry_id, business_id
        );
        self.select_one(&path).await
    }

    async fn schedule_entry_for_day(
        &self,
        business_id: Uuid,
        day: DayOfWeek,
    ) -> StoreResult<Option<WeeklyScheduleEntry>> {
        let path = format!(
            "/rest/v1/weekly_schedules?business_id=eq.{}&day_of_week=eq.{}",
            business_id,
            day.as_str()
        );
        self.select_one(&path).await
    }

    async fn save_schedule_entry(
        &self,
        entry: WeeklyScheduleEntry,
    ) -> StoreResult<WeeklyScheduleEntry> {
        let rows: Vec<WeeklyScheduleEntry> = self
            .write(
                Method::POST,
                "/rest/v1/weekly_schedules?on_conflict=business_id,day_of_week",
                Some(Self::to_body(&entry)?),
                UPSERT_REPRESENTATION,
            )
            .await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| StoreError::Backend("Upsert returned no schedule row".to_string()))
    }

    async fn schedule_exceptions(&self, business_id: Uuid) -> StoreResult<Vec<ScheduleException>> {
        let path = format!(
            "/rest/v1/schedule_exceptions?business_id=eq.{}&order=exception_date.asc",
            business_id
        );
        self.select(&path).await
    }

    async fn has_schedule_exception(&self, business_id: Uuid, date: NaiveDate) -> StoreResult<bool> {
        let path = format!(
            "/rest/v1/schedule_exceptions?business_id=eq.{}&exception_date=eq.{}&limit=1",
            business_id, date
        );
        let rows: Vec<ScheduleException> = self.select(&path).await?;
        Ok(!rows.is_empty())
    }

    async fn insert_schedule_exception(
        &self,
        exception: ScheduleException,
    ) -> StoreResult<ScheduleException> {
        // unique (business_id, exception_date) surfaces as 409
        let rows: Vec<ScheduleException> = self
            .write(
                Method::POST,
                "/rest/v1/schedule_exceptions",
                Some(Self::to_body(&exception)?),
                RETURN_REPRESENTATION,
            )
            .await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| StoreError::Backend("Insert returned no exception row".to_string()))
    }

    async fn delete_schedule_exception(&self, business_id: Uuid, exception_id: Uuid) -> StoreResult<()> {
        let path = format!(
            "/rest/v1/schedule_exceptions?id=eq.{}&business_id=eq.{}",
            exception_id, business_id
        );
        let rows: Vec<ScheduleException> = self
            .write(Method::DELETE, &path, None, RETURN_REPRESENTATION)
            .await?;
        if rows.is_empty() {
            return Err(StoreError::NotFound("Schedule exception not found".to_string()));
        }
        Ok(())
    }

    async fn holidays(&self, business_id: Uuid) -> StoreResult<Vec<HolidayPeriod>> {
        let path = format!(
            "/rest/v1/holidays?business_id=eq.{}&order=start_date.asc",
            business_id
        );
        self.select(&path).await
    }

    async fn holiday(&self, business_id: Uuid, holiday_id: Uuid) -> StoreResult<Option<HolidayPeriod>> {
        let path = format!(
            "/rest/v1/holidays?id=eq.{}&business_id=eq.{}",
            holiday_id, business_id
        );
        self.select_one(&path).await
    }

    async fn holiday_covering(
        &self,
        business_id: Uuid,
        date: NaiveDate,
    ) -> StoreResult<Option<HolidayPeriod>> {
        let path = format!(
            "/rest/v1/holidays?business_id=eq.{}&start_date=lte.{}&end_date=gte.{}&limit=1",
            business_id, date, date
        );
        self.select_one(&path).await
    }

    #[instrument(skip(self, holiday), fields(business_id = %holiday.business_id))]
    async fn create_holiday(
        &self,
        holiday: HolidayPeriod,
        cancelled_at: NaiveDateTime,
    ) -> StoreResult<HolidayCascade> {
        let args = json!({
            "p_holiday": Self::to_body(&holiday)?,
            "p_cancelled_at": cancelled_at,
        });
        let cascade: HolidayCascade = self
            .client
            .rpc("create_holiday_with_cascade", Some(&self.api_token), args)
            .await?;
        debug!(
            "Holiday {} created remotely, {} appointments cancelled",
            cascade.holiday.id,
            cascade.cancelled.len()
        );
        Ok(cascade)
    }

    #[instrument(skip(self, holiday), fields(business_id = %holiday.business_id))]
    async fn update_holiday(
        &self,
        holiday: HolidayPeriod,
        cancelled_at: NaiveDateTime,
    ) -> StoreResult<HolidayCascade> {
        let args = json!({
            "p_holiday": Self::to_body(&holiday)?,
            "p_cancelled_at": cancelled_at,
        });
        let cascade: HolidayCascade = self
            .client
            .rpc("update_holiday", Some(&self.api_token), args)
            .await?;
        Ok(cascade)
    }

    async fn delete_holiday(&self, business_id: Uuid, holiday_id: Uuid) -> StoreResult<()> {
        let path = format!(
            "/rest/v1/holidays?id=eq.{}&business_id=eq.{}",
            holiday_id, business_id
        );
        let rows: Vec<HolidayPeriod> = self
            .write(Method::DELETE, &path, None, RETURN_REPRESENTATION)
            .await?;
        if rows.is_empty() {
            return Err(StoreError::NotFound("Holiday not found".to_string()));
        }
        Ok(())
    }

    async fn appointments_in_range(
        &self,
        business_id: Uuid,
        range: TimeRange,
        filter: AppointmentFilter,
    ) -> StoreResult<Vec<Appointment>> {
        let mut path = format!(
            "/rest/v1/appointments?business_id=eq.{}&appointment_datetime=gte.{}&appointment_datetime=lt.{}&order=appointment_datetime.asc",
            business_id,
            timestamp(range.start),
            timestamp(range.end)
        );
        if filter == AppointmentFilter::Active {
            path.push_str("&status=neq.CANCELLED");
        }
        self.select(&path).await
    }

    async fn appointment(&self, appointment_id: Uuid) -> StoreResult<Option<Appointment>> {
        let path = format!("/rest/v1/appointments?id=eq.{}", appointment_id);
        self.select_one(&path).await
    }

    async fn appointment_by_token(&self, token: &str) -> StoreResult<Option<Appointment>> {
        let path = format!(
            "/rest/v1/appointments?cancellation_token=eq.{}",
            urlencoding::encode(token)
        );
        self.select_one(&path).await
    }

    async fn appointments_due(
        &self,
        statuses: &[AppointmentStatus],
        range: TimeRange,
    ) -> StoreResult<Vec<Appointment>> {
        if statuses.is_empty() {
            return Ok(Vec::new());
        }
        let status_list = statuses
            .iter()
            .map(AppointmentStatus::as_str)
            .collect::<Vec<_>>()
            .join(",");
        let path = format!(
            "/rest/v1/appointments?status=in.({})&appointment_datetime=gte.{}&appointment_datetime=lt.{}&order=appointment_datetime.asc",
            status_list,
            timestamp(range.start),
            timestamp(range.end)
        );
        self.select(&path).await
    }

    #[instrument(skip(self, draft), fields(business_id = %draft.business_id, start = %draft.appointment_datetime))]
    async fn book_appointment(&self, draft: BookingDraft) -> StoreResult<BookedAppointment> {
        let args = json!({ "p_draft": Self::to_body(&draft)? });
        let booked: BookedAppointment = self
            .client
            .rpc("book_appointment", Some(&self.api_token), args)
            .await?;
        Ok(booked)
    }

    async fn transition_appointment(
        &self,
        appointment_id: Uuid,
        expected: AppointmentStatus,
        change: StatusChange,
    ) -> StoreResult<Appointment> {
        let current = self
            .appointment(appointment_id)
            .await?
            .ok_or_else(|| StoreError::NotFound("Appointment not found".to_string()))?;

        let mut updated = current.clone();
        change.apply(&mut updated);

        if change.reactivates(&current) {
            // Back on the calendar: the overlap and holiday checks run under the business lock.
            let args = json!({
                "p_appointment_id": appointment_id,
                "p_expected": expected,
                "p_status": updated.status,
                "p_confirmed_at": updated.confirmed_at,
                "p_updated_at": updated.updated_at,
            });
            let reactivated: Appointment = self
                .client
                .rpc("reactivate_appointment", Some(&self.api_token), args)
                .await?;
            return Ok(reactivated);
        }

        let body = json!({
            "status": updated.status,
            "cancelled_by": updated.cancelled_by,
            "cancellation_reason": updated.cancellation_reason,
            "confirmed_at": updated.confirmed_at,
            "cancelled_at": updated.cancelled_at,
            "updated_at": updated.updated_at,
        });
        let path = format!(
            "/rest/v1/appointments?id=eq.{}&status=eq.{}",
            appointment_id,
            expected.as_str()
        );
        let rows: Vec<Appointment> = self
            .write(Method::PATCH, &path, Some(body), RETURN_REPRESENTATION)
            .await?;

        rows.into_iter().next().ok_or_else(|| {
            warn!(
                "Appointment {} no longer {} (was {})",
                appointment_id, expected, current.status
            );
            StoreError::Conflict(format!("Appointment status changed to {}", current.status))
        })
    }
}
