// libs/schedule-cell/src/services/holiday.rs
use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use notification_cell::{build_notice, NotificationDispatcher};
use shared_database::{AppointmentFilter, BookingStore, HolidayCascade};
use shared_models::auth::BusinessPrincipal;
use shared_models::booking::{Appointment, HolidayPeriod, TimeRange};
use shared_utils::clock::Clock;

use crate::models::{HolidayRequest, ScheduleError};
use crate::state::ScheduleState;

pub struct HolidayService {
    store: Arc<dyn BookingStore>,
    clock: Arc<dyn Clock>,
    notifier: NotificationDispatcher,
}

impl HolidayService {
    pub fn new(state: &ScheduleState) -> Self {
        Self {
            store: state.store.clone(),
            clock: state.clock.clone(),
            notifier: state.notifier.clone(),
        }
    }

    fn validate_range(start: NaiveDate, end: NaiveDate) -> Result<(), ScheduleError> {
        if end < start {
            return Err(ScheduleError::BadRequest(
                "End date must not be before start date".to_string(),
            ));
        }
        Ok(())
    }

    pub async fn list_holidays(
        &self,
        principal: &BusinessPrincipal,
    ) -> Result<Vec<HolidayPeriod>, ScheduleError> {
        Ok(self.store.holidays(principal.business_id).await?)
    }

    /// Holidays that have not ended yet.
    pub async fn upcoming_holidays(
        &self,
        principal: &BusinessPrincipal,
    ) -> Result<Vec<HolidayPeriod>, ScheduleError> {
        let today = self.clock.today();
        let holidays = self.store.holidays(principal.business_id).await?;
        Ok(holidays.into_iter().filter(|h| h.end_date >= today).collect())
    }

    pub async fn public_holidays(
        &self,
        business_slug: &str,
    ) -> Result<Vec<HolidayPeriod>, ScheduleError> {
        let business = self
            .store
            .business_by_slug(business_slug)
            .await?
            .ok_or(ScheduleError::BusinessNotFound)?;

        let today = self.clock.today();
        let holidays = self.store.holidays(business.id).await?;
        Ok(holidays.into_iter().filter(|h| h.end_date >= today).collect())
    }

    /// Appointments a holiday over `start..=end` would cancel. The cascade in
    /// `create_holiday` selects with the same range and filter.
    pub async fn affected_appointments(
        &self,
        principal: &BusinessPrincipal,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Appointment>, ScheduleError> {
        Self::validate_range(start, end)?;
        Ok(self
            .store
            .appointments_in_range(
                principal.business_id,
                TimeRange::covering_dates(start, end),
                AppointmentFilter::Active,
            )
            .await?)
    }

    #[instrument(skip(self, request), fields(business_id = %principal.business_id))]
    pub async fn create_holiday(
        &self,
        principal: &BusinessPrincipal,
        request: HolidayRequest,
    ) -> Result<HolidayCascade, ScheduleError> {
        Self::validate_range(request.start_date, request.end_date)?;

        let now = self.clock.now();
        if request.start_date < now.date() {
            return Err(ScheduleError::BadRequest(
                "Holiday cannot start in the past".to_string(),
            ));
        }

        let holiday = HolidayPeriod {
            id: Uuid::new_v4(),
            business_id: principal.business_id,
            start_date: request.start_date,
            end_date: request.end_date,
            reason: request.reason,
            created_at: now,
            updated_at: now,
        };

        let cascade = self.store.create_holiday(holiday, now).await?;

        info!(
            "Holiday {} ({}..={}) cancelled {} appointments",
            cascade.holiday.id,
            cascade.holiday.start_date,
            cascade.holiday.end_date,
            cascade.cancelled.len()
        );

        for appointment in &cascade.cancelled {
            self.notify_cancelled(appointment).await;
        }

        Ok(cascade)
    }

    /// Moves or resizes a holiday. Appointments on dates it newly covers are
    /// cancelled the same way `create_holiday` cancels them.
    #[instrument(skip(self, request), fields(business_id = %principal.business_id))]
    pub async fn update_holiday(
        &self,
        principal: &BusinessPrincipal,
        holiday_id: Uuid,
        request: HolidayRequest,
    ) -> Result<HolidayCascade, ScheduleError> {
        Self::validate_range(request.start_date, request.end_date)?;

        let mut holiday = self
            .store
            .holiday(principal.business_id, holiday_id)
            .await?
            .ok_or_else(|| ScheduleError::NotFound("Holiday not found".to_string()))?;

        let now = self.clock.now();
        if request.start_date != holiday.start_date && request.start_date < now.date() {
            return Err(ScheduleError::BadRequest(
                "Holiday cannot start in the past".to_string(),
            ));
        }

        holiday.start_date = request.start_date;
        holiday.end_date = request.end_date;
        holiday.reason = request.reason;
        holiday.updated_at = now;

        let cascade = self.store.update_holiday(holiday, now).await?;

        if !cascade.cancelled.is_empty() {
            info!(
                "Holiday {} now {}..={}, cancelled {} appointments",
                cascade.holiday.id,
                cascade.holiday.start_date,
                cascade.holiday.end_date,
                cascade.cancelled.len()
            );
        }

        for appointment in &cascade.cancelled {
            self.notify_cancelled(appointment).await;
        }

        Ok(cascade)
    }

    pub async fn delete_holiday(
        &self,
        principal: &BusinessPrincipal,
        holiday_id: Uuid,
    ) -> Result<(), ScheduleError> {
        Ok(self
            .store
            .delete_holiday(principal.business_id, holiday_id)
            .await?)
    }

    async fn notify_cancelled(&self, appointment: &Appointment) {
        match build_notice(self.store.as_ref(), appointment).await {
            Ok(notice) => self.notifier.send_cancellation(notice),
            Err(e) => warn!(
                "Skipping cancellation email for appointment {}: {}",
                appointment.id, e
            ),
        }
    }
}
