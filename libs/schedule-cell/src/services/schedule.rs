// libs/schedule-cell/src/services/schedule.rs
use std::sync::Arc;

use chrono::NaiveTime;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use shared_database::BookingStore;
use shared_models::auth::BusinessPrincipal;
use shared_models::booking::{ScheduleException, WeeklyScheduleEntry, DEFAULT_SLOT_INCREMENT_MINUTES};

use crate::models::{
    ScheduleError, ScheduleExceptionRequest, ScheduleRequest, UpdateScheduleRequest,
};
use crate::state::ScheduleState;

/// Weekly opening hours and single-day closures of a business.
pub struct ScheduleService {
    store: Arc<dyn BookingStore>,
}

fn validate_hours(
    start_time: NaiveTime,
    end_time: NaiveTime,
    slot_duration_minutes: Option<i32>,
) -> Result<(), ScheduleError> {
    if end_time <= start_time {
        return Err(ScheduleError::BadRequest(
            "End time must be after start time".to_string(),
        ));
    }
    if matches!(slot_duration_minutes, Some(minutes) if minutes <= 0) {
        return Err(ScheduleError::BadRequest(
            "Slot duration must be a positive number of minutes".to_string(),
        ));
    }
    Ok(())
}

impl ScheduleService {
    pub fn new(state: &ScheduleState) -> Self {
        Self {
            store: state.store.clone(),
        }
    }

    pub async fn list_schedule(
        &self,
        principal: &BusinessPrincipal,
    ) -> Result<Vec<WeeklyScheduleEntry>, ScheduleError> {
        Ok(self.store.weekly_schedule(principal.business_id).await?)
    }

    /// Active weekly hours of a business, for its public booking page.
    pub async fn public_schedule(
        &self,
        business_slug: &str,
    ) -> Result<Vec<WeeklyScheduleEntry>, ScheduleError> {
        let business = self
            .store
            .business_by_slug(business_slug)
            .await?
            .ok_or(ScheduleError::BusinessNotFound)?;

        let entries = self.store.weekly_schedule(business.id).await?;
        Ok(entries.into_iter().filter(|e| e.is_active).collect())
    }

    /// Creates the entry for `day_of_week`, or replaces the existing one.
    #[instrument(skip(self, request), fields(business_id = %principal.business_id))]
    pub async fn upsert_schedule(
        &self,
        principal: &BusinessPrincipal,
        request: ScheduleRequest,
    ) -> Result<WeeklyScheduleEntry, ScheduleError> {
        validate_hours(request.start_time, request.end_time, request.slot_duration_minutes)?;

        let existing = self
            .store
            .schedule_entry_for_day(principal.business_id, request.day_of_week)
            .await?;

        let entry = WeeklyScheduleEntry {
            id: existing.map(|e| e.id).unwrap_or_else(Uuid::new_v4),
            business_id: principal.business_id,
            day_of_week: request.day_of_week,
            start_time: request.start_time,
            end_time: request.end_time,
            slot_duration_minutes: Some(
                request
                    .slot_duration_minutes
                    .unwrap_or(DEFAULT_SLOT_INCREMENT_MINUTES as i32),
            ),
            is_active: request.is_active.unwrap_or(true),
        };

        let saved = self.store.save_schedule_entry(entry).await?;
        info!("Saved {} hours for business {}", saved.day_of_week.as_str(), principal.business_id);
        Ok(saved)
    }

    pub async fn update_schedule(
        &self,
        principal: &BusinessPrincipal,
        entry_id: Uuid,
        request: UpdateScheduleRequest,
    ) -> Result<WeeklyScheduleEntry, ScheduleError> {
        let mut entry = self
            .store
            .schedule_entry(principal.business_id, entry_id)
            .await?
            .ok_or_else(|| ScheduleError::NotFound("Schedule not found".to_string()))?;

        if let Some(start_time) = request.start_time {
            entry.start_time = start_time;
        }
        if let Some(end_time) = request.end_time {
            entry.end_time = end_time;
        }
        if let Some(minutes) = request.slot_duration_minutes {
            entry.slot_duration_minutes = Some(minutes);
        }
        if let Some(is_active) = request.is_active {
            entry.is_active = is_active;
        }

        validate_hours(entry.start_time, entry.end_time, entry.slot_duration_minutes)?;

        Ok(self.store.save_schedule_entry(entry).await?)
    }

    /// Deactivates the entry; the weekday becomes closed.
    pub async fn deactivate_schedule(
        &self,
        principal: &BusinessPrincipal,
        entry_id: Uuid,
    ) -> Result<WeeklyScheduleEntry, ScheduleError> {
        let mut entry = self
            .store
            .schedule_entry(principal.business_id, entry_id)
            .await?
            .ok_or_else(|| ScheduleError::NotFound("Schedule not found".to_string()))?;

        entry.is_active = false;
        debug!("Deactivating {} hours for business {}", entry.day_of_week.as_str(), principal.business_id);
        Ok(self.store.save_schedule_entry(entry).await?)
    }

    pub async fn list_exceptions(
        &self,
        principal: &BusinessPrincipal,
    ) -> Result<Vec<ScheduleException>, ScheduleError> {
        Ok(self.store.schedule_exceptions(principal.business_id).await?)
    }

    pub async fn add_exception(
        &self,
        principal: &BusinessPrincipal,
        request: ScheduleExceptionRequest,
    ) -> Result<ScheduleException, ScheduleError> {
        let exception = ScheduleException {
            id: Uuid::new_v4(),
            business_id: principal.business_id,
            exception_date: request.date,
            reason: request.reason,
        };
        Ok(self.store.insert_schedule_exception(exception).await?)
    }

    pub async fn remove_exception(
        &self,
        principal: &BusinessPrincipal,
        exception_id: Uuid,
    ) -> Result<(), ScheduleError> {
        Ok(self
            .store
            .delete_schedule_exception(principal.business_id, exception_id)
            .await?)
    }
}
