// libs/schedule-cell/src/services/calendar.rs
use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{debug, instrument};
use uuid::Uuid;

use shared_database::BookingStore;
use shared_models::booking::{DayOfWeek, WeeklyScheduleEntry};

use crate::models::{ClosedReason, DaySchedule, OpenHours, ScheduleError};

/// Folds holiday, exception and weekly entry into the hours for one date.
/// Holidays win over exceptions, exceptions win over the weekly entry.
pub fn resolve_day(
    on_holiday: bool,
    has_exception: bool,
    weekly_entry: Option<&WeeklyScheduleEntry>,
) -> DaySchedule {
    if on_holiday {
        return DaySchedule::Closed(ClosedReason::Holiday);
    }
    if has_exception {
        return DaySchedule::Closed(ClosedReason::ScheduleException);
    }
    match weekly_entry {
        None => DaySchedule::Closed(ClosedReason::NoWeeklyHours),
        Some(entry) if !entry.is_active => DaySchedule::Closed(ClosedReason::Inactive),
        Some(entry) => DaySchedule::Open(OpenHours {
            start_time: entry.start_time,
            end_time: entry.end_time,
            slot_increment_minutes: entry.slot_increment_minutes(),
        }),
    }
}

pub struct ScheduleCalendar {
    store: Arc<dyn BookingStore>,
}

impl ScheduleCalendar {
    pub fn new(store: Arc<dyn BookingStore>) -> Self {
        Self { store }
    }

    #[instrument(skip(self))]
    pub async fn resolve_day(
        &self,
        business_id: Uuid,
        date: NaiveDate,
    ) -> Result<DaySchedule, ScheduleError> {
        let on_holiday = self.store.holiday_covering(business_id, date).await?.is_some();
        if on_holiday {
            debug!("{} falls inside a holiday", date);
            return Ok(resolve_day(true, false, None));
        }

        let has_exception = self.store.has_schedule_exception(business_id, date).await?;
        if has_exception {
            debug!("{} has a schedule exception", date);
            return Ok(resolve_day(false, true, None));
        }

        let entry = self
            .store
            .schedule_entry_for_day(business_id, DayOfWeek::of(date))
            .await?;

        Ok(resolve_day(false, false, entry.as_ref()))
    }
}
