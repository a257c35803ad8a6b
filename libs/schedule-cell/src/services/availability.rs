// libs/schedule-cell/src/services/availability.rs
use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{debug, instrument};
use uuid::Uuid;

use shared_database::{AppointmentFilter, BookingStore};
use shared_models::booking::TimeRange;
use shared_utils::clock::Clock;

use crate::models::{AvailabilityResponse, ScheduleError};
use crate::services::{calendar::ScheduleCalendar, slots::generate_slots};
use crate::state::ScheduleState;

pub struct AvailabilityService {
    store: Arc<dyn BookingStore>,
    clock: Arc<dyn Clock>,
    calendar: ScheduleCalendar,
}

impl AvailabilityService {
    pub fn new(state: &ScheduleState) -> Self {
        Self {
            store: state.store.clone(),
            clock: state.clock.clone(),
            calendar: ScheduleCalendar::new(state.store.clone()),
        }
    }

    /// Slots for one service of a business on one date.
    #[instrument(skip(self))]
    pub async fn get_availability(
        &self,
        business_slug: &str,
        service_id: Uuid,
        date: NaiveDate,
    ) -> Result<AvailabilityResponse, ScheduleError> {
        let business = self
            .store
            .business_by_slug(business_slug)
            .await?
            .ok_or(ScheduleError::BusinessNotFound)?;

        if !business.is_active {
            return Err(ScheduleError::BadRequest(
                "Business is not accepting bookings".to_string(),
            ));
        }

        let service = self
            .store
            .service(business.id, service_id)
            .await?
            .ok_or(ScheduleError::ServiceNotFound)?;

        if !service.is_active {
            return Err(ScheduleError::BadRequest("Service is not active".to_string()));
        }

        let now = self.clock.now();
        if date < now.date() {
            debug!("{} is in the past, no slots", date);
            return Ok(AvailabilityResponse {
                date,
                slots: Vec::new(),
            });
        }

        let day = self.calendar.resolve_day(business.id, date).await?;
        if !day.is_open() {
            debug!("Business {} closed on {}: {:?}", business.id, date, day);
            return Ok(AvailabilityResponse {
                date,
                slots: Vec::new(),
            });
        }

        let appointments = self
            .store
            .appointments_in_range(business.id, TimeRange::day(date), AppointmentFilter::Active)
            .await?;

        let slots = generate_slots(
            &day,
            service.duration_minutes as i64,
            date,
            now,
            &appointments,
        );

        debug!(
            "{} slots ({} available) for service {} on {}",
            slots.len(),
            slots.iter().filter(|s| s.available).count(),
            service.id,
            date
        );

        Ok(AvailabilityResponse { date, slots })
    }
}
