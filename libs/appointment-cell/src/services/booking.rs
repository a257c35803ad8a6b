// libs/appointment-cell/src/services/booking.rs
use std::sync::Arc;

use chrono::NaiveDateTime;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use notification_cell::{AppointmentNotice, NotificationDispatcher};
use schedule_cell::models::DaySchedule;
use schedule_cell::services::ScheduleCalendar;
use shared_database::{AppointmentFilter, BookedAppointment, BookingDraft, BookingStore};
use shared_models::auth::BusinessPrincipal;
use shared_models::booking::{Business, CustomerInfo, Service, TimeRange};
use shared_utils::clock::Clock;

use crate::models::{AppointmentError, AppointmentResponse, BookingRequest};
use crate::services::details::AppointmentDetails;
use crate::services::token::generate_cancellation_token;
use crate::state::BookingState;

pub struct AppointmentBookingService {
    store: Arc<dyn BookingStore>,
    clock: Arc<dyn Clock>,
    calendar: ScheduleCalendar,
    notifier: NotificationDispatcher,
}

impl AppointmentBookingService {
    pub fn new(state: &BookingState) -> Self {
        Self {
            store: state.store.clone(),
            clock: state.clock.clone(),
            calendar: ScheduleCalendar::new(state.store.clone()),
            notifier: state.notifier.clone(),
        }
    }

    /// Books a service for a customer on the business's public page.
    ///
    /// Everything up to the draft is validated against a snapshot; the overlap
    /// check and the insert happen inside the store's per-business unit of work.
    #[instrument(skip(self, request), fields(service_id = %request.service_id))]
    pub async fn create_appointment(
        &self,
        business_slug: &str,
        request: BookingRequest,
    ) -> Result<AppointmentResponse, AppointmentError> {
        let business = self
            .store
            .business_by_slug(business_slug)
            .await?
            .ok_or(AppointmentError::BusinessNotFound)?;

        if !business.is_active {
            return Err(AppointmentError::Unavailable(
                "Business is not accepting bookings".to_string(),
            ));
        }

        let service = self
            .store
            .service(business.id, request.service_id)
            .await?
            .ok_or(AppointmentError::ServiceNotFound)?;

        if !service.is_active {
            return Err(AppointmentError::Unavailable("Service is not active".to_string()));
        }

        let now = self.clock.now();
        let start = request.appointment_datetime;
        if start <= now {
            return Err(AppointmentError::InvalidTime(
                "Appointment must be scheduled for a future time".to_string(),
            ));
        }

        let customer: CustomerInfo = request.customer.into();
        validate_customer(&customer)?;

        self.ensure_within_opening_hours(&business, &service, start)
            .await?;

        let draft = BookingDraft {
            appointment_id: Uuid::new_v4(),
            business_id: business.id,
            service_id: service.id,
            appointment_datetime: start,
            duration_minutes: service.duration_minutes,
            price: service.price,
            notes: request
                .notes
                .map(|n| n.trim().to_string())
                .filter(|n| !n.is_empty()),
            customer,
            cancellation_token: generate_cancellation_token(),
            created_at: now,
        };

        debug!(
            "Booking {} at {} for business {}",
            service.name, start, business.id
        );

        let booked = self.store.book_appointment(draft).await.map_err(|e| {
            warn!("Booking for business {} at {} rejected: {}", business.id, start, e);
            AppointmentError::from(e)
        })?;

        info!(
            "Appointment {} booked for business {} at {}",
            booked.appointment.id, business.id, start
        );

        self.notifier
            .send_booking_confirmation(confirmation_notice(&business, &service, &booked));

        let BookedAppointment {
            appointment,
            customer,
        } = booked;
        Ok(AppointmentResponse::new(
            appointment,
            Some(&service),
            Some(&customer),
        ))
    }

    /// All of the owner's appointments starting inside `[start, end)`, any status.
    pub async fn list_business_appointments(
        &self,
        principal: &BusinessPrincipal,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Vec<AppointmentResponse>, AppointmentError> {
        if start >= end {
            return Err(AppointmentError::ValidationError(
                "Range start must be before range end".to_string(),
            ));
        }

        let appointments = self
            .store
            .appointments_in_range(
                principal.business_id,
                TimeRange::new(start, end),
                AppointmentFilter::All,
            )
            .await?;

        AppointmentDetails::new(self.store.as_ref())
            .describe_all(appointments)
            .await
    }

    async fn ensure_within_opening_hours(
        &self,
        business: &Business,
        service: &Service,
        start: NaiveDateTime,
    ) -> Result<(), AppointmentError> {
        let date = start.date();
        let hours = match self.calendar.resolve_day(business.id, date).await? {
            DaySchedule::Open(hours) => hours,
            DaySchedule::Closed(reason) => {
                debug!("Business {} closed on {}: {:?}", business.id, date, reason);
                return Err(AppointmentError::Unavailable(
                    "The business is closed on the requested date".to_string(),
                ));
            }
        };

        let end = start + service.duration();
        if start < date.and_time(hours.start_time) || end > date.and_time(hours.end_time) {
            return Err(AppointmentError::InvalidTime(format!(
                "Requested time is outside business hours ({} - {})",
                hours.start_time.format("%H:%M"),
                hours.end_time.format("%H:%M")
            )));
        }

        Ok(())
    }
}

fn validate_customer(customer: &CustomerInfo) -> Result<(), AppointmentError> {
    if customer.first_name.is_empty() || customer.last_name.is_empty() {
        return Err(AppointmentError::ValidationError(
            "Customer first and last name are required".to_string(),
        ));
    }

    let valid_email = customer
        .email
        .split_once('@')
        .map(|(local, domain)| !local.is_empty() && domain.contains('.'))
        .unwrap_or(false);
    if !valid_email {
        return Err(AppointmentError::ValidationError(
            "A valid customer email is required".to_string(),
        ));
    }

    Ok(())
}

fn confirmation_notice(
    business: &Business,
    service: &Service,
    booked: &BookedAppointment,
) -> AppointmentNotice {
    AppointmentNotice {
        appointment_id: booked.appointment.id,
        recipient_email: booked.customer.email.clone(),
        customer_name: booked.customer.full_name(),
        business_name: business.name.clone(),
        service_name: service.name.clone(),
        appointment_datetime: booked.appointment.appointment_datetime,
        duration_minutes: booked.appointment.duration_minutes,
        cancellation_token: booked.appointment.cancellation_token.clone(),
        cancellation_reason: None,
    }
}
