// libs/appointment-cell/src/services/lifecycle.rs
use std::sync::Arc;

use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use notification_cell::{build_notice, NotificationDispatcher};
use shared_database::BookingStore;
use shared_models::auth::BusinessPrincipal;
use shared_models::booking::{Appointment, AppointmentStatus, CancelledBy, StatusChange};
use shared_utils::clock::Clock;

use crate::models::{AppointmentError, AppointmentResponse};
use crate::services::details::AppointmentDetails;
use crate::state::BookingState;

/// Next statuses an appointment may move to under normal operation.
pub fn valid_transitions(status: AppointmentStatus) -> &'static [AppointmentStatus] {
    match status {
        AppointmentStatus::Pending => &[AppointmentStatus::Confirmed, AppointmentStatus::Cancelled],
        AppointmentStatus::Confirmed => &[
            AppointmentStatus::Completed,
            AppointmentStatus::Cancelled,
            AppointmentStatus::NoShow,
        ],
        // Terminal states - no transitions allowed
        AppointmentStatus::Completed | AppointmentStatus::Cancelled | AppointmentStatus::NoShow => &[],
    }
}

pub fn is_terminal(status: AppointmentStatus) -> bool {
    valid_transitions(status).is_empty()
}

pub fn can_transition(from: AppointmentStatus, to: AppointmentStatus) -> bool {
    valid_transitions(from).contains(&to)
}

pub struct AppointmentLifecycleService {
    store: Arc<dyn BookingStore>,
    clock: Arc<dyn Clock>,
    notifier: NotificationDispatcher,
}

impl AppointmentLifecycleService {
    pub fn new(state: &BookingState) -> Self {
        Self {
            store: state.store.clone(),
            clock: state.clock.clone(),
            notifier: state.notifier.clone(),
        }
    }

    pub async fn get_by_token(&self, token: &str) -> Result<AppointmentResponse, AppointmentError> {
        let appointment = self
            .store
            .appointment_by_token(token)
            .await?
            .ok_or(AppointmentError::NotFound)?;

        AppointmentDetails::new(self.store.as_ref())
            .describe(appointment)
            .await
    }

    /// Customer cancellation through the emailed token.
    #[instrument(skip(self, token, reason))]
    pub async fn cancel_by_token(
        &self,
        token: &str,
        reason: Option<String>,
    ) -> Result<AppointmentResponse, AppointmentError> {
        let appointment = self
            .store
            .appointment_by_token(token)
            .await?
            .ok_or(AppointmentError::NotFound)?;

        let now = self.clock.now();
        match appointment.status {
            AppointmentStatus::Cancelled => return Err(AppointmentError::AlreadyCancelled),
            status if !can_transition(status, AppointmentStatus::Cancelled) => {
                return Err(AppointmentError::InvalidStatusTransition(status));
            }
            _ => {}
        }
        if appointment.appointment_datetime <= now {
            return Err(AppointmentError::InvalidTime(
                "Past appointments cannot be cancelled".to_string(),
            ));
        }

        let change = StatusChange {
            status: AppointmentStatus::Cancelled,
            cancelled_by: Some(CancelledBy::Customer),
            cancellation_reason: reason
                .map(|r| r.trim().to_string())
                .filter(|r| !r.is_empty()),
            at: now,
        };

        let cancelled = self
            .store
            .transition_appointment(appointment.id, appointment.status, change)
            .await?;

        info!("Appointment {} cancelled by customer", cancelled.id);
        self.notify_cancelled(&cancelled).await;

        AppointmentDetails::new(self.store.as_ref())
            .describe(cancelled)
            .await
    }

    /// Owner-initiated status change. Owners may override the usual flow;
    /// the only requirement is that the appointment belongs to their business.
    #[instrument(skip(self), fields(business_id = %principal.business_id))]
    pub async fn update_status(
        &self,
        principal: &BusinessPrincipal,
        appointment_id: Uuid,
        status: AppointmentStatus,
    ) -> Result<AppointmentResponse, AppointmentError> {
        let appointment = self
            .store
            .appointment(appointment_id)
            .await?
            .filter(|a| a.business_id == principal.business_id)
            .ok_or(AppointmentError::NotFound)?;

        let previous = appointment.status;
        if !can_transition(previous, status) {
            debug!("Owner override {} -> {} for appointment {}", previous, status, appointment.id);
        }

        let change = StatusChange {
            status,
            cancelled_by: (status == AppointmentStatus::Cancelled).then_some(CancelledBy::Business),
            cancellation_reason: None,
            at: self.clock.now(),
        };

        let updated = self
            .store
            .transition_appointment(appointment.id, previous, change)
            .await?;

        info!("Appointment {} moved {} -> {}", updated.id, previous, updated.status);

        if status == AppointmentStatus::Cancelled && previous != AppointmentStatus::Cancelled {
            self.notify_cancelled(&updated).await;
        }

        AppointmentDetails::new(self.store.as_ref())
            .describe(updated)
            .await
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
