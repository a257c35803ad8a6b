// libs/appointment-cell/src/services/jobs.rs
use std::sync::Arc;

use chrono::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use notification_cell::{build_notice, NotificationDispatcher};
use shared_database::{BookingStore, StoreError};
use shared_models::booking::{AppointmentStatus, StatusChange, TimeRange};
use shared_utils::clock::Clock;

use crate::models::AppointmentError;
use crate::state::BookingState;

/// How far back the auto-complete sweep looks for unfinished appointments.
const AUTO_COMPLETE_LOOKBACK_DAYS: i64 = 30;

fn spawn_periodic<F, Fut>(name: &'static str, period_seconds: u64, mut tick: F) -> JoinHandle<()>
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: std::future::Future<Output = Result<usize, AppointmentError>> + Send + 'static,
{
    tokio::spawn(async move {
        let mut ticker = interval(std::time::Duration::from_secs(period_seconds.max(1)));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        info!("Starting {} job every {}s", name, period_seconds);

        loop {
            ticker.tick().await;
            match tick().await {
                Ok(count) => debug!("{} job processed {} appointments", name, count),
                Err(e) => error!("{} job failed: {}", name, e),
            }
        }
    })
}

/// Sends a reminder for appointments starting 24 to 25 hours from now.
pub struct ReminderJob {
    store: Arc<dyn BookingStore>,
    clock: Arc<dyn Clock>,
    notifier: NotificationDispatcher,
}

impl ReminderJob {
    pub fn new(state: &BookingState) -> Self {
        Self {
            store: state.store.clone(),
            clock: state.clock.clone(),
            notifier: state.notifier.clone(),
        }
    }

    pub async fn run_once(&self) -> Result<usize, AppointmentError> {
        let now = self.clock.now();
        let window = TimeRange::new(now + Duration::hours(24), now + Duration::hours(25));

        let due = self
            .store
            .appointments_due(
                &[AppointmentStatus::Pending, AppointmentStatus::Confirmed],
                window,
            )
            .await?;

        let mut sent = 0;
        for appointment in &due {
            match build_notice(self.store.as_ref(), appointment).await {
                Ok(notice) => {
                    self.notifier.send_reminder(notice);
                    sent += 1;
                }
                Err(e) => warn!("No reminder for appointment {}: {}", appointment.id, e),
            }
        }

        Ok(sent)
    }

    pub fn spawn(self, period_seconds: u64) -> JoinHandle<()> {
        let job = Arc::new(self);
        spawn_periodic("reminder", period_seconds, move || {
            let job = job.clone();
            async move { job.run_once().await }
        })
    }
}

/// Marks confirmed appointments whose end has passed as completed.
pub struct AutoCompleteJob {
    store: Arc<dyn BookingStore>,
    clock: Arc<dyn Clock>,
}

impl AutoCompleteJob {
    pub fn new(state: &BookingState) -> Self {
        Self {
            store: state.store.clone(),
            clock: state.clock.clone(),
        }
    }

    pub async fn run_once(&self) -> Result<usize, AppointmentError> {
        let now = self.clock.now();
        let window = TimeRange::new(now - Duration::days(AUTO_COMPLETE_LOOKBACK_DAYS), now);

        let candidates = self
            .store
            .appointments_due(&[AppointmentStatus::Confirmed], window)
            .await?;

        let mut completed = 0;
        for appointment in candidates.into_iter().filter(|a| a.end_time() < now) {
            let change = StatusChange {
                status: AppointmentStatus::Completed,
                cancelled_by: None,
                cancellation_reason: None,
                at: now,
            };
            match self
                .store
                .transition_appointment(appointment.id, AppointmentStatus::Confirmed, change)
                .await
            {
                Ok(_) => completed += 1,
                // Someone else changed it first.
                Err(StoreError::Conflict(_)) => {
                    debug!("Appointment {} changed concurrently, skipping", appointment.id)
                }
                Err(e) => return Err(e.into()),
            }
        }

        if completed > 0 {
            info!("Auto-completed {} appointments", completed);
        }
        Ok(completed)
    }

    pub fn spawn(self, period_seconds: u64) -> JoinHandle<()> {
        let job = Arc::new(self);
        spawn_periodic("auto-complete", period_seconds, move || {
            let job = job.clone();
            async move { job.run_once().await }
        })
    }
}
