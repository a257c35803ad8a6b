use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, warn};

use crate::{AppointmentNotice, NotificationError, NotificationJob, NotificationKind};

/// Producer side of the notification queue.
///
/// Enqueueing never waits: when the queue is full or the worker is gone the
/// job is dropped and logged, and the caller carries on.
#[derive(Clone)]
pub struct NotificationDispatcher {
    sender: mpsc::Sender<NotificationJob>,
}

impl NotificationDispatcher {
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<NotificationJob>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (Self { sender }, receiver)
    }

    pub fn send_booking_confirmation(&self, notice: AppointmentNotice) {
        self.dispatch(NotificationJob::new(NotificationKind::BookingConfirmation, notice));
    }

    pub fn send_cancellation(&self, notice: AppointmentNotice) {
        self.dispatch(NotificationJob::new(NotificationKind::Cancellation, notice));
    }

    pub fn send_reminder(&self, notice: AppointmentNotice) {
        self.dispatch(NotificationJob::new(NotificationKind::Reminder, notice));
    }

    /// Returns whether the job made it onto the queue.
    pub fn dispatch(&self, job: NotificationJob) -> bool {
        match self.try_enqueue(job) {
            Ok(()) => true,
            Err((job, e)) => {
                warn!(
                    "Dropping {:?} notification for appointment {}: {}",
                    job.kind, job.notice.appointment_id, e
                );
                false
            }
        }
    }

    fn try_enqueue(&self, job: NotificationJob) -> Result<(), (NotificationJob, NotificationError)> {
        let job_id = job.job_id;
        match self.sender.try_send(job) {
            Ok(()) => {
                debug!("Queued notification job {}", job_id);
                Ok(())
            }
            Err(TrySendError::Full(job)) => Err((job, NotificationError::QueueFull)),
            Err(TrySendError::Closed(job)) => Err((job, NotificationError::QueueClosed)),
        }
    }
}
