use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    BookingConfirmation,
    Cancellation,
    Reminder,
}

/// What a customer-facing email needs to know about one appointment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppointmentNotice {
    pub appointment_id: Uuid,
    pub recipient_email: String,
    pub customer_name: String,
    pub business_name: String,
    pub service_name: String,
    pub appointment_datetime: NaiveDateTime,
    pub duration_minutes: i32,
    pub cancellation_token: String,
    pub cancellation_reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NotificationJob {
    pub job_id: Uuid,
    pub kind: NotificationKind,
    pub notice: AppointmentNotice,
    pub enqueued_at: DateTime<Utc>,
}

impl NotificationJob {
    pub fn new(kind: NotificationKind, notice: AppointmentNotice) -> Self {
        Self {
            job_id: Uuid::new_v4(),
            kind,
            notice,
            enqueued_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EmailMessage {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub text: String,
}

#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub worker_id: String,
    pub job_timeout_seconds: u64,
    pub public_base_url: String,
    pub mail_from: String,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            worker_id: "notification-worker".to_string(),
            job_timeout_seconds: 10,
            public_base_url: "http://localhost:4200".to_string(),
            mail_from: "noreply@slotbook.local".to_string(),
        }
    }
}
