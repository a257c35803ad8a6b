use std::sync::Arc;

use assert_matches::assert_matches;
use async_trait::async_trait;
use chrono::NaiveDate;
use tokio::sync::Mutex;
use tokio::time::{sleep, timeout, Duration};
use uuid::Uuid;

use notification_cell::*;

#[derive(Default)]
struct RecordingSender {
    sent: Mutex<Vec<EmailMessage>>,
    fail_first: Mutex<bool>,
}

#[async_trait]
impl EmailSender for RecordingSender {
    async fn send(&self, message: &EmailMessage) -> Result<(), NotificationError> {
        let mut fail_first = self.fail_first.lock().await;
        if *fail_first {
            *fail_first = false;
            return Err(NotificationError::Delivery("smtp down".to_string()));
        }
        self.sent.lock().await.push(message.clone());
        Ok(())
    }
}

struct SlowSender;

#[async_trait]
impl EmailSender for SlowSender {
    async fn send(&self, _message: &EmailMessage) -> Result<(), NotificationError> {
        sleep(Duration::from_secs(5)).await;
        Ok(())
    }
}

fn notice(email: &str) -> AppointmentNotice {
    AppointmentNotice {
        appointment_id: Uuid::new_v4(),
        recipient_email: email.to_string(),
        customer_name: "Ada Lovelace".to_string(),
        business_name: "Corner Barber".to_string(),
        service_name: "Haircut".to_string(),
        appointment_datetime: NaiveDate::from_ymd_opt(2025, 6, 2)
            .and_then(|d| d.and_hms_opt(10, 0, 0))
            .unwrap(),
        duration_minutes: 60,
        cancellation_token: "tok".to_string(),
        cancellation_reason: None,
    }
}

#[tokio::test]
async fn test_worker_delivers_queued_jobs_until_dispatchers_drop() {
    let sender = Arc::new(RecordingSender::default());
    let (dispatcher, receiver) = NotificationDispatcher::channel(8);
    let handle = NotificationWorker::new(WorkerConfig::default(), sender.clone()).spawn(receiver);

    dispatcher.send_booking_confirmation(notice("a@example.com"));
    dispatcher.send_cancellation(notice("b@example.com"));
    drop(dispatcher);

    timeout(Duration::from_secs(2), handle)
        .await
        .expect("worker should stop once the queue closes")
        .unwrap();

    let sent = sender.sent.lock().await;
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0].to, "a@example.com");
    assert!(sent[1].subject.starts_with("Appointment cancelled"));
}

#[tokio::test]
async fn test_failed_delivery_does_not_stop_worker() {
    let sender = Arc::new(RecordingSender {
        fail_first: Mutex::new(true),
        ..RecordingSender::default()
    });
    let (dispatcher, receiver) = NotificationDispatcher::channel(8);
    let handle = NotificationWorker::new(WorkerConfig::default(), sender.clone()).spawn(receiver);

    dispatcher.send_booking_confirmation(notice("first@example.com"));
    dispatcher.send_reminder(notice("second@example.com"));
    drop(dispatcher);

    timeout(Duration::from_secs(2), handle).await.unwrap().unwrap();

    let sent = sender.sent.lock().await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, "second@example.com");
}

#[tokio::test]
async fn test_full_queue_drops_without_blocking() {
    let (dispatcher, _receiver) = NotificationDispatcher::channel(1);

    assert!(dispatcher.dispatch(NotificationJob::new(
        NotificationKind::BookingConfirmation,
        notice("a@example.com"),
    )));
    assert!(!dispatcher.dispatch(NotificationJob::new(
        NotificationKind::BookingConfirmation,
        notice("b@example.com"),
    )));
}

#[tokio::test]
async fn test_closed_queue_drops_job() {
    let (dispatcher, receiver) = NotificationDispatcher::channel(4);
    drop(receiver);

    assert!(!dispatcher.dispatch(NotificationJob::new(
        NotificationKind::Cancellation,
        notice("a@example.com"),
    )));
}

#[tokio::test]
async fn test_slow_delivery_times_out() {
    let config = WorkerConfig {
        job_timeout_seconds: 0,
        ..WorkerConfig::default()
    };
    let worker = NotificationWorker::new(config, Arc::new(SlowSender));

    let result = worker
        .process_job(NotificationJob::new(NotificationKind::Reminder, notice("a@example.com")))
        .await;

    assert_matches!(result, Err(NotificationError::WorkerTimeout { timeout_seconds: 0 }));
}
