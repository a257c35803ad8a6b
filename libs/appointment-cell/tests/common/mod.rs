#![allow(dead_code)]

use std::sync::Arc;

use chrono::NaiveDateTime;
use tokio::sync::mpsc;
use uuid::Uuid;

use appointment_cell::models::{BookingRequest, CustomerRequest};
use appointment_cell::BookingState;
use notification_cell::{NotificationDispatcher, NotificationJob};
use shared_models::auth::BusinessPrincipal;
use shared_utils::clock::FixedClock;
use shared_utils::test_utils::{at, ymd, BusinessFixture, TestConfig};

pub struct Harness {
    pub fixture: BusinessFixture,
    pub clock: Arc<FixedClock>,
    pub state: BookingState,
    pub jobs: mpsc::Receiver<NotificationJob>,
}

impl Harness {
    /// Corner barber, open weekdays 09:00-17:00, with "now" on Sunday 2025-06-01 09:00.
    pub async fn new() -> Self {
        Self::with_fixture(BusinessFixture::new().await)
    }

    pub fn with_fixture(fixture: BusinessFixture) -> Self {
        let clock = Arc::new(FixedClock::new(at(ymd(2025, 6, 1), 9, 0)));
        let (notifier, jobs) = NotificationDispatcher::channel(64);
        let state = BookingState {
            config: TestConfig::default().to_arc(),
            store: fixture.store_handle(),
            clock: clock.clone(),
            notifier,
        };
        Self {
            fixture,
            clock,
            state,
            jobs,
        }
    }

    pub fn principal(&self) -> BusinessPrincipal {
        BusinessPrincipal {
            business_id: self.fixture.business.id,
            user_id: self.fixture.owner.id.clone(),
        }
    }

    pub fn drain_jobs(&mut self) -> Vec<NotificationJob> {
        let mut jobs = Vec::new();
        while let Ok(job) = self.jobs.try_recv() {
            jobs.push(job);
        }
        jobs
    }
}

pub fn booking_request(service_id: Uuid, start: NaiveDateTime, email: &str) -> BookingRequest {
    BookingRequest {
        service_id,
        appointment_datetime: start,
        customer: CustomerRequest {
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            email: email.to_string(),
            phone: Some("+44 20 7946 0000".to_string()),
        },
        notes: Some("First visit".to_string()),
    }
}
