use std::sync::Arc;

use assert_matches::assert_matches;
use tokio::sync::mpsc;
use uuid::Uuid;

use notification_cell::{NotificationDispatcher, NotificationJob, NotificationKind};
use schedule_cell::models::{HolidayRequest, ScheduleError};
use schedule_cell::services::{AvailabilityService, HolidayService};
use schedule_cell::ScheduleState;
use shared_database::BookingStore;
use shared_models::auth::BusinessPrincipal;
use shared_models::booking::{AppointmentStatus, CancelledBy};
use shared_utils::clock::FixedClock;
use shared_utils::test_utils::{at, ymd, BusinessFixture, TestConfig};

struct Harness {
    fixture: BusinessFixture,
    state: ScheduleState,
    principal: BusinessPrincipal,
    jobs: mpsc::Receiver<NotificationJob>,
}

async fn harness() -> Harness {
    let fixture = BusinessFixture::new().await;
    let (notifier, jobs) = NotificationDispatcher::channel(16);
    let state = ScheduleState {
        config: TestConfig::default().to_arc(),
        store: fixture.store_handle(),
        clock: Arc::new(FixedClock::new(at(ymd(2025, 6, 1), 9, 0))),
        notifier,
    };
    let principal = BusinessPrincipal {
        business_id: fixture.business.id,
        user_id: fixture.owner.id.clone(),
    };
    Harness {
        fixture,
        state,
        principal,
        jobs,
    }
}

fn request(start: (i32, u32, u32), end: (i32, u32, u32)) -> HolidayRequest {
    HolidayRequest {
        start_date: ymd(start.0, start.1, start.2),
        end_date: ymd(end.0, end.1, end.2),
        reason: Some("Summer break".to_string()),
    }
}

#[tokio::test]
async fn test_holiday_cancels_booking_and_closes_the_day() {
    let mut h = harness().await;
    let booked = h.fixture.book(at(ymd(2025, 6, 11), 10, 0), "ada@example.com").await;

    let service = HolidayService::new(&h.state);
    let cascade = service
        .create_holiday(&h.principal, request((2025, 6, 10), (2025, 6, 12)))
        .await
        .unwrap();

    assert_eq!(cascade.cancelled.len(), 1);
    assert_eq!(cascade.cancelled[0].id, booked.id);

    let stored = h.fixture.store.appointment(booked.id).await.unwrap().unwrap();
    assert_eq!(stored.status, AppointmentStatus::Cancelled);
    assert_eq!(stored.cancelled_by, Some(CancelledBy::Business));
    assert_eq!(stored.cancellation_reason.as_deref(), Some("Summer break"));

    let availability = AvailabilityService::new(&h.state)
        .get_availability(&h.fixture.business.slug, h.fixture.service.id, ymd(2025, 6, 11))
        .await
        .unwrap();
    assert!(availability.slots.is_empty());

    let job = h.jobs.try_recv().unwrap();
    assert_eq!(job.kind, NotificationKind::Cancellation);
    assert_eq!(job.notice.appointment_id, booked.id);
    assert_eq!(job.notice.recipient_email, "ada@example.com");
}

#[tokio::test]
async fn test_affected_preview_matches_cascade() {
    let h = harness().await;
    let first_day = h.fixture.book(at(ymd(2025, 6, 10), 9, 0), "a@example.com").await;
    let last_day = h.fixture.book(at(ymd(2025, 6, 12), 16, 0), "b@example.com").await;
    h.fixture.book(at(ymd(2025, 6, 13), 9, 0), "c@example.com").await;

    let service = HolidayService::new(&h.state);
    let preview = service
        .affected_appointments(&h.principal, ymd(2025, 6, 10), ymd(2025, 6, 12))
        .await
        .unwrap();
    let cascade = service
        .create_holiday(&h.principal, request((2025, 6, 10), (2025, 6, 12)))
        .await
        .unwrap();

    let preview_ids: Vec<Uuid> = preview.iter().map(|a| a.id).collect();
    let cancelled_ids: Vec<Uuid> = cascade.cancelled.iter().map(|a| a.id).collect();
    assert_eq!(preview_ids, vec![first_day.id, last_day.id]);
    assert_eq!(preview_ids, cancelled_ids);
}

#[tokio::test]
async fn test_holiday_validation() {
    let h = harness().await;
    let service = HolidayService::new(&h.state);

    let reversed = service
        .create_holiday(&h.principal, request((2025, 6, 12), (2025, 6, 10)))
        .await;
    assert_matches!(reversed, Err(ScheduleError::BadRequest(_)));

    let past = service
        .create_holiday(&h.principal, request((2025, 5, 30), (2025, 6, 2)))
        .await;
    assert_matches!(past, Err(ScheduleError::BadRequest(_)));

    let preview = service
        .affected_appointments(&h.principal, ymd(2025, 6, 12), ymd(2025, 6, 10))
        .await;
    assert_matches!(preview, Err(ScheduleError::BadRequest(_)));
}

#[tokio::test]
async fn test_overlapping_holiday_is_conflict() {
    let h = harness().await;
    let service = HolidayService::new(&h.state);

    service
        .create_holiday(&h.principal, request((2025, 6, 10), (2025, 6, 12)))
        .await
        .unwrap();
    let overlapping = service
        .create_holiday(&h.principal, request((2025, 6, 12), (2025, 6, 15)))
        .await;

    assert_matches!(overlapping, Err(ScheduleError::Conflict(_)));
}

#[tokio::test]
async fn test_upcoming_excludes_finished_holidays() {
    let h = harness().await;
    let service = HolidayService::new(&h.state);

    service
        .create_holiday(&h.principal, request((2025, 6, 2), (2025, 6, 3)))
        .await
        .unwrap();
    let later = service
        .create_holiday(&h.principal, request((2025, 7, 1), (2025, 7, 4)))
        .await
        .unwrap();

    let clock = Arc::new(FixedClock::new(at(ymd(2025, 6, 20), 9, 0)));
    let state = ScheduleState {
        clock,
        ..h.state.clone()
    };
    let upcoming = HolidayService::new(&state)
        .upcoming_holidays(&h.principal)
        .await
        .unwrap();

    assert_eq!(upcoming.len(), 1);
    assert_eq!(upcoming[0].id, later.holiday.id);

    let public = HolidayService::new(&state)
        .public_holidays(&h.fixture.business.slug)
        .await
        .unwrap();
    assert_eq!(public.len(), 1);
}

#[tokio::test]
async fn test_update_and_delete_holiday() {
    let h = harness().await;
    let service = HolidayService::new(&h.state);

    let created = service
        .create_holiday(&h.principal, request((2025, 6, 10), (2025, 6, 12)))
        .await
        .unwrap();

    let updated = service
        .update_holiday(&h.principal, created.holiday.id, request((2025, 6, 10), (2025, 6, 14)))
        .await
        .unwrap();
    assert_eq!(updated.holiday.end_date, ymd(2025, 6, 14));
    assert!(updated.cancelled.is_empty());

    service
        .delete_holiday(&h.principal, created.holiday.id)
        .await
        .unwrap();
    let missing = service
        .delete_holiday(&h.principal, created.holiday.id)
        .await;
    assert_matches!(missing, Err(ScheduleError::NotFound(_)));
}

#[tokio::test]
async fn test_extending_holiday_cancels_newly_covered_bookings() {
    let mut h = harness().await;
    let service = HolidayService::new(&h.state);

    let created = service
        .create_holiday(&h.principal, request((2025, 6, 10), (2025, 6, 12)))
        .await
        .unwrap();
    let friday = h.fixture.book(at(ymd(2025, 6, 13), 10, 0), "ada@example.com").await;
    let monday = h.fixture.book(at(ymd(2025, 6, 16), 10, 0), "bob@example.com").await;

    let updated = service
        .update_holiday(&h.principal, created.holiday.id, request((2025, 6, 10), (2025, 6, 14)))
        .await
        .unwrap();

    assert_eq!(updated.cancelled.len(), 1);
    assert_eq!(updated.cancelled[0].id, friday.id);

    let stored = h.fixture.store.appointment(friday.id).await.unwrap().unwrap();
    assert_eq!(stored.status, AppointmentStatus::Cancelled);
    assert_eq!(stored.cancelled_by, Some(CancelledBy::Business));

    let untouched = h.fixture.store.appointment(monday.id).await.unwrap().unwrap();
    assert!(untouched.is_blocking());

    let job = h.jobs.try_recv().unwrap();
    assert_eq!(job.kind, NotificationKind::Cancellation);
    assert_eq!(job.notice.appointment_id, friday.id);
    assert!(h.jobs.try_recv().is_err());
}
