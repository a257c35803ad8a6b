mod common;

use assert_matches::assert_matches;
use chrono::Duration;

use appointment_cell::models::{AppointmentError, AppointmentResponse};
use appointment_cell::services::{AppointmentBookingService, AppointmentLifecycleService};
use notification_cell::NotificationKind;
use shared_database::BookingStore;
use shared_models::auth::BusinessPrincipal;
use shared_models::booking::{AppointmentStatus, CancelledBy};
use shared_utils::test_utils::{at, ymd, BusinessFixture};

use common::{booking_request, Harness};

async fn book_monday_ten(h: &Harness) -> AppointmentResponse {
    AppointmentBookingService::new(&h.state)
        .create_appointment(
            &h.fixture.business.slug,
            booking_request(h.fixture.service.id, at(ymd(2025, 6, 2), 10, 0), "ada@example.com"),
        )
        .await
        .unwrap()
}

#[tokio::test]
async fn test_customer_cancels_with_token() {
    let mut h = Harness::new().await;
    let booked = book_monday_ten(&h).await;
    h.drain_jobs();

    let lifecycle = AppointmentLifecycleService::new(&h.state);
    let cancelled = lifecycle
        .cancel_by_token(&booked.cancellation_token, Some("Running late".to_string()))
        .await
        .unwrap();

    assert_eq!(cancelled.status, AppointmentStatus::Cancelled);
    assert_eq!(cancelled.cancelled_by, Some(CancelledBy::Customer));
    assert_eq!(cancelled.cancellation_reason.as_deref(), Some("Running late"));
    assert_eq!(cancelled.cancelled_at, Some(at(ymd(2025, 6, 1), 9, 0)));

    let jobs = h.drain_jobs();
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0].kind, NotificationKind::Cancellation);
}

#[tokio::test]
async fn test_cancelling_twice_is_conflict() {
    let h = Harness::new().await;
    let booked = book_monday_ten(&h).await;
    let lifecycle = AppointmentLifecycleService::new(&h.state);

    lifecycle
        .cancel_by_token(&booked.cancellation_token, None)
        .await
        .unwrap();
    let again = lifecycle.cancel_by_token(&booked.cancellation_token, None).await;

    assert_matches!(again, Err(AppointmentError::AlreadyCancelled));
}

#[tokio::test]
async fn test_completed_or_past_appointments_cannot_be_cancelled() {
    let h = Harness::new().await;
    let booked = book_monday_ten(&h).await;
    let lifecycle = AppointmentLifecycleService::new(&h.state);

    h.clock.set(at(ymd(2025, 6, 2), 10, 30));
    let past = lifecycle.cancel_by_token(&booked.cancellation_token, None).await;
    assert_matches!(past, Err(AppointmentError::InvalidTime(_)));

    h.clock.set(at(ymd(2025, 6, 1), 9, 0));
    lifecycle
        .update_status(&h.principal(), booked.id, AppointmentStatus::Confirmed)
        .await
        .unwrap();
    lifecycle
        .update_status(&h.principal(), booked.id, AppointmentStatus::Completed)
        .await
        .unwrap();

    let completed = lifecycle.cancel_by_token(&booked.cancellation_token, None).await;
    assert_matches!(
        completed,
        Err(AppointmentError::InvalidStatusTransition(AppointmentStatus::Completed))
    );
}

#[tokio::test]
async fn test_unknown_token_is_not_found() {
    let h = Harness::new().await;
    let lifecycle = AppointmentLifecycleService::new(&h.state);

    assert_matches!(
        lifecycle.cancel_by_token("missing", None).await,
        Err(AppointmentError::NotFound)
    );
    assert_matches!(
        lifecycle.get_by_token("missing").await,
        Err(AppointmentError::NotFound)
    );
}

#[tokio::test]
async fn test_token_lookup_returns_details() {
    let h = Harness::new().await;
    let booked = book_monday_ten(&h).await;

    let found = AppointmentLifecycleService::new(&h.state)
        .get_by_token(&booked.cancellation_token)
        .await
        .unwrap();

    assert_eq!(found, booked);
}

#[tokio::test]
async fn test_owner_status_updates_stamp_audit_fields() {
    let mut h = Harness::new().await;
    let booked = book_monday_ten(&h).await;
    h.drain_jobs();
    let lifecycle = AppointmentLifecycleService::new(&h.state);

    let confirmed = lifecycle
        .update_status(&h.principal(), booked.id, AppointmentStatus::Confirmed)
        .await
        .unwrap();
    assert_eq!(confirmed.confirmed_at, Some(at(ymd(2025, 6, 1), 9, 0)));

    h.clock.advance(Duration::hours(1));
    let cancelled = lifecycle
        .update_status(&h.principal(), booked.id, AppointmentStatus::Cancelled)
        .await
        .unwrap();
    assert_eq!(cancelled.cancelled_by, Some(CancelledBy::Business));
    assert_eq!(cancelled.cancelled_at, Some(at(ymd(2025, 6, 1), 10, 0)));

    let jobs = h.drain_jobs();
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0].kind, NotificationKind::Cancellation);
}

#[tokio::test]
async fn test_owner_cannot_touch_other_business_appointments() {
    let h = Harness::new().await;
    let booked = book_monday_ten(&h).await;
    let other = BusinessFixture::seed(h.fixture.store.clone(), "other-shop", 30).await;
    let intruder = BusinessPrincipal {
        business_id: other.business.id,
        user_id: other.owner.id.clone(),
    };

    let result = AppointmentLifecycleService::new(&h.state)
        .update_status(&intruder, booked.id, AppointmentStatus::Cancelled)
        .await;

    assert_matches!(result, Err(AppointmentError::NotFound));
}

#[tokio::test]
async fn test_cancelled_interval_can_be_booked_again() {
    let h = Harness::new().await;
    let booked = book_monday_ten(&h).await;

    AppointmentLifecycleService::new(&h.state)
        .cancel_by_token(&booked.cancellation_token, None)
        .await
        .unwrap();

    let rebooked = AppointmentBookingService::new(&h.state)
        .create_appointment(
            &h.fixture.business.slug,
            booking_request(h.fixture.service.id, at(ymd(2025, 6, 2), 10, 0), "bob@example.com"),
        )
        .await;

    assert!(rebooked.is_ok());
}

#[tokio::test]
async fn test_restoring_cancelled_appointment_over_new_booking_is_conflict() {
    let h = Harness::new().await;
    let first = book_monday_ten(&h).await;
    let lifecycle = AppointmentLifecycleService::new(&h.state);

    lifecycle
        .update_status(&h.principal(), first.id, AppointmentStatus::Cancelled)
        .await
        .unwrap();
    AppointmentBookingService::new(&h.state)
        .create_appointment(
            &h.fixture.business.slug,
            booking_request(h.fixture.service.id, at(ymd(2025, 6, 2), 10, 0), "bob@example.com"),
        )
        .await
        .unwrap();

    let restored = lifecycle
        .update_status(&h.principal(), first.id, AppointmentStatus::Confirmed)
        .await;

    assert_matches!(restored, Err(AppointmentError::ConflictDetected(_)));
    let stored = h.fixture.store.appointment(first.id).await.unwrap().unwrap();
    assert_eq!(stored.status, AppointmentStatus::Cancelled);
}

#[tokio::test]
async fn test_restoring_cancelled_appointment_into_free_slot_succeeds() {
    let h = Harness::new().await;
    let booked = book_monday_ten(&h).await;
    let lifecycle = AppointmentLifecycleService::new(&h.state);

    lifecycle
        .update_status(&h.principal(), booked.id, AppointmentStatus::Cancelled)
        .await
        .unwrap();
    let restored = lifecycle
        .update_status(&h.principal(), booked.id, AppointmentStatus::Pending)
        .await
        .unwrap();

    assert_eq!(restored.status, AppointmentStatus::Pending);
}

#[tokio::test]
async fn test_no_show_cannot_be_cancelled_by_token() {
    let h = Harness::new().await;
    let booked = book_monday_ten(&h).await;
    let lifecycle = AppointmentLifecycleService::new(&h.state);

    lifecycle
        .update_status(&h.principal(), booked.id, AppointmentStatus::NoShow)
        .await
        .unwrap();

    let result = lifecycle.cancel_by_token(&booked.cancellation_token, None).await;

    assert_matches!(
        result,
        Err(AppointmentError::InvalidStatusTransition(AppointmentStatus::NoShow))
    );
    let stored = h.fixture.store.appointment(booked.id).await.unwrap().unwrap();
    assert_eq!(stored.status, AppointmentStatus::NoShow);
}
