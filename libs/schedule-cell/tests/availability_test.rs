use std::sync::Arc;

use assert_matches::assert_matches;
use chrono::NaiveTime;
use uuid::Uuid;

use notification_cell::NotificationDispatcher;
use schedule_cell::models::ScheduleError;
use schedule_cell::services::AvailabilityService;
use schedule_cell::ScheduleState;
use shared_database::BookingStore;
use shared_models::booking::{DayOfWeek, ScheduleException};
use shared_utils::clock::FixedClock;
use shared_utils::test_utils::{at, ymd, BusinessFixture, TestConfig};

fn state_for(fixture: &BusinessFixture, now: chrono::NaiveDateTime) -> ScheduleState {
    let (notifier, _jobs) = NotificationDispatcher::channel(4);
    ScheduleState {
        config: TestConfig::default().to_arc(),
        store: fixture.store_handle(),
        clock: Arc::new(FixedClock::new(now)),
        notifier,
    }
}

fn nine_to_ten() -> (NaiveTime, NaiveTime) {
    (
        NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
        NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
    )
}

#[tokio::test]
async fn test_booked_interval_is_reported_unavailable() {
    let fixture = BusinessFixture::new().await;
    fixture.book(at(ymd(2025, 6, 2), 10, 0), "ada@example.com").await;
    let state = state_for(&fixture, at(ymd(2025, 6, 1), 9, 0));

    let response = AvailabilityService::new(&state)
        .get_availability(&fixture.business.slug, fixture.service.id, ymd(2025, 6, 2))
        .await
        .unwrap();

    assert_eq!(response.date, ymd(2025, 6, 2));
    assert_eq!(response.slots.len(), 15);
    let unavailable: Vec<String> = response
        .slots
        .iter()
        .filter(|s| !s.available)
        .map(|s| s.start_time.format("%H:%M").to_string())
        .collect();
    assert_eq!(unavailable, vec!["09:30", "10:00", "10:30"]);
}

#[tokio::test]
async fn test_weekend_without_hours_is_empty() {
    let fixture = BusinessFixture::new().await;
    let state = state_for(&fixture, at(ymd(2025, 6, 1), 9, 0));

    let response = AvailabilityService::new(&state)
        .get_availability(&fixture.business.slug, fixture.service.id, ymd(2025, 6, 7))
        .await
        .unwrap();

    assert!(response.slots.is_empty());
}

#[tokio::test]
async fn test_schedule_exception_closes_the_day() {
    let fixture = BusinessFixture::new().await;
    fixture
        .store
        .insert_schedule_exception(ScheduleException {
            id: Uuid::new_v4(),
            business_id: fixture.business.id,
            exception_date: ymd(2025, 6, 3),
            reason: Some("Staff training".to_string()),
        })
        .await
        .unwrap();
    let state = state_for(&fixture, at(ymd(2025, 6, 1), 9, 0));

    let response = AvailabilityService::new(&state)
        .get_availability(&fixture.business.slug, fixture.service.id, ymd(2025, 6, 3))
        .await
        .unwrap();

    assert!(response.slots.is_empty());
}

#[tokio::test]
async fn test_custom_increment_is_used() {
    let fixture = BusinessFixture::with_service_duration(60).await;
    let (open, close) = nine_to_ten();
    fixture
        .open_day(DayOfWeek::Saturday, 9, 10, Some(15))
        .await;
    let state = state_for(&fixture, at(ymd(2025, 6, 1), 9, 0));

    let response = AvailabilityService::new(&state)
        .get_availability(&fixture.business.slug, fixture.service.id, ymd(2025, 6, 7))
        .await
        .unwrap();

    assert_eq!(response.slots.len(), 1);
    assert_eq!(response.slots[0].start_time, open);
    assert_eq!(response.slots[0].end_time, close);
}

#[tokio::test]
async fn test_past_date_is_empty() {
    let fixture = BusinessFixture::new().await;
    let state = state_for(&fixture, at(ymd(2025, 6, 10), 9, 0));

    let response = AvailabilityService::new(&state)
        .get_availability(&fixture.business.slug, fixture.service.id, ymd(2025, 6, 9))
        .await
        .unwrap();

    assert!(response.slots.is_empty());
}

#[tokio::test]
async fn test_unknown_business_and_service_are_not_found() {
    let fixture = BusinessFixture::new().await;
    let state = state_for(&fixture, at(ymd(2025, 6, 1), 9, 0));
    let service = AvailabilityService::new(&state);

    let unknown_business = service
        .get_availability("no-such-business", fixture.service.id, ymd(2025, 6, 2))
        .await;
    assert_matches!(unknown_business, Err(ScheduleError::BusinessNotFound));

    let unknown_service = service
        .get_availability(&fixture.business.slug, Uuid::new_v4(), ymd(2025, 6, 2))
        .await;
    assert_matches!(unknown_service, Err(ScheduleError::ServiceNotFound));
}

#[tokio::test]
async fn test_inactive_service_is_bad_request() {
    let fixture = BusinessFixture::new().await;
    let retired = fixture.add_service("Retired", 30, false).await;
    let state = state_for(&fixture, at(ymd(2025, 6, 1), 9, 0));

    let result = AvailabilityService::new(&state)
        .get_availability(&fixture.business.slug, retired.id, ymd(2025, 6, 2))
        .await;

    assert_matches!(result, Err(ScheduleError::BadRequest(_)));
}
