use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use notification_cell::NotificationDispatcher;
use schedule_cell::{schedule_routes, ScheduleState};
use shared_utils::clock::FixedClock;
use shared_utils::test_utils::{at, ymd, BusinessFixture, JwtTestUtils, TestConfig, TestUser};

struct TestApp {
    router: Router,
    fixture: BusinessFixture,
    token: String,
}

async fn create_test_app() -> TestApp {
    let test_config = TestConfig::default();
    let fixture = BusinessFixture::new().await;
    let (notifier, _jobs) = NotificationDispatcher::channel(16);
    let state = ScheduleState {
        config: test_config.to_arc(),
        store: fixture.store_handle(),
        clock: Arc::new(FixedClock::new(at(ymd(2025, 6, 1), 9, 0))),
        notifier,
    };
    let token = fixture.owner_token(&test_config.jwt_secret);

    TestApp {
        router: schedule_routes(state),
        fixture,
        token,
    }
}

async fn send(router: &Router, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

#[tokio::test]
async fn test_public_availability_endpoint() {
    let app = create_test_app().await;
    let uri = format!(
        "/availability/{}?serviceId={}&date=2025-06-02",
        app.fixture.business.slug, app.fixture.service.id
    );

    let (status, body) = send(&app.router, Method::GET, &uri, None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["date"], "2025-06-02");
    assert_eq!(body["slots"][0]["startTime"], "09:00:00");
    assert_eq!(body["slots"][0]["endTime"], "10:00:00");
    assert_eq!(body["slots"][0]["available"], true);
}

#[tokio::test]
async fn test_unknown_business_is_404() {
    let app = create_test_app().await;
    let uri = format!(
        "/availability/nobody?serviceId={}&date=2025-06-02",
        app.fixture.service.id
    );

    let (status, body) = send(&app.router, Method::GET, &uri, None, None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Business not found");
}

#[tokio::test]
async fn test_owner_routes_require_token() {
    let app = create_test_app().await;

    let (status, _) = send(&app.router, Method::GET, "/holidays", None, None).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_user_without_business_is_404() {
    let app = create_test_app().await;
    let stranger = TestUser::owner("stranger@example.com");
    let token = JwtTestUtils::create_test_token(&stranger, &TestConfig::default().jwt_secret, None);

    let (status, _) = send(&app.router, Method::GET, "/schedules", Some(&token), None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_holiday_endpoints_cascade() {
    let app = create_test_app().await;
    let booked = app
        .fixture
        .book(at(ymd(2025, 6, 11), 10, 0), "ada@example.com")
        .await;

    let (status, preview) = send(
        &app.router,
        Method::GET,
        "/holidays/affected-appointments?start=2025-06-10&end=2025-06-12",
        Some(&app.token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(preview, json!([booked.id]));

    let (status, created) = send(
        &app.router,
        Method::POST,
        "/holidays",
        Some(&app.token),
        Some(json!({ "startDate": "2025-06-10", "endDate": "2025-06-12", "reason": "Summer break" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["cancelledAppointmentIds"], json!([booked.id]));
    assert_eq!(created["startDate"], "2025-06-10");

    let (status, _) = send(
        &app.router,
        Method::POST,
        "/holidays",
        Some(&app.token),
        Some(json!({ "startDate": "2025-06-12", "endDate": "2025-06-13" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let uri = format!(
        "/availability/{}?serviceId={}&date=2025-06-11",
        app.fixture.business.slug, app.fixture.service.id
    );
    let (_, availability) = send(&app.router, Method::GET, &uri, None, None).await;
    assert_eq!(availability["slots"], json!([]));

    let holiday_id = created["id"].as_str().unwrap().to_string();
    let (status, _) = send(
        &app.router,
        Method::DELETE,
        &format!("/holidays/{}", holiday_id),
        Some(&app.token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let public_uri = format!("/businesses/{}/holidays", app.fixture.business.slug);
    let (status, public) = send(&app.router, Method::GET, &public_uri, None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(public, json!([]));
}

#[tokio::test]
async fn test_weekly_schedule_endpoints() {
    let app = create_test_app().await;

    let (status, saved) = send(
        &app.router,
        Method::POST,
        "/schedules",
        Some(&app.token),
        Some(json!({ "dayOfWeek": "SATURDAY", "startTime": "10:00:00", "endTime": "14:00:00" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(saved["slotDurationMinutes"], 30);
    assert_eq!(saved["isActive"], true);

    let (status, _) = send(
        &app.router,
        Method::POST,
        "/schedules",
        Some(&app.token),
        Some(json!({ "dayOfWeek": "SUNDAY", "startTime": "14:00:00", "endTime": "10:00:00" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let schedule_id = saved["id"].as_str().unwrap().to_string();
    let (status, _) = send(
        &app.router,
        Method::DELETE,
        &format!("/schedules/{}", schedule_id),
        Some(&app.token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let public_uri = format!("/schedules/public/{}", app.fixture.business.slug);
    let (status, public) = send(&app.router, Method::GET, &public_uri, None, None).await;
    assert_eq!(status, StatusCode::OK);
    let days: Vec<&str> = public
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["dayOfWeek"].as_str().unwrap())
        .collect();
    assert_eq!(days, vec!["MONDAY", "TUESDAY", "WEDNESDAY", "THURSDAY", "FRIDAY"]);
}

#[tokio::test]
async fn test_schedule_exception_endpoints() {
    let app = create_test_app().await;

    let (status, created) = send(
        &app.router,
        Method::POST,
        "/schedule-exceptions",
        Some(&app.token),
        Some(json!({ "date": "2025-06-03", "reason": "Staff training" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = send(
        &app.router,
        Method::POST,
        "/schedule-exceptions",
        Some(&app.token),
        Some(json!({ "date": "2025-06-03" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, listed) = send(&app.router, Method::GET, "/schedule-exceptions", Some(&app.token), None).await;
    assert_eq!(listed.as_array().map(|a| a.len()), Some(1));

    let exception_id = created["id"].as_str().unwrap().to_string();
    let (status, _) = send(
        &app.router,
        Method::DELETE,
        &format!("/schedule-exceptions/{}", exception_id),
        Some(&app.token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}
