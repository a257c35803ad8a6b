use axum::{
    middleware,
    routing::{delete, get, put},
    Router,
};

use shared_utils::extractor::auth_middleware;

use crate::handlers;
use crate::state::ScheduleState;

pub fn schedule_routes(state: ScheduleState) -> Router {
    // Public routes (no authentication required)
    let public_routes = Router::new()
        .route("/availability/{business_slug}", get(handlers::get_availability))
        .route("/schedules/public/{business_slug}", get(handlers::get_public_schedule))
        .route("/businesses/{business_slug}/holidays", get(handlers::get_public_holidays));

    // Owner routes (authentication required)
    let protected_routes = Router::new()
        .route(
            "/schedules",
            get(handlers::list_schedules).post(handlers::upsert_schedule),
        )
        .route(
            "/schedules/{schedule_id}",
            put(handlers::update_schedule).delete(handlers::delete_schedule),
        )
        .route(
            "/schedule-exceptions",
            get(handlers::list_schedule_exceptions).post(handlers::create_schedule_exception),
        )
        .route(
            "/schedule-exceptions/{exception_id}",
            delete(handlers::delete_schedule_exception),
        )
        .route(
            "/holidays",
            get(handlers::list_holidays).post(handlers::create_holiday),
        )
        .route("/holidays/upcoming", get(handlers::list_upcoming_holidays))
        .route(
            "/holidays/affected-appointments",
            get(handlers::get_affected_appointments),
        )
        .route(
            "/holidays/{holiday_id}",
            put(handlers::update_holiday).delete(handlers::delete_holiday),
        )
        .layer(middleware::from_fn_with_state(
            state.config.clone(),
            auth_middleware,
        ));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}
