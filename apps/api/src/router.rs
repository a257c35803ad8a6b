use axum::{routing::get, Router};

use appointment_cell::{appointment_routes, BookingState};
use schedule_cell::{schedule_routes, ScheduleState};

pub fn create_router(schedule_state: ScheduleState, booking_state: BookingState) -> Router {
    Router::new()
        .route("/", get(|| async { "SlotBook API is running!" }))
        .merge(schedule_routes(schedule_state))
        .merge(appointment_routes(booking_state))
}
