// libs/appointment-cell/src/router.rs
use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};

use shared_utils::extractor::auth_middleware;

use crate::handlers;
use crate::state::BookingState;

pub fn appointment_routes(state: BookingState) -> Router {
    // Public routes: customers identify themselves with the cancellation token
    let public_routes = Router::new()
        .route("/booking/{business_slug}", post(handlers::book_appointment))
        .route(
            "/booking/appointment/{token}",
            get(handlers::get_appointment_by_token),
        )
        .route(
            "/booking/cancel/{token}",
            post(handlers::cancel_appointment_by_token),
        );

    // Owner routes (authentication required)
    let protected_routes = Router::new()
        .route("/appointments", get(handlers::list_appointments))
        .route(
            "/appointments/{appointment_id}/status",
            put(handlers::update_appointment_status),
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
