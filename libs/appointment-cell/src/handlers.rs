// libs/appointment-cell/src/handlers.rs
use axum::{
    body::Bytes,
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_models::auth::User;
use shared_models::error::AppError;
use shared_utils::principal::resolve_principal;

use crate::models::{AppointmentRangeQuery, BookingRequest, CancelRequest, StatusUpdateQuery};
use crate::services::{
    booking::AppointmentBookingService, lifecycle::AppointmentLifecycleService,
};
use crate::state::BookingState;

// ==============================================================================
// PUBLIC HANDLERS (NO AUTHENTICATION REQUIRED)
// ==============================================================================

#[axum::debug_handler]
pub async fn book_appointment(
    State(state): State<BookingState>,
    Path(business_slug): Path<String>,
    Json(request): Json<BookingRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let booking_service = AppointmentBookingService::new(&state);

    let appointment = booking_service
        .create_appointment(&business_slug, request)
        .await?;

    Ok((StatusCode::CREATED, Json(json!(appointment))))
}

#[axum::debug_handler]
pub async fn get_appointment_by_token(
    State(state): State<BookingState>,
    Path(token): Path<String>,
) -> Result<Json<Value>, AppError> {
    let lifecycle_service = AppointmentLifecycleService::new(&state);

    let appointment = lifecycle_service.get_by_token(&token).await?;

    Ok(Json(json!(appointment)))
}

/// The body is optional; an empty one cancels without a reason.
#[axum::debug_handler]
pub async fn cancel_appointment_by_token(
    State(state): State<BookingState>,
    Path(token): Path<String>,
    body: Bytes,
) -> Result<Json<Value>, AppError> {
    let request: CancelRequest = if body.iter().all(u8::is_ascii_whitespace) {
        CancelRequest::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| AppError::BadRequest(format!("Invalid cancellation request: {}", e)))?
    };

    let lifecycle_service = AppointmentLifecycleService::new(&state);

    let appointment = lifecycle_service
        .cancel_by_token(&token, request.cancellation_reason)
        .await?;

    Ok(Json(json!({
        "message": "Appointment cancelled",
        "appointment": appointment
    })))
}

// ==============================================================================
// OWNER HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn list_appointments(
    State(state): State<BookingState>,
    Extension(user): Extension<User>,
    Query(query): Query<AppointmentRangeQuery>,
) -> Result<Json<Value>, AppError> {
    let principal = resolve_principal(state.store.as_ref(), &user).await?;
    let booking_service = AppointmentBookingService::new(&state);

    let appointments = booking_service
        .list_business_appointments(&principal, query.start, query.end)
        .await?;

    Ok(Json(json!(appointments)))
}

#[axum::debug_handler]
pub async fn update_appointment_status(
    State(state): State<BookingState>,
    Extension(user): Extension<User>,
    Path(appointment_id): Path<Uuid>,
    Query(query): Query<StatusUpdateQuery>,
) -> Result<Json<Value>, AppError> {
    let principal = resolve_principal(state.store.as_ref(), &user).await?;
    let lifecycle_service = AppointmentLifecycleService::new(&state);

    let appointment = lifecycle_service
        .update_status(&principal, appointment_id, query.status)
        .await?;

    Ok(Json(json!(appointment)))
}
