use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_models::auth::User;
use shared_models::error::AppError;
use shared_utils::principal::resolve_principal;

use crate::models::{
    AffectedAppointmentsQuery, AvailabilityQuery, HolidayCascadeResponse, HolidayRequest,
    HolidayResponse, ScheduleExceptionRequest, ScheduleExceptionResponse, ScheduleRequest,
    ScheduleResponse, UpdateScheduleRequest,
};
use crate::services::{
    availability::AvailabilityService, holiday::HolidayService, schedule::ScheduleService,
};
use crate::state::ScheduleState;

// ==============================================================================
// PUBLIC HANDLERS (NO AUTHENTICATION REQUIRED)
// ==============================================================================

#[axum::debug_handler]
pub async fn get_availability(
    State(state): State<ScheduleState>,
    Path(business_slug): Path<String>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<Json<Value>, AppError> {
    let availability_service = AvailabilityService::new(&state);

    let availability = availability_service
        .get_availability(&business_slug, query.service_id, query.date)
        .await?;

    Ok(Json(json!(availability)))
}

#[axum::debug_handler]
pub async fn get_public_schedule(
    State(state): State<ScheduleState>,
    Path(business_slug): Path<String>,
) -> Result<Json<Value>, AppError> {
    let schedule_service = ScheduleService::new(&state);

    let entries = schedule_service.public_schedule(&business_slug).await?;
    let schedules: Vec<ScheduleResponse> = entries.into_iter().map(Into::into).collect();

    Ok(Json(json!(schedules)))
}

#[axum::debug_handler]
pub async fn get_public_holidays(
    State(state): State<ScheduleState>,
    Path(business_slug): Path<String>,
) -> Result<Json<Value>, AppError> {
    let holiday_service = HolidayService::new(&state);

    let holidays = holiday_service.public_holidays(&business_slug).await?;
    let holidays: Vec<HolidayResponse> = holidays.into_iter().map(Into::into).collect();

    Ok(Json(json!(holidays)))
}

// ==============================================================================
// WEEKLY SCHEDULE HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn list_schedules(
    State(state): State<ScheduleState>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let principal = resolve_principal(state.store.as_ref(), &user).await?;
    let schedule_service = ScheduleService::new(&state);

    let entries = schedule_service.list_schedule(&principal).await?;
    let schedules: Vec<ScheduleResponse> = entries.into_iter().map(Into::into).collect();

    Ok(Json(json!(schedules)))
}

#[axum::debug_handler]
pub async fn upsert_schedule(
    State(state): State<ScheduleState>,
    Extension(user): Extension<User>,
    Json(request): Json<ScheduleRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let principal = resolve_principal(state.store.as_ref(), &user).await?;
    let schedule_service = ScheduleService::new(&state);

    let entry = schedule_service.upsert_schedule(&principal, request).await?;

    Ok((StatusCode::CREATED, Json(json!(ScheduleResponse::from(entry)))))
}

#[axum::debug_handler]
pub async fn update_schedule(
    State(state): State<ScheduleState>,
    Extension(user): Extension<User>,
    Path(schedule_id): Path<Uuid>,
    Json(request): Json<UpdateScheduleRequest>,
) -> Result<Json<Value>, AppError> {
    let principal = resolve_principal(state.store.as_ref(), &user).await?;
    let schedule_service = ScheduleService::new(&state);

    let entry = schedule_service
        .update_schedule(&principal, schedule_id, request)
        .await?;

    Ok(Json(json!(ScheduleResponse::from(entry))))
}

#[axum::debug_handler]
pub async fn delete_schedule(
    State(state): State<ScheduleState>,
    Extension(user): Extension<User>,
    Path(schedule_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let principal = resolve_principal(state.store.as_ref(), &user).await?;
    let schedule_service = ScheduleService::new(&state);

    schedule_service
        .deactivate_schedule(&principal, schedule_id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

// ==============================================================================
// SCHEDULE EXCEPTION HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn list_schedule_exceptions(
    State(state): State<ScheduleState>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let principal = resolve_principal(state.store.as_ref(), &user).await?;
    let schedule_service = ScheduleService::new(&state);

    let exceptions = schedule_service.list_exceptions(&principal).await?;
    let exceptions: Vec<ScheduleExceptionResponse> =
        exceptions.into_iter().map(Into::into).collect();

    Ok(Json(json!(exceptions)))
}

#[axum::debug_handler]
pub async fn create_schedule_exception(
    State(state): State<ScheduleState>,
    Extension(user): Extension<User>,
    Json(request): Json<ScheduleExceptionRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let principal = resolve_principal(state.store.as_ref(), &user).await?;
    let schedule_service = ScheduleService::new(&state);

    let exception = schedule_service.add_exception(&principal, request).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!(ScheduleExceptionResponse::from(exception))),
    ))
}

#[axum::debug_handler]
pub async fn delete_schedule_exception(
    State(state): State<ScheduleState>,
    Extension(user): Extension<User>,
    Path(exception_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let principal = resolve_principal(state.store.as_ref(), &user).await?;
    let schedule_service = ScheduleService::new(&state);

    schedule_service
        .remove_exception(&principal, exception_id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

// ==============================================================================
// HOLIDAY HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn list_holidays(
    State(state): State<ScheduleState>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let principal = resolve_principal(state.store.as_ref(), &user).await?;
    let holiday_service = HolidayService::new(&state);

    let holidays = holiday_service.list_holidays(&principal).await?;
    let holidays: Vec<HolidayResponse> = holidays.into_iter().map(Into::into).collect();

    Ok(Json(json!(holidays)))
}

#[axum::debug_handler]
pub async fn list_upcoming_holidays(
    State(state): State<ScheduleState>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let principal = resolve_principal(state.store.as_ref(), &user).await?;
    let holiday_service = HolidayService::new(&state);

    let holidays = holiday_service.upcoming_holidays(&principal).await?;
    let holidays: Vec<HolidayResponse> = holidays.into_iter().map(Into::into).collect();

    Ok(Json(json!(holidays)))
}

#[axum::debug_handler]
pub async fn get_affected_appointments(
    State(state): State<ScheduleState>,
    Extension(user): Extension<User>,
    Query(query): Query<AffectedAppointmentsQuery>,
) -> Result<Json<Value>, AppError> {
    let principal = resolve_principal(state.store.as_ref(), &user).await?;
    let holiday_service = HolidayService::new(&state);

    let appointments = holiday_service
        .affected_appointments(&principal, query.start, query.end)
        .await?;
    let ids: Vec<Uuid> = appointments.iter().map(|a| a.id).collect();

    Ok(Json(json!(ids)))
}

#[axum::debug_handler]
pub async fn create_holiday(
    State(state): State<ScheduleState>,
    Extension(user): Extension<User>,
    Json(request): Json<HolidayRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let principal = resolve_principal(state.store.as_ref(), &user).await?;
    let holiday_service = HolidayService::new(&state);

    let cascade = holiday_service.create_holiday(&principal, request).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!(HolidayCascadeResponse::from(cascade))),
    ))
}

#[axum::debug_handler]
pub async fn update_holiday(
    State(state): State<ScheduleState>,
    Extension(user): Extension<User>,
    Path(holiday_id): Path<Uuid>,
    Json(request): Json<HolidayRequest>,
) -> Result<Json<Value>, AppError> {
    let principal = resolve_principal(state.store.as_ref(), &user).await?;
    let holiday_service = HolidayService::new(&state);

    let cascade = holiday_service
        .update_holiday(&principal, holiday_id, request)
        .await?;

    Ok(Json(json!(HolidayCascadeResponse::from(cascade))))
}

#[axum::debug_handler]
pub async fn delete_holiday(
    State(state): State<ScheduleState>,
    Extension(user): Extension<User>,
    Path(holiday_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let principal = resolve_principal(state.store.as_ref(), &user).await?;
    let holiday_service = HolidayService::new(&state);

    holiday_service.delete_holiday(&principal, holiday_id).await?;

    Ok(StatusCode::NO_CONTENT)
}
