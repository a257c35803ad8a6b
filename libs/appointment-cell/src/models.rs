// libs/appointment-cell/src/models.rs
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use schedule_cell::ScheduleError;
use shared_database::StoreError;
use shared_models::booking::{
    Appointment, AppointmentStatus, CancelledBy, Customer, CustomerInfo, Service,
};
use shared_models::error::AppError;

// ==============================================================================
// REQUEST MODELS
// ==============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
}

impl From<CustomerRequest> for CustomerInfo {
    fn from(request: CustomerRequest) -> Self {
        Self {
            first_name: request.first_name.trim().to_string(),
            last_name: request.last_name.trim().to_string(),
            email: request.email.trim().to_string(),
            phone: request
                .phone
                .map(|p| p.trim().to_string())
                .filter(|p| !p.is_empty()),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingRequest {
    pub service_id: Uuid,
    pub appointment_datetime: NaiveDateTime,
    pub customer: CustomerRequest,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelRequest {
    pub cancellation_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AppointmentRangeQuery {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

#[derive(Debug, Deserialize)]
pub struct StatusUpdateQuery {
    pub status: AppointmentStatus,
}

// ==============================================================================
// RESPONSE MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ServiceSummary {
    pub id: Uuid,
    pub name: String,
    pub duration_minutes: i32,
    pub price: f64,
}

impl From<&Service> for ServiceSummary {
    fn from(service: &Service) -> Self {
        Self {
            id: service.id,
            name: service.name.clone(),
            duration_minutes: service.duration_minutes,
            price: service.price,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CustomerSummary {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
}

impl From<&Customer> for CustomerSummary {
    fn from(customer: &Customer) -> Self {
        Self {
            id: customer.id,
            first_name: customer.first_name.clone(),
            last_name: customer.last_name.clone(),
            email: customer.email.clone(),
            phone: customer.phone.clone(),
        }
    }
}

/// Appointment as seen by customers and owners.
///
/// Price and duration are the values captured at booking time, not the
/// service's current ones.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentResponse {
    pub id: Uuid,
    pub appointment_datetime: NaiveDateTime,
    pub end_datetime: NaiveDateTime,
    pub duration_minutes: i32,
    pub price: f64,
    pub status: AppointmentStatus,
    pub notes: Option<String>,
    pub cancellation_token: String,
    pub cancellation_reason: Option<String>,
    pub cancelled_by: Option<CancelledBy>,
    pub confirmed_at: Option<NaiveDateTime>,
    pub cancelled_at: Option<NaiveDateTime>,
    pub service: Option<ServiceSummary>,
    pub customer: Option<CustomerSummary>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl AppointmentResponse {
    pub fn new(
        appointment: Appointment,
        service: Option<&Service>,
        customer: Option<&Customer>,
    ) -> Self {
        Self {
            id: appointment.id,
            end_datetime: appointment.end_time(),
            appointment_datetime: appointment.appointment_datetime,
            duration_minutes: appointment.duration_minutes,
            price: appointment.price,
            status: appointment.status,
            notes: appointment.notes,
            cancellation_token: appointment.cancellation_token,
            cancellation_reason: appointment.cancellation_reason,
            cancelled_by: appointment.cancelled_by,
            confirmed_at: appointment.confirmed_at,
            cancelled_at: appointment.cancelled_at,
            service: service.map(ServiceSummary::from),
            customer: customer.map(CustomerSummary::from),
            created_at: appointment.created_at,
            updated_at: appointment.updated_at,
        }
    }
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Error, Debug, PartialEq)]
pub enum AppointmentError {
    #[error("Business not found")]
    BusinessNotFound,

    #[error("Service not found")]
    ServiceNotFound,

    #[error("Appointment not found")]
    NotFound,

    #[error("Invalid appointment time: {0}")]
    InvalidTime(String),

    #[error("{0}")]
    Unavailable(String),

    #[error("Appointment is already cancelled")]
    AlreadyCancelled,

    #[error("Appointment cannot be modified in current status: {0}")]
    InvalidStatusTransition(AppointmentStatus),

    #[error("{0}")]
    ConflictDetected(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<StoreError> for AppointmentError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::NotFound(_) => AppointmentError::NotFound,
            StoreError::Conflict(msg) => AppointmentError::ConflictDetected(msg),
            StoreError::BadRequest(msg) => AppointmentError::ValidationError(msg),
            StoreError::Backend(msg) => AppointmentError::DatabaseError(msg),
        }
    }
}

impl From<ScheduleError> for AppointmentError {
    fn from(error: ScheduleError) -> Self {
        match error {
            ScheduleError::BusinessNotFound => AppointmentError::BusinessNotFound,
            ScheduleError::ServiceNotFound => AppointmentError::ServiceNotFound,
            ScheduleError::NotFound(_) => AppointmentError::NotFound,
            ScheduleError::BadRequest(msg) => AppointmentError::ValidationError(msg),
            ScheduleError::Conflict(msg) => AppointmentError::ConflictDetected(msg),
            ScheduleError::Database(msg) => AppointmentError::DatabaseError(msg),
        }
    }
}

impl From<AppointmentError> for AppError {
    fn from(error: AppointmentError) -> Self {
        match error {
            AppointmentError::BusinessNotFound
            | AppointmentError::ServiceNotFound
            | AppointmentError::NotFound => AppError::NotFound(error.to_string()),
            AppointmentError::InvalidTime(_)
            | AppointmentError::InvalidStatusTransition(_) => AppError::BadRequest(error.to_string()),
            AppointmentError::Unavailable(msg) => AppError::BadRequest(msg),
            AppointmentError::ValidationError(msg) => AppError::ValidationError(msg),
            AppointmentError::AlreadyCancelled => AppError::Conflict(error.to_string()),
            AppointmentError::ConflictDetected(msg) => AppError::Conflict(msg),
            AppointmentError::DatabaseError(msg) => AppError::Database(msg),
        }
    }
}
