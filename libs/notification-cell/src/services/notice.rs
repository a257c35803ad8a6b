use shared_database::{BookingStore, StoreError, StoreResult};
use shared_models::booking::Appointment;

use crate::AppointmentNotice;

/// Gathers the business, customer and service names an email needs.
pub async fn build_notice(
    store: &dyn BookingStore,
    appointment: &Appointment,
) -> StoreResult<AppointmentNotice> {
    let business = store
        .business_by_id(appointment.business_id)
        .await?
        .ok_or_else(|| StoreError::NotFound("Business not found".to_string()))?;
    let customer = store
        .customer(appointment.business_id, appointment.customer_id)
        .await?
        .ok_or_else(|| StoreError::NotFound("Customer not found".to_string()))?;
    let service_name = store
        .service(appointment.business_id, appointment.service_id)
        .await?
        .map(|s| s.name)
        .unwrap_or_else(|| "Appointment".to_string());

    Ok(AppointmentNotice {
        appointment_id: appointment.id,
        recipient_email: customer.email.clone(),
        customer_name: customer.full_name(),
        business_name: business.name,
        service_name,
        appointment_datetime: appointment.appointment_datetime,
        duration_minutes: appointment.duration_minutes,
        cancellation_token: appointment.cancellation_token.clone(),
        cancellation_reason: appointment.cancellation_reason.clone(),
    })
}
