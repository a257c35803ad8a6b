use std::collections::HashMap;

use uuid::Uuid;

use shared_database::BookingStore;
use shared_models::booking::{Appointment, Customer, Service};

use crate::models::{AppointmentError, AppointmentResponse};

/// Joins appointments with their service and customer records.
pub struct AppointmentDetails<'a> {
    store: &'a dyn BookingStore,
    services: HashMap<Uuid, Option<Service>>,
    customers: HashMap<Uuid, Option<Customer>>,
}

impl<'a> AppointmentDetails<'a> {
    pub fn new(store: &'a dyn BookingStore) -> Self {
        Self {
            store,
            services: HashMap::new(),
            customers: HashMap::new(),
        }
    }

    pub async fn describe(
        &mut self,
        appointment: Appointment,
    ) -> Result<AppointmentResponse, AppointmentError> {
        if !self.services.contains_key(&appointment.service_id) {
            let service = self
                .store
                .service(appointment.business_id, appointment.service_id)
                .await?;
            self.services.insert(appointment.service_id, service);
        }
        if !self.customers.contains_key(&appointment.customer_id) {
            let customer = self
                .store
                .customer(appointment.business_id, appointment.customer_id)
                .await?;
            self.customers.insert(appointment.customer_id, customer);
        }

        let service = self.services.get(&appointment.service_id).and_then(Option::as_ref);
        let customer = self.customers.get(&appointment.customer_id).and_then(Option::as_ref);

        Ok(AppointmentResponse::new(appointment, service, customer))
    }

    pub async fn describe_all(
        &mut self,
        appointments: Vec<Appointment>,
    ) -> Result<Vec<AppointmentResponse>, AppointmentError> {
        let mut responses = Vec::with_capacity(appointments.len());
        for appointment in appointments {
            responses.push(self.describe(appointment).await?);
        }
        Ok(responses)
    }
}
