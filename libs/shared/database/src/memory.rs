// libs/shared/database/src/memory.rs
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use tokio::sync::Mutex;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use shared_models::booking::{
    Appointment, AppointmentStatus, Business, Customer, DayOfWeek, HolidayPeriod,
    ScheduleException, Service, StatusChange, TimeRange, WeeklyScheduleEntry,
};

use crate::store::{
    holiday_cancellation, AppointmentFilter, BookedAppointment, BookingDraft, BookingStore,
    HolidayCascade, StoreError, StoreResult, CLOSED_ON_DATE_MESSAGE, HOLIDAY_OVERLAP_MESSAGE,
    SLOT_TAKEN_MESSAGE,
};

/// All state owned by one business. The mutex around it is the per-business lock.
struct Partition {
    business: Business,
    services: HashMap<Uuid, Service>,
    schedule: HashMap<Uuid, WeeklyScheduleEntry>,
    exceptions: HashMap<Uuid, ScheduleException>,
    holidays: HashMap<Uuid, HolidayPeriod>,
    customers: HashMap<Uuid, Customer>,
    appointments: HashMap<Uuid, Appointment>,
}

impl Partition {
    fn new(business: Business) -> Self {
        Self {
            business,
            services: HashMap::new(),
            schedule: HashMap::new(),
            exceptions: HashMap::new(),
            holidays: HashMap::new(),
            customers: HashMap::new(),
            appointments: HashMap::new(),
        }
    }

    /// Booking checks for `[start, end)`: no holiday on the day and no overlap
    /// with any active appointment other than `skip`, however long it is.
    fn ensure_bookable(
        &self,
        start: NaiveDateTime,
        end: NaiveDateTime,
        skip: Option<Uuid>,
    ) -> StoreResult<()> {
        if self.holidays.values().any(|h| h.contains(start.date())) {
            return Err(StoreError::Conflict(CLOSED_ON_DATE_MESSAGE.to_string()));
        }

        if let Some(existing) = self
            .appointments
            .values()
            .filter(|a| Some(a.id) != skip)
            .find(|a| a.conflicts_with(start, end))
        {
            debug!("Slot conflicts with appointment {}", existing.id);
            return Err(StoreError::Conflict(SLOT_TAKEN_MESSAGE.to_string()));
        }

        Ok(())
    }

    /// Cancels every active appointment inside the holiday, oldest first.
    fn cancel_for_holiday(&mut self, holiday: &HolidayPeriod, at: NaiveDateTime) -> Vec<Appointment> {
        let window = holiday.closure_window();
        let change = holiday_cancellation(holiday, at);
        let mut cancelled = Vec::new();
        for appointment in self.appointments.values_mut() {
            if AppointmentFilter::Active.matches(appointment, &window) {
                change.apply(appointment);
                cancelled.push(appointment.clone());
            }
        }
        cancelled.sort_by_key(|a| a.appointment_datetime);
        cancelled
    }

    fn select_appointments(&self, range: &TimeRange, filter: AppointmentFilter) -> Vec<Appointment> {
        let mut selected: Vec<Appointment> = self
            .appointments
            .values()
            .filter(|a| filter.matches(a, range))
            .cloned()
            .collect();
        selected.sort_by_key(|a| a.appointment_datetime);
        selected
    }
}

#[derive(Default)]
struct Directory {
    partitions: HashMap<Uuid, Arc<Mutex<Partition>>>,
    slugs: HashMap<String, Uuid>,
    owners: HashMap<String, Uuid>,
    appointment_owners: HashMap<Uuid, Uuid>,
    tokens: HashMap<String, Uuid>,
}

/// Process-local store with one lock per business.
///
/// Lock order is always partition mutex, then directory; the directory guard
/// is never held across an await.
#[derive(Default)]
pub struct InMemoryStore {
    directory: RwLock<Directory>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read_directory(&self) -> StoreResult<RwLockReadGuard<'_, Directory>> {
        self.directory
            .read()
            .map_err(|_| StoreError::Backend("directory lock poisoned".to_string()))
    }

    fn write_directory(&self) -> StoreResult<RwLockWriteGuard<'_, Directory>> {
        self.directory
            .write()
            .map_err(|_| StoreError::Backend("directory lock poisoned".to_string()))
    }

    fn partition(&self, business_id: Uuid) -> StoreResult<Arc<Mutex<Partition>>> {
        self.read_directory()?
            .partitions
            .get(&business_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound("Business not found".to_string()))
    }

    fn partition_for_appointment(&self, appointment_id: Uuid) -> StoreResult<Option<Arc<Mutex<Partition>>>> {
        let directory = self.read_directory()?;
        Ok(directory
            .appointment_owners
            .get(&appointment_id)
            .and_then(|business_id| directory.partitions.get(business_id))
            .cloned())
    }

    fn business_lookup(&self, key: impl FnOnce(&Directory) -> Option<Uuid>) -> StoreResult<Option<Arc<Mutex<Partition>>>> {
        let directory = self.read_directory()?;
        Ok(key(&directory).and_then(|id| directory.partitions.get(&id)).cloned())
    }

    fn index_appointment(&self, appointment: &Appointment) -> StoreResult<()> {
        let mut directory = self.write_directory()?;
        directory
            .appointment_owners
            .insert(appointment.id, appointment.business_id);
        directory
            .tokens
            .insert(appointment.cancellation_token.clone(), appointment.id);
        Ok(())
    }

    // Seeding. Businesses, services and customers are managed outside the
    // booking engine; these let the binary and tests provide them.

    pub fn insert_business(&self, business: Business) -> StoreResult<()> {
        let mut directory = self.write_directory()?;
        if directory.slugs.contains_key(&business.slug) {
            return Err(StoreError::Conflict(format!(
                "Business slug '{}' already exists",
                business.slug
            )));
        }
        directory.slugs.insert(business.slug.clone(), business.id);
        directory.owners.insert(business.owner_id.clone(), business.id);
        directory
            .partitions
            .insert(business.id, Arc::new(Mutex::new(Partition::new(business))));
        Ok(())
    }

    pub async fn insert_service(&self, service: Service) -> StoreResult<()> {
        let partition = self.partition(service.business_id)?;
        partition.lock().await.services.insert(service.id, service);
        Ok(())
    }

    /// Stores an appointment without any conflict checks.
    pub async fn insert_appointment(&self, appointment: Appointment) -> StoreResult<()> {
        let partition = self.partition(appointment.business_id)?;
        let mut guard = partition.lock().await;
        self.index_appointment(&appointment)?;
        guard.appointments.insert(appointment.id, appointment);
        Ok(())
    }

    pub async fn appointment_count(&self, business_id: Uuid) -> StoreResult<usize> {
        let partition = self.partition(business_id)?;
        let count = partition.lock().await.appointments.len();
        Ok(count)
    }
}

#[async_trait]
impl BookingStore for InMemoryStore {
    async fn business_by_slug(&self, slug: &str) -> StoreResult<Option<Business>> {
        match self.business_lookup(|d| d.slugs.get(slug).copied())? {
            Some(partition) => Ok(Some(partition.lock().await.business.clone())),
            None => Ok(None),
        }
    }

    async fn business_by_owner(&self, owner_id: &str) -> StoreResult<Option<Business>> {
        match self.business_lookup(|d| d.owners.get(owner_id).copied())? {
            Some(partition) => Ok(Some(partition.lock().await.business.clone())),
            None => Ok(None),
        }
    }

    async fn business_by_id(&self, business_id: Uuid) -> StoreResult<Option<Business>> {
        match self.business_lookup(|_| Some(business_id))? {
            Some(partition) => Ok(Some(partition.lock().await.business.clone())),
            None => Ok(None),
        }
    }

    async fn service(&self, business_id: Uuid, service_id: Uuid) -> StoreResult<Option<Service>> {
        let Some(partition) = self.business_lookup(|_| Some(business_id))? else {
            return Ok(None);
        };
        let guard = partition.lock().await;
        Ok(guard.services.get(&service_id).cloned())
    }

    async fn customer(&self, business_id: Uuid, customer_id: Uuid) -> StoreResult<Option<Customer>> {
        let Some(partition) = self.business_lookup(|_| Some(business_id))? else {
            return Ok(None);
        };
        let guard = partition.lock().await;
        Ok(guard.customers.get(&customer_id).cloned())
    }

    async fn weekly_schedule(&self, business_id: Uuid) -> StoreResult<Vec<WeeklyScheduleEntry>> {
        let partition = self.partition(business_id)?;
        let guard = partition.lock().await;
        let mut entries: Vec<WeeklyScheduleEntry> = guard.schedule.values().cloned().collect();
        entries.sort_by_key(|e| e.day_of_week);
        Ok(entries)
    }

    async fn schedule_entry(
        &self,
        business_id: Uuid,
        entry_id: Uuid,
    ) -> StoreResult<Option<WeeklyScheduleEntry>> {
        let partition = self.partition(business_id)?;
        let guard = partition.lock().await;
        Ok(guard.schedule.get(&entry_id).cloned())
    }

    async fn schedule_entry_for_day(
        &self,
        business_id: Uuid,
        day: DayOfWeek,
    ) -> StoreResult<Option<WeeklyScheduleEntry>> {
        let partition = self.partition(business_id)?;
        let guard = partition.lock().await;
        Ok(guard
            .schedule
            .values()
            .find(|e| e.day_of_week == day)
            .cloned())
    }

    async fn save_schedule_entry(
        &self,
        mut entry: WeeklyScheduleEntry,
    ) -> StoreResult<WeeklyScheduleEntry> {
        let partition = self.partition(entry.business_id)?;
        let mut guard = partition.lock().await;

        // One entry per weekday: an existing row for the day keeps its id.
        if let Some(existing) = guard
            .schedule
            .values()
            .find(|e| e.day_of_week == entry.day_of_week && e.id != entry.id)
        {
            entry.id = existing.id;
        }
        guard.schedule.insert(entry.id, entry.clone());
        Ok(entry)
    }

    async fn schedule_exceptions(&self, business_id: Uuid) -> StoreResult<Vec<ScheduleException>> {
        let partition = self.partition(business_id)?;
        let guard = partition.lock().await;
        let mut exceptions: Vec<ScheduleException> = guard.exceptions.values().cloned().collect();
        exceptions.sort_by_key(|e| e.exception_date);
        Ok(exceptions)
    }

    async fn has_schedule_exception(&self, business_id: Uuid, date: NaiveDate) -> StoreResult<bool> {
        let partition = self.partition(business_id)?;
        let guard = partition.lock().await;
        Ok(guard.exceptions.values().any(|e| e.exception_date == date))
    }

    async fn insert_schedule_exception(
        &self,
        exception: ScheduleException,
    ) -> StoreResult<ScheduleException> {
        let partition = self.partition(exception.business_id)?;
        let mut guard = partition.lock().await;
        if guard
            .exceptions
            .values()
            .any(|e| e.exception_date == exception.exception_date)
        {
            return Err(StoreError::Conflict(format!(
                "A schedule exception already exists for {}",
                exception.exception_date
            )));
        }
        guard.exceptions.insert(exception.id, exception.clone());
        Ok(exception)
    }

    async fn delete_schedule_exception(&self, business_id: Uuid, exception_id: Uuid) -> StoreResult<()> {
        let partition = self.partition(business_id)?;
        let mut guard = partition.lock().await;
        guard
            .exceptions
            .remove(&exception_id)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound("Schedule exception not found".to_string()))
    }

    async fn holidays(&self, business_id: Uuid) -> StoreResult<Vec<HolidayPeriod>> {
        let partition = self.partition(business_id)?;
        let guard = partition.lock().await;
        let mut holidays: Vec<HolidayPeriod> = guard.holidays.values().cloned().collect();
        holidays.sort_by_key(|h| h.start_date);
        Ok(holidays)
    }

    async fn holiday(&self, business_id: Uuid, holiday_id: Uuid) -> StoreResult<Option<HolidayPeriod>> {
        let partition = self.partition(business_id)?;
        let guard = partition.lock().await;
        Ok(guard.holidays.get(&holiday_id).cloned())
    }

    async fn holiday_covering(
        &self,
        business_id: Uuid,
        date: NaiveDate,
    ) -> StoreResult<Option<HolidayPeriod>> {
        let partition = self.partition(business_id)?;
        let guard = partition.lock().await;
        Ok(guard.holidays.values().find(|h| h.contains(date)).cloned())
    }

    #[instrument(skip(self, holiday), fields(business_id = %holiday.business_id))]
    async fn create_holiday(
        &self,
        holiday: HolidayPeriod,
        cancelled_at: NaiveDateTime,
    ) -> StoreResult<HolidayCascade> {
        let partition = self.partition(holiday.business_id)?;
        let mut guard = partition.lock().await;

        if guard
            .holidays
            .values()
            .any(|h| h.overlaps_dates(holiday.start_date, holiday.end_date))
        {
            return Err(StoreError::Conflict(HOLIDAY_OVERLAP_MESSAGE.to_string()));
        }

        let cancelled = guard.cancel_for_holiday(&holiday, cancelled_at);
        guard.holidays.insert(holiday.id, holiday.clone());

        info!(
            "Holiday {} created, {} appointments cancelled",
            holiday.id,
            cancelled.len()
        );

        Ok(HolidayCascade { holiday, cancelled })
    }

    #[instrument(skip(self, holiday), fields(business_id = %holiday.business_id))]
    async fn update_holiday(
        &self,
        holiday: HolidayPeriod,
        cancelled_at: NaiveDateTime,
    ) -> StoreResult<HolidayCascade> {
        let partition = self.partition(holiday.business_id)?;
        let mut guard = partition.lock().await;

        if !guard.holidays.contains_key(&holiday.id) {
            return Err(StoreError::NotFound("Holiday not found".to_string()));
        }
        if guard
            .holidays
            .values()
            .any(|h| h.id != holiday.id && h.overlaps_dates(holiday.start_date, holiday.end_date))
        {
            return Err(StoreError::Conflict(HOLIDAY_OVERLAP_MESSAGE.to_string()));
        }

        // Dates the holiday already covered hold no active appointments, so this
        // only sweeps the newly covered ones.
        let cancelled = guard.cancel_for_holiday(&holiday, cancelled_at);
        guard.holidays.insert(holiday.id, holiday.clone());

        if !cancelled.is_empty() {
            info!(
                "Holiday {} extended, {} appointments cancelled",
                holiday.id,
                cancelled.len()
            );
        }

        Ok(HolidayCascade { holiday, cancelled })
    }

    async fn delete_holiday(&self, business_id: Uuid, holiday_id: Uuid) -> StoreResult<()> {
        let partition = self.partition(business_id)?;
        let mut guard = partition.lock().await;
        guard
            .holidays
            .remove(&holiday_id)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound("Holiday not found".to_string()))
    }

    async fn appointments_in_range(
        &self,
        business_id: Uuid,
        range: TimeRange,
        filter: AppointmentFilter,
    ) -> StoreResult<Vec<Appointment>> {
        let partition = self.partition(business_id)?;
        let guard = partition.lock().await;
        Ok(guard.select_appointments(&range, filter))
    }

    async fn appointment(&self, appointment_id: Uuid) -> StoreResult<Option<Appointment>> {
        let Some(partition) = self.partition_for_appointment(appointment_id)? else {
            return Ok(None);
        };
        let guard = partition.lock().await;
        Ok(guard.appointments.get(&appointment_id).cloned())
    }

    async fn appointment_by_token(&self, token: &str) -> StoreResult<Option<Appointment>> {
        let appointment_id = self.read_directory()?.tokens.get(token).copied();
        match appointment_id {
            Some(id) => self.appointment(id).await,
            None => Ok(None),
        }
    }

    async fn appointments_due(
        &self,
        statuses: &[AppointmentStatus],
        range: TimeRange,
    ) -> StoreResult<Vec<Appointment>> {
        let partitions: Vec<Arc<Mutex<Partition>>> =
            self.read_directory()?.partitions.values().cloned().collect();

        let mut due = Vec::new();
        for partition in partitions {
            let guard = partition.lock().await;
            due.extend(
                guard
                    .select_appointments(&range, AppointmentFilter::All)
                    .into_iter()
                    .filter(|a| statuses.contains(&a.status)),
            );
        }
        due.sort_by_key(|a| a.appointment_datetime);
        Ok(due)
    }

    #[instrument(skip(self, draft), fields(business_id = %draft.business_id, start = %draft.appointment_datetime))]
    async fn book_appointment(&self, draft: BookingDraft) -> StoreResult<BookedAppointment> {
        let partition = self.partition(draft.business_id)?;
        let mut guard = partition.lock().await;

        let start = draft.appointment_datetime;
        guard.ensure_bookable(start, draft.end_time(), None)?;

        if self.read_directory()?.tokens.contains_key(&draft.cancellation_token) {
            return Err(StoreError::Conflict("Cancellation token collision".to_string()));
        }

        // All checks passed; nothing below can fail.
        let info = &draft.customer;
        let existing_customer = guard
            .customers
            .values_mut()
            .find(|c| c.email.eq_ignore_ascii_case(&info.email));
        let customer = match existing_customer {
            Some(customer) => {
                customer.first_name = info.first_name.clone();
                customer.last_name = info.last_name.clone();
                if info.phone.is_some() {
                    customer.phone = info.phone.clone();
                }
                customer.total_appointments += 1;
                customer.last_appointment_at = Some(draft.created_at);
                customer.clone()
            }
            None => {
                let customer = Customer {
                    id: Uuid::new_v4(),
                    business_id: draft.business_id,
                    first_name: info.first_name.clone(),
                    last_name: info.last_name.clone(),
                    email: info.email.clone(),
                    phone: info.phone.clone(),
                    total_appointments: 1,
                    last_appointment_at: Some(draft.created_at),
                    created_at: draft.created_at,
                };
                guard.customers.insert(customer.id, customer.clone());
                customer
            }
        };

        let appointment = Appointment {
            id: draft.appointment_id,
            business_id: draft.business_id,
            service_id: draft.service_id,
            customer_id: customer.id,
            appointment_datetime: start,
            duration_minutes: draft.duration_minutes,
            price: draft.price,
            status: AppointmentStatus::Pending,
            notes: draft.notes.clone(),
            cancellation_token: draft.cancellation_token.clone(),
            cancellation_reason: None,
            cancelled_by: None,
            confirmed_at: None,
            cancelled_at: None,
            created_at: draft.created_at,
            updated_at: draft.created_at,
        };

        self.index_appointment(&appointment)?;
        guard.appointments.insert(appointment.id, appointment.clone());

        Ok(BookedAppointment {
            appointment,
            customer,
        })
    }

    async fn transition_appointment(
        &self,
        appointment_id: Uuid,
        expected: AppointmentStatus,
        change: StatusChange,
    ) -> StoreResult<Appointment> {
        let partition = self
            .partition_for_appointment(appointment_id)?
            .ok_or_else(|| StoreError::NotFound("Appointment not found".to_string()))?;
        let mut guard = partition.lock().await;

        let current = guard
            .appointments
            .get(&appointment_id)
            .ok_or_else(|| StoreError::NotFound("Appointment not found".to_string()))?;

        if current.status != expected {
            return Err(StoreError::Conflict(format!(
                "Appointment status changed to {}",
                current.status
            )));
        }

        if change.reactivates(current) {
            let (start, end) = (current.appointment_datetime, current.end_time());
            guard.ensure_bookable(start, end, Some(appointment_id))?;
        }

        let appointment = guard
            .appointments
            .get_mut(&appointment_id)
            .ok_or_else(|| StoreError::NotFound("Appointment not found".to_string()))?;
        change.apply(appointment);
        Ok(appointment.clone())
    }
}
