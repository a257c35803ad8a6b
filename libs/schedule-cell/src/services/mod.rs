pub mod availability;
pub mod calendar;
pub mod holiday;
pub mod schedule;
pub mod slots;

pub use availability::AvailabilityService;
pub use calendar::ScheduleCalendar;
pub use holiday::HolidayService;
pub use schedule::ScheduleService;
pub use slots::generate_slots;
