pub mod booking;
pub mod details;
pub mod jobs;
pub mod lifecycle;
pub mod token;

pub use booking::AppointmentBookingService;
pub use details::AppointmentDetails;
pub use jobs::{AutoCompleteJob, ReminderJob};
pub use lifecycle::AppointmentLifecycleService;
pub use token::generate_cancellation_token;
