pub mod memory;
pub mod postgrest;
pub mod store;
pub mod supabase;

pub use memory::InMemoryStore;
pub use postgrest::SupabaseStore;
pub use store::{
    AppointmentFilter, BookedAppointment, BookingDraft, BookingStore, HolidayCascade, StoreError,
    StoreResult,
};
pub use supabase::{SupabaseClient, SupabaseError};
