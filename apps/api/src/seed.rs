use chrono::NaiveTime;
use tracing::info;
use uuid::Uuid;

use shared_database::{BookingStore, InMemoryStore, StoreResult};
use shared_models::booking::{Business, DayOfWeek, Service, WeeklyScheduleEntry};

pub const DEMO_SLUG: &str = "demo-salon";
pub const DEMO_OWNER_ID: &str = "demo-owner";

/// A business with two services and weekday plus Saturday hours, so the
/// in-memory backend is usable without an admin surface.
pub async fn seed_demo_business(store: &InMemoryStore) -> StoreResult<()> {
    let business = Business {
        id: Uuid::new_v4(),
        slug: DEMO_SLUG.to_string(),
        name: "Demo Salon".to_string(),
        owner_id: DEMO_OWNER_ID.to_string(),
        email: Some("hello@demo-salon.local".to_string()),
        is_active: true,
    };
    store.insert_business(business.clone())?;

    for (name, duration_minutes, price) in [("Haircut", 30, 25.0), ("Colour", 90, 80.0)] {
        store
            .insert_service(Service {
                id: Uuid::new_v4(),
                business_id: business.id,
                name: name.to_string(),
                duration_minutes,
                price,
                is_active: true,
            })
            .await?;
    }

    let hours = [
        (DayOfWeek::Monday, 9, 17),
        (DayOfWeek::Tuesday, 9, 17),
        (DayOfWeek::Wednesday, 9, 17),
        (DayOfWeek::Thursday, 9, 19),
        (DayOfWeek::Friday, 9, 17),
        (DayOfWeek::Saturday, 10, 14),
    ];
    for (day, open, close) in hours {
        store
            .save_schedule_entry(WeeklyScheduleEntry {
                id: Uuid::new_v4(),
                business_id: business.id,
                day_of_week: day,
                start_time: NaiveTime::from_hms_opt(open, 0, 0).unwrap_or_default(),
                end_time: NaiveTime::from_hms_opt(close, 0, 0).unwrap_or_default(),
                slot_duration_minutes: Some(30),
                is_active: true,
            })
            .await?;
    }

    info!("Seeded demo business '{}' owned by '{}'", DEMO_SLUG, DEMO_OWNER_ID);
    Ok(())
}
