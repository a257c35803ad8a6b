use std::sync::Arc;

use base64::{engine::general_purpose, Engine as _};
use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use hmac::{Hmac, Mac};
use serde_json::json;
use sha2::Sha256;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::{BookingDraft, BookingStore, InMemoryStore};
use shared_models::auth::User;
use shared_models::booking::{
    Appointment, Business, CustomerInfo, DayOfWeek, Service, WeeklyScheduleEntry,
};

pub struct TestConfig {
    pub jwt_secret: String,
    pub supabase_url: String,
    pub supabase_anon_key: String,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "test-secret-key-for-jwt-validation-must-be-long-enough".to_string(),
            supabase_url: "http://localhost:54321".to_string(),
            supabase_anon_key: "test-anon-key".to_string(),
        }
    }
}

impl TestConfig {
    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            supabase_url: self.supabase_url.clone(),
            supabase_anon_key: self.supabase_anon_key.clone(),
            supabase_jwt_secret: self.jwt_secret.clone(),
            ..AppConfig::default()
        }
    }

    pub fn to_arc(&self) -> Arc<AppConfig> {
        Arc::new(self.to_app_config())
    }
}

pub struct TestUser {
    pub id: String,
    pub email: String,
    pub role: String,
}

impl Default for TestUser {
    fn default() -> Self {
        Self::new("test@example.com", "authenticated")
    }
}

impl TestUser {
    pub fn new(email: &str, role: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            email: email.to_string(),
            role: role.to_string(),
        }
    }

    pub fn owner(email: &str) -> Self {
        Self::new(email, "authenticated")
    }

    pub fn to_user(&self) -> User {
        User {
            id: self.id.clone(),
            email: Some(self.email.clone()),
            role: Some(self.role.clone()),
            metadata: None,
            created_at: Some(Utc::now()),
        }
    }
}

pub struct JwtTestUtils;

impl JwtTestUtils {
    pub fn create_test_token(user: &TestUser, secret: &str, exp_hours: Option<i64>) -> String {
        let now = Utc::now();
        let exp = now + Duration::hours(exp_hours.unwrap_or(24));

        let header = json!({
            "alg": "HS256",
            "typ": "JWT"
        });

        let payload = json!({
            "sub": user.id,
            "email": user.email,
            "role": user.role,
            "iat": now.timestamp(),
            "exp": exp.timestamp()
        });

        let header_encoded = general_purpose::URL_SAFE_NO_PAD.encode(header.to_string());
        let payload_encoded = general_purpose::URL_SAFE_NO_PAD.encode(payload.to_string());

        let signing_input = format!("{}.{}", header_encoded, payload_encoded);

        let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
            .expect("HMAC can take key of any size");
        mac.update(signing_input.as_bytes());
        let signature = mac.finalize().into_bytes();
        let signature_encoded = general_purpose::URL_SAFE_NO_PAD.encode(signature);

        format!("{}.{}", signing_input, signature_encoded)
    }

    pub fn create_expired_token(user: &TestUser, secret: &str) -> String {
        Self::create_test_token(user, secret, Some(-1))
    }

    pub fn create_invalid_signature_token(user: &TestUser) -> String {
        Self::create_test_token(user, "wrong-secret", Some(24))
    }

    pub fn create_malformed_token() -> String {
        "invalid.token.format".to_string()
    }
}

pub fn at(date: NaiveDate, hour: u32, minute: u32) -> NaiveDateTime {
    date.and_time(NaiveTime::from_hms_opt(hour, minute, 0).expect("valid test time"))
}

pub fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid test date")
}

/// A business with one service and Monday-Friday 09:00-17:00 hours, seeded
/// into an `InMemoryStore`.
pub struct BusinessFixture {
    pub store: Arc<InMemoryStore>,
    pub owner: TestUser,
    pub business: Business,
    pub service: Service,
}

impl BusinessFixture {
    pub async fn new() -> Self {
        Self::with_service_duration(60).await
    }

    pub async fn with_service_duration(duration_minutes: i32) -> Self {
        let store = Arc::new(InMemoryStore::new());
        let fixture = Self::seed(store, "corner-barber", duration_minutes).await;
        fixture.open_weekdays(9, 17).await;
        fixture
    }

    /// Seeds another business into an existing store, without opening hours.
    pub async fn seed(store: Arc<InMemoryStore>, slug: &str, duration_minutes: i32) -> Self {
        let owner = TestUser::owner(&format!("owner@{}.test", slug));
        let business = Business {
            id: Uuid::new_v4(),
            slug: slug.to_string(),
            name: format!("Business {}", slug),
            owner_id: owner.id.clone(),
            email: Some(format!("hello@{}.test", slug)),
            is_active: true,
        };
        let service = Service {
            id: Uuid::new_v4(),
            business_id: business.id,
            name: "Haircut".to_string(),
            duration_minutes,
            price: 25.0,
            is_active: true,
        };

        store
            .insert_business(business.clone())
            .expect("seed business");
        store
            .insert_service(service.clone())
            .await
            .expect("seed service");

        Self {
            store,
            owner,
            business,
            service,
        }
    }

    pub async fn open_weekdays(&self, open_hour: u32, close_hour: u32) {
        for day in [
            DayOfWeek::Monday,
            DayOfWeek::Tuesday,
            DayOfWeek::Wednesday,
            DayOfWeek::Thursday,
            DayOfWeek::Friday,
        ] {
            self.open_day(day, open_hour, close_hour, Some(30)).await;
        }
    }

    pub async fn open_day(&self, day: DayOfWeek, open_hour: u32, close_hour: u32, increment: Option<i32>) {
        let entry = WeeklyScheduleEntry {
            id: Uuid::new_v4(),
            business_id: self.business.id,
            day_of_week: day,
            start_time: NaiveTime::from_hms_opt(open_hour, 0, 0).expect("valid open hour"),
            end_time: NaiveTime::from_hms_opt(close_hour, 0, 0).expect("valid close hour"),
            slot_duration_minutes: increment,
            is_active: true,
        };
        self.store
            .save_schedule_entry(entry)
            .await
            .expect("seed schedule");
    }

    pub async fn add_service(&self, name: &str, duration_minutes: i32, is_active: bool) -> Service {
        let service = Service {
            id: Uuid::new_v4(),
            business_id: self.business.id,
            name: name.to_string(),
            duration_minutes,
            price: 40.0,
            is_active,
        };
        self.store
            .insert_service(service.clone())
            .await
            .expect("seed service");
        service
    }

    /// Books the fixture service through the store's locked unit of work.
    pub async fn book(&self, start: NaiveDateTime, email: &str) -> Appointment {
        let draft = BookingDraft {
            appointment_id: Uuid::new_v4(),
            business_id: self.business.id,
            service_id: self.service.id,
            appointment_datetime: start,
            duration_minutes: self.service.duration_minutes,
            price: self.service.price,
            notes: None,
            customer: CustomerInfo {
                first_name: "Test".to_string(),
                last_name: "Customer".to_string(),
                email: email.to_string(),
                phone: None,
            },
            cancellation_token: Uuid::new_v4().simple().to_string(),
            created_at: start - Duration::days(30),
        };
        self.store
            .book_appointment(draft)
            .await
            .expect("seed appointment")
            .appointment
    }

    pub fn store_handle(&self) -> Arc<dyn BookingStore> {
        self.store.clone()
    }

    pub fn owner_token(&self, secret: &str) -> String {
        JwtTestUtils::create_test_token(&self.owner, secret, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_creation() {
        let config = TestConfig::default();
        let app_config = config.to_app_config();

        assert_eq!(app_config.supabase_url, "http://localhost:54321");
        assert_eq!(app_config.supabase_anon_key, "test-anon-key");
        assert!(!app_config.supabase_jwt_secret.is_empty());
    }

    #[test]
    fn test_user_creation() {
        let user = TestUser::owner("owner@example.com");
        let user_model = user.to_user();

        assert_eq!(user_model.email, Some(user.email.clone()));
        assert_eq!(user_model.id, user.id);
    }

    #[tokio::test]
    async fn test_fixture_seeds_weekday_hours() {
        let fixture = BusinessFixture::new().await;

        let schedule = fixture
            .store
            .weekly_schedule(fixture.business.id)
            .await
            .unwrap();

        assert_eq!(schedule.len(), 5);
        assert_eq!(schedule[0].day_of_week, DayOfWeek::Monday);
    }
}
