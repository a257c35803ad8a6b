use std::env;
use std::str::FromStr;
use tracing::warn;

/// Where bookings, schedules and holidays are persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Memory,
    Supabase,
}

impl FromStr for StorageBackend {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(StorageBackend::Memory),
            "supabase" | "postgrest" => Ok(StorageBackend::Supabase),
            other => Err(format!("Unknown storage backend: {}", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub storage_backend: StorageBackend,
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub supabase_service_role_key: String,
    pub supabase_jwt_secret: String,
    pub notification_queue_capacity: usize,
    pub email_api_url: String,
    pub email_api_key: String,
    pub mail_from: String,
    pub public_base_url: String,
    pub reminder_interval_seconds: u64,
    pub auto_complete_interval_seconds: u64,
    pub seed_demo_data: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            storage_backend: StorageBackend::Memory,
            supabase_url: String::new(),
            supabase_anon_key: String::new(),
            supabase_service_role_key: String::new(),
            supabase_jwt_secret: String::new(),
            notification_queue_capacity: 256,
            email_api_url: String::new(),
            email_api_key: String::new(),
            mail_from: "noreply@slotbook.local".to_string(),
            public_base_url: "http://localhost:4200".to_string(),
            reminder_interval_seconds: 3600,
            auto_complete_interval_seconds: 86400,
            seed_demo_data: false,
        }
    }
}

fn string_var(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| {
        warn!("{} not set, using default", name);
        default.to_string()
    })
}

fn parsed_var<T: FromStr>(name: &str, default: T) -> T {
    match env::var(name) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            warn!("{} has an invalid value '{}', using default", name, raw);
            default
        }),
        Err(_) => default,
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let storage_backend = match env::var("STORAGE_BACKEND") {
            Ok(raw) => raw.parse().unwrap_or_else(|e: String| {
                warn!("{}, falling back to in-memory storage", e);
                StorageBackend::Memory
            }),
            Err(_) => {
                warn!("STORAGE_BACKEND not set, using in-memory storage");
                StorageBackend::Memory
            }
        };

        let config = Self {
            port: parsed_var("PORT", defaults.port),
            storage_backend,
            supabase_url: string_var("SUPABASE_URL", ""),
            supabase_anon_key: string_var("SUPABASE_ANON_PUBLIC_KEY", ""),
            supabase_service_role_key: env::var("SUPABASE_SERVICE_ROLE_KEY").unwrap_or_default(),
            supabase_jwt_secret: string_var("SUPABASE_JWT_SECRET", ""),
            notification_queue_capacity: parsed_var(
                "NOTIFICATION_QUEUE_CAPACITY",
                defaults.notification_queue_capacity,
            ),
            email_api_url: env::var("EMAIL_API_URL").unwrap_or_default(),
            email_api_key: env::var("EMAIL_API_KEY").unwrap_or_default(),
            mail_from: string_var("MAIL_FROM", &defaults.mail_from),
            public_base_url: string_var("PUBLIC_BASE_URL", &defaults.public_base_url),
            reminder_interval_seconds: parsed_var(
                "REMINDER_INTERVAL_SECONDS",
                defaults.reminder_interval_seconds,
            ),
            auto_complete_interval_seconds: parsed_var(
                "AUTO_COMPLETE_INTERVAL_SECONDS",
                defaults.auto_complete_interval_seconds,
            ),
            seed_demo_data: parsed_var("SEED_DEMO_DATA", false),
        };

        if !config.is_configured() {
            warn!("Application not fully configured - missing environment variables");
        }

        if !config.is_email_configured() {
            warn!("EMAIL_API_URL not set - outgoing emails will only be logged");
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        let auth_ready = !self.supabase_jwt_secret.is_empty();
        match self.storage_backend {
            StorageBackend::Memory => auth_ready,
            StorageBackend::Supabase => {
                auth_ready && !self.supabase_url.is_empty() && !self.supabase_anon_key.is_empty()
            }
        }
    }

    pub fn is_email_configured(&self) -> bool {
        !self.email_api_url.is_empty() && !self.email_api_key.is_empty()
    }
}
