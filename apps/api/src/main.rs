use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use dotenv::dotenv;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::{self, TraceLayer};
use tracing::{info, warn, Level};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod router;
mod seed;

use appointment_cell::{AutoCompleteJob, BookingState, ReminderJob};
use notification_cell::{email_sender_from_config, NotificationDispatcher, NotificationWorker, WorkerConfig};
use schedule_cell::ScheduleState;
use shared_config::{AppConfig, StorageBackend};
use shared_database::{BookingStore, InMemoryStore, SupabaseStore};
use shared_utils::clock::{Clock, SystemClock};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Loading Env Vars
    dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting SlotBook API server");

    // Load configuration
    let config = Arc::new(AppConfig::from_env());

    let store: Arc<dyn BookingStore> = match config.storage_backend {
        StorageBackend::Memory => {
            let store = Arc::new(InMemoryStore::new());
            if config.seed_demo_data {
                seed::seed_demo_business(&store)
                    .await
                    .context("seeding demo data")?;
            }
            info!("Using in-memory storage");
            store as Arc<dyn BookingStore>
        }
        StorageBackend::Supabase => {
            if !config.is_configured() {
                warn!("Supabase backend selected but SUPABASE_URL or keys are missing");
            }
            info!("Using Supabase storage at {}", config.supabase_url);
            Arc::new(SupabaseStore::new(&config))
        }
    };

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    // Notification queue and its worker
    let (notifier, receiver) = NotificationDispatcher::channel(config.notification_queue_capacity);
    let worker_config = WorkerConfig {
        public_base_url: config.public_base_url.clone(),
        mail_from: config.mail_from.clone(),
        ..WorkerConfig::default()
    };
    NotificationWorker::new(worker_config, email_sender_from_config(&config)).spawn(receiver);

    let schedule_state = ScheduleState {
        config: config.clone(),
        store: store.clone(),
        clock: clock.clone(),
        notifier: notifier.clone(),
    };
    let booking_state = BookingState {
        config: config.clone(),
        store,
        clock,
        notifier,
    };

    // Background jobs
    ReminderJob::new(&booking_state).spawn(config.reminder_interval_seconds);
    AutoCompleteJob::new(&booking_state).spawn(config.auto_complete_interval_seconds);

    // Set up CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Build the application router
    let app = router::create_router(schedule_state, booking_state)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(trace::DefaultMakeSpan::new().level(Level::INFO))
                .on_response(trace::DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors);

    // Run the server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!("Listening on {}", addr);

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {}", addr))?;
    axum::serve(listener, app).await.context("serving HTTP")?;

    Ok(())
}
