use std::sync::Arc;

use notification_cell::NotificationDispatcher;
use shared_config::AppConfig;
use shared_database::BookingStore;
use shared_utils::clock::Clock;

#[derive(Clone)]
pub struct BookingState {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn BookingStore>,
    pub clock: Arc<dyn Clock>,
    pub notifier: NotificationDispatcher,
}
