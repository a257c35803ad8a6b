use std::sync::Arc;

use shared_config::AppConfig;
use shared_database::BookingStore;
use shared_utils::clock::Clock;
use notification_cell::NotificationDispatcher;

#[derive(Clone)]
pub struct ScheduleState {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn BookingStore>,
    pub clock: Arc<dyn Clock>,
    pub notifier: NotificationDispatcher,
}
