use thiserror::Error;

#[derive(Error, Debug)]
pub enum NotificationError {
    #[error("Notification queue is full")]
    QueueFull,

    #[error("Notification queue is closed")]
    QueueClosed,

    #[error("Email delivery failed: {0}")]
    Delivery(String),

    #[error("Email provider request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Worker timeout: delivery took longer than {timeout_seconds} seconds")]
    WorkerTimeout { timeout_seconds: u64 },
}
