use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use tracing::{debug, info};

use shared_config::AppConfig;

use crate::{EmailMessage, NotificationError};

#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send(&self, message: &EmailMessage) -> Result<(), NotificationError>;
}

/// Posts messages to an HTTP email API (`{from, to, subject, text}` with a bearer key).
pub struct HttpEmailSender {
    client: Client,
    api_url: String,
    api_key: String,
}

impl HttpEmailSender {
    pub fn new(api_url: &str, api_key: &str) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            api_url: api_url.to_string(),
            api_key: api_key.to_string(),
        }
    }
}

#[async_trait]
impl EmailSender for HttpEmailSender {
    async fn send(&self, message: &EmailMessage) -> Result<(), NotificationError> {
        debug!("Sending email '{}' to {}", message.subject, message.to);

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&json!({
                "from": message.from,
                "to": message.to,
                "subject": message.subject,
                "text": message.text,
            }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NotificationError::Delivery(format!("{}: {}", status, body)));
        }

        Ok(())
    }
}

/// Writes messages to the log instead of sending them.
#[derive(Default)]
pub struct LogEmailSender;

#[async_trait]
impl EmailSender for LogEmailSender {
    async fn send(&self, message: &EmailMessage) -> Result<(), NotificationError> {
        info!(to = %message.to, subject = %message.subject, "Email (not sent, no provider configured)");
        Ok(())
    }
}

pub fn email_sender_from_config(config: &AppConfig) -> Arc<dyn EmailSender> {
    if config.is_email_configured() {
        Arc::new(HttpEmailSender::new(&config.email_api_url, &config.email_api_key))
    } else {
        Arc::new(LogEmailSender)
    }
}
