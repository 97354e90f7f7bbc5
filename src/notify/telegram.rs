use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::{debug, warn};

use crate::model::AlertEvent;

use super::AlertDispatcher;

const TELEGRAM_API_URL: &str = "https://api.telegram.org";

/// Posts each alert as a message to one Telegram chat.
pub struct TelegramDispatcher {
    client: reqwest::Client,
    token: String,
    chat_id: String,
}

impl TelegramDispatcher {
    pub fn new(token: String, chat_id: String) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .context("creating Telegram HTTP client")?;
        Ok(Self {
            client,
            token,
            chat_id,
        })
    }

    async fn send(&self, text: &str) {
        let url = format!("{TELEGRAM_API_URL}/bot{}/sendMessage", self.token);
        let result = self
            .client
            .post(&url)
            .form(&[("chat_id", self.chat_id.as_str()), ("text", text)])
            .send()
            .await
            .and_then(|r| r.error_for_status());
        match result {
            Ok(_) => debug!("telegram message delivered"),
            // The token is part of the URL, so log the status only.
            Err(e) => warn!("telegram delivery failed: {:?}", e.status()),
        }
    }
}

#[async_trait]
impl AlertDispatcher for TelegramDispatcher {
    async fn dispatch(&self, alert: &AlertEvent) {
        self.send(&alert.message).await;
    }

    async fn dispatch_error(&self, message: &str) {
        self.send(&format!("❌ {message}")).await;
    }
}
