//! Outbound notification channels.

use async_trait::async_trait;
use serde::Serialize;
use shared::MessageSummary;
use std::sync::Arc;

use crate::config::PollingConfig;
use crate::error::NotifyError;

pub const TEST_MESSAGE: &str = "Test notification - Working perfectly!";

/// Best-effort delivery of new-mail alerts. Callers log failures and move on.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn notify(&self, message: &MessageSummary) -> Result<(), NotifyError>;

    /// Push a fixed test message through the channel
    async fn send_test(&self) -> Result<(), NotifyError>;
}

/// Pick the sink described by the configuration
pub fn from_config(config: &PollingConfig) -> Arc<dyn NotificationSink> {
    match config.telegram() {
        Some((bot_token, chat_id)) => {
            tracing::info!("Notifications go to Telegram chat {}", chat_id);
            Arc::new(TelegramNotifier::new(
                &config.telegram_api_base,
                bot_token,
                chat_id,
            ))
        }
        None => {
            tracing::warn!("Telegram is not configured; new mail will only be logged");
            Arc::new(LogNotifier)
        }
    }
}

#[derive(Debug, Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
}

/// Sends messages through the Telegram Bot API
pub struct TelegramNotifier {
    client: reqwest::Client,
    api_base: String,
    bot_token: String,
    chat_id: String,
}

impl TelegramNotifier {
    pub fn new(api_base: &str, bot_token: &str, chat_id: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_base: api_base.trim_end_matches('/').to_string(),
            bot_token: bot_token.to_string(),
            chat_id: chat_id.to_string(),
        }
    }

    fn send_message_url(&self) -> String {
        format!("{}/bot{}/sendMessage", self.api_base, self.bot_token)
    }

    async fn send_text(&self, text: &str) -> Result<(), NotifyError> {
        let response = self
            .client
            .post(self.send_message_url())
            .json(&SendMessage {
                chat_id: &self.chat_id,
                text,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NotifyError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(())
    }
}

#[async_trait]
impl NotificationSink for TelegramNotifier {
    async fn notify(&self, message: &MessageSummary) -> Result<(), NotifyError> {
        self.send_text(&message.notification_text()).await
    }

    async fn send_test(&self) -> Result<(), NotifyError> {
        self.send_text(TEST_MESSAGE).await
    }
}

/// Writes notifications to the log only
pub struct LogNotifier;

#[async_trait]
impl NotificationSink for LogNotifier {
    async fn notify(&self, message: &MessageSummary) -> Result<(), NotifyError> {
        tracing::info!(
            id = %message.id,
            from = %message.sender_name(),
            "NEW: {}",
            message.subject
        );
        Ok(())
    }

    async fn send_test(&self) -> Result<(), NotifyError> {
        tracing::info!("{}", TEST_MESSAGE);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::assert_ok;

    #[test]
    fn test_send_message_url() {
        let notifier = TelegramNotifier::new("https://api.telegram.org/", "123:abc", "42");
        assert_eq!(
            notifier.send_message_url(),
            "https://api.telegram.org/bot123:abc/sendMessage"
        );
    }

    #[test]
    fn test_send_message_body() {
        let body = serde_json::to_value(SendMessage {
            chat_id: "42",
            text: "Jane\nLunch?",
        })
        .expect("should serialize");
        assert_eq!(body, serde_json::json!({ "chat_id": "42", "text": "Jane\nLunch?" }));
    }

    #[tokio::test]
    async fn test_log_notifier_never_fails() {
        let message = MessageSummary {
            id: "m1".to_string(),
            from: "Jane <jane@example.com>".to_string(),
            subject: "Lunch?".to_string(),
            snippet: String::new(),
            date: String::new(),
            thread_id: "t1".to_string(),
        };
        assert_ok!(LogNotifier.notify(&message).await);
        assert_ok!(LogNotifier.send_test().await);
    }

    #[tokio::test]
    async fn test_unreachable_telegram_is_an_error() {
        // Port 9 (discard) on localhost is not expected to be listening
        let notifier = TelegramNotifier::new("http://127.0.0.1:9", "123:abc", "42");
        assert!(notifier.send_test().await.is_err());
    }

    #[tokio::test]
    async fn test_http_error_does_not_leak_bot_token() {
        let notifier = TelegramNotifier::new("http://127.0.0.1:9", "123:SECRET", "42");
        let err = notifier.send_test().await.expect_err("should fail");

        assert!(matches!(err, NotifyError::Http(_)));
        assert!(!err.to_string().contains("SECRET"));
        assert!(!format!("{:?}", err).contains("SECRET"));
    }
}
