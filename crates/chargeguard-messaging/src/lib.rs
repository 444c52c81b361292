//! Outbound message delivery
//!
//! Sends the configured alert text through the WhatsApp Cloud API when the
//! target level is reached. Delivery is fire-and-forget from the monitoring
//! engine's perspective: the daemon spawns the send and only logs the
//! outcome. A failed or late delivery never touches alarm state, and nothing
//! is retried.

use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MessagingError {
    #[error("outbound messaging is not configured")]
    NotConfigured,

    #[error("message API returned {status}: {body}")]
    ApiRejected { status: u16, body: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Cloud API text message payload.
#[derive(Debug, Serialize, PartialEq, Eq)]
struct TextMessage<'a> {
    messaging_product: &'static str,
    to: &'a str,
    #[serde(rename = "type")]
    kind: &'static str,
    text: TextBody<'a>,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct TextBody<'a> {
    body: &'a str,
}

impl<'a> TextMessage<'a> {
    fn new(to: &'a str, body: &'a str) -> Self {
        Self {
            messaging_product: "whatsapp",
            to,
            kind: "text",
            text: TextBody { body },
        }
    }
}

/// Sends text messages through the WhatsApp Cloud API.
pub struct MessageSender {
    api_url: String,
    phone_number_id: String,
    access_token: String,
    client: reqwest::Client,
}

impl MessageSender {
    /// Create a sender; `api_url` is the Cloud API base
    /// (e.g. `https://graph.facebook.com/v19.0`).
    pub fn new(api_url: String, phone_number_id: String, access_token: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .user_agent(format!("chargeguard/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            api_url,
            phone_number_id,
            access_token,
            client,
        }
    }

    /// Whether credentials are present. The daemon skips dispatch entirely
    /// when they are not, so a half-configured setup degrades to a log line.
    pub fn is_configured(&self) -> bool {
        !self.phone_number_id.is_empty() && !self.access_token.is_empty()
    }

    /// Send `body` to the phone number `to`. At-most-once: no retries.
    pub async fn send(&self, to: &str, body: &str) -> Result<(), MessagingError> {
        if !self.is_configured() {
            return Err(MessagingError::NotConfigured);
        }

        let url = format!("{}/{}/messages", self.api_url, self.phone_number_id);
        tracing::debug!(to, "sending outbound message");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.access_token)
            .json(&TextMessage::new(to, body))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MessagingError::ApiRejected {
                status: status.as_u16(),
                body,
            });
        }

        tracing::info!(to, "outbound message delivered");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_shape() {
        let msg = TextMessage::new("15551234567", "Battery charged to 80%!");
        let json = serde_json::to_value(&msg).unwrap();

        assert_eq!(json["messaging_product"], "whatsapp");
        assert_eq!(json["to"], "15551234567");
        assert_eq!(json["type"], "text");
        assert_eq!(json["text"]["body"], "Battery charged to 80%!");
    }

    #[test]
    fn test_unconfigured_sender() {
        let sender = MessageSender::new(
            "https://graph.facebook.com/v19.0".to_string(),
            String::new(),
            String::new(),
        );
        assert!(!sender.is_configured());
    }

    #[tokio::test]
    async fn test_send_without_credentials_fails_fast() {
        let sender = MessageSender::new(
            "https://graph.facebook.com/v19.0".to_string(),
            String::new(),
            "token".to_string(),
        );
        let result = sender.send("15551234567", "hi").await;
        assert!(matches!(result, Err(MessagingError::NotConfigured)));
    }
}
