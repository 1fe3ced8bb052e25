//! Webhook notification sink
//!
//! Posts each notification as a JSON document. Attachments travel inline,
//! base64-encoded.

use crate::health::sink::{EncodedAttachment, Notification, NotificationSink, NotifyError};
use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde::Serialize;
use url::Url;

#[derive(Debug, Serialize)]
struct WebhookPayload<'a> {
    subject: &'a str,
    body: &'a str,
    sent_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    attachment: Option<EncodedAttachment>,
}

/// Sink that POSTs JSON to a fixed URL
pub struct WebhookSink {
    client: Client,
    url: Url,
}

impl WebhookSink {
    pub fn new(client: Client, url: Url) -> Self {
        Self { client, url }
    }
}

#[async_trait]
impl NotificationSink for WebhookSink {
    async fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
        let attachment = match &notification.attachment {
            Some(path) => Some(EncodedAttachment::read(path).await?),
            None => None,
        };

        let payload = WebhookPayload {
            subject: &notification.subject,
            body: &notification.body,
            sent_at: Utc::now().to_rfc3339(),
            attachment,
        };

        let response = self
            .client
            .post(self.url.clone())
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(NotifyError::Rejected {
                service: "webhook",
                status,
                body,
            });
        }

        tracing::debug!("Webhook notification '{}' delivered", notification.subject);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "webhook"
    }
}
