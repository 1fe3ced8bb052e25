//! SendGrid email notification sink
//!
//! Sends plain-text email through the SendGrid v3 mail API, with the optional
//! attachment base64-encoded as the API requires.

use crate::health::sink::{EncodedAttachment, Notification, NotificationSink, NotifyError};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use url::Url;

#[derive(Debug, Serialize)]
struct MailRequest<'a> {
    personalizations: Vec<Personalization<'a>>,
    from: Address<'a>,
    subject: &'a str,
    content: Vec<Content<'a>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    attachments: Vec<MailAttachment>,
}

#[derive(Debug, Serialize)]
struct Personalization<'a> {
    to: Vec<Address<'a>>,
}

#[derive(Debug, Serialize)]
struct Address<'a> {
    email: &'a str,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    #[serde(rename = "type")]
    content_type: &'static str,
    value: &'a str,
}

#[derive(Debug, Serialize)]
struct MailAttachment {
    content: String,
    filename: String,
    #[serde(rename = "type")]
    content_type: &'static str,
    disposition: &'static str,
}

impl From<EncodedAttachment> for MailAttachment {
    fn from(attachment: EncodedAttachment) -> Self {
        Self {
            content: attachment.content,
            filename: attachment.filename,
            content_type: attachment.content_type,
            disposition: "attachment",
        }
    }
}

/// Sink that emails notifications through SendGrid
pub struct SendGridSink {
    client: Client,
    api_url: Url,
    api_key: String,
    from: String,
    to: String,
}

impl SendGridSink {
    pub fn new(client: Client, api_url: Url, api_key: String, from: String, to: String) -> Self {
        Self {
            client,
            api_url,
            api_key,
            from,
            to,
        }
    }
}

#[async_trait]
impl NotificationSink for SendGridSink {
    async fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
        let attachments = match &notification.attachment {
            Some(path) => vec![EncodedAttachment::read(path).await?.into()],
            None => Vec::new(),
        };

        let request = MailRequest {
            personalizations: vec![Personalization {
                to: vec![Address { email: &self.to }],
            }],
            from: Address { email: &self.from },
            subject: &notification.subject,
            content: vec![Content {
                content_type: "text/plain",
                value: &notification.body,
            }],
            attachments,
        };

        tracing::info!("Sending email notification to: {}", self.to);

        let response = self
            .client
            .post(self.api_url.clone())
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            tracing::error!("SendGrid send failed {}: {}", status, body);
            return Err(NotifyError::Rejected {
                service: "sendgrid",
                status,
                body,
            });
        }

        Ok(())
    }

    fn name(&self) -> &'static str {
        "sendgrid"
    }
}
