//! Notification sinks
//!
//! A sink delivers a [`Notification`] somewhere a human will see it. Delivery is
//! best-effort: callers log failures and carry on.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised while delivering a notification
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Failed to read attachment {path}: {source}")]
    Attachment {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{service} rejected notification with status {status}: {body}")]
    Rejected {
        service: &'static str,
        status: u16,
        body: String,
    },

    #[error("Invalid sink configuration: {0}")]
    Config(String),
}

/// One message for the operator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub subject: String,
    pub body: String,

    /// File to attach, if the sink supports attachments
    pub attachment: Option<PathBuf>,
}

impl Notification {
    pub fn new(subject: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            body: body.into(),
            attachment: None,
        }
    }

    pub fn with_attachment(mut self, path: impl Into<PathBuf>) -> Self {
        self.attachment = Some(path.into());
        self
    }
}

/// Delivery channel for operator notifications
#[async_trait]
pub trait NotificationSink: Send + Sync {
    /// Delivers one notification
    async fn send(&self, notification: &Notification) -> Result<(), NotifyError>;

    /// Short name for log lines
    fn name(&self) -> &'static str;
}

/// A file attachment, base64-encoded for JSON transport
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EncodedAttachment {
    pub filename: String,
    pub content_type: &'static str,
    pub content: String,
}

impl EncodedAttachment {
    /// Reads and encodes the file at `path`
    pub async fn read(path: &Path) -> Result<Self, NotifyError> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|source| NotifyError::Attachment {
                path: path.to_path_buf(),
                source,
            })?;

        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "attachment".to_string());

        let content_type = match path.extension().and_then(|e| e.to_str()) {
            Some("json") => "application/json",
            Some("jsonl") => "application/x-ndjson",
            _ => "application/octet-stream",
        };

        Ok(Self {
            filename,
            content_type,
            content: STANDARD.encode(bytes),
        })
    }
}

/// Writes notifications to the tracing log
#[derive(Debug, Default)]
pub struct LogSink;

#[async_trait]
impl NotificationSink for LogSink {
    async fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
        tracing::info!("{}: {}", notification.subject, notification.body);
        if let Some(path) = &notification.attachment {
            tracing::info!("Attachment: {}", path.display());
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "log"
    }
}
