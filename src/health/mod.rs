//! Health reporting for long-running crawls
//!
//! This module handles:
//! - Periodic heartbeat notifications while a crawl is in progress
//! - A single success or failure notification when the crawl ends
//! - Delivery through a configured sink (log, webhook, or SendGrid email)

mod reporter;
mod sendgrid;
mod sink;
mod webhook;

pub use reporter::{error_chain, HealthReporter, HeartbeatHandle, Outcome, HEARTBEAT_SUBJECT};
pub use sendgrid::SendGridSink;
pub use sink::{EncodedAttachment, LogSink, Notification, NotificationSink, NotifyError};
pub use webhook::WebhookSink;

use crate::config::{SinkConfig, UserAgentConfig};
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Timeout for a single notification request
const NOTIFY_TIMEOUT: Duration = Duration::from_secs(30);

/// Builds the sink described by the config
///
/// # Arguments
///
/// * `config` - The configured sink
/// * `user_agent` - Identifies outbound notification requests
///
/// # Returns
///
/// * `Ok(Arc<dyn NotificationSink>)` - Ready-to-use sink
/// * `Err(NotifyError)` - Invalid URL or HTTP client failure
pub fn build_sink(
    config: &SinkConfig,
    user_agent: &UserAgentConfig,
) -> Result<Arc<dyn NotificationSink>, NotifyError> {
    let sink: Arc<dyn NotificationSink> = match config {
        SinkConfig::Log => Arc::new(LogSink),
        SinkConfig::Webhook { url } => {
            Arc::new(WebhookSink::new(notify_client(user_agent)?, parse_url(url)?))
        }
        SinkConfig::Sendgrid {
            api_key,
            from,
            to,
            api_url,
        } => Arc::new(SendGridSink::new(
            notify_client(user_agent)?,
            parse_url(api_url)?,
            api_key.clone(),
            from.clone(),
            to.clone(),
        )),
    };

    tracing::debug!("Notification sink: {}", sink.name());
    Ok(sink)
}

fn notify_client(user_agent: &UserAgentConfig) -> Result<Client, NotifyError> {
    Ok(Client::builder()
        .user_agent(user_agent.header_value())
        .timeout(NOTIFY_TIMEOUT)
        .build()?)
}

fn parse_url(raw: &str) -> Result<Url, NotifyError> {
    Url::parse(raw).map_err(|e| NotifyError::Config(format!("{}: {}", raw, e)))
}
