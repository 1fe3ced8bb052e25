use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for WikiGraph
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub crawler: CrawlerConfig,
    pub resilience: ResilienceConfig,
    #[serde(default)]
    pub wiki: WikiConfig,
    #[serde(rename = "user-agent", default)]
    pub user_agent: UserAgentConfig,
    pub output: OutputConfig,
    #[serde(default)]
    pub notify: NotifyConfig,
}

/// Crawl traversal configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Ordered list of starting article titles
    pub seeds: Vec<String>,

    /// Hop limit; items are only enqueued while `depth + 1 < max_depth`
    #[serde(rename = "max-depth")]
    pub max_depth: u32,

    /// Number of dequeued items between frontier checkpoints
    #[serde(rename = "checkpoint-every")]
    pub checkpoint_every: u32,
}

/// Network resilience settings
#[derive(Debug, Clone, Deserialize)]
pub struct ResilienceConfig {
    /// Per-request timeout (milliseconds)
    #[serde(rename = "request-timeout")]
    pub request_timeout: u64,

    /// Total fetch attempts per title before it is skipped
    #[serde(rename = "retry-attempts")]
    pub retry_attempts: u32,

    /// Delay between attempts after a transient failure (milliseconds)
    #[serde(rename = "retry-delay")]
    pub retry_delay: u64,

    /// Minimum spacing between consecutive requests (milliseconds)
    #[serde(rename = "polite-delay")]
    pub polite_delay: u64,
}

impl ResilienceConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay)
    }

    pub fn polite_delay(&self) -> Duration {
        Duration::from_millis(self.polite_delay)
    }
}

/// Upstream wiki endpoints
#[derive(Debug, Clone, Deserialize)]
pub struct WikiConfig {
    /// MediaWiki Action API endpoint
    #[serde(rename = "api-url", default = "default_api_url")]
    pub api_url: String,

    /// Prefix for canonical article URLs in the export
    #[serde(rename = "article-base-url", default = "default_article_base_url")]
    pub article_base_url: String,
}

impl Default for WikiConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            article_base_url: default_article_base_url(),
        }
    }
}

fn default_api_url() -> String {
    "https://en.wikipedia.org/w/api.php".to_string()
}

fn default_article_base_url() -> String {
    "https://en.wikipedia.org/wiki/".to_string()
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

impl UserAgentConfig {
    /// Formats the user agent header: `Name/Version (+ContactURL; ContactEmail)`
    pub fn header_value(&self) -> String {
        format!(
            "{}/{} (+{}; {})",
            self.crawler_name, self.crawler_version, self.contact_url, self.contact_email
        )
    }
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: "WikiGraphExplorer".to_string(),
            crawler_version: env!("CARGO_PKG_VERSION").to_string(),
            contact_url: "https://github.com/wikigraph/wikigraph".to_string(),
            contact_email: "wikigraph@example.com".to_string(),
        }
    }
}

/// Output file locations
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Append-only node log (JSON lines)
    #[serde(rename = "node-log")]
    pub node_log: String,

    /// Append-only edge log (JSON lines)
    #[serde(rename = "edge-log")]
    pub edge_log: String,

    /// Frontier checkpoint file, replaced on every save
    pub checkpoint: String,

    /// Finalized node/edge export
    pub elements: String,
}

/// Health notification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct NotifyConfig {
    /// Seconds between heartbeat notifications
    #[serde(rename = "heartbeat-interval", default = "default_heartbeat_interval")]
    pub heartbeat_interval: u64,

    #[serde(default)]
    pub sink: SinkConfig,
}

impl NotifyConfig {
    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_secs(self.heartbeat_interval)
    }
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            heartbeat_interval: default_heartbeat_interval(),
            sink: SinkConfig::default(),
        }
    }
}

fn default_heartbeat_interval() -> u64 {
    600
}

/// Where notifications are delivered
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum SinkConfig {
    /// Write notifications to the tracing log
    #[default]
    Log,

    /// POST notifications as JSON to a URL
    Webhook { url: String },

    /// Send notifications as email through the SendGrid v3 API
    Sendgrid {
        #[serde(rename = "api-key")]
        api_key: String,
        from: String,
        to: String,
        #[serde(rename = "api-url", default = "default_sendgrid_url")]
        api_url: String,
    },
}

fn default_sendgrid_url() -> String {
    "https://api.sendgrid.com/v3/mail/send".to_string()
}
