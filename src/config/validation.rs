use crate::config::types::{
    Config, CrawlerConfig, NotifyConfig, OutputConfig, ResilienceConfig, SinkConfig,
    UserAgentConfig, WikiConfig,
};
use crate::title::is_namespaced;
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_resilience_config(&config.resilience)?;
    validate_wiki_config(&config.wiki)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_output_config(&config.output)?;
    validate_notify_config(&config.notify)?;
    Ok(())
}

/// Validates crawl traversal configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    // max_depth >= 0 is always true for u32; a limit of 0 crawls nothing

    if config.seeds.is_empty() {
        return Err(ConfigError::Validation(
            "seeds must contain at least one title".to_string(),
        ));
    }

    for seed in &config.seeds {
        if seed.trim().is_empty() {
            return Err(ConfigError::Validation(
                "seed titles cannot be blank".to_string(),
            ));
        }
        if is_namespaced(seed) {
            tracing::warn!(
                "Seed '{}' is a namespaced title; it will be crawled but never linked to",
                seed
            );
        }
    }

    if config.checkpoint_every < 1 {
        return Err(ConfigError::Validation(format!(
            "checkpoint_every must be >= 1, got {}",
            config.checkpoint_every
        )));
    }

    Ok(())
}

/// Validates network resilience settings
fn validate_resilience_config(config: &ResilienceConfig) -> Result<(), ConfigError> {
    if config.request_timeout < 1 {
        return Err(ConfigError::Validation(format!(
            "request_timeout must be >= 1ms, got {}ms",
            config.request_timeout
        )));
    }

    if config.retry_attempts < 1 {
        return Err(ConfigError::Validation(format!(
            "retry_attempts must be >= 1, got {}",
            config.retry_attempts
        )));
    }

    Ok(())
}

/// Validates upstream wiki endpoints
fn validate_wiki_config(config: &WikiConfig) -> Result<(), ConfigError> {
    validate_http_url("api_url", &config.api_url)?;

    let base = validate_http_url("article_base_url", &config.article_base_url)?;
    if base.cannot_be_a_base() {
        return Err(ConfigError::InvalidUrl(format!(
            "article_base_url cannot be used as a base: {}",
            config.article_base_url
        )));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    // Validate crawler name: non-empty, alphanumeric + hyphens only
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler_name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    Url::parse(&config.contact_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;

    validate_email(&config.contact_email)?;

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    let paths = [
        ("node_log", &config.node_log),
        ("edge_log", &config.edge_log),
        ("checkpoint", &config.checkpoint),
        ("elements", &config.elements),
    ];

    for (name, path) in paths {
        if path.is_empty() {
            return Err(ConfigError::Validation(format!("{} cannot be empty", name)));
        }
    }

    if config.node_log == config.edge_log {
        return Err(ConfigError::Validation(
            "node_log and edge_log must be different files".to_string(),
        ));
    }

    Ok(())
}

/// Validates notification configuration
fn validate_notify_config(config: &NotifyConfig) -> Result<(), ConfigError> {
    if config.heartbeat_interval < 1 {
        return Err(ConfigError::Validation(format!(
            "heartbeat_interval must be >= 1s, got {}s",
            config.heartbeat_interval
        )));
    }

    match &config.sink {
        SinkConfig::Log => {}
        SinkConfig::Webhook { url } => {
            validate_http_url("webhook url", url)?;
        }
        SinkConfig::Sendgrid {
            api_key,
            from,
            to,
            api_url,
        } => {
            if api_key.is_empty() {
                return Err(ConfigError::Validation(
                    "sendgrid api-key cannot be empty".to_string(),
                ));
            }
            validate_email(from)?;
            validate_email(to)?;
            validate_http_url("sendgrid api-url", api_url)?;
        }
    }

    Ok(())
}

/// Parses a URL and requires an http(s) scheme
fn validate_http_url(name: &str, value: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(value)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid {} '{}': {}", name, value, e)))?;

    if url.scheme() != "https" && url.scheme() != "http" {
        return Err(ConfigError::InvalidUrl(format!(
            "{} '{}' must use http or https",
            name, value
        )));
    }

    Ok(url)
}

/// Basic email validation
fn validate_email(email: &str) -> Result<(), ConfigError> {
    if email.is_empty() {
        return Err(ConfigError::Validation("email cannot be empty".to_string()));
    }

    // Must contain exactly one @ with text on both sides
    let parts: Vec<&str> = email.split('@').collect();
    if parts.len() != 2 {
        return Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            email
        )));
    }

    let local = parts[0];
    let domain = parts[1];

    if local.is_empty() || domain.is_empty() {
        return Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            email
        )));
    }

    if !domain.contains('.') {
        return Err(ConfigError::Validation(format!(
            "Invalid email domain: '{}'",
            email
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_config() -> Config {
        Config {
            crawler: CrawlerConfig {
                seeds: vec!["Science".to_string()],
                max_depth: 2,
                checkpoint_every: 50,
            },
            resilience: ResilienceConfig {
                request_timeout: 60_000,
                retry_attempts: 10,
                retry_delay: 10_000,
                polite_delay: 1_000,
            },
            wiki: WikiConfig::default(),
            user_agent: UserAgentConfig::default(),
            output: OutputConfig {
                node_log: "nodes.jsonl".to_string(),
                edge_log: "edges.jsonl".to_string(),
                checkpoint: "checkpoint.json".to_string(),
                elements: "elements.json".to_string(),
            },
            notify: NotifyConfig::default(),
        }
    }

    #[test]
    fn test_valid_config() {
        assert!(validate(&create_test_config()).is_ok());
    }

    #[test]
    fn test_empty_seeds_rejected() {
        let mut config = create_test_config();
        config.crawler.seeds.clear();
        assert!(matches!(validate(&config), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_blank_seed_rejected() {
        let mut config = create_test_config();
        config.crawler.seeds.push("  ".to_string());
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_zero_depth_allowed() {
        let mut config = create_test_config();
        config.crawler.max_depth = 0;
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_zero_checkpoint_interval_rejected() {
        let mut config = create_test_config();
        config.crawler.checkpoint_every = 0;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_zero_retry_attempts_rejected() {
        let mut config = create_test_config();
        config.resilience.retry_attempts = 0;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_zero_delays_allowed() {
        let mut config = create_test_config();
        config.resilience.retry_delay = 0;
        config.resilience.polite_delay = 0;
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_invalid_api_url_rejected() {
        let mut config = create_test_config();
        config.wiki.api_url = "not a url".to_string();
        assert!(matches!(validate(&config), Err(ConfigError::InvalidUrl(_))));

        config.wiki.api_url = "ftp://en.wikipedia.org/w/api.php".to_string();
        assert!(matches!(validate(&config), Err(ConfigError::InvalidUrl(_))));
    }

    #[test]
    fn test_crawler_name_rules() {
        let mut config = create_test_config();
        config.user_agent.crawler_name = "Wiki Graph".to_string();
        assert!(validate(&config).is_err());

        config.user_agent.crawler_name = "Wiki-Graph2".to_string();
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_same_log_paths_rejected() {
        let mut config = create_test_config();
        config.output.edge_log = config.output.node_log.clone();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_zero_heartbeat_rejected() {
        let mut config = create_test_config();
        config.notify.heartbeat_interval = 0;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_sendgrid_requires_key_and_emails() {
        let mut config = create_test_config();
        config.notify.sink = SinkConfig::Sendgrid {
            api_key: String::new(),
            from: "crawler@example.com".to_string(),
            to: "ops@example.com".to_string(),
            api_url: "https://api.sendgrid.com/v3/mail/send".to_string(),
        };
        assert!(validate(&config).is_err());

        config.notify.sink = SinkConfig::Sendgrid {
            api_key: "SG.key".to_string(),
            from: "crawler".to_string(),
            to: "ops@example.com".to_string(),
            api_url: "https://api.sendgrid.com/v3/mail/send".to_string(),
        };
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("user@example.com").is_ok());
        assert!(validate_email("admin@sub.example.com").is_ok());

        assert!(validate_email("").is_err());
        assert!(validate_email("invalid").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("user@").is_err());
        assert!(validate_email("user@domain").is_err());
    }
}
