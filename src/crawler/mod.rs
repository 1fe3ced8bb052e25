//! Crawler module for Wikipedia link-graph traversal
//!
//! This module contains the core crawling logic, including:
//! - MediaWiki API fetching with bounded retries
//! - Request pacing
//! - The breadth-first crawl engine with checkpointing
//! - Overall run orchestration: heartbeat, crawl, export, terminal report

mod engine;
mod fetcher;
mod pacer;
mod retry;

pub use engine::{CrawlEngine, CrawlStats};
pub use fetcher::{
    build_http_client, FetchError, FetchOutcome, Page, PageFetcher, PageSource, WikiApiSource,
};
pub use pacer::Pacer;
pub use retry::{RetryError, RetryPolicy};

use crate::config::Config;
use crate::health::{build_sink, error_chain, HealthReporter, NotificationSink, Outcome};
use crate::output::{finalize_graph, format_summary, write_elements, CrawlSummary, FinalGraph};
use crate::storage::{CheckpointStore, JsonCheckpointFile, JsonlGraphLog};
use crate::{ConfigError, Result, WikiGraphError};
use chrono::Utc;
use std::path::Path;
use std::sync::Arc;
use url::Url;

/// Per-invocation switches that are not part of the config file
#[derive(Debug, Clone, Default)]
pub struct CrawlOptions {
    /// Discard the checkpoint and truncate the graph logs before starting
    pub fresh: bool,

    /// Hash of the config file, carried into the summary
    pub config_hash: String,
}

/// Runs a complete crawl operation
///
/// This is the main entry point for starting a crawl. It will:
/// 1. Start the heartbeat
/// 2. Open the graph logs and checkpoint, resuming if a checkpoint exists
/// 3. Crawl until the frontier is exhausted
/// 4. Consolidate the logs into the element export
/// 5. Send exactly one terminal notification, success or failure
///
/// # Arguments
///
/// * `config` - The crawler configuration
/// * `options` - Per-invocation switches
///
/// # Returns
///
/// * `Ok(CrawlSummary)` - Crawl and export completed
/// * `Err(WikiGraphError)` - Crawl failed; the failure notification has been sent
///
/// # Example
///
/// ```no_run
/// use wikigraph::config::load_config;
/// use wikigraph::crawler::{run_crawl, CrawlOptions};
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new("config.toml"))?;
/// run_crawl(config, CrawlOptions::default()).await?;
/// # Ok(())
/// # }
/// ```
pub async fn run_crawl(config: Config, options: CrawlOptions) -> Result<CrawlSummary> {
    let sink = build_sink(&config.notify.sink, &config.user_agent)?;
    let source = wiki_source(&config)?;
    run_crawl_with(config, options, Box::new(source), sink).await
}

/// Runs a crawl against an explicit page source and notification sink
pub async fn run_crawl_with(
    config: Config,
    options: CrawlOptions,
    source: Box<dyn PageSource>,
    sink: Arc<dyn NotificationSink>,
) -> Result<CrawlSummary> {
    let reporter = HealthReporter::new(sink);
    let heartbeat = reporter.start_heartbeat(config.notify.heartbeat_interval());

    let result = crawl_and_export(&config, &options, source).await;
    heartbeat.stop();

    match result {
        Ok(summary) => {
            reporter
                .report_terminal(
                    Outcome::Success,
                    &format_summary(&summary),
                    Some(Path::new(&config.output.elements)),
                )
                .await;
            Ok(summary)
        }
        Err(e) => {
            reporter
                .report_terminal(Outcome::Failure, &error_chain(&e), None)
                .await;
            Err(e)
        }
    }
}

/// Builds the MediaWiki page source described by the config
pub fn wiki_source(config: &Config) -> Result<WikiApiSource> {
    let client = build_http_client(&config.user_agent, config.resilience.request_timeout())?;
    let api_url = parse_config_url(&config.wiki.api_url)?;
    Ok(WikiApiSource::new(client, api_url))
}

/// Consolidates the existing graph logs into the element export without crawling
///
/// The logs are only read, never repaired, so this can run beside a live crawl.
///
/// # Returns
///
/// * `Ok(FinalGraph)` - The graph that was written
/// * `Err(WikiGraphError)` - A log could not be read or the export could not be written
pub fn export_graph(config: &Config) -> Result<FinalGraph> {
    let mut log = JsonlGraphLog::open_read_only(
        Path::new(&config.output.node_log),
        Path::new(&config.output.edge_log),
    );
    export_from(&mut log, config)
}

fn export_from(log: &mut dyn crate::storage::GraphLog, config: &Config) -> Result<FinalGraph> {
    let article_base = parse_config_url(&config.wiki.article_base_url)?;
    let graph = finalize_graph(log, &article_base)?;
    write_elements(&graph, Path::new(&config.output.elements))?;

    tracing::info!(
        "Wrote {} nodes and {} edges to {} (max in-degree {})",
        graph.nodes.len(),
        graph.edges.len(),
        config.output.elements,
        graph.max_in_degree()
    );
    Ok(graph)
}

async fn crawl_and_export(
    config: &Config,
    options: &CrawlOptions,
    source: Box<dyn PageSource>,
) -> Result<CrawlSummary> {
    let started_at = Utc::now();

    let mut log = JsonlGraphLog::open(
        Path::new(&config.output.node_log),
        Path::new(&config.output.edge_log),
    )?;
    let mut checkpoints = JsonCheckpointFile::new(&config.output.checkpoint);

    if options.fresh {
        tracing::info!("Fresh start: clearing checkpoint and graph logs");
        checkpoints
            .clear()
            .map_err(|source| WikiGraphError::Checkpoint {
                path: checkpoints.location(),
                source,
            })?;
        log.truncate()?;
    }

    let fetcher = PageFetcher::new(
        source,
        RetryPolicy::from(&config.resilience),
        Pacer::new(config.resilience.polite_delay()),
    );
    let mut engine = CrawlEngine::new(
        config.crawler.clone(),
        fetcher,
        Box::new(log),
        Box::new(checkpoints),
    )?;

    let stats = engine.run().await?;

    let mut log = engine.into_log();
    let graph = export_from(log.as_mut(), config)?;

    Ok(CrawlSummary::new(
        started_at,
        Utc::now(),
        options.config_hash.clone(),
        stats,
        &graph,
    ))
}

fn parse_config_url(raw: &str) -> Result<Url> {
    Url::parse(raw).map_err(|e| WikiGraphError::Config(ConfigError::InvalidUrl(format!("{}: {}", raw, e))))
}
