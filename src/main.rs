//! WikiGraph main entry point
//!
//! This is the command-line interface for the WikiGraph link-graph crawler.

use anyhow::Context;
use clap::Parser;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use wikigraph::config::{load_config_with_hash, Config};
use wikigraph::crawler::{export_graph, run_crawl, CrawlOptions};
use wikigraph::output::{load_statistics, print_statistics};
use wikigraph::storage::{JsonCheckpointFile, JsonlGraphLog};
use wikigraph::title::is_namespaced;

/// WikiGraph: a resumable Wikipedia link-graph crawler
///
/// WikiGraph walks Wikipedia's article links breadth-first from a set of seed
/// articles, logging every node and edge it finds. Interrupted crawls resume from the
/// last checkpoint; finished crawls are exported as a sized node/edge graph.
#[derive(Parser, Debug)]
#[command(name = "wikigraph")]
#[command(version)]
#[command(about = "A resumable Wikipedia link-graph crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Discard the checkpoint and graph logs and start from the seeds
    #[arg(long, conflicts_with_all = ["dry_run", "stats", "finalize_only"])]
    fresh: bool,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long, conflicts_with_all = ["stats", "finalize_only"])]
    dry_run: bool,

    /// Show statistics from the graph logs and checkpoint and exit
    #[arg(long, conflicts_with_all = ["dry_run", "finalize_only"])]
    stats: bool,

    /// Rebuild the element export from the existing logs and exit
    #[arg(long, conflicts_with_all = ["dry_run", "stats"])]
    finalize_only: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration from {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if cli.dry_run {
        handle_dry_run(&config);
    } else if cli.stats {
        handle_stats(&config)?;
    } else if cli.finalize_only {
        handle_finalize_only(&config)?;
    } else {
        handle_crawl(config, cli.fresh, config_hash).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("wikigraph=info,warn"),
            1 => EnvFilter::new("wikigraph=debug,info"),
            2 => EnvFilter::new("wikigraph=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: validates config and shows what would be crawled
fn handle_dry_run(config: &Config) {
    println!("=== WikiGraph Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Max depth: {}", config.crawler.max_depth);
    println!("  Checkpoint every: {} items", config.crawler.checkpoint_every);

    println!("\nResilience:");
    println!("  Request timeout: {}ms", config.resilience.request_timeout);
    println!("  Retry attempts: {}", config.resilience.retry_attempts);
    println!("  Retry delay: {}ms", config.resilience.retry_delay);
    println!("  Polite delay: {}ms", config.resilience.polite_delay);

    println!("\nWiki:");
    println!("  API: {}", config.wiki.api_url);
    println!("  Articles: {}", config.wiki.article_base_url);

    println!("\nUser Agent:");
    println!("  {}", config.user_agent.header_value());

    println!("\nOutput:");
    println!("  Node log: {}", config.output.node_log);
    println!("  Edge log: {}", config.output.edge_log);
    println!("  Checkpoint: {}", config.output.checkpoint);
    println!("  Elements: {}", config.output.elements);

    println!("\nNotifications:");
    println!("  Sink: {:?}", config.notify.sink);
    println!("  Heartbeat every: {}s", config.notify.heartbeat_interval);

    println!("\nSeeds ({}):", config.crawler.seeds.len());
    for seed in &config.crawler.seeds {
        if is_namespaced(seed) {
            println!("  * {} (namespaced)", seed);
        } else {
            println!("  * {}", seed);
        }
    }

    let checkpoint = Path::new(&config.output.checkpoint);
    println!("\n✓ Configuration is valid");
    if checkpoint.exists() {
        println!("✓ Would resume from checkpoint {}", checkpoint.display());
    } else {
        println!(
            "✓ Would start crawling from {} seed articles",
            config.crawler.seeds.len()
        );
    }
}

/// Handles the --stats mode: shows statistics from the logs and checkpoint
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    let mut log = JsonlGraphLog::open_read_only(
        Path::new(&config.output.node_log),
        Path::new(&config.output.edge_log),
    );
    let checkpoints = JsonCheckpointFile::new(&config.output.checkpoint);

    println!("Node log: {}", log.node_path().display());
    println!("Edge log: {}", log.edge_path().display());
    println!("Checkpoint: {}\n", checkpoints.path().display());

    let stats = load_statistics(&mut log, &checkpoints)?;
    print_statistics(&stats);

    Ok(())
}

/// Handles the --finalize-only mode: rebuilds the export from existing logs
fn handle_finalize_only(config: &Config) -> anyhow::Result<()> {
    println!("=== Rebuilding Graph Export ===\n");
    println!("Node log: {}", config.output.node_log);
    println!("Edge log: {}", config.output.edge_log);
    println!("Output: {}", config.output.elements);
    println!();

    let graph = export_graph(config).context("Failed to export graph")?;

    println!(
        "✓ Exported {} nodes and {} edges to: {}",
        graph.nodes.len(),
        graph.edges.len(),
        config.output.elements
    );

    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config, fresh: bool, config_hash: String) -> anyhow::Result<()> {
    if fresh {
        tracing::info!("Starting fresh crawl (ignoring previous state)");
    } else {
        tracing::info!("Starting crawl (will resume if a checkpoint exists)");
    }
    tracing::info!(
        "Seeds: {}, max depth: {}",
        config.crawler.seeds.len(),
        config.crawler.max_depth
    );

    let options = CrawlOptions { fresh, config_hash };
    match run_crawl(config, options).await {
        Ok(summary) => {
            tracing::info!("{}", summary.headline());
            Ok(())
        }
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            Err(e.into())
        }
    }
}
