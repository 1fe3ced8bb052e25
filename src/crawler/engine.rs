//! Crawl engine - the breadth-first crawl loop
//!
//! The engine owns the crawl state and drives it one frontier item at a time:
//! - Restoring the frontier from the last checkpoint, or seeding it
//! - Fetching each page within the depth limit
//! - Appending nodes and edges to the graph log and growing the frontier
//! - Checkpointing the frontier at a fixed cadence, after syncing the logs
//! - Tracking its lifecycle phase (Idle, Running, Completed, Failed)

use crate::config::CrawlerConfig;
use crate::crawler::fetcher::{FetchOutcome, PageFetcher};
use crate::state::{CrawlState, EnginePhase, FrontierItem};
use crate::storage::{CheckpointStore, EdgeRecord, GraphLog, NodeRecord};
use crate::title::is_article;
use crate::{Result, WikiGraphError};
use std::time::{Duration, Instant};

/// Number of processed items between progress lines
const PROGRESS_INTERVAL: u64 = 10;

/// Number of processed items between resource lines
const RESOURCE_INTERVAL: u64 = 50;

/// Counters for one engine run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlStats {
    /// Whether the run started from a checkpoint
    pub resumed: bool,

    /// Items dequeued, including depth-skipped ones
    pub processed: u64,

    pub pages_fetched: u64,
    pub not_found: u64,
    pub unreachable: u64,
    pub depth_skipped: u64,
    pub namespaced_skipped: u64,
    pub nodes_logged: u64,
    pub edges_logged: u64,
    pub enqueued: u64,
    pub checkpoints_written: u64,

    pub elapsed: Duration,
}

/// Breadth-first crawl engine
pub struct CrawlEngine {
    settings: CrawlerConfig,
    state: CrawlState,
    fetcher: PageFetcher,
    log: Box<dyn GraphLog>,
    checkpoints: Box<dyn CheckpointStore>,
    phase: EnginePhase,
    stats: CrawlStats,
    started: Option<Instant>,
}

impl CrawlEngine {
    /// Creates a new engine instance
    ///
    /// If the checkpoint store holds a snapshot the crawl resumes from it and the seeds
    /// are ignored; otherwise the frontier is seeded at depth 0.
    ///
    /// # Arguments
    ///
    /// * `settings` - Seeds, depth limit and checkpoint cadence
    /// * `fetcher` - Page fetcher with retry and pacing
    /// * `log` - Destination for node and edge records
    /// * `checkpoints` - Home of the frontier snapshot
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlEngine)` - Engine in the Idle phase
    /// * `Err(WikiGraphError)` - The existing checkpoint could not be read
    pub fn new(
        settings: CrawlerConfig,
        fetcher: PageFetcher,
        log: Box<dyn GraphLog>,
        checkpoints: Box<dyn CheckpointStore>,
    ) -> Result<Self> {
        let loaded = checkpoints
            .load()
            .map_err(|source| WikiGraphError::Checkpoint {
                path: checkpoints.location(),
                source,
            })?;

        let (state, resumed) = match loaded {
            Some(snapshot) => {
                tracing::info!(
                    "Resuming from checkpoint {}: {} queued, {} visited",
                    checkpoints.location(),
                    snapshot.queue.len(),
                    snapshot.visited.len()
                );
                (CrawlState::restored(snapshot), true)
            }
            None => {
                tracing::info!(
                    "No checkpoint found, seeding frontier with {} seeds",
                    settings.seeds.len()
                );
                (CrawlState::seeded(&settings.seeds), false)
            }
        };

        Ok(Self {
            settings,
            state,
            fetcher,
            log,
            checkpoints,
            phase: EnginePhase::Idle,
            stats: CrawlStats {
                resumed,
                ..CrawlStats::default()
            },
            started: None,
        })
    }

    pub fn phase(&self) -> EnginePhase {
        self.phase
    }

    pub fn state(&self) -> &CrawlState {
        &self.state
    }

    /// Returns a copy of the counters with the elapsed time filled in
    pub fn stats(&self) -> CrawlStats {
        CrawlStats {
            processed: self.state.processed(),
            elapsed: self.started.map(|s| s.elapsed()).unwrap_or_default(),
            ..self.stats.clone()
        }
    }

    /// Hands back the graph log, for finalization once the crawl is over
    pub fn into_log(self) -> Box<dyn GraphLog> {
        self.log
    }

    /// Runs the crawl until the frontier is exhausted
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlStats)` - Frontier drained; logs synced and final checkpoint written
    /// * `Err(WikiGraphError)` - A fatal fetch, log or checkpoint error; the engine is Failed
    pub async fn run(&mut self) -> Result<CrawlStats> {
        while self.step().await? {}
        Ok(self.stats())
    }

    /// Processes a single frontier item
    ///
    /// Returns `Ok(true)` while work remains. When the frontier is empty the crawl is
    /// completed and `Ok(false)` is returned.
    pub async fn step(&mut self) -> Result<bool> {
        match self.phase {
            EnginePhase::Idle => self.start()?,
            EnginePhase::Running => {}
            EnginePhase::Completed => return Ok(false),
            EnginePhase::Failed => {
                return Err(WikiGraphError::InvalidTransition {
                    from: EnginePhase::Failed,
                    to: EnginePhase::Running,
                })
            }
        }

        let result = match self.state.frontier_mut().dequeue() {
            Some(item) => self.process_item(item).await.map(|_| true),
            None => self.complete().map(|_| false),
        };

        if let Err(e) = &result {
            self.fail(e);
        }
        result
    }

    fn transition(&mut self, next: EnginePhase) -> Result<()> {
        if !self.phase.can_transition_to(next) {
            return Err(WikiGraphError::InvalidTransition {
                from: self.phase,
                to: next,
            });
        }
        tracing::debug!("Engine phase {} -> {}", self.phase, next);
        self.phase = next;
        Ok(())
    }

    fn start(&mut self) -> Result<()> {
        self.transition(EnginePhase::Running)?;
        self.started = Some(Instant::now());
        tracing::info!(
            "Starting crawl: {} queued, {} visited, max depth {}",
            self.state.frontier().len(),
            self.state.frontier().visited_len(),
            self.settings.max_depth
        );
        Ok(())
    }

    fn complete(&mut self) -> Result<()> {
        tracing::info!("Frontier is empty, crawl complete");
        self.checkpoint()?;
        self.transition(EnginePhase::Completed)?;

        let stats = self.stats();
        tracing::info!(
            "Crawl completed: {} items processed, {} pages fetched, {} edges logged in {:?}",
            stats.processed,
            stats.pages_fetched,
            stats.edges_logged,
            stats.elapsed
        );
        Ok(())
    }

    fn fail(&mut self, error: &WikiGraphError) {
        tracing::error!("Crawl failed: {}", error);
        if !self.phase.is_terminal() {
            self.phase = EnginePhase::Failed;
        }
    }

    /// Handles one dequeued item, then checkpoints and reports progress when due
    async fn process_item(&mut self, item: FrontierItem) -> Result<()> {
        let processed = self.state.record_processed();

        if item.depth >= self.settings.max_depth {
            tracing::debug!("Skipping '{}' at depth {}", item.title, item.depth);
            self.stats.depth_skipped += 1;
        } else {
            self.crawl_page(&item).await?;
        }

        if processed % u64::from(self.settings.checkpoint_every.max(1)) == 0 {
            self.checkpoint()?;
        }

        if processed % PROGRESS_INTERVAL == 0 {
            let elapsed = self.started.map(|s| s.elapsed()).unwrap_or_default();
            let rate = processed as f64 / elapsed.as_secs_f64().max(f64::EPSILON);
            tracing::info!(
                "Progress: {} pages crawled, {} in frontier, {:.2} pages/sec",
                processed,
                self.state.frontier().len(),
                rate
            );
        }

        if processed % RESOURCE_INTERVAL == 0 {
            tracing::info!(
                "Resources: {} queued, {} visited, {} nodes held in memory",
                self.state.frontier().len(),
                self.state.frontier().visited_len(),
                self.state.nodes_seen()
            );
        }

        Ok(())
    }

    async fn crawl_page(&mut self, item: &FrontierItem) -> Result<()> {
        tracing::debug!("Fetching '{}' at depth {}", item.title, item.depth);

        let outcome = self
            .fetcher
            .fetch(&item.title)
            .await
            .map_err(|source| WikiGraphError::Fetch {
                title: item.title.clone(),
                source,
            })?;

        let page = match outcome {
            FetchOutcome::Found(page) => page,
            FetchOutcome::NotFound => {
                tracing::debug!("'{}' does not exist", item.title);
                self.stats.not_found += 1;
                return Ok(());
            }
            FetchOutcome::Unreachable { attempts, error } => {
                tracing::warn!(
                    "Treating '{}' as absent after {} failed attempts: {}",
                    item.title,
                    attempts,
                    error
                );
                self.stats.unreachable += 1;
                return Ok(());
            }
        };

        self.stats.pages_fetched += 1;
        self.log_node(&item.title)?;

        let next_depth = item.depth + 1;
        for link in &page.links {
            if !is_article(link) {
                self.stats.namespaced_skipped += 1;
                continue;
            }

            self.log_node(link)?;
            self.log.append_edge(&EdgeRecord::new(&item.title, link))?;
            self.stats.edges_logged += 1;

            if next_depth < self.settings.max_depth
                && self.state.frontier_mut().enqueue(link, next_depth)
            {
                self.stats.enqueued += 1;
            }
        }

        Ok(())
    }

    fn log_node(&mut self, title: &str) -> Result<()> {
        if self.state.mark_node_seen(title) {
            self.log.append_node(&NodeRecord::new(title))?;
            self.stats.nodes_logged += 1;
        }
        Ok(())
    }

    /// Syncs the logs, then replaces the checkpoint with the current frontier
    fn checkpoint(&mut self) -> Result<()> {
        self.log.sync()?;

        let snapshot = self.state.snapshot();
        self.checkpoints
            .save(&snapshot)
            .map_err(|source| WikiGraphError::Checkpoint {
                path: self.checkpoints.location(),
                source,
            })?;

        self.stats.checkpoints_written += 1;
        tracing::debug!(
            "Checkpoint saved: {} queued, {} visited",
            snapshot.queue.len(),
            snapshot.visited.len()
        );
        Ok(())
    }
}
