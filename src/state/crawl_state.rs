use crate::state::frontier::{CheckpointSnapshot, FrontierStore};
use std::collections::HashSet;

/// All mutable state of one crawl, owned by the engine
///
/// Besides the frontier this tracks `nodes_seen`: titles already written to the node
/// log by this process. It is wider than the frontier's visited set because link
/// targets are logged as nodes without ever being enqueued, and it is never persisted;
/// a resumed process starts it empty.
#[derive(Debug, Default)]
pub struct CrawlState {
    frontier: FrontierStore,
    nodes_seen: HashSet<String>,
    processed: u64,
}

impl CrawlState {
    /// Creates state for a fresh crawl, enqueuing each seed at depth 0
    ///
    /// Duplicate seeds collapse onto their first occurrence.
    pub fn seeded(seeds: &[String]) -> Self {
        let mut frontier = FrontierStore::new();
        for seed in seeds {
            frontier.enqueue(seed, 0);
        }

        Self {
            frontier,
            ..Self::default()
        }
    }

    /// Creates state resuming from a checkpoint snapshot
    pub fn restored(snapshot: CheckpointSnapshot) -> Self {
        let mut frontier = FrontierStore::new();
        frontier.restore(snapshot);

        Self {
            frontier,
            ..Self::default()
        }
    }

    pub fn frontier(&self) -> &FrontierStore {
        &self.frontier
    }

    pub fn frontier_mut(&mut self) -> &mut FrontierStore {
        &mut self.frontier
    }

    /// Marks a title as logged; returns true the first time it is seen
    pub fn mark_node_seen(&mut self, title: &str) -> bool {
        if self.nodes_seen.contains(title) {
            return false;
        }
        self.nodes_seen.insert(title.to_string())
    }

    /// Returns the number of distinct titles logged by this process
    pub fn nodes_seen(&self) -> usize {
        self.nodes_seen.len()
    }

    /// Counts one dequeued item and returns the new total
    pub fn record_processed(&mut self) -> u64 {
        self.processed += 1;
        self.processed
    }

    /// Returns the number of items dequeued by this process
    pub fn processed(&self) -> u64 {
        self.processed
    }

    /// Snapshots the frontier for checkpointing
    pub fn snapshot(&self) -> CheckpointSnapshot {
        self.frontier.snapshot()
    }
}
