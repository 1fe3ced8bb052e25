//! Statistics over the crawl's on-disk state
//!
//! This module reads the graph logs and the checkpoint without modifying them and
//! reports how much of the graph has been collected so far.

use crate::output::finalize::InDegreeTable;
use crate::storage::{CheckpointStore, EdgeRecord, GraphLog};
use crate::Result;
use std::collections::HashSet;

/// Number of titles listed in the in-degree ranking
const TOP_TITLES: usize = 10;

/// Snapshot of the logs and checkpoint
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogStatistics {
    /// Node records in the log, replays included
    pub node_records: u64,
    pub distinct_nodes: u64,

    /// Edge records in the log, replays included
    pub edge_records: u64,
    pub distinct_edges: u64,

    /// Whether a checkpoint exists; queue and visited sizes are zero otherwise
    pub checkpoint_present: bool,
    pub queued: u64,
    pub visited: u64,

    /// Most-linked titles with their distinct in-degree
    pub top_in_degree: Vec<(String, u32)>,
}

/// Loads statistics from the graph log and checkpoint
///
/// # Arguments
///
/// * `log` - The graph log to scan
/// * `checkpoints` - The checkpoint store to inspect
///
/// # Returns
///
/// * `Ok(LogStatistics)` - Successfully loaded statistics
/// * `Err(WikiGraphError)` - A log or the checkpoint could not be read
pub fn load_statistics(
    log: &mut dyn GraphLog,
    checkpoints: &dyn CheckpointStore,
) -> Result<LogStatistics> {
    let mut stats = LogStatistics::default();

    let mut nodes = HashSet::new();
    for node in log.read_nodes()? {
        stats.node_records += 1;
        nodes.insert(node?.id);
    }
    stats.distinct_nodes = nodes.len() as u64;

    let mut edges: HashSet<EdgeRecord> = HashSet::new();
    for edge in log.read_edges()? {
        stats.edge_records += 1;
        edges.insert(edge?);
    }
    stats.distinct_edges = edges.len() as u64;
    stats.top_in_degree = InDegreeTable::from_edges(&edges).top(TOP_TITLES);

    if let Some(snapshot) = checkpoints.load()? {
        stats.checkpoint_present = true;
        stats.queued = snapshot.queue.len() as u64;
        stats.visited = snapshot.visited.len() as u64;
    }

    Ok(stats)
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &LogStatistics) {
    println!("=== Crawl Statistics ===\n");

    println!("Graph Log:");
    println!(
        "  Nodes: {} distinct ({} records)",
        stats.distinct_nodes, stats.node_records
    );
    println!(
        "  Edges: {} distinct ({} records)",
        stats.distinct_edges, stats.edge_records
    );
    let replayed = (stats.node_records - stats.distinct_nodes)
        + (stats.edge_records - stats.distinct_edges);
    if replayed > 0 {
        println!("  Replayed records: {}", replayed);
    }
    println!();

    println!("Checkpoint:");
    if stats.checkpoint_present {
        println!("  Queued: {}", stats.queued);
        println!("  Visited: {}", stats.visited);
        if stats.queued == 0 {
            println!("  Frontier exhausted; the crawl is complete");
        }
    } else {
        println!("  None (the next run starts from the seeds)");
    }
    println!();

    if !stats.top_in_degree.is_empty() {
        println!("Most Linked ({}):", stats.top_in_degree.len());
        for (title, count) in &stats.top_in_degree {
            println!("  {:>6}  {}", count, title);
        }
        println!();
    }
}
