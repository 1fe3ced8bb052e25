//! Crawl summary generation
//!
//! Produces the human-readable report sent with the success notification: a one-line
//! headline followed by run information, traversal counters, and the most-linked
//! articles.

use crate::crawler::CrawlStats;
use crate::output::finalize::FinalGraph;
use chrono::{DateTime, Utc};

/// Number of articles listed in the summary ranking
const TOP_NODES: usize = 10;

/// Summary of a finished crawl
#[derive(Debug, Clone, PartialEq)]
pub struct CrawlSummary {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub config_hash: String,
    pub stats: CrawlStats,

    /// Distinct nodes and edges in the export
    pub nodes: usize,
    pub edges: usize,
    pub backfilled: usize,

    /// Most-linked articles with their in-degree
    pub top_nodes: Vec<(String, u32)>,
}

impl CrawlSummary {
    pub fn new(
        started_at: DateTime<Utc>,
        finished_at: DateTime<Utc>,
        config_hash: String,
        stats: CrawlStats,
        graph: &FinalGraph,
    ) -> Self {
        Self {
            started_at,
            finished_at,
            config_hash,
            stats,
            nodes: graph.nodes.len(),
            edges: graph.edges.len(),
            backfilled: graph.backfilled,
            top_nodes: graph
                .top_by_in_degree(TOP_NODES)
                .into_iter()
                .map(|n| (n.label.clone(), n.in_degree))
                .collect(),
        }
    }

    /// One-line result, e.g. `Crawl complete: 3 nodes, 2 edges.`
    pub fn headline(&self) -> String {
        format!("Crawl complete: {} nodes, {} edges.", self.nodes, self.edges)
    }

    pub fn duration_seconds(&self) -> i64 {
        (self.finished_at - self.started_at).num_seconds()
    }
}

/// Formats a crawl summary as a plain-text report
///
/// # Arguments
///
/// * `summary` - The crawl summary data
///
/// # Returns
///
/// A formatted report whose first line is the headline
pub fn format_summary(summary: &CrawlSummary) -> String {
    let stats = &summary.stats;
    let mut report = String::new();

    report.push_str(&summary.headline());
    report.push_str("\n\n");

    report.push_str("Run Information\n");
    report.push_str(&format!("- Started: {}\n", summary.started_at.to_rfc3339()));
    report.push_str(&format!("- Finished: {}\n", summary.finished_at.to_rfc3339()));
    let duration = summary.duration_seconds();
    report.push_str(&format!(
        "- Duration: {} seconds ({:.2} minutes)\n",
        duration,
        duration as f64 / 60.0
    ));
    report.push_str(&format!(
        "- Resumed from checkpoint: {}\n",
        if stats.resumed { "yes" } else { "no" }
    ));
    report.push_str(&format!("- Config Hash: {}\n\n", summary.config_hash));

    report.push_str("Traversal\n");
    report.push_str(&format!("- Items processed: {}\n", stats.processed));
    report.push_str(&format!("- Pages fetched: {}\n", stats.pages_fetched));
    report.push_str(&format!("- Not found: {}\n", stats.not_found));
    report.push_str(&format!("- Unreachable: {}\n", stats.unreachable));
    report.push_str(&format!("- Beyond depth limit: {}\n", stats.depth_skipped));
    report.push_str(&format!(
        "- Namespaced links skipped: {}\n",
        stats.namespaced_skipped
    ));
    report.push_str(&format!("- Checkpoints written: {}\n", stats.checkpoints_written));
    if summary.backfilled > 0 {
        report.push_str(&format!(
            "- Nodes recovered from edges: {}\n",
            summary.backfilled
        ));
    }

    if !summary.top_nodes.is_empty() {
        report.push_str("\nMost Linked\n");
        for (label, in_degree) in &summary.top_nodes {
            report.push_str(&format!("- {} ({} incoming)\n", label, in_degree));
        }
    }

    report
}
