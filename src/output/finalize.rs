//! Graph finalization
//!
//! Consolidates the append-only logs into the final graph: duplicates from replayed
//! appends are collapsed, in-degrees are counted over distinct edges, and every node is
//! sized relative to the most-linked node.

use crate::storage::{EdgeRecord, GraphLog, StorageResult};
use crate::title::{article_url, display_label};
use std::collections::{HashMap, HashSet};
use url::Url;

/// Size of a node nothing links to
pub const BASE_NODE_SIZE: f64 = 10.0;

/// Size of the node with the highest in-degree
pub const MAX_NODE_SIZE: f64 = 150.0;

/// A node ready for export
#[derive(Debug, Clone, PartialEq)]
pub struct FinalNode {
    pub id: String,
    pub label: String,
    pub size: f64,
    pub url: String,
    pub in_degree: u32,
}

/// An edge ready for export
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinalEdge {
    pub source: String,
    pub target: String,
    pub label: String,
}

/// The consolidated graph, nodes and edges in first-seen order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FinalGraph {
    pub nodes: Vec<FinalNode>,
    pub edges: Vec<FinalEdge>,

    /// Nodes added because an edge referenced them but the node log did not
    pub backfilled: usize,
}

impl FinalGraph {
    pub fn max_in_degree(&self) -> u32 {
        self.nodes.iter().map(|n| n.in_degree).max().unwrap_or(0)
    }

    /// Returns up to `limit` nodes, highest in-degree first; ties keep log order
    pub fn top_by_in_degree(&self, limit: usize) -> Vec<&FinalNode> {
        let mut ranked: Vec<&FinalNode> = self.nodes.iter().collect();
        ranked.sort_by(|a, b| b.in_degree.cmp(&a.in_degree));
        ranked.truncate(limit);
        ranked
    }
}

/// Incoming-edge counts per title
#[derive(Debug, Default)]
pub struct InDegreeTable {
    counts: HashMap<String, u32>,
}

impl InDegreeTable {
    /// Counts targets; callers pass distinct edges
    pub fn from_edges<'a>(edges: impl IntoIterator<Item = &'a EdgeRecord>) -> Self {
        let mut counts = HashMap::new();
        for edge in edges {
            *counts.entry(edge.to.clone()).or_insert(0) += 1;
        }
        Self { counts }
    }

    pub fn get(&self, title: &str) -> u32 {
        self.counts.get(title).copied().unwrap_or(0)
    }

    pub fn max(&self) -> u32 {
        self.counts.values().copied().max().unwrap_or(0)
    }

    /// Returns up to `limit` titles by descending in-degree, ties broken by title
    pub fn top(&self, limit: usize) -> Vec<(String, u32)> {
        let mut ranked: Vec<(String, u32)> = self
            .counts
            .iter()
            .map(|(title, count)| (title.clone(), *count))
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ranked.truncate(limit);
        ranked
    }
}

/// Maps an in-degree onto `[BASE_NODE_SIZE, MAX_NODE_SIZE]`
///
/// A graph without edges sizes every node at `BASE_NODE_SIZE`.
pub fn node_size(in_degree: u32, max_in_degree: u32) -> f64 {
    let max = f64::from(max_in_degree.max(1));
    let ratio = (f64::from(in_degree) / max).min(1.0);
    BASE_NODE_SIZE + (MAX_NODE_SIZE - BASE_NODE_SIZE) * ratio
}

/// Builds the final graph from the node and edge logs
///
/// # Arguments
///
/// * `log` - The graph log to read from the beginning
/// * `article_base` - Base URL that article titles are appended to
///
/// # Returns
///
/// * `Ok(FinalGraph)` - Deduplicated, sized graph
/// * `Err(StorageError)` - A log could not be read or held a malformed record
pub fn finalize_graph(log: &mut dyn GraphLog, article_base: &Url) -> StorageResult<FinalGraph> {
    let mut node_ids: Vec<String> = Vec::new();
    let mut known: HashSet<String> = HashSet::new();
    let mut node_records = 0usize;
    for node in log.read_nodes()? {
        let node = node?;
        node_records += 1;
        if known.insert(node.id.clone()) {
            node_ids.push(node.id);
        }
    }

    let mut edges: Vec<EdgeRecord> = Vec::new();
    let mut seen_edges: HashSet<EdgeRecord> = HashSet::new();
    let mut edge_records = 0usize;
    for edge in log.read_edges()? {
        let edge = edge?;
        edge_records += 1;
        if seen_edges.insert(edge.clone()) {
            edges.push(edge);
        }
    }

    let mut backfilled = 0;
    for edge in &edges {
        for endpoint in [&edge.from, &edge.to] {
            if known.insert(endpoint.clone()) {
                tracing::warn!("Edge endpoint '{}' missing from node log, adding it", endpoint);
                node_ids.push(endpoint.clone());
                backfilled += 1;
            }
        }
    }

    tracing::info!(
        "Finalizing graph: {} node records ({} distinct), {} edge records ({} distinct)",
        node_records,
        node_ids.len() - backfilled,
        edge_records,
        edges.len()
    );

    let in_degree = InDegreeTable::from_edges(&edges);
    let max_in_degree = in_degree.max();

    let nodes = node_ids
        .into_iter()
        .map(|id| {
            let degree = in_degree.get(&id);
            FinalNode {
                label: display_label(&id),
                url: article_url(article_base, &id),
                size: node_size(degree, max_in_degree),
                in_degree: degree,
                id,
            }
        })
        .collect();

    let edges = edges
        .into_iter()
        .map(|edge| FinalEdge {
            label: format!("{} → {}", edge.from, edge.to),
            source: edge.from,
            target: edge.to,
        })
        .collect();

    Ok(FinalGraph {
        nodes,
        edges,
        backfilled,
    })
}
