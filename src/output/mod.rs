//! Output module for the finished graph and crawl reports
//!
//! This module handles:
//! - Consolidating the graph logs into a deduplicated, sized graph
//! - Writing the node/edge element export
//! - Generating the crawl summary sent on success
//! - Reporting statistics over the logs and checkpoint

mod elements;
mod finalize;
pub mod stats;
mod summary;

pub use elements::{read_elements, to_elements, write_elements, EdgeData, GraphElement, NodeData};
pub use finalize::{
    finalize_graph, node_size, FinalEdge, FinalGraph, FinalNode, InDegreeTable, BASE_NODE_SIZE,
    MAX_NODE_SIZE,
};
pub use stats::{load_statistics, print_statistics, LogStatistics};
pub use summary::{format_summary, CrawlSummary};
