//! Storage module for persisting crawl data
//!
//! This module handles everything the crawl writes to disk:
//! - Append-only node and edge logs (the durable record of the discovered graph)
//! - The frontier checkpoint used to resume an interrupted crawl
//! - Torn-write repair for logs cut off mid-append

mod checkpoint;
mod graph_log;
mod traits;

pub use checkpoint::JsonCheckpointFile;
pub use graph_log::{repair_torn_tail, JsonlGraphLog};
pub use traits::{CheckpointStore, GraphLog, RecordIter, StorageError, StorageResult};

use serde::{Deserialize, Serialize};

/// A discovered article, identified by its title
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeRecord {
    pub id: String,
}

impl NodeRecord {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

/// A directed link observed on the `from` article
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EdgeRecord {
    pub from: String,
    pub to: String,
}

impl EdgeRecord {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }
}
