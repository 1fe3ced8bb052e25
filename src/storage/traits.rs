//! Storage traits and error types
//!
//! This module defines the trait interfaces for the graph log and checkpoint
//! backends and their shared error type.

use crate::state::CheckpointSnapshot;
use crate::storage::{EdgeRecord, NodeRecord};
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Malformed record in {path} at line {line}: {message}")]
    Malformed {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("Graph log {path} is open read-only")]
    ReadOnly { path: PathBuf },
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Lazy stream of records read back from a log
pub type RecordIter<'a, T> = Box<dyn Iterator<Item = StorageResult<T>> + 'a>;

/// Append-only record streams for discovered nodes and edges
///
/// Appends are not exactly-once: a crash between a write and the next checkpoint
/// can replay records after resume. Readers deduplicate by key.
pub trait GraphLog: Send {
    /// Appends a node record to the node stream
    fn append_node(&mut self, node: &NodeRecord) -> StorageResult<()>;

    /// Appends an edge record to the edge stream
    fn append_edge(&mut self, edge: &EdgeRecord) -> StorageResult<()>;

    /// Makes every record appended so far durable
    fn sync(&mut self) -> StorageResult<()>;

    /// Reads the node stream from the beginning
    fn read_nodes(&mut self) -> StorageResult<RecordIter<'_, NodeRecord>>;

    /// Reads the edge stream from the beginning
    fn read_edges(&mut self) -> StorageResult<RecordIter<'_, EdgeRecord>>;
}

/// Durable home for the most recent frontier snapshot
pub trait CheckpointStore: Send {
    /// Loads the last saved snapshot, if any
    fn load(&self) -> StorageResult<Option<CheckpointSnapshot>>;

    /// Replaces the stored snapshot; the previous one stays intact if this fails
    fn save(&mut self, snapshot: &CheckpointSnapshot) -> StorageResult<()>;

    /// Removes the stored snapshot
    fn clear(&mut self) -> StorageResult<()>;

    /// Human-readable location for logs and errors
    fn location(&self) -> String;
}
