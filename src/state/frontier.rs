use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet, VecDeque};

/// A title waiting to be crawled, with its hop distance from the seeds
///
/// Serialized as a `[title, depth]` pair to match the checkpoint file format.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "(String, u32)", into = "(String, u32)")]
pub struct FrontierItem {
    pub title: String,
    pub depth: u32,
}

impl FrontierItem {
    pub fn new(title: impl Into<String>, depth: u32) -> Self {
        Self {
            title: title.into(),
            depth,
        }
    }
}

impl From<(String, u32)> for FrontierItem {
    fn from((title, depth): (String, u32)) -> Self {
        Self { title, depth }
    }
}

impl From<FrontierItem> for (String, u32) {
    fn from(item: FrontierItem) -> Self {
        (item.title, item.depth)
    }
}

/// Point-in-time copy of the frontier, as persisted in the checkpoint file
///
/// `visited` is ordered so equal frontiers serialize to equal bytes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckpointSnapshot {
    pub queue: Vec<FrontierItem>,
    pub visited: BTreeSet<String>,
}

/// Breadth-first work queue plus the set of every title ever enqueued
///
/// Membership is checked at enqueue time, so each title becomes at most one unit of
/// work per crawl no matter how many pages link to it.
#[derive(Debug, Clone, Default)]
pub struct FrontierStore {
    queue: VecDeque<FrontierItem>,
    visited: HashSet<String>,
}

impl FrontierStore {
    /// Creates an empty frontier
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a title at the tail of the queue unless it was ever enqueued before
    ///
    /// # Returns
    ///
    /// * `true` - The title was new and is now queued
    /// * `false` - The title was already visited; nothing changed
    pub fn enqueue(&mut self, title: &str, depth: u32) -> bool {
        if self.contains(title) {
            return false;
        }

        self.visited.insert(title.to_string());
        self.queue.push_back(FrontierItem::new(title, depth));
        true
    }

    /// Removes and returns the item at the head of the queue
    pub fn dequeue(&mut self) -> Option<FrontierItem> {
        self.queue.pop_front()
    }

    /// Copies the queue and visited set for checkpointing
    pub fn snapshot(&self) -> CheckpointSnapshot {
        CheckpointSnapshot {
            queue: self.queue.iter().cloned().collect(),
            visited: self.visited.iter().cloned().collect(),
        }
    }

    /// Replaces the in-memory queue and visited set with a snapshot's contents
    ///
    /// Titles present in the queue but missing from `visited` (a hand-edited or
    /// older checkpoint) are added to the visited set so they cannot be enqueued twice.
    pub fn restore(&mut self, snapshot: CheckpointSnapshot) {
        let mut visited: HashSet<String> = snapshot.visited.into_iter().collect();
        for item in &snapshot.queue {
            visited.insert(item.title.clone());
        }

        self.queue = snapshot.queue.into();
        self.visited = visited;
    }

    /// Returns whether the title was ever enqueued
    pub fn contains(&self, title: &str) -> bool {
        self.visited.contains(title)
    }

    /// Returns the number of items waiting in the queue
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Returns whether the queue is empty
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Returns the number of titles ever enqueued
    pub fn visited_len(&self) -> usize {
        self.visited.len()
    }
}
