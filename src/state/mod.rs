//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `EnginePhase`: lifecycle of the crawl engine (idle, running, completed, failed)
//! - `FrontierStore`: breadth-first queue of titles plus the visited set
//! - `CheckpointSnapshot`: serializable copy of the frontier
//! - `CrawlState`: the aggregate the engine owns (frontier, nodes seen, counters)

mod crawl_state;
mod frontier;
mod phase;

// Re-export main types
pub use crawl_state::CrawlState;
pub use frontier::{CheckpointSnapshot, FrontierItem, FrontierStore};
pub use phase::EnginePhase;
