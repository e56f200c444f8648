//! Checkpoint module for crash-safe crawl progress
//!
//! # Components
//!
//! - `Phase`: Which signature is currently being collected (A or B)
//! - `CrawlSets`: The two result sets, owned and threaded through the phases
//! - `CrawlState`: The durable unit (phase, last completed bin, both sets)
//! - `CheckpointStore`: Atomic JSON persistence of `CrawlState`

mod state;
mod store;

// Re-export main types
pub use state::{CrawlSets, CrawlState, Phase};
pub use store::{write_atomically, CheckpointStore};
