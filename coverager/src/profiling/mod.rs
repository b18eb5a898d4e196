//! Collection core
//!
//! This module contains everything that runs while the target executes:
//! - Basic-block and routine counters
//! - Per-thread call tracking
//! - The process-lifetime collector owning both
//! - Event dispatch from host events to collector handlers

pub mod call_tree;
pub mod collector;
pub mod coverage;
pub mod event_processor;

// Re-export common types
pub use call_tree::{CallTreeTracker, ThreadCallContext, ROOT_FRAME};
pub use collector::{Collector, ProcessSnapshot, ProcessSummary};
pub use coverage::{BlockKey, BlockStats, CoverageAggregator, CoverageTables};
pub use event_processor::{EventProcessor, EventStats, Flow};
