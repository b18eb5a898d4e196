//! Basic-block and routine execution counting.
//!
//! # Architecture
//!
//! - **`CoverageAggregator`** - Shared, lock-guarded tables updated from every
//!   target thread as events arrive
//! - **`CoverageTables`** - Plain tables drained from the aggregator at process
//!   exit, read by the report writer
//!
//! ## Locking
//!
//! Each table has its own mutex, held only for one lookup-or-insert-and-increment.
//! A basic-block event never waits on a routine event and vice versa.
//!
//! # Performance
//!
//! - `on_basic_block()`: O(log n) in the number of distinct blocks
//! - `on_routine_target()`: O(log n) in the number of distinct call targets

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Identity of a basic block: start address and instrumented length
///
/// The host may re-trace a region with different slicing, so the same start
/// address with a different size is a distinct block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockKey {
    pub address: u64,
    pub size: u32,
}

/// Statistics for a single basic block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockStats {
    /// Instruction count sampled on first observation, never updated.
    pub instructions: u32,
    /// Number of times the block was entered.
    pub executions: u64,
}

pub type BlockTable = BTreeMap<BlockKey, BlockStats>;

/// Call target address → number of arrivals
pub type RoutineTable = BTreeMap<u64, u64>;

/// Thread-safe execution counters for blocks and call targets
#[derive(Debug, Default)]
pub struct CoverageAggregator {
    blocks: Mutex<BlockTable>,
    routines: Mutex<RoutineTable>,
}

// Every critical section leaves its table consistent, so a panic on another
// thread never invalidates the data.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl CoverageAggregator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one entry into the block at `address` with length `size`
    ///
    /// The first observation stores `instructions`; later observations only
    /// increment the execution count.
    pub fn on_basic_block(&self, address: u64, size: u32, instructions: u32) {
        let mut blocks = lock(&self.blocks);
        blocks
            .entry(BlockKey { address, size })
            .and_modify(|stats| stats.executions += 1)
            .or_insert(BlockStats { instructions, executions: 1 });
    }

    /// Record one arrival at a routine entry or resolved call target
    pub fn on_routine_target(&self, address: u64) {
        let mut routines = lock(&self.routines);
        *routines.entry(address).or_insert(0) += 1;
    }

    #[must_use]
    pub fn block_count(&self) -> usize {
        lock(&self.blocks).len()
    }

    #[must_use]
    pub fn routine_count(&self) -> usize {
        lock(&self.routines).len()
    }

    /// Move the tables out of the aggregator
    #[must_use]
    pub fn into_tables(self) -> CoverageTables {
        CoverageTables {
            blocks: self.blocks.into_inner().unwrap_or_else(PoisonError::into_inner),
            routines: self.routines.into_inner().unwrap_or_else(PoisonError::into_inner),
        }
    }
}

/// Drained coverage state, ordered by address
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoverageTables {
    pub blocks: BlockTable,
    pub routines: RoutineTable,
}

impl CoverageTables {
    /// Sum of the sizes of all distinct blocks
    ///
    /// Not weighted by execution count: a block counts its bytes once.
    #[must_use]
    pub fn covered_bytes(&self) -> u64 {
        self.blocks.keys().map(|key| u64::from(key.size)).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_repeated_block_keeps_first_instruction_count() {
        let aggregator = CoverageAggregator::new();
        aggregator.on_basic_block(0x1000, 16, 4);
        aggregator.on_basic_block(0x1000, 16, 9);
        aggregator.on_basic_block(0x1000, 16, 4);

        let tables = aggregator.into_tables();
        let stats = tables.blocks[&BlockKey { address: 0x1000, size: 16 }];
        assert_eq!(stats.executions, 3);
        assert_eq!(stats.instructions, 4);
    }

    #[test]
    fn test_same_start_different_size_is_distinct() {
        let aggregator = CoverageAggregator::new();
        aggregator.on_basic_block(0x1000, 16, 4);
        aggregator.on_basic_block(0x1000, 8, 2);

        assert_eq!(aggregator.block_count(), 2);
    }

    #[test]
    fn test_covered_bytes_counts_distinct_blocks_once() {
        let aggregator = CoverageAggregator::new();
        // Two blocks of 10 bytes sharing a key, one block of 5 bytes.
        for _ in 0..3 {
            aggregator.on_basic_block(0x1000, 10, 3);
        }
        aggregator.on_basic_block(0x1000, 10, 3);
        for _ in 0..7 {
            aggregator.on_basic_block(0x2000, 5, 1);
        }

        let tables = aggregator.into_tables();
        assert_eq!(tables.blocks.len(), 2);
        assert_eq!(tables.covered_bytes(), 15);
    }

    #[test]
    fn test_routine_counts() {
        let aggregator = CoverageAggregator::new();
        aggregator.on_routine_target(0x402000);
        aggregator.on_routine_target(0x402000);
        aggregator.on_routine_target(0x403000);

        let tables = aggregator.into_tables();
        assert_eq!(tables.routines[&0x402000], 2);
        assert_eq!(tables.routines[&0x403000], 1);
    }

    #[test]
    fn test_concurrent_increments_are_not_lost() {
        let aggregator = Arc::new(CoverageAggregator::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let aggregator = Arc::clone(&aggregator);
                thread::spawn(move || {
                    for _ in 0..1000 {
                        aggregator.on_basic_block(0x1000, 16, 4);
                        aggregator.on_routine_target(0x2000);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let tables = Arc::try_unwrap(aggregator).unwrap().into_tables();
        assert_eq!(tables.blocks[&BlockKey { address: 0x1000, size: 16 }].executions, 8000);
        assert_eq!(tables.routines[&0x2000], 8000);
    }
}
