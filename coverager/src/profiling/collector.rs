//! # Collector
//!
//! Owns every table that lives for the duration of the target process and
//! exposes one handler per host event. Handlers take `&self` and may be called
//! concurrently from any number of target threads.
//!
//! ## Lifecycle
//!
//! ```text
//! Collector::new()       ← process start: empty tables, start instant
//!     │
//!     │  on_basic_block / on_call / on_return / on_routine_entered
//!     │  on_module_loaded / on_thread_start / on_thread_end
//!     ▼
//! Collector::finish()    ← process exit: close logs, drain into ProcessSnapshot
//! ```
//!
//! Handlers never fail: I/O problems on call logs only disable logging for the
//! affected thread.

use coverager_common::UNRESOLVED_TARGET;
use log::info;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use super::call_tree::CallTreeTracker;
use super::coverage::{CoverageAggregator, CoverageTables};
use crate::config::CollectorConfig;
use crate::domain::{ProcessInfo, Tid};
use crate::symbolization::{ModuleLoadLog, ModuleTable};

#[derive(Debug, Default)]
struct ModuleState {
    table: ModuleTable,
    loads: ModuleLoadLog,
}

/// Aggregates host events for one target process
#[derive(Debug)]
pub struct Collector {
    process: ProcessInfo,
    started: Instant,
    coverage: CoverageAggregator,
    modules: Mutex<ModuleState>,
    call_tree: CallTreeTracker,
}

impl Collector {
    /// Create the collector at process start
    #[must_use]
    pub fn new(config: &CollectorConfig, process: ProcessInfo) -> Self {
        let call_log_paths = config.call_tree.then(|| config.report_paths());

        info!(
            "Collecting coverage for {} (call tree: {})",
            process.pid,
            if config.call_tree { "on" } else { "off" }
        );

        Self {
            process,
            started: Instant::now(),
            coverage: CoverageAggregator::new(),
            modules: Mutex::new(ModuleState::default()),
            call_tree: CallTreeTracker::new(call_log_paths),
        }
    }

    pub fn on_module_loaded(&self, low: u64, high: u64, path: &str) {
        let mut modules = self.modules.lock().unwrap_or_else(PoisonError::into_inner);
        modules.loads.push(path);
        modules.table.insert(low, high, path);
    }

    pub fn on_thread_start(&self, tid: Tid) {
        self.call_tree.on_thread_start(tid);
    }

    pub fn on_thread_end(&self, tid: Tid) {
        self.call_tree.on_thread_end(tid);
    }

    pub fn on_basic_block(&self, address: u64, size: u32, instructions: u32) {
        self.coverage.on_basic_block(address, size, instructions);
    }

    /// Handle a call instruction about to transfer to `target`
    ///
    /// Unresolved (zero) targets are ignored. Resolved targets count as a
    /// routine arrival and, when call tracking is on, as an edge in the
    /// thread's call log.
    pub fn on_call(&self, tid: Tid, _instruction: u64, target: u64) {
        if target == UNRESOLVED_TARGET {
            return;
        }
        self.coverage.on_routine_target(target);
        self.call_tree.on_call(tid, target);
    }

    pub fn on_return(&self, tid: Tid, _instruction: u64) {
        self.call_tree.on_return(tid);
    }

    /// Handle direct routine-entry instrumentation
    ///
    /// Shares the routine counter with resolved call targets.
    pub fn on_routine_entered(&self, _tid: Tid, address: u64) {
        self.coverage.on_routine_target(address);
    }

    /// Number of thread starts observed so far
    #[must_use]
    pub fn thread_count(&self) -> u64 {
        self.call_tree.threads_started()
    }

    /// Current call stack of a thread, if call tracking is on and it is alive
    #[must_use]
    pub fn call_stack(&self, tid: Tid) -> Option<Vec<u64>> {
        self.call_tree.call_stack(tid)
    }

    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Drain all state at process exit
    ///
    /// Call logs of threads that never reported their end are closed here.
    #[must_use]
    pub fn finish(self) -> ProcessSnapshot {
        self.call_tree.close_all();

        let elapsed = self.started.elapsed();
        let threads = self.call_tree.threads_started();
        let ModuleState { table, loads } =
            self.modules.into_inner().unwrap_or_else(PoisonError::into_inner);

        ProcessSnapshot {
            process: self.process,
            elapsed,
            threads,
            modules: table,
            module_loads: loads,
            coverage: self.coverage.into_tables(),
        }
    }
}

/// Everything collected for one process, read once by the report writer
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessSnapshot {
    pub process: ProcessInfo,
    pub elapsed: Duration,
    pub threads: u64,
    pub modules: ModuleTable,
    pub module_loads: ModuleLoadLog,
    pub coverage: CoverageTables,
}

/// Counters reported in the summary artifact
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProcessSummary {
    pub threads: u64,
    pub modules: usize,
    pub routines: usize,
    pub blocks: usize,
    pub covered_bytes: u64,
    pub elapsed_secs: f64,
}

impl ProcessSnapshot {
    #[must_use]
    pub fn summary(&self) -> ProcessSummary {
        ProcessSummary {
            threads: self.threads,
            modules: self.modules.len(),
            routines: self.coverage.routines.len(),
            blocks: self.coverage.blocks.len(),
            covered_bytes: self.coverage.covered_bytes(),
            elapsed_secs: self.elapsed.as_secs_f64(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Pid;
    use crate::profiling::call_tree::ROOT_FRAME;
    use crate::profiling::coverage::BlockKey;

    fn collector(config: &CollectorConfig) -> Collector {
        Collector::new(config, ProcessInfo::new(Pid(100), "app.exe --run"))
    }

    #[test]
    fn test_call_and_routine_entry_share_counter() {
        let collector = collector(&CollectorConfig::default());
        collector.on_thread_start(Tid(1));
        collector.on_call(Tid(1), 0x401010, 0x402000);
        collector.on_routine_entered(Tid(1), 0x402000);

        let snapshot = collector.finish();
        assert_eq!(snapshot.coverage.routines[&0x402000], 2);
    }

    #[test]
    fn test_unresolved_call_target_is_ignored() {
        let collector = collector(&CollectorConfig::default());
        collector.on_call(Tid(1), 0x401010, 0);

        let snapshot = collector.finish();
        assert!(snapshot.coverage.routines.is_empty());
    }

    #[test]
    fn test_call_return_balance_tolerance() {
        let dir = tempfile::tempdir().unwrap();
        let config = CollectorConfig::new(dir.path(), "run").with_call_tree(true);
        let collector = collector(&config);

        collector.on_thread_start(Tid(1));
        collector.on_call(Tid(1), 0xA, 0xB);
        collector.on_return(Tid(1), 0xB0);
        assert_eq!(collector.call_stack(Tid(1)).unwrap(), [ROOT_FRAME]);
        collector.on_return(Tid(1), 0xC0);
        assert_eq!(collector.call_stack(Tid(1)).unwrap(), [ROOT_FRAME]);
    }

    #[test]
    fn test_thread_count_independent_of_call_tree() {
        let collector = collector(&CollectorConfig::default());
        collector.on_thread_start(Tid(1));
        collector.on_thread_start(Tid(2));
        collector.on_thread_end(Tid(1));

        assert_eq!(collector.thread_count(), 2);
        assert!(collector.call_stack(Tid(2)).is_none());
        assert_eq!(collector.finish().threads, 2);
    }

    #[test]
    fn test_snapshot_summary() {
        let collector = collector(&CollectorConfig::default());
        collector.on_module_loaded(0x400000, 0x410000, "app.exe");
        collector.on_basic_block(0x401000, 16, 4);
        collector.on_basic_block(0x401000, 16, 4);
        collector.on_basic_block(0x401010, 6, 2);

        let snapshot = collector.finish();
        let summary = snapshot.summary();
        assert_eq!(summary.modules, 1);
        assert_eq!(summary.blocks, 2);
        assert_eq!(summary.covered_bytes, 22);
        assert_eq!(
            snapshot.coverage.blocks[&BlockKey { address: 0x401000, size: 16 }].executions,
            2
        );
        assert_eq!(snapshot.process.command_line, "app.exe --run");
    }

    #[test]
    fn test_module_load_log_keeps_every_load() {
        let collector = collector(&CollectorConfig::default());
        collector.on_module_loaded(0x1000, 0x2000, r"C:\a\util.dll");
        collector.on_module_loaded(0x5000, 0x6000, r"C:\b\util.dll");

        let snapshot = collector.finish();
        assert_eq!(snapshot.modules.len(), 1);
        assert_eq!(snapshot.module_loads.len(), 2);
    }
}
