//! # Event Processing
//!
//! Routes host events to the matching [`Collector`] handler.
//!
//! ## Event Routing
//!
//! - `ModuleLoaded` → module table and load log
//! - `ThreadStart` / `ThreadEnd` → thread counter and call contexts
//! - `BasicBlock` → block table
//! - `Call` / `RoutineEntered` → routine table (and call log for `Call`)
//! - `Return` → call context
//! - `ProcessExit` → reported to the caller, which stops delivery
//!
//! One processor is used per delivering thread; per-kind counters are merged
//! at exit for diagnostics.

use coverager_common::{EventKind, HostEvent};
use log::debug;
use std::collections::BTreeMap;

use super::Collector;
use crate::domain::Tid;

/// Outcome of processing one event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    /// The host reported process exit with this code
    Exit(i32),
}

/// Per-kind event counters
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct EventStats {
    counts: BTreeMap<EventKind, u64>,
}

impl EventStats {
    pub fn record(&mut self, kind: EventKind) {
        *self.counts.entry(kind).or_insert(0) += 1;
    }

    #[must_use]
    pub fn count(&self, kind: EventKind) -> u64 {
        self.counts.get(&kind).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }

    pub fn merge(&mut self, other: &EventStats) {
        for (kind, count) in &other.counts {
            *self.counts.entry(*kind).or_insert(0) += count;
        }
    }

    /// Log the counters at debug level
    pub fn log(&self) {
        debug!("events: {} total", self.total());
        for (kind, count) in &self.counts {
            debug!("  {kind:?}: {count}");
        }
    }
}

/// Dispatches host events onto a shared collector
pub struct EventProcessor<'a> {
    collector: &'a Collector,
    pub stats: EventStats,
}

impl<'a> EventProcessor<'a> {
    #[must_use]
    pub fn new(collector: &'a Collector) -> Self {
        Self { collector, stats: EventStats::default() }
    }

    /// Process a single event
    pub fn process_event(&mut self, event: &HostEvent) -> Flow {
        self.stats.record(event.kind());

        match *event {
            HostEvent::ModuleLoaded { low, high, ref path } => {
                self.collector.on_module_loaded(low, high, path);
            }
            HostEvent::ThreadStart { tid } => self.collector.on_thread_start(Tid(tid)),
            HostEvent::ThreadEnd { tid } => self.collector.on_thread_end(Tid(tid)),
            HostEvent::BasicBlock { address, size, instructions, .. } => {
                self.collector.on_basic_block(address, size, instructions);
            }
            HostEvent::Call { tid, instruction, target } => {
                self.collector.on_call(Tid(tid), instruction, target);
            }
            HostEvent::Return { tid, instruction } => {
                self.collector.on_return(Tid(tid), instruction);
            }
            HostEvent::RoutineEntered { tid, address } => {
                self.collector.on_routine_entered(Tid(tid), address);
            }
            HostEvent::ProcessExit { code } => return Flow::Exit(code),
        }

        Flow::Continue
    }
}
