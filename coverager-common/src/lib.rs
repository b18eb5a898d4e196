//! # Shared Event Interface (Instrumentation Host ↔ Collector)
//!
//! Defines the events an instrumentation host delivers to the coverage
//! collector. The host decides *where* to insert callbacks (basic blocks,
//! call and return instructions, routine entries) and delivers thread and
//! module lifecycle notifications; the collector only consumes these events.
//!
//! ## Delivery Model
//!
//! Thread-scoped events (basic block, call, return, routine entry, thread
//! start/end) are delivered synchronously on the executing thread of the
//! target process. Process-scoped events (module load, process exit) carry no
//! thread id.
//!
//! ## Key Types
//!
//! - [`HostEvent`] - One notification from the host
//! - [`EventKind`] - Field-less discriminant, used for per-kind counters
//!
//! With the `serde` feature enabled, events serialize as internally tagged JSON
//! objects: `{"event":"call","tid":1,"instruction":4198416,"target":4202496}`.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

// ============================================================================
// Constants
// ============================================================================

/// Branch target reported for call instructions the host could not resolve
/// at instrumentation time (indirect calls through a register, for instance).
///
/// Calls with this target are ignored by the collector.
pub const UNRESOLVED_TARGET: u64 = 0;

// ============================================================================
// Events
// ============================================================================

/// Event delivered by the instrumentation host
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "event", rename_all = "snake_case"))]
pub enum HostEvent {
    /// An executable image was mapped at `[low, high)`
    ///
    /// `path` is the full path as reported by the host loader.
    ModuleLoaded { low: u64, high: u64, path: String },

    /// A thread of the target process is about to run its first instruction
    ThreadStart { tid: u32 },

    /// A thread of the target process has finished
    ThreadEnd { tid: u32 },

    /// A basic block is about to execute
    ///
    /// `size` is the instrumented length in bytes, `instructions` the number
    /// of instructions in the block. Both are static properties of the block
    /// as sliced by the host.
    BasicBlock { tid: u32, address: u64, size: u32, instructions: u32 },

    /// A call instruction at `instruction` is about to transfer to `target`
    ///
    /// **Value** of `target`:
    /// - Non-zero: resolved branch target
    /// - [`UNRESOLVED_TARGET`]: unknown at instrumentation time (ignored)
    Call { tid: u32, instruction: u64, target: u64 },

    /// A return instruction at `instruction` is about to execute
    Return { tid: u32, instruction: u64 },

    /// The first instruction of a routine known to the host symbol table
    /// is about to execute
    RoutineEntered { tid: u32, address: u64 },

    /// The target process has exited; no further events follow
    ProcessExit { code: i32 },
}

/// Discriminant of a [`HostEvent`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EventKind {
    ModuleLoaded,
    ThreadStart,
    ThreadEnd,
    BasicBlock,
    Call,
    Return,
    RoutineEntered,
    ProcessExit,
}

impl HostEvent {
    /// Thread that delivers this event, `None` for process-scoped events
    #[must_use]
    pub fn tid(&self) -> Option<u32> {
        match *self {
            Self::ThreadStart { tid }
            | Self::ThreadEnd { tid }
            | Self::BasicBlock { tid, .. }
            | Self::Call { tid, .. }
            | Self::Return { tid, .. }
            | Self::RoutineEntered { tid, .. } => Some(tid),
            Self::ModuleLoaded { .. } | Self::ProcessExit { .. } => None,
        }
    }

    #[must_use]
    pub fn kind(&self) -> EventKind {
        match self {
            Self::ModuleLoaded { .. } => EventKind::ModuleLoaded,
            Self::ThreadStart { .. } => EventKind::ThreadStart,
            Self::ThreadEnd { .. } => EventKind::ThreadEnd,
            Self::BasicBlock { .. } => EventKind::BasicBlock,
            Self::Call { .. } => EventKind::Call,
            Self::Return { .. } => EventKind::Return,
            Self::RoutineEntered { .. } => EventKind::RoutineEntered,
            Self::ProcessExit { .. } => EventKind::ProcessExit,
        }
    }
}
