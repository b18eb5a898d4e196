//! # Coverager - Execution Coverage and Call-Edge Collector
//!
//! Coverager aggregates low-level execution events delivered by a dynamic
//! instrumentation host (basic-block entry, call, return, module load, thread
//! start/end) into per-address statistics, and writes deterministic text
//! reports when the target process exits.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      Target Process                             │
//! │               (any number of native threads)                    │
//! └───────────────────────┬─────────────────────────────────────────┘
//!                         │ executes
//!                         ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                  Instrumentation Host                           │
//! │  • Basic-block, call, return and routine-entry callbacks        │
//! │  • Module load and thread start/end notifications               │
//! └───────────────────────┬─────────────────────────────────────────┘
//!                         │ HostEvent (inline, on the executing thread)
//!                         ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                  Coverager (This Crate)                         │
//! │                                                                 │
//! │  ┌──────────────┐   ┌──────────────┐   ┌──────────────┐         │
//! │  │    Event     │──▶│  Collector   │──▶│   Snapshot   │         │
//! │  │  Processor   │   │ (profiling)  │   │ (at exit)    │         │
//! │  └──────────────┘   └──────────────┘   └──────┬───────┘         │
//! │                        │        │             │                 │
//! │              ┌─────────┘        │             ▼                 │
//! │              ▼                  ▼      ┌──────────────┐         │
//! │     ┌──────────────┐   ┌──────────────┐│    Export    │         │
//! │     │  Coverage    │   │  Call Tree   ││  (reports)   │         │
//! │     │  Aggregator  │   │  (per-thread)│└──────┬───────┘         │
//! │     └──────────────┘   └──────────────┘       │ resolves via    │
//! │                                               ▼                 │
//! │                                        ┌──────────────┐         │
//! │                                        │Symbolization │         │
//! │                                        └──────────────┘         │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Structure
//!
//! - [`profiling`]: everything that runs while the target executes
//!   - `coverage`: basic-block and routine counters
//!   - `call_tree`: per-thread call stacks and call-edge logs
//!   - `collector`: process-lifetime owner of all tables
//!   - `event_processor`: host event → collector handler dispatch
//!
//! - [`symbolization`]: module table and `"<module>+<offset>"` resolution
//!
//! - [`export`]: summary, blocks, routines, modules and load-log reports
//!
//! - [`replay`]: drive a collector from a recorded JSON-lines event stream
//!
//! - [`config`]: output naming and collector options
//!
//! - [`cli`]: command-line arguments of the `coverager` binary
//!
//! - [`domain`]: core domain types (Pid, Tid, ProcessInfo) and errors
//!
//! ## Output
//!
//! For an output base `coverager.log`:
//!
//! ```text
//! coverager.log            [coverage] summary
//! coverager.log.blocks     0x00401000:0x00000010:4:app.exe+0x1000:1
//! coverager.log.routines   0x00402000:app.exe+0x2000:1
//! coverager.log.modules    0x00400000:0x00410000:app.exe
//! coverager.log.loads      app.exe
//! coverager.log.1.calls    0x00000000:0x00402000   (with call tracking)
//! ```
//!
//! ## Typical Usage
//!
//! ```bash
//! # Replay a recorded event stream
//! coverager events.jsonl
//!
//! # Also log call edges per thread, into out/run.*
//! coverager -d out -o run --call-tree events.jsonl
//! ```

pub mod cli;
pub mod config;
pub mod domain;
pub mod export;
pub mod profiling;
pub mod replay;
pub mod symbolization;
