//! # Event Replay
//!
//! Feeds a recorded stream of host events (JSON lines) into a [`Collector`]
//! using the same threading model as a live host: every target thread gets its
//! own OS thread, and its events run inline on that thread in order.
//!
//! ## Dispatch
//!
//! ```text
//!              ┌──────────────┐   ThreadStart{tid} spawns a worker
//!  JSON lines ─▶│  dispatcher  │──────────────────────────────────┐
//!              └──────┬───────┘                                  ▼
//!                     │ ModuleLoaded, ProcessExit,     ┌──────────────────┐
//!                     │ events of unknown threads      │ worker (tid = 1) │ ...
//!                     ▼                                └──────────────────┘
//!                 Collector ◀───────── thread-scoped events ─────┘
//! ```
//!
//! Per-thread order is preserved; order across threads is not. Events for a
//! thread id that never reported a start run on the dispatcher so they are
//! still counted. `ProcessExit` (or end of input) stops delivery and joins
//! every worker.

use coverager_common::HostEvent;
use crossbeam_channel::{bounded, Sender};
use log::{debug, warn};
use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;
use std::thread::{self, ScopedJoinHandle};

use crate::domain::ReplayError;
use crate::profiling::{Collector, EventProcessor, EventStats, Flow};

/// Events buffered per worker before the dispatcher waits
const WORKER_QUEUE_DEPTH: usize = 1024;

/// Summary of one replay
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReplayOutcome {
    /// Exit code from `ProcessExit`, `None` if the input ended first
    pub exit_code: Option<i32>,
    /// Events processed, by kind, across all threads
    pub stats: EventStats,
    /// Number of worker threads spawned
    pub workers: usize,
}

/// Open an event source: a file, or stdin when `path` is `None`
///
/// # Errors
/// Returns an error if the file cannot be opened
pub fn open_events(path: Option<&Path>) -> io::Result<Box<dyn BufRead>> {
    Ok(match path {
        Some(path) => Box::new(BufReader::new(File::open(path)?)),
        None => Box::new(BufReader::new(io::stdin())),
    })
}

fn parse_line(line: &str, number: usize) -> Result<Option<HostEvent>, ReplayError> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }
    serde_json::from_str(line)
        .map(Some)
        .map_err(|source| ReplayError::MalformedEvent { line: number, source })
}

struct Worker<'scope> {
    tx: Sender<HostEvent>,
    handle: ScopedJoinHandle<'scope, EventStats>,
}

fn join(tid: u32, handle: ScopedJoinHandle<'_, EventStats>) -> Result<EventStats, ReplayError> {
    handle.join().map_err(|_| ReplayError::WorkerPanicked(tid))
}

/// Replay every event from `input` into `collector`
///
/// # Errors
/// Returns an error on unreadable input, a malformed line, or a worker panic.
/// Events before the failing line have already been applied.
pub fn replay<R: BufRead>(collector: &Collector, input: R) -> Result<ReplayOutcome, ReplayError> {
    thread::scope(|scope| -> Result<ReplayOutcome, ReplayError> {
        let mut dispatcher = EventProcessor::new(collector);
        let mut live: HashMap<u32, Worker<'_>> = HashMap::new();
        let mut finished: Vec<(u32, ScopedJoinHandle<'_, EventStats>)> = Vec::new();
        let mut outcome = ReplayOutcome::default();

        for (index, line) in input.lines().enumerate() {
            let Some(event) = parse_line(&line?, index + 1)? else {
                continue;
            };

            let Some(tid) = event.tid() else {
                if let Flow::Exit(code) = dispatcher.process_event(&event) {
                    outcome.exit_code = Some(code);
                    break;
                }
                continue;
            };

            if matches!(event, HostEvent::ThreadStart { .. }) {
                // The host reused an id without ending the previous thread;
                // its queued events must land before the new context exists.
                if let Some(Worker { tx, handle }) = live.remove(&tid) {
                    warn!("Thread {tid} started again before it ended");
                    drop(tx);
                    dispatcher.stats.merge(&join(tid, handle)?);
                }

                let (tx, rx) = bounded::<HostEvent>(WORKER_QUEUE_DEPTH);
                let handle = scope.spawn(move || {
                    let mut processor = EventProcessor::new(collector);
                    for event in rx {
                        processor.process_event(&event);
                    }
                    processor.stats
                });
                debug!("Spawned replay worker for thread {tid}");
                live.insert(tid, Worker { tx, handle });
                outcome.workers += 1;
            }

            let is_end = matches!(event, HostEvent::ThreadEnd { .. });
            match live.get(&tid) {
                Some(worker) => {
                    if let Err(returned) = worker.tx.send(event) {
                        // The worker is gone; only a panic ends it early.
                        dispatcher.process_event(&returned.0);
                    }
                    if is_end {
                        if let Some(worker) = live.remove(&tid) {
                            finished.push((tid, worker.handle));
                        }
                    }
                }
                None => {
                    dispatcher.process_event(&event);
                }
            }
        }

        // Closing the channels lets the remaining workers drain and exit.
        finished.extend(live.into_iter().map(|(tid, worker)| (tid, worker.handle)));

        outcome.stats = dispatcher.stats;
        for (tid, handle) in finished {
            outcome.stats.merge(&join(tid, handle)?);
        }

        Ok(outcome)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CollectorConfig;
    use crate::domain::{ProcessInfo, Tid};
    use coverager_common::EventKind;

    fn collector() -> Collector {
        Collector::new(&CollectorConfig::default(), ProcessInfo::default())
    }

    #[test]
    fn test_parse_skips_blank_and_comment_lines() {
        assert!(parse_line("   ", 1).unwrap().is_none());
        assert!(parse_line("# recorded by host shim", 2).unwrap().is_none());
        assert_eq!(
            parse_line(r#"{"event":"thread_start","tid":4}"#, 3).unwrap(),
            Some(HostEvent::ThreadStart { tid: 4 })
        );
    }

    #[test]
    fn test_malformed_line_reports_line_number() {
        let input = "{\"event\":\"thread_start\",\"tid\":1}\n{\"event\":\"bogus\"}\n";
        let err = replay(&collector(), input.as_bytes()).unwrap_err();
        assert!(matches!(err, ReplayError::MalformedEvent { line: 2, .. }));
    }

    #[test]
    fn test_replay_stops_at_process_exit() {
        let input = r#"{"event":"thread_start","tid":1}
{"event":"basic_block","tid":1,"address":4198400,"size":16,"instructions":4}
{"event":"thread_end","tid":1}
{"event":"process_exit","code":5}
{"event":"basic_block","tid":2,"address":4198400,"size":16,"instructions":4}
"#;
        let collector = collector();
        let outcome = replay(&collector, input.as_bytes()).unwrap();

        assert_eq!(outcome.exit_code, Some(5));
        assert_eq!(outcome.workers, 1);
        assert_eq!(outcome.stats.count(EventKind::BasicBlock), 1);
        assert_eq!(outcome.stats.total(), 4);

        let snapshot = collector.finish();
        assert_eq!(snapshot.coverage.blocks.values().next().unwrap().executions, 1);
    }

    #[test]
    fn test_reused_thread_id_drains_previous_worker_first() {
        let dir = tempfile::tempdir().unwrap();
        let config = CollectorConfig::new(dir.path(), "run").with_call_tree(true);
        let collector = Collector::new(&config, ProcessInfo::default());

        let mut input = String::from("{\"event\":\"thread_start\",\"tid\":1}\n");
        for i in 0..1000 {
            input.push_str(&format!(
                "{{\"event\":\"call\",\"tid\":1,\"instruction\":4096,\"target\":{}}}\n",
                8192 + i
            ));
        }
        input.push_str("{\"event\":\"thread_start\",\"tid\":1}\n{\"event\":\"thread_end\",\"tid\":1}\n");

        let outcome = replay(&collector, input.as_bytes()).unwrap();
        assert_eq!(outcome.workers, 2);
        assert_eq!(outcome.stats.count(EventKind::Call), 1000);
        drop(collector.finish());

        let paths = config.report_paths();
        let first = std::fs::read_to_string(paths.call_log(Tid(1))).unwrap();
        let second = std::fs::read_to_string(paths.call_log_for(Tid(1), 2)).unwrap();
        assert_eq!(first.lines().count(), 1001);
        assert_eq!(second, "# thread 1\n");
    }

    #[test]
    fn test_events_of_unstarted_threads_are_counted() {
        let input = r#"{"event":"basic_block","tid":9,"address":4096,"size":4,"instructions":1}
{"event":"call","tid":9,"instruction":4100,"target":8192}
"#;
        let collector = collector();
        let outcome = replay(&collector, input.as_bytes()).unwrap();

        assert_eq!(outcome.exit_code, None);
        assert_eq!(outcome.workers, 0);
        let snapshot = collector.finish();
        assert_eq!(snapshot.coverage.blocks.len(), 1);
        assert_eq!(snapshot.coverage.routines[&8192], 1);
        assert_eq!(snapshot.threads, 0);
    }
}
