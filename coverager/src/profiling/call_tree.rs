//! # Per-Thread Call Tracking
//!
//! Keeps one call stack per live thread and writes every observed call edge
//! to that thread's log as `<caller>:<target>`. A downstream call-graph tool
//! reassembles the tree from the edge list; the stack only exists to know
//! which caller to pair with each call.
//!
//! ## Thread Lifecycle
//!
//! ```text
//! ABSENT ──thread start──▶ ACTIVE ──thread end──▶ ABSENT (log closed)
//! ```
//!
//! A host may hand out an id again once its thread ended. Each thread that
//! runs under a reused id writes to its own numbered log, so earlier logs are
//! never truncated.
//!
//! Every stack starts with the [`ROOT_FRAME`] sentinel, standing for "no caller".
//! A return at the root frame is ignored: returns out of the thread entry
//! point are expected and not an error.
//!
//! Calls and returns the host does not observe (tail calls, exceptions,
//! unwinding) leave the stack unbalanced; later edges then carry a stale
//! caller. The log is an over-approximation in that case.
//!
//! ## Synchronization
//!
//! The registry of contexts is shared: thread start/end take its write lock,
//! call/return events take the read lock just long enough to clone the
//! context handle. The context mutex itself is only ever taken by the owning
//! thread, so it is never contended.

use coverager_common::UNRESOLVED_TARGET;
use log::{debug, warn};
use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use crate::config::ReportPaths;
use crate::domain::Tid;
use crate::export::format::hex;

/// Synthetic caller address of a thread's outermost frame
pub const ROOT_FRAME: u64 = 0;

/// Call stack and edge log of one thread
#[derive(Debug)]
pub struct ThreadCallContext {
    tid: Tid,
    log: Option<BufWriter<File>>,
    stack: Vec<u64>,
}

impl ThreadCallContext {
    /// Create a context without a log file
    #[must_use]
    pub fn new(tid: Tid) -> Self {
        Self { tid, log: None, stack: vec![ROOT_FRAME] }
    }

    /// Create a context logging to `path`
    ///
    /// If the log cannot be created the context still tracks the stack, but
    /// this thread's edges are not recorded.
    #[must_use]
    pub fn with_log(tid: Tid, path: &Path) -> Self {
        let mut context = Self::new(tid);
        match open_log(tid, path) {
            Ok(log) => context.log = Some(log),
            Err(e) => warn!("Call logging disabled for {tid}: cannot create {}: {e}", path.display()),
        }
        context
    }

    #[must_use]
    pub fn tid(&self) -> Tid {
        self.tid
    }

    /// Current stack, root frame first
    #[must_use]
    pub fn stack(&self) -> &[u64] {
        &self.stack
    }

    #[must_use]
    pub fn is_logging(&self) -> bool {
        self.log.is_some()
    }

    /// Record a call edge from the current top of stack to `target`, then
    /// make `target` the current frame
    pub fn record_call(&mut self, target: u64) {
        let caller = self.stack.last().copied().unwrap_or(ROOT_FRAME);

        if let Some(log) = self.log.as_mut() {
            if let Err(e) = writeln!(log, "{}:{}", hex(caller), hex(target)) {
                warn!("Call logging disabled for {}: write failed: {e}", self.tid);
                self.log = None;
            }
        }

        self.stack.push(target);
    }

    /// Leave the current frame; a return at the root frame is ignored
    pub fn record_return(&mut self) {
        if self.stack.len() > 1 {
            self.stack.pop();
        }
    }

    /// Flush and close the log; the stack is left as is
    ///
    /// # Errors
    /// Returns an error if buffered edges could not be written out
    pub fn close(&mut self) -> io::Result<()> {
        match self.log.take() {
            Some(mut log) => log.flush(),
            None => Ok(()),
        }
    }
}

fn open_log(tid: Tid, path: &Path) -> io::Result<BufWriter<File>> {
    let mut log = BufWriter::new(File::create(path)?);
    writeln!(log, "# thread {}", tid.0)?;
    Ok(log)
}

type ContextHandle = Arc<Mutex<ThreadCallContext>>;

fn lock(context: &ContextHandle) -> MutexGuard<'_, ThreadCallContext> {
    context.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Registry of per-thread call contexts
#[derive(Debug)]
pub struct CallTreeTracker {
    /// Output locations; `None` when call-tree logging is disabled
    paths: Option<ReportPaths>,
    contexts: RwLock<HashMap<Tid, ContextHandle>>,
    /// Threads started so far under each id, for call log numbering
    lifetimes: Mutex<HashMap<Tid, u32>>,
    threads_started: AtomicU64,
}

impl CallTreeTracker {
    /// Create a tracker; contexts are only created when `paths` is given
    #[must_use]
    pub fn new(paths: Option<ReportPaths>) -> Self {
        Self {
            paths,
            contexts: RwLock::new(HashMap::new()),
            lifetimes: Mutex::new(HashMap::new()),
            threads_started: AtomicU64::new(0),
        }
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.paths.is_some()
    }

    /// Number of thread starts observed, whether or not logging is enabled
    #[must_use]
    pub fn threads_started(&self) -> u64 {
        self.threads_started.load(Ordering::Relaxed)
    }

    /// Number of threads with a live context
    #[must_use]
    pub fn active_threads(&self) -> usize {
        self.contexts.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn on_thread_start(&self, tid: Tid) {
        self.threads_started.fetch_add(1, Ordering::Relaxed);

        let Some(paths) = &self.paths else {
            return;
        };

        let lifetime = {
            let mut lifetimes = self.lifetimes.lock().unwrap_or_else(PoisonError::into_inner);
            let count = lifetimes.entry(tid).or_insert(0);
            *count += 1;
            *count
        };

        let context = ThreadCallContext::with_log(tid, &paths.call_log_for(tid, lifetime));
        let previous = self
            .contexts
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(tid, Arc::new(Mutex::new(context)));

        debug!("Call tracking started for {tid}");

        // The host reused an id without reporting the end of the first thread.
        if let Some(previous) = previous {
            warn!("{tid} started again without ending; closing its previous call log");
            close_handle(previous);
        }
    }

    /// Close and forget the thread's context; no-op if it has none
    pub fn on_thread_end(&self, tid: Tid) {
        let removed = self.contexts.write().unwrap_or_else(PoisonError::into_inner).remove(&tid);

        if let Some(handle) = removed {
            debug!("Call tracking finished for {tid}");
            close_handle(handle);
        }
    }

    /// Record a call to a resolved, non-zero `target` on `tid`
    pub fn on_call(&self, tid: Tid, target: u64) {
        if target == UNRESOLVED_TARGET {
            return;
        }
        if let Some(context) = self.context(tid) {
            lock(&context).record_call(target);
        }
    }

    pub fn on_return(&self, tid: Tid) {
        if let Some(context) = self.context(tid) {
            lock(&context).record_return();
        }
    }

    /// Snapshot of a thread's current call stack, root frame first
    #[must_use]
    pub fn call_stack(&self, tid: Tid) -> Option<Vec<u64>> {
        self.context(tid).map(|context| lock(&context).stack().to_vec())
    }

    /// Close the logs of threads that never reported their end
    pub fn close_all(&self) {
        let remaining: Vec<ContextHandle> = self
            .contexts
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .drain()
            .map(|(_, handle)| handle)
            .collect();

        if !remaining.is_empty() {
            debug!("Closing {} call logs of threads still alive at exit", remaining.len());
        }
        for handle in remaining {
            close_handle(handle);
        }
    }

    fn context(&self, tid: Tid) -> Option<ContextHandle> {
        self.contexts.read().unwrap_or_else(PoisonError::into_inner).get(&tid).cloned()
    }
}

impl Drop for CallTreeTracker {
    fn drop(&mut self) {
        self.close_all();
    }
}

fn close_handle(handle: ContextHandle) {
    // An in-flight event may still hold a clone; it keeps the stack but loses the log.
    let mut context = lock(&handle);
    let tid = context.tid();
    if let Err(e) = context.close() {
        warn!("Failed to flush call log for {tid}: {e}");
    }
}
