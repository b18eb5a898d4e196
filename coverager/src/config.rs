//! Collector configuration and output file naming
//!
//! The options are owned by whatever front end drives the collector (the
//! `coverager` binary parses them with clap); the core only reads them.

use std::path::{Path, PathBuf};

use crate::domain::Tid;

/// Default output base name, also used as the summary file name
pub const DEFAULT_BASE_NAME: &str = "coverager.log";

/// Options consumed by the collector
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectorConfig {
    /// Directory all artifacts are written to
    pub output_dir: PathBuf,
    /// Base file name; every artifact name is derived from it
    pub base_name: String,
    /// Write one call-edge log per thread
    pub call_tree: bool,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            base_name: DEFAULT_BASE_NAME.to_string(),
            call_tree: false,
        }
    }
}

impl CollectorConfig {
    #[must_use]
    pub fn new(output_dir: impl Into<PathBuf>, base_name: impl Into<String>) -> Self {
        Self { output_dir: output_dir.into(), base_name: base_name.into(), call_tree: false }
    }

    /// Enable or disable per-thread call-edge logging
    #[must_use]
    pub fn with_call_tree(mut self, enabled: bool) -> Self {
        self.call_tree = enabled;
        self
    }

    #[must_use]
    pub fn report_paths(&self) -> ReportPaths {
        ReportPaths { dir: self.output_dir.clone(), base: self.base_name.clone() }
    }
}

/// File locations of every artifact of one run
///
/// ```text
/// <dir>/<base>               summary
/// <dir>/<base>.blocks        basic blocks
/// <dir>/<base>.routines      call targets
/// <dir>/<base>.modules       module table
/// <dir>/<base>.loads         module load log
/// <dir>/<base>.<tid>.calls   per-thread call edges
/// <dir>/<base>.<tid>.<n>.calls n-th thread to run under a reused id
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportPaths {
    dir: PathBuf,
    base: String,
}

impl ReportPaths {
    fn with_suffix(&self, suffix: &str) -> PathBuf {
        self.dir.join(format!("{}{suffix}", self.base))
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    #[must_use]
    pub fn summary(&self) -> PathBuf {
        self.dir.join(&self.base)
    }

    #[must_use]
    pub fn blocks(&self) -> PathBuf {
        self.with_suffix(".blocks")
    }

    #[must_use]
    pub fn routines(&self) -> PathBuf {
        self.with_suffix(".routines")
    }

    #[must_use]
    pub fn modules(&self) -> PathBuf {
        self.with_suffix(".modules")
    }

    #[must_use]
    pub fn module_loads(&self) -> PathBuf {
        self.with_suffix(".loads")
    }

    /// Call log of the first thread to run under `tid`
    #[must_use]
    pub fn call_log(&self, tid: Tid) -> PathBuf {
        self.call_log_for(tid, 1)
    }

    /// Call log of the `lifetime`-th thread to run under `tid`, counting from 1
    #[must_use]
    pub fn call_log_for(&self, tid: Tid, lifetime: u32) -> PathBuf {
        if lifetime <= 1 {
            self.with_suffix(&format!(".{}.calls", tid.0))
        } else {
            self.with_suffix(&format!(".{}.{lifetime}.calls", tid.0))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CollectorConfig::default();
        assert_eq!(config.base_name, "coverager.log");
        assert!(!config.call_tree);
    }

    #[test]
    fn test_report_paths() {
        let paths = CollectorConfig::new("/tmp/out", "run").report_paths();
        assert_eq!(paths.summary(), PathBuf::from("/tmp/out/run"));
        assert_eq!(paths.blocks(), PathBuf::from("/tmp/out/run.blocks"));
        assert_eq!(paths.routines(), PathBuf::from("/tmp/out/run.routines"));
        assert_eq!(paths.modules(), PathBuf::from("/tmp/out/run.modules"));
        assert_eq!(paths.module_loads(), PathBuf::from("/tmp/out/run.loads"));
        assert_eq!(paths.call_log(Tid(3)), PathBuf::from("/tmp/out/run.3.calls"));
    }

    #[test]
    fn test_reused_thread_id_gets_numbered_call_log() {
        let paths = CollectorConfig::new("/tmp/out", "run").report_paths();
        assert_eq!(paths.call_log_for(Tid(3), 1), paths.call_log(Tid(3)));
        assert_eq!(paths.call_log_for(Tid(3), 2), PathBuf::from("/tmp/out/run.3.2.calls"));
    }
}
