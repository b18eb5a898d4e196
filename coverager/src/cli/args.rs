//! CLI argument definitions

use clap::Parser;
use std::path::PathBuf;

use crate::config::{CollectorConfig, DEFAULT_BASE_NAME};
use crate::domain::{Pid, ProcessInfo};

#[derive(Parser, Debug)]
#[command(
    name = "coverager",
    version,
    about = "Collect basic-block coverage and call edges from instrumentation host events",
    after_help = "\
EXAMPLES:
    coverager events.jsonl                       Write coverager.log* to the current directory
    coverager -d out -o run --call-tree ev.jsonl Also write out/run.<tid>.calls per thread
    host-shim | coverager --pid 1234             Read events from stdin"
)]
pub struct Args {
    /// JSON-lines event file (reads stdin if omitted)
    #[arg(value_name = "EVENTS")]
    pub events: Option<PathBuf>,

    /// Output base name; other artifacts append .blocks, .routines, ...
    #[arg(short, long, default_value = DEFAULT_BASE_NAME)]
    pub output: String,

    /// Output directory
    #[arg(short, long, default_value = ".")]
    pub dir: PathBuf,

    /// Write one call-edge log per thread
    #[arg(long)]
    pub call_tree: bool,

    /// Process ID of the target, for the summary
    #[arg(short, long, default_value = "0")]
    pub pid: u32,

    /// Command line of the target, for the summary
    #[arg(long, value_name = "STRING", default_value = "")]
    pub command_line: String,

    /// Suppress non-essential output
    #[arg(short, long)]
    pub quiet: bool,
}

impl Args {
    #[must_use]
    pub fn collector_config(&self) -> CollectorConfig {
        CollectorConfig::new(&self.dir, &self.output).with_call_tree(self.call_tree)
    }

    #[must_use]
    pub fn process_info(&self) -> ProcessInfo {
        ProcessInfo::new(Pid(self.pid), &self.command_line)
    }
}
