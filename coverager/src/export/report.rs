//! Report rendering and file output
//!
//! Every artifact is rendered by a function taking any `Write`, so the same
//! code serves files and in-memory buffers. [`ReportWriter`] writes all
//! artifacts of one run; an artifact whose file cannot be created or written
//! is skipped without affecting the others.
//!
//! ## Line Formats
//!
//! ```text
//! summary    [coverage] section of `key = value ; comment` lines
//! blocks     <address>:<size>:<instructions>:<symbol>:<executions>
//! routines   <address>:<symbol>:<calls>
//! modules    <low>:<high>:<full path>
//! loads      <full path>
//! ```

use log::{info, warn};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use super::format::hex;
use crate::config::ReportPaths;
use crate::domain::ReportError;
use crate::profiling::ProcessSnapshot;
use crate::symbolization::SymbolResolver;

/// Report artifacts written at process exit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Artifact {
    Summary,
    Blocks,
    Routines,
    Modules,
    ModuleLoads,
}

impl Artifact {
    pub const ALL: [Artifact; 5] =
        [Self::Summary, Self::Blocks, Self::Routines, Self::Modules, Self::ModuleLoads];

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Summary => "summary",
            Self::Blocks => "blocks",
            Self::Routines => "routines",
            Self::Modules => "modules",
            Self::ModuleLoads => "module loads",
        }
    }

    #[must_use]
    pub fn path(self, paths: &ReportPaths) -> PathBuf {
        match self {
            Self::Summary => paths.summary(),
            Self::Blocks => paths.blocks(),
            Self::Routines => paths.routines(),
            Self::Modules => paths.modules(),
            Self::ModuleLoads => paths.module_loads(),
        }
    }

    /// Render this artifact from a snapshot
    ///
    /// # Errors
    /// Returns an error if writing to `out` fails
    pub fn render<W: Write>(self, snapshot: &ProcessSnapshot, out: &mut W) -> io::Result<()> {
        match self {
            Self::Summary => write_summary(snapshot, out),
            Self::Blocks => write_blocks(snapshot, out),
            Self::Routines => write_routines(snapshot, out),
            Self::Modules => write_modules(snapshot, out),
            Self::ModuleLoads => write_module_loads(snapshot, out),
        }
    }
}

/// Write the summary section
///
/// # Errors
/// Returns an error if writing to `out` fails
pub fn write_summary<W: Write>(snapshot: &ProcessSnapshot, out: &mut W) -> io::Result<()> {
    let summary = snapshot.summary();

    writeln!(out, "[coverage]")?;
    writeln!(out, "pid = {} ; process id", snapshot.process.pid.0)?;
    // Debug formatting quotes the command line so `;` inside it stays unambiguous.
    writeln!(out, "command_line = {:?} ; original command line", snapshot.process.command_line)?;
    writeln!(out, "threads = {} ; number of threads", summary.threads)?;
    writeln!(out, "modules = {} ; number of modules", summary.modules)?;
    writeln!(out, "routines = {} ; number of distinct call targets", summary.routines)?;
    writeln!(out, "blocks = {} ; number of distinct basic blocks", summary.blocks)?;
    writeln!(
        out,
        "coverage_size = {} ; bytes in distinct basic blocks",
        hex(summary.covered_bytes)
    )?;
    writeln!(out, "elapsed = {:.3} ; seconds since process start", summary.elapsed_secs)?;
    Ok(())
}

/// Write one line per distinct basic block, in address order
///
/// # Errors
/// Returns an error if writing to `out` fails
pub fn write_blocks<W: Write>(snapshot: &ProcessSnapshot, out: &mut W) -> io::Result<()> {
    let resolver = SymbolResolver::new(&snapshot.modules);

    for (key, stats) in &snapshot.coverage.blocks {
        writeln!(
            out,
            "{}:{}:{}:{}:{}",
            hex(key.address),
            hex(u64::from(key.size)),
            stats.instructions,
            resolver.resolve(key.address),
            stats.executions
        )?;
    }
    Ok(())
}

/// Write one line per distinct call target, in address order
///
/// # Errors
/// Returns an error if writing to `out` fails
pub fn write_routines<W: Write>(snapshot: &ProcessSnapshot, out: &mut W) -> io::Result<()> {
    let resolver = SymbolResolver::new(&snapshot.modules);

    for (&address, calls) in &snapshot.coverage.routines {
        writeln!(out, "{}:{}:{}", hex(address), resolver.resolve(address), calls)?;
    }
    Ok(())
}

/// Write one line per module table entry, in short-name order
///
/// # Errors
/// Returns an error if writing to `out` fails
pub fn write_modules<W: Write>(snapshot: &ProcessSnapshot, out: &mut W) -> io::Result<()> {
    for (_, record) in snapshot.modules.iter() {
        writeln!(out, "{}:{}:{}", hex(record.range.start), hex(record.range.end), record.path)?;
    }
    Ok(())
}

/// Write every reported module path in load order
///
/// # Errors
/// Returns an error if writing to `out` fails
pub fn write_module_loads<W: Write>(snapshot: &ProcessSnapshot, out: &mut W) -> io::Result<()> {
    for path in snapshot.module_loads.iter() {
        writeln!(out, "{path}")?;
    }
    Ok(())
}

/// Result of writing the reports of one run
#[derive(Debug, Default)]
pub struct ReportOutcome {
    pub written: Vec<PathBuf>,
    pub skipped: Vec<ReportError>,
}

/// Writes every artifact of a run to its file
#[derive(Debug, Clone)]
pub struct ReportWriter {
    paths: ReportPaths,
}

impl ReportWriter {
    #[must_use]
    pub fn new(paths: ReportPaths) -> Self {
        Self { paths }
    }

    /// Write all artifacts, skipping the ones that fail
    pub fn write_all(&self, snapshot: &ProcessSnapshot) -> ReportOutcome {
        let mut outcome = ReportOutcome::default();

        for artifact in Artifact::ALL {
            match self.write_artifact(artifact, snapshot) {
                Ok(path) => {
                    info!("Wrote {} report to {}", artifact.name(), path.display());
                    outcome.written.push(path);
                }
                Err(e) => {
                    warn!("Skipping {} report: {e}", artifact.name());
                    outcome.skipped.push(e);
                }
            }
        }

        outcome
    }

    /// Write a single artifact, truncating any previous file
    ///
    /// # Errors
    /// Returns an error if the file cannot be created or written
    pub fn write_artifact(
        &self,
        artifact: Artifact,
        snapshot: &ProcessSnapshot,
    ) -> Result<PathBuf, ReportError> {
        let path = artifact.path(&self.paths);
        let file = File::create(&path)
            .map_err(|source| ReportError::CreateFailed { path: path.clone(), source })?;

        let mut out = BufWriter::new(file);
        artifact
            .render(snapshot, &mut out)
            .and_then(|()| out.flush())
            .map_err(|source| ReportError::WriteFailed { artifact: artifact.name(), source })?;

        Ok(path)
    }
}
