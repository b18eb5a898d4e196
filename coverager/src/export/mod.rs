//! Report export
//!
//! Renders the collected state into flat text artifacts at process exit.
//! All numbers use the fixed-width hex rendering from [`format`].

pub mod format;
pub mod report;

pub use report::{Artifact, ReportOutcome, ReportWriter};
