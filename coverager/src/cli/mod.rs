//! Command-line interface of the `coverager` binary

pub mod args;

pub use args::Args;
