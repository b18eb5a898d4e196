//! Loaded module bookkeeping
//!
//! Records, for every image the host reports as loaded, its short name, full
//! path and address range. Two views are kept:
//! - [`ModuleTable`]: keyed by short name, ordered by name, used for symbol
//!   resolution and the modules report
//! - [`ModuleLoadLog`]: every full path in load order, duplicates included

use log::warn;
use std::collections::BTreeMap;

/// Address range of a loaded module, `[start, end)` as reported by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModuleRange {
    pub start: u64,
    pub end: u64,
}

impl ModuleRange {
    /// Check if an address lies strictly inside this range
    ///
    /// Both bounds are excluded: an address equal to `start` or `end` is not
    /// attributed to the module.
    #[must_use]
    pub fn contains_strictly(&self, addr: u64) -> bool {
        addr > self.start && addr < self.end
    }
}

/// One entry of the module table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleRecord {
    pub range: ModuleRange,
    pub path: String,
}

/// Derive a module's short name from its full path
///
/// Strips everything up to the last path separator, accepting both `\` and `/`
/// since the host reports paths in the target platform's convention.
#[must_use]
pub fn short_name(path: &str) -> &str {
    path.rsplit(['\\', '/']).next().unwrap_or(path)
}

/// Loaded modules keyed by short name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModuleTable {
    modules: BTreeMap<String, ModuleRecord>,
}

impl ModuleTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a loaded module
    ///
    /// A second module with the same short name replaces the first one. The
    /// replacement is logged since later addresses of the first module will
    /// resolve as unknown.
    pub fn insert(&mut self, low: u64, high: u64, path: &str) {
        let name = short_name(path).to_string();
        let record = ModuleRecord { range: ModuleRange { start: low, end: high }, path: path.to_string() };

        if let Some(previous) = self.modules.insert(name, record) {
            if previous.path != path {
                warn!(
                    "Module short name collision: {} replaces {} in the module table",
                    path, previous.path
                );
            }
        }
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ModuleRecord> {
        self.modules.get(name)
    }

    /// Modules in ascending short-name order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ModuleRecord)> {
        self.modules.iter().map(|(name, record)| (name.as_str(), record))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

/// Full module paths in the order the host reported them
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModuleLoadLog {
    paths: Vec<String>,
}

impl ModuleLoadLog {
    pub fn push(&mut self, path: &str) {
        self.paths.push(path.to_string());
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.paths.iter().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}
