//! Domain types providing compile-time safety and self-documentation
//!
//! These newtype wrappers prevent passing a thread id where a process id is
//! expected and make the event handler signatures easier to read.

use std::fmt;

/// Process ID of the instrumented target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Pid(pub u32);

impl fmt::Display for Pid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PID:{}", self.0)
    }
}

/// Thread ID as reported by the instrumentation host
///
/// Ids may be reused by the host once the owning thread has ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Tid(pub u32);

impl fmt::Display for Tid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TID:{}", self.0)
    }
}

impl From<u32> for Tid {
    fn from(tid: u32) -> Self {
        Tid(tid)
    }
}

/// Identity of the target process, supplied by the host at startup
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessInfo {
    pub pid: Pid,
    pub command_line: String,
}

impl ProcessInfo {
    #[must_use]
    pub fn new(pid: Pid, command_line: impl Into<String>) -> Self {
        Self { pid, command_line: command_line.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tid_display() {
        assert_eq!(Tid(42).to_string(), "TID:42");
        assert_eq!(Tid::from(7), Tid(7));
    }

    #[test]
    fn test_pid_display() {
        assert_eq!(Pid(1234).to_string(), "PID:1234");
    }
}
