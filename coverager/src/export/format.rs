//! Fixed-width number rendering shared by every report artifact

use std::fmt;

/// Minimum number of hex digits after the `0x` prefix
pub const HEX_DIGITS: usize = 8;

/// Address or size rendered as `0x` + zero-padded lowercase hex
///
/// Values wider than [`HEX_DIGITS`] digits render at their natural width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hex(pub u64);

impl fmt::Display for Hex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#0width$x}", self.0, width = HEX_DIGITS + 2)
    }
}

#[must_use]
pub fn hex(value: u64) -> Hex {
    Hex(value)
}
