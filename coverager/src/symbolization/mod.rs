//! # Symbol Resolution
//!
//! Converts raw addresses recorded during collection into strings a reader
//! (or a call-graph converter) can attribute to a module.
//!
//! ## Address Translation
//!
//! ```text
//! 1. Host reports module load
//!    app.exe loaded at: 0x400000 - 0x410000
//!
//! 2. Report writer asks for address 0x402000
//!
//! 3. Find the module whose range strictly contains the address
//!    0x400000 < 0x402000 < 0x410000  →  app.exe
//!
//! 4. Offset = address - module start = 0x2000
//!    → "app.exe+0x2000"
//! ```
//!
//! Addresses outside every module (JIT code, stubs, or addresses exactly on a
//! module bound) render as `"?0x<address>"`.
//!
//! ## Module Structure
//!
//! - **`module_table`**: module ranges keyed by short name, and the load log
//! - **`resolver`**: the address → name lookup over a module table

pub mod module_table;
pub mod resolver;

pub use module_table::{short_name, ModuleLoadLog, ModuleRange, ModuleRecord, ModuleTable};
pub use resolver::SymbolResolver;
