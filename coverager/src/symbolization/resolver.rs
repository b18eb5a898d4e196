use super::module_table::ModuleTable;

/// Resolves absolute addresses to `"<module>+<offset>"` display strings
///
/// Resolution runs only while reports are written, so a linear scan of the
/// module table is sufficient. The resolver borrows the table and keeps no
/// state of its own.
#[derive(Debug, Clone, Copy)]
pub struct SymbolResolver<'a> {
    modules: &'a ModuleTable,
}

impl<'a> SymbolResolver<'a> {
    #[must_use]
    pub fn new(modules: &'a ModuleTable) -> Self {
        Self { modules }
    }

    /// Resolve an address to a symbolic name
    ///
    /// Returns `"<module>+0x<offset>"` for the module whose range strictly
    /// contains the address, otherwise `"?0x<address>"`.
    #[must_use]
    pub fn resolve(&self, addr: u64) -> String {
        self.modules
            .iter()
            .find(|(_, record)| record.range.contains_strictly(addr))
            .map_or_else(
                || format!("?{addr:#x}"),
                |(name, record)| format!("{name}+{:#x}", addr - record.range.start),
            )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> ModuleTable {
        let mut table = ModuleTable::new();
        table.insert(0x1000, 0x2000, r"C:\app\mod.dll");
        table.insert(0x400000, 0x410000, "app.exe");
        table
    }

    #[test]
    fn test_resolve_inside_module() {
        let modules = table();
        let resolver = SymbolResolver::new(&modules);
        assert_eq!(resolver.resolve(0x1500), "mod.dll+0x500");
        assert_eq!(resolver.resolve(0x402000), "app.exe+0x2000");
    }

    #[test]
    fn test_resolve_bounds_are_unknown() {
        let modules = table();
        let resolver = SymbolResolver::new(&modules);
        assert_eq!(resolver.resolve(0x1000), "?0x1000");
        assert_eq!(resolver.resolve(0x2000), "?0x2000");
    }

    #[test]
    fn test_resolve_without_modules() {
        let modules = ModuleTable::new();
        let resolver = SymbolResolver::new(&modules);
        assert_eq!(resolver.resolve(0xdead_beef), "?0xdeadbeef");
    }
}
