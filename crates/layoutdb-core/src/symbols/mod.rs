//! # Symbols
//!
//! Symbol lookup in the binaries loaded by the inspected process.
//!
//! The database only ever asks one question: "where does symbol S of binary B
//! live at runtime?" ([`SymbolResolver::lookup`]). It uses the answer to find
//! vtables. Two resolvers ship with the crate:
//!
//! - [`SymbolTable`]: an in-memory map, filled by whoever already knows the
//!   addresses (a remote agent, a test).
//! - [`ImageSymbols`]: the symbol table of an ELF, Mach-O or PE file parsed
//!   with `object`, relocated to the image's runtime load address.

pub mod image;

use std::collections::HashMap;

pub use image::ImageSymbols;

use crate::types::Address;

/// Resolves `(binary, symbol)` pairs to runtime addresses.
///
/// Returning `None` means "not found", never "failed": resolvers are probed
/// speculatively with symbols that often do not exist.
pub trait SymbolResolver: Send + Sync
{
    /// Runtime address of `symbol` in the binary named `binary`.
    fn lookup(&self, binary: &str, symbol: &str) -> Option<Address>;
}

/// In-memory symbol table keyed by binary name, then symbol name.
///
/// ## Example
///
/// ```rust
/// use layoutdb_core::symbols::{SymbolResolver, SymbolTable};
/// use layoutdb_core::types::Address;
///
/// let mut table = SymbolTable::new();
/// table.insert("libjvm.so", "_ZTV6Thread", Address::new(0x7f00_1000));
///
/// assert_eq!(table.lookup("libjvm.so", "_ZTV6Thread"), Some(Address::new(0x7f00_1000)));
/// assert_eq!(table.lookup("libc.so.6", "_ZTV6Thread"), None);
/// ```
#[derive(Debug, Clone, Default)]
pub struct SymbolTable
{
    binaries: HashMap<String, HashMap<String, Address>>,
}

impl SymbolTable
{
    /// Create an empty table.
    #[must_use]
    pub fn new() -> Self
    {
        Self::default()
    }

    /// Record `symbol` of `binary` at `address`, replacing any earlier entry.
    pub fn insert(&mut self, binary: impl Into<String>, symbol: impl Into<String>, address: Address)
    {
        self.binaries
            .entry(binary.into())
            .or_default()
            .insert(symbol.into(), address);
    }

    /// Total number of symbols across all binaries.
    #[must_use]
    pub fn len(&self) -> usize
    {
        self.binaries.values().map(HashMap::len).sum()
    }

    /// Whether the table holds no symbols.
    #[must_use]
    pub fn is_empty(&self) -> bool
    {
        self.len() == 0
    }
}

impl SymbolResolver for SymbolTable
{
    fn lookup(&self, binary: &str, symbol: &str) -> Option<Address>
    {
        self.binaries.get(binary)?.get(symbol).copied()
    }
}

impl<R: SymbolResolver> SymbolResolver for Vec<R>
{
    fn lookup(&self, binary: &str, symbol: &str) -> Option<Address>
    {
        self.iter().find_map(|resolver| resolver.lookup(binary, symbol))
    }
}
