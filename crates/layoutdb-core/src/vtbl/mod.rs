//! # Vtable Cache
//!
//! Memoised mapping from a type to the runtime address of its vtable.
//!
//! Resolving a vtable means building the platform's mangled symbol name and
//! probing every configured binary for it, which is far too slow to repeat
//! for each candidate type of each dynamic-type query. [`VtblCache`] keeps
//! one entry per type:
//!
//! | entry | meaning |
//! |---|---|
//! | missing | never asked |
//! | [`VtblEntry::Absent`] | asked, the type has no vtable |
//! | [`VtblEntry::Present`] | asked, vptrs of this type hold this address |
//!
//! Negative answers are cached as well, so a non-polymorphic type costs one
//! round of probes per cache lifetime.
//!
//! ## Invalidation
//!
//! Vtable addresses move when the inspected process loads or unloads
//! binaries. Call [`VtblCache::invalidate_all`] (or
//! [`TypeRegistry::invalidate_vtbl_cache`](crate::registry::TypeRegistry::invalidate_vtbl_cache))
//! whenever the process has run since the cache was filled.

pub mod naming;

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

pub use naming::{Itanium, Msvc, VtblSymbolNaming};
use tracing::debug;

use crate::node::{TypeId, TypeNode};
use crate::symbols::SymbolResolver;
use crate::types::Address;

/// A resolved cache entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VtblEntry
{
    /// Vptrs of this type hold this address.
    Present(Address),
    /// The type has no vtable in any configured binary.
    Absent,
}

impl VtblEntry
{
    /// The vtable address, if present.
    #[must_use]
    pub fn address(self) -> Option<Address>
    {
        match self {
            VtblEntry::Present(address) => Some(address),
            VtblEntry::Absent => None,
        }
    }
}

/// Memoised vtable lookups.
///
/// All state sits behind one mutex, so [`VtblCache::resolve`] works through
/// `&self` from any number of reader threads.
pub struct VtblCache
{
    entries: Mutex<HashMap<TypeId, VtblEntry>>,
    resolver: Arc<dyn SymbolResolver>,
    naming: Arc<dyn VtblSymbolNaming>,
    libraries: Vec<String>,
    lookups: AtomicU64,
}

impl VtblCache
{
    /// Create an empty cache.
    ///
    /// `libraries` are probed in order; the first one that defines a type's
    /// vtable symbol wins.
    pub fn new(resolver: Arc<dyn SymbolResolver>, naming: Arc<dyn VtblSymbolNaming>, libraries: Vec<String>) -> Self
    {
        Self {
            entries: Mutex::new(HashMap::new()),
            resolver,
            naming,
            libraries,
            lookups: AtomicU64::new(0),
        }
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<TypeId, VtblEntry>>
    {
        // Entries are plain data; a panic elsewhere cannot leave them torn.
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Address point of `node`'s vtable, resolving and caching it on first use.
    pub fn resolve(&self, id: TypeId, node: &TypeNode, address_size: u64) -> Option<Address>
    {
        let mut entries = self.entries();
        if let Some(entry) = entries.get(&id) {
            return entry.address();
        }

        let entry = self.probe(node, address_size);
        entries.insert(id, entry);
        entry.address()
    }

    fn probe(&self, node: &TypeNode, address_size: u64) -> VtblEntry
    {
        let Some(symbol) = self.naming.symbol_name_for(node) else {
            debug!(type_name = node.name(), "type kind has no vtable");
            return VtblEntry::Absent;
        };

        for library in &self.libraries {
            self.lookups.fetch_add(1, Ordering::Relaxed);
            if let Some(address) = self.resolver.lookup(library, &symbol) {
                let address_point = address + self.naming.address_point_offset(address_size);
                debug!(
                    type_name = node.name(),
                    %symbol,
                    %library,
                    vtbl = %address_point,
                    "resolved vtable"
                );
                return VtblEntry::Present(address_point);
            }
        }

        debug!(type_name = node.name(), %symbol, "vtable symbol not found in any library");
        VtblEntry::Absent
    }

    /// Cached entry for `id`, without resolving.
    pub fn cached(&self, id: TypeId) -> Option<VtblEntry>
    {
        self.entries().get(&id).copied()
    }

    /// Forget every entry, positive and negative.
    pub fn invalidate_all(&self)
    {
        let mut entries = self.entries();
        debug!(entries = entries.len(), "invalidating vtable cache");
        entries.clear();
    }

    /// Symbol-resolver probes performed so far.
    pub fn lookups(&self) -> u64
    {
        self.lookups.load(Ordering::Relaxed)
    }

    /// Binaries probed, in priority order.
    pub fn libraries(&self) -> &[String]
    {
        &self.libraries
    }
}

impl fmt::Debug for VtblCache
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        f.debug_struct("VtblCache")
            .field("entries", &self.entries().len())
            .field("libraries", &self.libraries)
            .field("lookups", &self.lookups())
            .finish_non_exhaustive()
    }
}
