//! Dynamic type recovery.
//!
//! Given the address of an object whose static type is known, find its most
//! derived type by comparing the vtable pointers stored in the object with
//! the vtables of the static type's subtypes.
//!
//! With single inheritance the vptr sits at offset 0. Some compilers place it
//! after the fields of a non-polymorphic base instead, so besides offset 0 a
//! [`VptrLayout`] names secondary offsets to try. A match at offset 0 always
//! wins; otherwise the earliest secondary offset with a match does.
//!
//! Nothing here reports errors: a read that fails, a null address, or a type
//! without a vtable all simply mean "no match".

use smallvec::SmallVec;
use tracing::{debug, trace};

use super::TypeRegistry;
use crate::node::TypeId;
use crate::types::Address;

/// Where, besides offset 0, a vptr may live inside an object.
pub trait VptrLayout: Send + Sync
{
    /// Offsets to probe, in preference order, for an object whose static
    /// type is `base_size` bytes on a machine with `address_size`-byte
    /// pointers.
    fn secondary_offsets(&self, base_size: u64, address_size: u64) -> SmallVec<[i64; 2]>;
}

/// The last two aligned words of the static type.
///
/// `size - w` rounded down to a multiple of `w`, then one word before that;
/// each only when positive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TrailingWords;

impl VptrLayout for TrailingWords
{
    #[allow(clippy::cast_possible_wrap)]
    fn secondary_offsets(&self, base_size: u64, address_size: u64) -> SmallVec<[i64; 2]>
    {
        let word = address_size as i64;
        let offset2 = (base_size as i64 - word) & !(word - 1);
        let offset3 = offset2 - word;
        [offset2, offset3].into_iter().filter(|offset| *offset > 0).collect()
    }
}

/// A region whose objects carry their type in a non-vtable way (for
/// example, class metadata laid out by the VM itself).
pub trait MetadataRegion: Send + Sync
{
    /// Whether `address` lies inside the region.
    fn contains(&self, address: Address) -> bool;

    /// Type of the object whose first word is `vptr`.
    fn type_for_vptr(&self, vptr: Address) -> Option<TypeId>;
}

impl TypeRegistry
{
    /// Address point of `id`'s vtable, resolved through the cache.
    pub fn vtbl_for_type(&self, id: TypeId) -> Option<Address>
    {
        let node = self.type_node(id)?;
        self.vtbl_cache.resolve(id, node, self.address_size())
    }

    /// Forget every cached vtable address.
    ///
    /// Call whenever the inspected process has run since the last query.
    pub fn invalidate_vtbl_cache(&self)
    {
        self.vtbl_cache.invalidate_all();
    }

    fn read_vptr(&self, address: Address, offset: i64) -> Option<Address>
    {
        match self.memory.read_address_at(address, offset) {
            Ok(value) => Some(value),
            Err(err) => {
                trace!(%address, offset, %err, "vptr read failed");
                None
            }
        }
    }

    /// Whether the object at `address` has exactly the vtable of `id`.
    ///
    /// A null address, a type without a vtable, or unreadable memory all
    /// answer `false`.
    pub fn addresses_match_type(&self, address: Address, id: TypeId) -> bool
    {
        if address.is_null() {
            return false;
        }
        let Some(vtbl) = self.vtbl_for_type(id) else {
            return false;
        };
        self.read_vptr(address, 0) == Some(vtbl)
    }

    /// Any registered type whose vtable sits at offset 0 of `address`.
    ///
    /// Which type is returned when several would match is unspecified.
    pub fn guess_type_for_address(&self, address: Address) -> Option<TypeId>
    {
        self.types()
            .map(|handle| handle.id())
            .find(|id| self.addresses_match_type(address, *id))
    }

    /// Most derived type of the object at `address`, whose static type is
    /// `base`.
    ///
    /// ## Panics
    ///
    /// Panics if `base` is not registered or has no vtable; asking for the
    /// dynamic type of a non-polymorphic type is a caller bug.
    pub fn find_dynamic_type(&self, address: Address, base: TypeId) -> Option<TypeId>
    {
        let Some(base_handle) = self.handle(base) else {
            panic!("{base} is not a registered type");
        };
        assert!(
            self.vtbl_for_type(base).is_some(),
            "{} does not appear to be polymorphic",
            base_handle.name()
        );

        let loc1 = self.read_vptr(address, 0);
        if let (Some(region), Some(vptr)) = (&self.metadata_region, loc1) {
            if region.contains(vptr) {
                let found = region.type_for_vptr(vptr);
                debug!(%address, %vptr, ?found, "vptr lies in metadata region");
                return found;
            }
        }

        let secondary: SmallVec<[(i64, Option<Address>); 2]> = self
            .vptr_layout
            .secondary_offsets(base_handle.size(), self.address_size())
            .into_iter()
            .map(|offset| (offset, self.read_vptr(address, offset)))
            .collect();
        let mut secondary_matches: SmallVec<[Option<TypeId>; 2]> = SmallVec::from_elem(None, secondary.len());

        for candidate in self.types() {
            if !candidate.is_subtype_of(base) {
                continue;
            }
            let Some(vtbl) = self.vtbl_for_type(candidate.id()) else {
                continue;
            };
            if self.config.trace_probes {
                debug!(%address, candidate = candidate.name(), %vtbl, "probing candidate");
            }

            if loc1 == Some(vtbl) {
                debug!(%address, found = candidate.name(), "vptr at offset 0 matched");
                return Some(candidate.id());
            }
            for ((_, value), matched) in secondary.iter().zip(secondary_matches.iter_mut()) {
                if matched.is_none() && *value == Some(vtbl) {
                    *matched = Some(candidate.id());
                }
            }
        }

        let found = secondary
            .iter()
            .zip(&secondary_matches)
            .find_map(|((offset, _), matched)| matched.map(|id| (*offset, id)));
        match found {
            Some((offset, id)) => {
                debug!(%address, offset, found = %id, "vptr at secondary offset matched");
                Some(id)
            }
            None => {
                debug!(%address, base = base_handle.name(), "no dynamic type found");
                None
            }
        }
    }
}
