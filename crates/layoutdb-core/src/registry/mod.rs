//! # Type Registry
//!
//! The frozen type database: named types, named integer constants, the
//! Java primitive handles, and dynamic type recovery.
//!
//! A registry is populated through a [`TypeRegistryBuilder`] and frozen with
//! [`TypeRegistryBuilder::build`]. After that only `&self` methods exist, so
//! any number of threads may query it; the only interior state is the vtable
//! cache, which synchronises itself.
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use layoutdb_core::field::FieldLocation;
//! use layoutdb_core::machine::TwosComplement;
//! use layoutdb_core::memory::SnapshotMemory;
//! use layoutdb_core::node::TypeNode;
//! use layoutdb_core::registry::TypeRegistryBuilder;
//! use layoutdb_core::symbols::SymbolTable;
//! use layoutdb_core::types::Address;
//! use layoutdb_core::vtbl::{Itanium, VtblCache};
//!
//! # fn main() -> layoutdb_core::error::TypeDbResult<()> {
//! let mut builder = TypeRegistryBuilder::new(Arc::new(TwosComplement::LP64));
//! let jint = builder.add_type(TypeNode::new("jint", 4).with_primitive())?;
//! builder.set_int_type(jint)?;
//! let thread = builder.add_type(TypeNode::new("Thread", 64))?;
//! builder.add_field(thread, "_state", jint, FieldLocation::Instance { offset: 8 })?;
//!
//! let mut memory = SnapshotMemory::new(8);
//! memory.map_zeroed(Address::new(0x1000), 64);
//! memory.write_u32(Address::new(0x1008), 3)?;
//!
//! let cache = VtblCache::new(Arc::new(SymbolTable::new()), Arc::new(Itanium), vec![]);
//! let registry = builder.with_memory(Arc::new(memory)).with_vtbl_cache(cache).build()?;
//!
//! let state = registry.handle_by_name("Thread")?.int_field("_state")?;
//! assert_eq!(state.value(registry.memory(), Address::new(0x1000))?, 3);
//! # Ok(())
//! # }
//! ```

mod builder;
mod dynamic;

use std::collections::HashMap;
use std::sync::Arc;

pub use builder::TypeRegistryBuilder;
pub use dynamic::{MetadataRegion, TrailingWords, VptrLayout};

use crate::config::RegistryConfig;
use crate::error::{NameKind, TypeDbError, TypeDbResult};
use crate::handle::TypeHandle;
use crate::machine::MachineModel;
use crate::memory::RemoteMemory;
use crate::node::{TypeId, TypeNode};
use crate::primitives::{PrimitiveKind, PrimitiveTypes};
use crate::vtbl::VtblCache;

/// A frozen, queryable type database.
pub struct TypeRegistry
{
    /// Arena indexed by [`TypeId`]; removed types leave an empty slot.
    types: Vec<Option<TypeNode>>,
    by_name: HashMap<String, TypeId>,
    int_constants: HashMap<String, i32>,
    long_constants: HashMap<String, i64>,
    primitives: PrimitiveTypes,
    machine: Arc<dyn MachineModel>,
    memory: Arc<dyn RemoteMemory>,
    vtbl_cache: VtblCache,
    vptr_layout: Box<dyn VptrLayout>,
    metadata_region: Option<Arc<dyn MetadataRegion>>,
    config: RegistryConfig,
}

impl TypeRegistry
{
    /// Id of the type named `name`.
    ///
    /// ## Errors
    ///
    /// `NameNotFound` if no such type is registered.
    pub fn lookup_type(&self, name: &str) -> TypeDbResult<TypeId>
    {
        self.find_type(name)
            .ok_or_else(|| TypeDbError::not_found(NameKind::Type, name))
    }

    /// Id of the type named `name`, if registered.
    pub fn find_type(&self, name: &str) -> Option<TypeId>
    {
        self.by_name.get(name).copied()
    }

    /// Node of a registered type.
    pub fn type_node(&self, id: TypeId) -> Option<&TypeNode>
    {
        self.types.get(id.index()).and_then(Option::as_ref)
    }

    /// Handle on a registered type.
    pub fn handle(&self, id: TypeId) -> Option<TypeHandle<'_>>
    {
        self.type_node(id).map(|node| TypeHandle::new(self, id, node))
    }

    /// Handle on the type named `name`.
    ///
    /// ## Errors
    ///
    /// `NameNotFound` if no such type is registered.
    pub fn handle_by_name(&self, name: &str) -> TypeDbResult<TypeHandle<'_>>
    {
        let id = self.lookup_type(name)?;
        self.handle(id)
            .ok_or_else(|| TypeDbError::not_found(NameKind::Type, name))
    }

    /// Every registered type, in registration order.
    pub fn types(&self) -> impl Iterator<Item = TypeHandle<'_>> + '_
    {
        self.types
            .iter()
            .enumerate()
            .filter_map(|(index, node)| node.as_ref().map(|node| TypeHandle::new(self, TypeId::from_index(index), node)))
    }

    /// Number of registered types.
    pub fn len(&self) -> usize
    {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool
    {
        self.by_name.is_empty()
    }

    /// ## Errors
    ///
    /// `NameNotFound` if no such constant is registered.
    pub fn lookup_int_constant(&self, name: &str) -> TypeDbResult<i32>
    {
        self.find_int_constant(name)
            .ok_or_else(|| TypeDbError::not_found(NameKind::IntConstant, name))
    }

    pub fn find_int_constant(&self, name: &str) -> Option<i32>
    {
        self.int_constants.get(name).copied()
    }

    /// Names of all int constants (unordered).
    pub fn int_constant_names(&self) -> impl Iterator<Item = &str> + '_
    {
        self.int_constants.keys().map(String::as_str)
    }

    /// ## Errors
    ///
    /// `NameNotFound` if no such constant is registered.
    pub fn lookup_long_constant(&self, name: &str) -> TypeDbResult<i64>
    {
        self.find_long_constant(name)
            .ok_or_else(|| TypeDbError::not_found(NameKind::LongConstant, name))
    }

    pub fn find_long_constant(&self, name: &str) -> Option<i64>
    {
        self.long_constants.get(name).copied()
    }

    /// Names of all long constants (unordered).
    pub fn long_constant_names(&self) -> impl Iterator<Item = &str> + '_
    {
        self.long_constants.keys().map(String::as_str)
    }

    /// All primitive slots.
    pub fn primitives(&self) -> &PrimitiveTypes
    {
        &self.primitives
    }

    /// Type registered for a Java primitive kind.
    pub fn primitive_type(&self, kind: PrimitiveKind) -> Option<TypeId>
    {
        self.primitives.get(kind)
    }

    pub fn boolean_type(&self) -> Option<TypeId>
    {
        self.primitive_type(PrimitiveKind::Boolean)
    }

    pub fn byte_type(&self) -> Option<TypeId>
    {
        self.primitive_type(PrimitiveKind::Byte)
    }

    pub fn char_type(&self) -> Option<TypeId>
    {
        self.primitive_type(PrimitiveKind::Char)
    }

    pub fn double_type(&self) -> Option<TypeId>
    {
        self.primitive_type(PrimitiveKind::Double)
    }

    pub fn float_type(&self) -> Option<TypeId>
    {
        self.primitive_type(PrimitiveKind::Float)
    }

    pub fn int_type(&self) -> Option<TypeId>
    {
        self.primitive_type(PrimitiveKind::Int)
    }

    pub fn long_type(&self) -> Option<TypeId>
    {
        self.primitive_type(PrimitiveKind::Long)
    }

    pub fn short_type(&self) -> Option<TypeId>
    {
        self.primitive_type(PrimitiveKind::Short)
    }

    /// Size of a native pointer in the inspected process.
    pub fn address_size(&self) -> u64
    {
        self.machine.address_size()
    }

    /// Size of an uncompressed oop in the inspected process.
    pub fn oop_size(&self) -> u64
    {
        self.machine.oop_size()
    }

    pub fn machine(&self) -> &dyn MachineModel
    {
        self.machine.as_ref()
    }

    /// Memory of the inspected process.
    pub fn memory(&self) -> &dyn RemoteMemory
    {
        self.memory.as_ref()
    }

    pub fn vtbl_cache(&self) -> &VtblCache
    {
        &self.vtbl_cache
    }

    pub fn config(&self) -> RegistryConfig
    {
        self.config
    }
}

impl std::fmt::Debug for TypeRegistry
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result
    {
        f.debug_struct("TypeRegistry")
            .field("types", &self.by_name.len())
            .field("int_constants", &self.int_constants.len())
            .field("long_constants", &self.long_constants.len())
            .field("primitives", &self.primitives)
            .field("vtbl_cache", &self.vtbl_cache)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
