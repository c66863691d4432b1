//! Populating and freezing a registry.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, warn};

use super::{MetadataRegion, TrailingWords, TypeRegistry, VptrLayout};
use crate::config::RegistryConfig;
use crate::error::{NameKind, TypeDbError, TypeDbResult};
use crate::field::{BasicField, Field, FieldLocation};
use crate::machine::MachineModel;
use crate::memory::RemoteMemory;
use crate::node::{TypeId, TypeNode};
use crate::primitives::{PrimitiveKind, PrimitiveTypes};
use crate::vtbl::VtblCache;

/// Mutable registry under construction.
///
/// Types, fields and constants may be added and removed freely; references
/// between types are only checked by [`TypeRegistryBuilder::build`].
pub struct TypeRegistryBuilder
{
    types: Vec<Option<TypeNode>>,
    by_name: HashMap<String, TypeId>,
    int_constants: HashMap<String, i32>,
    long_constants: HashMap<String, i64>,
    primitives: PrimitiveTypes,
    machine: Arc<dyn MachineModel>,
    memory: Option<Arc<dyn RemoteMemory>>,
    vtbl_cache: Option<VtblCache>,
    vptr_layout: Box<dyn VptrLayout>,
    metadata_region: Option<Arc<dyn MetadataRegion>>,
    config: RegistryConfig,
}

impl TypeRegistryBuilder
{
    /// Empty builder for a process running on `machine`.
    pub fn new(machine: Arc<dyn MachineModel>) -> Self
    {
        Self {
            types: Vec::new(),
            by_name: HashMap::new(),
            int_constants: HashMap::new(),
            long_constants: HashMap::new(),
            primitives: PrimitiveTypes::default(),
            machine,
            memory: None,
            vtbl_cache: None,
            vptr_layout: Box::new(TrailingWords),
            metadata_region: None,
            config: RegistryConfig::default(),
        }
    }

    /// Register a type.
    ///
    /// ## Errors
    ///
    /// `DuplicateType` if a type of the same name is registered.
    pub fn add_type(&mut self, node: TypeNode) -> TypeDbResult<TypeId>
    {
        if self.by_name.contains_key(node.name()) {
            return Err(TypeDbError::DuplicateType(node.name().to_string()));
        }
        let id = TypeId::from_index(self.types.len());
        self.by_name.insert(node.name().to_string(), id);
        self.types.push(Some(node));
        Ok(id)
    }

    /// Unregister the type `id`, which must be the one registered as `name`.
    ///
    /// ## Errors
    ///
    /// `NameNotFound` if nothing is registered as `name`; `TypeMismatch` if a
    /// different type is.
    pub fn remove_type(&mut self, name: &str, id: TypeId) -> TypeDbResult<TypeNode>
    {
        let registered = self
            .by_name
            .get(name)
            .copied()
            .ok_or_else(|| TypeDbError::not_found(NameKind::Type, name))?;
        if registered != id {
            return Err(TypeDbError::TypeMismatch(format!(
                "type {name} is registered as {registered}, not {id}"
            )));
        }

        self.by_name.remove(name);
        self.types
            .get_mut(id.index())
            .and_then(Option::take)
            .ok_or_else(|| TypeDbError::not_found(NameKind::Type, name))
    }

    pub fn find_type(&self, name: &str) -> Option<TypeId>
    {
        self.by_name.get(name).copied()
    }

    pub fn type_node(&self, id: TypeId) -> Option<&TypeNode>
    {
        self.types.get(id.index()).and_then(Option::as_ref)
    }

    /// Mutable access to a registered type.
    ///
    /// ## Errors
    ///
    /// `NameNotFound` if `id` is not registered.
    pub fn type_mut(&mut self, id: TypeId) -> TypeDbResult<&mut TypeNode>
    {
        self.types
            .get_mut(id.index())
            .and_then(Option::as_mut)
            .ok_or_else(|| TypeDbError::not_found(NameKind::Type, id.to_string()))
    }

    /// Declare a field on `owner`, sized after its declared type.
    ///
    /// ## Errors
    ///
    /// `NameNotFound` if either type is not registered; `DuplicateField` if
    /// `owner` already declares `name`.
    pub fn add_field(
        &mut self,
        owner: TypeId,
        name: &str,
        declared: TypeId,
        location: FieldLocation,
    ) -> TypeDbResult<Arc<dyn Field>>
    {
        let size = self
            .type_node(declared)
            .map(TypeNode::size)
            .ok_or_else(|| TypeDbError::not_found(NameKind::Type, declared.to_string()))?;
        let field: Arc<dyn Field> = Arc::new(BasicField::new(name, owner, declared, size, location));
        self.type_mut(owner)?.add_field(Arc::clone(&field))?;
        Ok(field)
    }

    /// ## Errors
    ///
    /// `DuplicateConstant` if the name is taken.
    pub fn add_int_constant(&mut self, name: &str, value: i32) -> TypeDbResult<()>
    {
        if self.int_constants.contains_key(name) {
            return Err(TypeDbError::DuplicateConstant(name.to_string()));
        }
        self.int_constants.insert(name.to_string(), value);
        Ok(())
    }

    /// ## Errors
    ///
    /// `NameNotFound` if no such constant exists.
    pub fn remove_int_constant(&mut self, name: &str) -> TypeDbResult<i32>
    {
        self.int_constants
            .remove(name)
            .ok_or_else(|| TypeDbError::not_found(NameKind::IntConstant, name))
    }

    /// ## Errors
    ///
    /// `DuplicateConstant` if the name is taken.
    pub fn add_long_constant(&mut self, name: &str, value: i64) -> TypeDbResult<()>
    {
        if self.long_constants.contains_key(name) {
            return Err(TypeDbError::DuplicateConstant(name.to_string()));
        }
        self.long_constants.insert(name.to_string(), value);
        Ok(())
    }

    /// ## Errors
    ///
    /// `NameNotFound` if no such constant exists.
    pub fn remove_long_constant(&mut self, name: &str) -> TypeDbResult<i64>
    {
        self.long_constants
            .remove(name)
            .ok_or_else(|| TypeDbError::not_found(NameKind::LongConstant, name))
    }

    /// Name the type standing for a Java primitive kind.
    ///
    /// ## Errors
    ///
    /// `AlreadySet` if the kind was named before.
    pub fn set_primitive_type(&mut self, kind: PrimitiveKind, id: TypeId) -> TypeDbResult<()>
    {
        self.primitives.set(kind, id)
    }

    /// ## Errors
    ///
    /// `AlreadySet` on a second call.
    pub fn set_boolean_type(&mut self, id: TypeId) -> TypeDbResult<()>
    {
        self.set_primitive_type(PrimitiveKind::Boolean, id)
    }

    /// ## Errors
    ///
    /// `AlreadySet` on a second call.
    pub fn set_byte_type(&mut self, id: TypeId) -> TypeDbResult<()>
    {
        self.set_primitive_type(PrimitiveKind::Byte, id)
    }

    /// ## Errors
    ///
    /// `AlreadySet` on a second call.
    pub fn set_char_type(&mut self, id: TypeId) -> TypeDbResult<()>
    {
        self.set_primitive_type(PrimitiveKind::Char, id)
    }

    /// ## Errors
    ///
    /// `AlreadySet` on a second call.
    pub fn set_double_type(&mut self, id: TypeId) -> TypeDbResult<()>
    {
        self.set_primitive_type(PrimitiveKind::Double, id)
    }

    /// ## Errors
    ///
    /// `AlreadySet` on a second call.
    pub fn set_float_type(&mut self, id: TypeId) -> TypeDbResult<()>
    {
        self.set_primitive_type(PrimitiveKind::Float, id)
    }

    /// ## Errors
    ///
    /// `AlreadySet` on a second call.
    pub fn set_int_type(&mut self, id: TypeId) -> TypeDbResult<()>
    {
        self.set_primitive_type(PrimitiveKind::Int, id)
    }

    /// ## Errors
    ///
    /// `AlreadySet` on a second call.
    pub fn set_long_type(&mut self, id: TypeId) -> TypeDbResult<()>
    {
        self.set_primitive_type(PrimitiveKind::Long, id)
    }

    /// ## Errors
    ///
    /// `AlreadySet` on a second call.
    pub fn set_short_type(&mut self, id: TypeId) -> TypeDbResult<()>
    {
        self.set_primitive_type(PrimitiveKind::Short, id)
    }

    #[must_use]
    pub fn with_memory(mut self, memory: Arc<dyn RemoteMemory>) -> Self
    {
        self.memory = Some(memory);
        self
    }

    #[must_use]
    pub fn with_vtbl_cache(mut self, cache: VtblCache) -> Self
    {
        self.vtbl_cache = Some(cache);
        self
    }

    /// Replace the default [`TrailingWords`] secondary-vptr layout.
    #[must_use]
    pub fn with_vptr_layout(mut self, layout: impl VptrLayout + 'static) -> Self
    {
        self.vptr_layout = Box::new(layout);
        self
    }

    #[must_use]
    pub fn with_metadata_region(mut self, region: Arc<dyn MetadataRegion>) -> Self
    {
        self.metadata_region = Some(region);
        self
    }

    #[must_use]
    pub fn with_config(mut self, config: RegistryConfig) -> Self
    {
        self.config = config;
        self
    }

    fn is_live(&self, id: TypeId) -> bool
    {
        self.type_node(id).is_some()
    }

    fn check_reference(&self, from: &str, role: &str, id: TypeId) -> TypeDbResult<()>
    {
        if self.is_live(id) {
            return Ok(());
        }
        warn!(type_name = from, role, %id, "reference to unregistered type");
        Err(TypeDbError::DanglingType(format!("{from}: {role} {id} is not registered")))
    }

    fn validate(&self) -> TypeDbResult<()>
    {
        for (index, node) in self.types.iter().enumerate() {
            let Some(node) = node else {
                continue;
            };
            let id = TypeId::from_index(index);
            if let Some(superclass) = node.superclass() {
                self.check_reference(node.name(), "superclass", superclass)?;
            }
            if let Some(target) = node.pointer_target() {
                self.check_reference(node.name(), "pointer target", target)?;
            }
            for field in node.fields() {
                self.check_reference(node.name(), &format!("field {} type", field.name()), field.declared_type())?;
                self.check_reference(node.name(), &format!("field {} owner", field.name()), field.owning_type())?;
                if field.owning_type() != id {
                    warn!(
                        owner = node.name(),
                        field = field.name(),
                        declared_owner = %field.owning_type(),
                        "field is attached to a type other than its owner"
                    );
                    return Err(TypeDbError::TypeMismatch(format!(
                        "field {}::{} names {} as its owner",
                        node.name(),
                        field.name(),
                        field.owning_type()
                    )));
                }
            }
        }
        for (kind, id) in self.primitives.iter() {
            self.check_reference("primitives", &kind.to_string(), id)?;
        }
        Ok(())
    }

    /// Check every type reference and freeze.
    ///
    /// ## Errors
    ///
    /// `DanglingType` if a superclass, pointer target, field type or
    /// primitive slot names a removed type; `TypeMismatch` if a field sits on
    /// a type other than its owning type; `MissingCollaborator` if no memory
    /// or vtable cache was supplied.
    pub fn build(self) -> TypeDbResult<TypeRegistry>
    {
        self.validate()?;
        let memory = self.memory.ok_or(TypeDbError::MissingCollaborator("remote memory"))?;
        let vtbl_cache = self.vtbl_cache.ok_or(TypeDbError::MissingCollaborator("vtable cache"))?;

        if memory.address_size() != self.machine.address_size() {
            warn!(
                memory = memory.address_size(),
                machine = self.machine.address_size(),
                "remote memory and machine model disagree on address size"
            );
        }

        debug!(
            types = self.by_name.len(),
            int_constants = self.int_constants.len(),
            long_constants = self.long_constants.len(),
            "type registry frozen"
        );

        Ok(TypeRegistry {
            types: self.types,
            by_name: self.by_name,
            int_constants: self.int_constants,
            long_constants: self.long_constants,
            primitives: self.primitives,
            machine: self.machine,
            memory,
            vtbl_cache,
            vptr_layout: self.vptr_layout,
            metadata_region: self.metadata_region,
            config: self.config,
        })
    }
}

impl std::fmt::Debug for TypeRegistryBuilder
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result
    {
        f.debug_struct("TypeRegistryBuilder")
            .field("types", &self.by_name.len())
            .field("primitives", &self.primitives)
            .field("has_memory", &self.memory.is_some())
            .field("has_vtbl_cache", &self.vtbl_cache.is_some())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests
{
    use super::*;
    use crate::machine::TwosComplement;
    use crate::memory::SnapshotMemory;
    use crate::symbols::SymbolTable;
    use crate::vtbl::Itanium;

    fn builder() -> TypeRegistryBuilder
    {
        TypeRegistryBuilder::new(Arc::new(TwosComplement::LP64))
    }

    fn finish(builder: TypeRegistryBuilder) -> TypeDbResult<TypeRegistry>
    {
        builder
            .with_memory(Arc::new(SnapshotMemory::new(8)))
            .with_vtbl_cache(VtblCache::new(Arc::new(SymbolTable::new()), Arc::new(Itanium), vec![]))
            .build()
    }

    #[test]
    fn test_duplicate_type_rejected()
    {
        let mut builder = builder();
        builder.add_type(TypeNode::new("Thread", 64)).unwrap();
        let err = builder.add_type(TypeNode::new("Thread", 32)).unwrap_err();
        assert!(matches!(err, TypeDbError::DuplicateType(ref name) if name == "Thread"));
    }

    #[test]
    fn test_add_field_copies_declared_size()
    {
        let mut builder = builder();
        let jlong = builder.add_type(TypeNode::new("jlong", 8).with_primitive()).unwrap();
        let thread = builder.add_type(TypeNode::new("Thread", 64)).unwrap();
        let field = builder
            .add_field(thread, "_id", jlong, FieldLocation::Instance { offset: 16 })
            .unwrap();
        assert_eq!(field.size(), 8);
        assert_eq!(field.owning_type(), thread);
        assert!(builder.type_node(thread).unwrap().own_field("_id").is_some());
    }

    #[test]
    fn test_constants_round_trip()
    {
        let mut builder = builder();
        builder.add_int_constant("Thread::_max", 7).unwrap();
        builder.add_long_constant("markWord::hash_mask", 0x7fff_ffff).unwrap();
        assert!(matches!(
            builder.add_int_constant("Thread::_max", 8),
            Err(TypeDbError::DuplicateConstant(_))
        ));
        assert_eq!(builder.remove_int_constant("Thread::_max").unwrap(), 7);
        assert!(matches!(
            builder.remove_int_constant("Thread::_max"),
            Err(TypeDbError::NameNotFound { kind: NameKind::IntConstant, .. })
        ));

        let registry = finish(builder).unwrap();
        assert_eq!(registry.lookup_long_constant("markWord::hash_mask").unwrap(), 0x7fff_ffff);
        assert_eq!(registry.find_int_constant("Thread::_max"), None);
    }

    #[test]
    fn test_build_rejects_dangling_superclass()
    {
        let mut builder = builder();
        let base = builder.add_type(TypeNode::new("Base", 16)).unwrap();
        builder.add_type(TypeNode::new("Derived", 32).with_superclass(base)).unwrap();
        builder.remove_type("Base", base).unwrap();
        let err = finish(builder).unwrap_err();
        assert!(matches!(err, TypeDbError::DanglingType(ref what) if what.contains("Derived")));
    }

    #[test]
    fn test_build_rejects_field_on_foreign_type()
    {
        let mut builder = builder();
        let jint = builder.add_type(TypeNode::new("jint", 4).with_primitive()).unwrap();
        let thread = builder.add_type(TypeNode::new("Thread", 64)).unwrap();
        let klass = builder.add_type(TypeNode::new("Klass", 200)).unwrap();

        let field: Arc<dyn Field> = Arc::new(BasicField::new(
            "_layout_helper",
            klass,
            jint,
            4,
            FieldLocation::Instance { offset: 8 },
        ));
        builder.type_mut(thread).unwrap().add_field(field).unwrap();

        let err = finish(builder).unwrap_err();
        assert!(matches!(err, TypeDbError::TypeMismatch(ref what) if what.contains("Thread::_layout_helper")));
    }

    #[test]
    fn test_build_requires_collaborators()
    {
        let err = builder().build().unwrap_err();
        assert!(matches!(err, TypeDbError::MissingCollaborator("remote memory")));

        let err = builder()
            .with_memory(Arc::new(SnapshotMemory::new(8)))
            .build()
            .unwrap_err();
        assert!(matches!(err, TypeDbError::MissingCollaborator("vtable cache")));
    }
}
