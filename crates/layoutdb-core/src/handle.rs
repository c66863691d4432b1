//! # Type Handles
//!
//! A [`TypeHandle`] pairs a [`TypeNode`] with the registry it lives in, so
//! that questions needing the rest of the type graph (superclass fields,
//! subtype checks, primitive handles, the machine's integer ranges) can be
//! answered from one value.

use std::fmt;
use std::sync::Arc;

use crate::error::{NameKind, TypeDbError, TypeDbResult};
use crate::field::{
    AddressField, BooleanField, ByteField, CIntegerField, CharField, DoubleField, Field, FieldValue, FloatField,
    IntField, LongField, NarrowOopField, OopField, ShortField, TypedField,
};
use crate::node::{CIntegerKind, TypeId, TypeNode};
use crate::registry::TypeRegistry;

/// Name of the pointee that makes a pointer type a C string.
const C_STRING_TARGET: &str = "const char";

/// Borrowed view of one type in a frozen registry.
#[derive(Clone, Copy)]
pub struct TypeHandle<'a>
{
    registry: &'a TypeRegistry,
    id: TypeId,
    node: &'a TypeNode,
}

impl<'a> TypeHandle<'a>
{
    pub(crate) fn new(registry: &'a TypeRegistry, id: TypeId, node: &'a TypeNode) -> Self
    {
        Self { registry, id, node }
    }

    pub fn id(&self) -> TypeId
    {
        self.id
    }

    pub fn node(&self) -> &'a TypeNode
    {
        self.node
    }

    pub fn name(&self) -> &'a str
    {
        self.node.name()
    }

    pub fn size(&self) -> u64
    {
        self.node.size()
    }

    pub fn superclass(&self) -> Option<TypeHandle<'a>>
    {
        self.node.superclass().and_then(|id| self.registry.handle(id))
    }

    /// Whether `other` is this type or one of its superclasses.
    pub fn is_subtype_of(&self, other: TypeId) -> bool
    {
        let mut current = Some(*self);
        while let Some(handle) = current {
            if handle.id == other {
                return true;
            }
            current = handle.superclass();
        }
        false
    }

    /// Fields declared directly on this type, in insertion order.
    pub fn fields(&self) -> impl Iterator<Item = &'a Arc<dyn Field>> + 'a
    {
        self.node.fields()
    }

    /// Look a field up by name.
    ///
    /// Own fields are searched first; with `search_superclass` the whole
    /// superclass chain follows, nearest ancestor first.
    ///
    /// ## Errors
    ///
    /// `NameNotFound` if nothing matched and `must_exist` is set.
    pub fn find_field(&self, name: &str, search_superclass: bool, must_exist: bool) -> TypeDbResult<Option<Arc<dyn Field>>>
    {
        let mut current = Some(*self);
        while let Some(handle) = current {
            if let Some(field) = handle.node.own_field(name) {
                return Ok(Some(Arc::clone(field)));
            }
            if !search_superclass {
                break;
            }
            current = handle.superclass();
        }

        if must_exist {
            return Err(TypeDbError::not_found(
                NameKind::Field,
                format!("{}::{name}", self.name()),
            ));
        }
        Ok(None)
    }

    /// Look a field up and check its declared type.
    ///
    /// ## Errors
    ///
    /// `NameNotFound` if there is no such field; `TypeMismatch` if it is
    /// declared with a type other than `expected`.
    pub fn find_field_of_type(&self, name: &str, expected: TypeId, search_superclass: bool) -> TypeDbResult<Arc<dyn Field>>
    {
        let field = self.required_field(name, search_superclass)?;
        if field.declared_type() != expected {
            return Err(TypeDbError::TypeMismatch(format!(
                "field {}::{name} is declared as {}, expected {}",
                self.name(),
                self.type_name(field.declared_type()),
                self.type_name(expected),
            )));
        }
        Ok(field)
    }

    fn required_field(&self, name: &str, search_superclass: bool) -> TypeDbResult<Arc<dyn Field>>
    {
        self.find_field(name, search_superclass, true)?
            .ok_or_else(|| TypeDbError::not_found(NameKind::Field, format!("{}::{name}", self.name())))
    }

    fn type_name(&self, id: TypeId) -> String
    {
        self.registry
            .type_node(id)
            .map_or_else(|| id.to_string(), |node| node.to_string())
    }

    fn primitive_field<T: FieldValue>(&self, name: &str) -> TypeDbResult<TypedField<T>>
    {
        let expected = self
            .registry
            .primitives()
            .get(T::KIND)
            .ok_or_else(|| TypeDbError::TypeMismatch(format!("no {} type is registered", T::KIND)))?;
        let field = self.required_field(name, true)?;
        if field.declared_type() != expected {
            return Err(TypeDbError::TypeMismatch(format!(
                "field {}::{name} is of type {}, not {}",
                self.name(),
                self.type_name(field.declared_type()),
                T::KIND,
            )));
        }
        Ok(TypedField::new(field))
    }

    pub fn boolean_field(&self, name: &str) -> TypeDbResult<BooleanField>
    {
        self.primitive_field(name)
    }

    pub fn byte_field(&self, name: &str) -> TypeDbResult<ByteField>
    {
        self.primitive_field(name)
    }

    pub fn char_field(&self, name: &str) -> TypeDbResult<CharField>
    {
        self.primitive_field(name)
    }

    pub fn double_field(&self, name: &str) -> TypeDbResult<DoubleField>
    {
        self.primitive_field(name)
    }

    pub fn float_field(&self, name: &str) -> TypeDbResult<FloatField>
    {
        self.primitive_field(name)
    }

    pub fn int_field(&self, name: &str) -> TypeDbResult<IntField>
    {
        self.primitive_field(name)
    }

    pub fn long_field(&self, name: &str) -> TypeDbResult<LongField>
    {
        self.primitive_field(name)
    }

    pub fn short_field(&self, name: &str) -> TypeDbResult<ShortField>
    {
        self.primitive_field(name)
    }

    /// Field whose declared type is a native integer.
    ///
    /// ## Errors
    ///
    /// `NameNotFound`, or `TypeMismatch` if the declared type is not a
    /// C-integer type.
    pub fn c_integer_field(&self, name: &str) -> TypeDbResult<CIntegerField>
    {
        let field = self.required_field(name, true)?;
        let kind = self
            .registry
            .type_node(field.declared_type())
            .and_then(TypeNode::c_integer_kind)
            .ok_or_else(|| TypeDbError::TypeMismatch(format!("field {}::{name} is not of C-integer type", self.name())))?;
        Ok(CIntegerField::new(field, kind))
    }

    fn checked_oop_field(&self, name: &str) -> TypeDbResult<Arc<dyn Field>>
    {
        let field = self.required_field(name, true)?;
        let is_oop = self
            .registry
            .type_node(field.declared_type())
            .is_some_and(TypeNode::is_oop);
        if !is_oop {
            return Err(TypeDbError::TypeMismatch(format!(
                "field {}::{name} is not of oop type",
                self.name()
            )));
        }
        Ok(field)
    }

    /// Field holding a full-width oop.
    ///
    /// ## Errors
    ///
    /// `NameNotFound`, or `TypeMismatch` if the declared type is not an oop
    /// type.
    pub fn oop_field(&self, name: &str) -> TypeDbResult<OopField>
    {
        self.checked_oop_field(name).map(OopField::new)
    }

    /// Field holding a compressed oop.
    ///
    /// ## Errors
    ///
    /// `NameNotFound`, or `TypeMismatch` if the declared type is not an oop
    /// type.
    pub fn narrow_oop_field(&self, name: &str) -> TypeDbResult<NarrowOopField>
    {
        self.checked_oop_field(name).map(NarrowOopField::new)
    }

    /// Any field, read as a native address.
    ///
    /// ## Errors
    ///
    /// `NameNotFound` only.
    pub fn address_field(&self, name: &str) -> TypeDbResult<AddressField>
    {
        self.required_field(name, true).map(AddressField::new)
    }

    pub fn is_pointer_type(&self) -> bool
    {
        self.node.is_pointer()
    }

    /// Pointed-to type of a pointer type, when known.
    pub fn target_type(&self) -> Option<TypeHandle<'a>>
    {
        self.node.pointer_target().and_then(|id| self.registry.handle(id))
    }

    /// Whether this is a pointer to the C-integer type `const char`.
    pub fn is_c_string_type(&self) -> bool
    {
        self.target_type()
            .is_some_and(|target| target.node.is_c_integer() && target.name() == C_STRING_TARGET)
    }

    /// Smallest value of a C-integer type on the inspected machine.
    ///
    /// ## Errors
    ///
    /// `TypeMismatch` if this is not a C-integer type, or its size is not
    /// between 1 and 8 bytes.
    pub fn min_value(&self) -> TypeDbResult<i64>
    {
        let kind = self.c_integer_kind()?;
        Ok(self.registry.machine().min_for(kind.size, kind.is_unsigned))
    }

    /// Largest value of a C-integer type on the inspected machine.
    ///
    /// An unsigned 8-byte type reports `-1`, the bit pattern of `u64::MAX`.
    ///
    /// ## Errors
    ///
    /// `TypeMismatch` if this is not a C-integer type, or its size is not
    /// between 1 and 8 bytes.
    pub fn max_value(&self) -> TypeDbResult<i64>
    {
        let kind = self.c_integer_kind()?;
        Ok(self.registry.machine().max_for(kind.size, kind.is_unsigned))
    }

    fn c_integer_kind(&self) -> TypeDbResult<CIntegerKind>
    {
        let kind = self
            .node
            .c_integer_kind()
            .ok_or_else(|| TypeDbError::TypeMismatch(format!("{} is not a C-integer type", self.name())))?;
        if !(1..=8).contains(&kind.size) {
            return Err(TypeDbError::TypeMismatch(format!(
                "{}: unsupported integer size {} bytes",
                self.name(),
                kind.size
            )));
        }
        Ok(kind)
    }
}

impl PartialEq for TypeHandle<'_>
{
    fn eq(&self, other: &Self) -> bool
    {
        std::ptr::eq(self.registry, other.registry) && self.id == other.id
    }
}

impl Eq for TypeHandle<'_> {}

impl fmt::Debug for TypeHandle<'_>
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        f.debug_struct("TypeHandle")
            .field("id", &self.id)
            .field("name", &self.node.name())
            .field("size", &self.node.size())
            .finish()
    }
}

impl fmt::Display for TypeHandle<'_>
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        fmt::Display::fmt(self.node, f)
    }
}
