//! # Fields
//!
//! One named member of a type, and typed access to its value in the
//! inspected process.
//!
//! A field is either an *instance* field, stored at a byte offset from the
//! start of each object, or a *static* field, stored at one fixed address.
//! Asking an instance field for its static address (or a static field for its
//! offset) is an error, and so is every read of the wrong direction:
//!
//! | operation | instance field | static field |
//! |---|---|---|
//! | `offset()`, `read_*(memory, base)` | ok | `StaticField` |
//! | `static_address()`, `read_static_*(memory)` | `InstanceField` | ok |
//!
//! Memory errors from the backend pass through unchanged as
//! [`TypeDbError::Memory`](crate::error::TypeDbError::Memory).
//!
//! ## Implementations
//!
//! [`Field`] has two implementations: [`BasicField`], which owns its data,
//! and [`FieldWrapper`], which forwards everything to another field. The
//! typed views in [`typed`] are built on top of them.

pub mod typed;
mod wrapper;

use std::fmt;

pub use typed::{
    AddressField, BooleanField, ByteField, CIntegerField, CharField, DoubleField, FieldValue, FloatField, IntField,
    LongField, NarrowOopField, OopField, OopFieldAccess, ShortField, TypedField,
};
pub use wrapper::FieldWrapper;

use crate::error::{TypeDbError, TypeDbResult};
use crate::memory::RemoteMemory;
use crate::node::{CIntegerKind, TypeId};
use crate::types::Address;

/// Where a field's storage lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldLocation
{
    /// Byte offset from the owning object's base address.
    Instance
    {
        /// Signed offset in bytes
        offset: i64,
    },
    /// Fixed address in the inspected process.
    Static
    {
        /// Address of the storage
        address: Address,
    },
}

/// A member of a type.
///
/// The read methods are provided in terms of [`Field::offset`] and
/// [`Field::static_address`], so an implementation only has to describe the
/// field; [`FieldWrapper`] overrides every method to forward it.
pub trait Field: fmt::Debug + Send + Sync
{
    /// Field name, unique within the owning type.
    fn name(&self) -> &str;

    /// Type that declares this field.
    fn owning_type(&self) -> TypeId;

    /// Declared type of the field's value.
    fn declared_type(&self) -> TypeId;

    /// Size in bytes (the declared type's size when the field was created).
    fn size(&self) -> u64;

    fn is_static(&self) -> bool;

    /// Byte offset from the owning object.
    ///
    /// ## Errors
    ///
    /// `StaticField` for static fields.
    fn offset(&self) -> TypeDbResult<i64>;

    /// Address of a static field's storage.
    ///
    /// ## Errors
    ///
    /// `InstanceField` for instance fields.
    fn static_address(&self) -> TypeDbResult<Address>;

    fn read_boolean(&self, memory: &dyn RemoteMemory, base: Address) -> TypeDbResult<bool>
    {
        Ok(memory.read_boolean_at(base, self.offset()?)?)
    }

    fn read_byte(&self, memory: &dyn RemoteMemory, base: Address) -> TypeDbResult<i8>
    {
        Ok(memory.read_byte_at(base, self.offset()?)?)
    }

    fn read_char(&self, memory: &dyn RemoteMemory, base: Address) -> TypeDbResult<u16>
    {
        Ok(memory.read_char_at(base, self.offset()?)?)
    }

    fn read_double(&self, memory: &dyn RemoteMemory, base: Address) -> TypeDbResult<f64>
    {
        Ok(memory.read_double_at(base, self.offset()?)?)
    }

    fn read_float(&self, memory: &dyn RemoteMemory, base: Address) -> TypeDbResult<f32>
    {
        Ok(memory.read_float_at(base, self.offset()?)?)
    }

    fn read_int(&self, memory: &dyn RemoteMemory, base: Address) -> TypeDbResult<i32>
    {
        Ok(memory.read_int_at(base, self.offset()?)?)
    }

    fn read_long(&self, memory: &dyn RemoteMemory, base: Address) -> TypeDbResult<i64>
    {
        Ok(memory.read_long_at(base, self.offset()?)?)
    }

    fn read_short(&self, memory: &dyn RemoteMemory, base: Address) -> TypeDbResult<i16>
    {
        Ok(memory.read_short_at(base, self.offset()?)?)
    }

    fn read_c_integer(&self, memory: &dyn RemoteMemory, base: Address, kind: CIntegerKind) -> TypeDbResult<i64>
    {
        Ok(memory.read_c_integer_at(base, self.offset()?, kind.size, kind.is_unsigned)?)
    }

    fn read_address(&self, memory: &dyn RemoteMemory, base: Address) -> TypeDbResult<Address>
    {
        Ok(memory.read_address_at(base, self.offset()?)?)
    }

    fn read_oop(&self, memory: &dyn RemoteMemory, base: Address) -> TypeDbResult<Address>
    {
        Ok(memory.read_oop_at(base, self.offset()?)?)
    }

    fn read_narrow_oop(&self, memory: &dyn RemoteMemory, base: Address) -> TypeDbResult<Address>
    {
        Ok(memory.read_narrow_oop_at(base, self.offset()?)?)
    }

    fn read_static_boolean(&self, memory: &dyn RemoteMemory) -> TypeDbResult<bool>
    {
        Ok(memory.read_boolean_at(self.static_address()?, 0)?)
    }

    fn read_static_byte(&self, memory: &dyn RemoteMemory) -> TypeDbResult<i8>
    {
        Ok(memory.read_byte_at(self.static_address()?, 0)?)
    }

    fn read_static_char(&self, memory: &dyn RemoteMemory) -> TypeDbResult<u16>
    {
        Ok(memory.read_char_at(self.static_address()?, 0)?)
    }

    fn read_static_double(&self, memory: &dyn RemoteMemory) -> TypeDbResult<f64>
    {
        Ok(memory.read_double_at(self.static_address()?, 0)?)
    }

    fn read_static_float(&self, memory: &dyn RemoteMemory) -> TypeDbResult<f32>
    {
        Ok(memory.read_float_at(self.static_address()?, 0)?)
    }

    fn read_static_int(&self, memory: &dyn RemoteMemory) -> TypeDbResult<i32>
    {
        Ok(memory.read_int_at(self.static_address()?, 0)?)
    }

    fn read_static_long(&self, memory: &dyn RemoteMemory) -> TypeDbResult<i64>
    {
        Ok(memory.read_long_at(self.static_address()?, 0)?)
    }

    fn read_static_short(&self, memory: &dyn RemoteMemory) -> TypeDbResult<i16>
    {
        Ok(memory.read_short_at(self.static_address()?, 0)?)
    }

    fn read_static_c_integer(&self, memory: &dyn RemoteMemory, kind: CIntegerKind) -> TypeDbResult<i64>
    {
        Ok(memory.read_c_integer_at(self.static_address()?, 0, kind.size, kind.is_unsigned)?)
    }

    fn read_static_address(&self, memory: &dyn RemoteMemory) -> TypeDbResult<Address>
    {
        Ok(memory.read_address_at(self.static_address()?, 0)?)
    }

    fn read_static_oop(&self, memory: &dyn RemoteMemory) -> TypeDbResult<Address>
    {
        Ok(memory.read_oop_at(self.static_address()?, 0)?)
    }

    fn read_static_narrow_oop(&self, memory: &dyn RemoteMemory) -> TypeDbResult<Address>
    {
        Ok(memory.read_narrow_oop_at(self.static_address()?, 0)?)
    }
}

/// A field that owns its description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasicField
{
    name: String,
    owning_type: TypeId,
    declared_type: TypeId,
    size: u64,
    location: FieldLocation,
}

impl BasicField
{
    /// Describe a field. `size` is normally the declared type's size; the
    /// registry builder's `add_field` fills it in that way.
    pub fn new(
        name: impl Into<String>,
        owning_type: TypeId,
        declared_type: TypeId,
        size: u64,
        location: FieldLocation,
    ) -> Self
    {
        Self {
            name: name.into(),
            owning_type,
            declared_type,
            size,
            location,
        }
    }

    pub fn location(&self) -> FieldLocation
    {
        self.location
    }
}

impl Field for BasicField
{
    fn name(&self) -> &str
    {
        &self.name
    }

    fn owning_type(&self) -> TypeId
    {
        self.owning_type
    }

    fn declared_type(&self) -> TypeId
    {
        self.declared_type
    }

    fn size(&self) -> u64
    {
        self.size
    }

    fn is_static(&self) -> bool
    {
        matches!(self.location, FieldLocation::Static { .. })
    }

    fn offset(&self) -> TypeDbResult<i64>
    {
        match self.location {
            FieldLocation::Instance { offset } => Ok(offset),
            FieldLocation::Static { .. } => Err(TypeDbError::StaticField(self.name.clone())),
        }
    }

    fn static_address(&self) -> TypeDbResult<Address>
    {
        match self.location {
            FieldLocation::Static { address } => Ok(address),
            FieldLocation::Instance { .. } => Err(TypeDbError::InstanceField(self.name.clone())),
        }
    }
}
