//! Forwarding field.

use std::sync::Arc;

use super::Field;
use crate::error::TypeDbResult;
use crate::memory::RemoteMemory;
use crate::node::{CIntegerKind, TypeId};
use crate::types::Address;

/// A field that forwards every operation to another field.
///
/// Used to present one field under a different typed view (a narrow oop as
/// an oop, any field as an address) without copying its description.
#[derive(Debug, Clone)]
pub struct FieldWrapper
{
    inner: Arc<dyn Field>,
}

impl FieldWrapper
{
    pub fn new(inner: Arc<dyn Field>) -> Self
    {
        Self { inner }
    }

    /// The wrapped field.
    pub fn inner(&self) -> &Arc<dyn Field>
    {
        &self.inner
    }
}

impl Field for FieldWrapper
{
    fn name(&self) -> &str
    {
        self.inner.name()
    }

    fn owning_type(&self) -> TypeId
    {
        self.inner.owning_type()
    }

    fn declared_type(&self) -> TypeId
    {
        self.inner.declared_type()
    }

    fn size(&self) -> u64
    {
        self.inner.size()
    }

    fn is_static(&self) -> bool
    {
        self.inner.is_static()
    }

    fn offset(&self) -> TypeDbResult<i64>
    {
        self.inner.offset()
    }

    fn static_address(&self) -> TypeDbResult<Address>
    {
        self.inner.static_address()
    }

    fn read_boolean(&self, memory: &dyn RemoteMemory, base: Address) -> TypeDbResult<bool>
    {
        self.inner.read_boolean(memory, base)
    }

    fn read_byte(&self, memory: &dyn RemoteMemory, base: Address) -> TypeDbResult<i8>
    {
        self.inner.read_byte(memory, base)
    }

    fn read_char(&self, memory: &dyn RemoteMemory, base: Address) -> TypeDbResult<u16>
    {
        self.inner.read_char(memory, base)
    }

    fn read_double(&self, memory: &dyn RemoteMemory, base: Address) -> TypeDbResult<f64>
    {
        self.inner.read_double(memory, base)
    }

    fn read_float(&self, memory: &dyn RemoteMemory, base: Address) -> TypeDbResult<f32>
    {
        self.inner.read_float(memory, base)
    }

    fn read_int(&self, memory: &dyn RemoteMemory, base: Address) -> TypeDbResult<i32>
    {
        self.inner.read_int(memory, base)
    }

    fn read_long(&self, memory: &dyn RemoteMemory, base: Address) -> TypeDbResult<i64>
    {
        self.inner.read_long(memory, base)
    }

    fn read_short(&self, memory: &dyn RemoteMemory, base: Address) -> TypeDbResult<i16>
    {
        self.inner.read_short(memory, base)
    }

    fn read_c_integer(&self, memory: &dyn RemoteMemory, base: Address, kind: CIntegerKind) -> TypeDbResult<i64>
    {
        self.inner.read_c_integer(memory, base, kind)
    }

    fn read_address(&self, memory: &dyn RemoteMemory, base: Address) -> TypeDbResult<Address>
    {
        self.inner.read_address(memory, base)
    }

    fn read_oop(&self, memory: &dyn RemoteMemory, base: Address) -> TypeDbResult<Address>
    {
        self.inner.read_oop(memory, base)
    }

    fn read_narrow_oop(&self, memory: &dyn RemoteMemory, base: Address) -> TypeDbResult<Address>
    {
        self.inner.read_narrow_oop(memory, base)
    }

    fn read_static_boolean(&self, memory: &dyn RemoteMemory) -> TypeDbResult<bool>
    {
        self.inner.read_static_boolean(memory)
    }

    fn read_static_byte(&self, memory: &dyn RemoteMemory) -> TypeDbResult<i8>
    {
        self.inner.read_static_byte(memory)
    }

    fn read_static_char(&self, memory: &dyn RemoteMemory) -> TypeDbResult<u16>
    {
        self.inner.read_static_char(memory)
    }

    fn read_static_double(&self, memory: &dyn RemoteMemory) -> TypeDbResult<f64>
    {
        self.inner.read_static_double(memory)
    }

    fn read_static_float(&self, memory: &dyn RemoteMemory) -> TypeDbResult<f32>
    {
        self.inner.read_static_float(memory)
    }

    fn read_static_int(&self, memory: &dyn RemoteMemory) -> TypeDbResult<i32>
    {
        self.inner.read_static_int(memory)
    }

    fn read_static_long(&self, memory: &dyn RemoteMemory) -> TypeDbResult<i64>
    {
        self.inner.read_static_long(memory)
    }

    fn read_static_short(&self, memory: &dyn RemoteMemory) -> TypeDbResult<i16>
    {
        self.inner.read_static_short(memory)
    }

    fn read_static_c_integer(&self, memory: &dyn RemoteMemory, kind: CIntegerKind) -> TypeDbResult<i64>
    {
        self.inner.read_static_c_integer(memory, kind)
    }

    fn read_static_address(&self, memory: &dyn RemoteMemory) -> TypeDbResult<Address>
    {
        self.inner.read_static_address(memory)
    }

    fn read_static_oop(&self, memory: &dyn RemoteMemory) -> TypeDbResult<Address>
    {
        self.inner.read_static_oop(memory)
    }

    fn read_static_narrow_oop(&self, memory: &dyn RemoteMemory) -> TypeDbResult<Address>
    {
        self.inner.read_static_narrow_oop(memory)
    }
}
