//! Typed views over fields.
//!
//! [`TypeHandle`](crate::handle::TypeHandle)'s accessors check a field's
//! declared type once and hand back one of these views, so callers read
//! `thread.int_field("_state")?.value(memory, thread_addr)?` without
//! repeating the kind at every read.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use super::{Field, FieldWrapper};
use crate::error::TypeDbResult;
use crate::memory::RemoteMemory;
use crate::node::CIntegerKind;
use crate::primitives::PrimitiveKind;
use crate::types::Address;

/// A Rust value type that a Java-primitive field reads as.
pub trait FieldValue: Sized
{
    /// Primitive kind whose registered type a field must declare.
    const KIND: PrimitiveKind;

    /// Read from an instance field of the object at `base`.
    ///
    /// ## Errors
    ///
    /// See [`Field`]: direction errors and memory errors.
    fn read(field: &dyn Field, memory: &dyn RemoteMemory, base: Address) -> TypeDbResult<Self>;

    /// Read from a static field.
    ///
    /// ## Errors
    ///
    /// See [`Field`]: direction errors and memory errors.
    fn read_static(field: &dyn Field, memory: &dyn RemoteMemory) -> TypeDbResult<Self>;
}

impl FieldValue for bool
{
    const KIND: PrimitiveKind = PrimitiveKind::Boolean;

    fn read(field: &dyn Field, memory: &dyn RemoteMemory, base: Address) -> TypeDbResult<Self>
    {
        field.read_boolean(memory, base)
    }

    fn read_static(field: &dyn Field, memory: &dyn RemoteMemory) -> TypeDbResult<Self>
    {
        field.read_static_boolean(memory)
    }
}

impl FieldValue for i8
{
    const KIND: PrimitiveKind = PrimitiveKind::Byte;

    fn read(field: &dyn Field, memory: &dyn RemoteMemory, base: Address) -> TypeDbResult<Self>
    {
        field.read_byte(memory, base)
    }

    fn read_static(field: &dyn Field, memory: &dyn RemoteMemory) -> TypeDbResult<Self>
    {
        field.read_static_byte(memory)
    }
}

impl FieldValue for u16
{
    const KIND: PrimitiveKind = PrimitiveKind::Char;

    fn read(field: &dyn Field, memory: &dyn RemoteMemory, base: Address) -> TypeDbResult<Self>
    {
        field.read_char(memory, base)
    }

    fn read_static(field: &dyn Field, memory: &dyn RemoteMemory) -> TypeDbResult<Self>
    {
        field.read_static_char(memory)
    }
}

impl FieldValue for f64
{
    const KIND: PrimitiveKind = PrimitiveKind::Double;

    fn read(field: &dyn Field, memory: &dyn RemoteMemory, base: Address) -> TypeDbResult<Self>
    {
        field.read_double(memory, base)
    }

    fn read_static(field: &dyn Field, memory: &dyn RemoteMemory) -> TypeDbResult<Self>
    {
        field.read_static_double(memory)
    }
}

impl FieldValue for f32
{
    const KIND: PrimitiveKind = PrimitiveKind::Float;

    fn read(field: &dyn Field, memory: &dyn RemoteMemory, base: Address) -> TypeDbResult<Self>
    {
        field.read_float(memory, base)
    }

    fn read_static(field: &dyn Field, memory: &dyn RemoteMemory) -> TypeDbResult<Self>
    {
        field.read_static_float(memory)
    }
}

impl FieldValue for i32
{
    const KIND: PrimitiveKind = PrimitiveKind::Int;

    fn read(field: &dyn Field, memory: &dyn RemoteMemory, base: Address) -> TypeDbResult<Self>
    {
        field.read_int(memory, base)
    }

    fn read_static(field: &dyn Field, memory: &dyn RemoteMemory) -> TypeDbResult<Self>
    {
        field.read_static_int(memory)
    }
}

impl FieldValue for i64
{
    const KIND: PrimitiveKind = PrimitiveKind::Long;

    fn read(field: &dyn Field, memory: &dyn RemoteMemory, base: Address) -> TypeDbResult<Self>
    {
        field.read_long(memory, base)
    }

    fn read_static(field: &dyn Field, memory: &dyn RemoteMemory) -> TypeDbResult<Self>
    {
        field.read_static_long(memory)
    }
}

impl FieldValue for i16
{
    const KIND: PrimitiveKind = PrimitiveKind::Short;

    fn read(field: &dyn Field, memory: &dyn RemoteMemory, base: Address) -> TypeDbResult<Self>
    {
        field.read_short(memory, base)
    }

    fn read_static(field: &dyn Field, memory: &dyn RemoteMemory) -> TypeDbResult<Self>
    {
        field.read_static_short(memory)
    }
}

/// A field known to declare the Java primitive type `T` reads as.
pub struct TypedField<T>
{
    field: Arc<dyn Field>,
    _value: PhantomData<fn() -> T>,
}

pub type BooleanField = TypedField<bool>;
pub type ByteField = TypedField<i8>;
pub type CharField = TypedField<u16>;
pub type DoubleField = TypedField<f64>;
pub type FloatField = TypedField<f32>;
pub type IntField = TypedField<i32>;
pub type LongField = TypedField<i64>;
pub type ShortField = TypedField<i16>;

impl<T: FieldValue> TypedField<T>
{
    pub fn new(field: Arc<dyn Field>) -> Self
    {
        Self {
            field,
            _value: PhantomData,
        }
    }

    /// The underlying field.
    pub fn field(&self) -> &Arc<dyn Field>
    {
        &self.field
    }

    /// Value in the object at `base`.
    ///
    /// ## Errors
    ///
    /// `StaticField` if the field is static; memory errors.
    pub fn value(&self, memory: &dyn RemoteMemory, base: Address) -> TypeDbResult<T>
    {
        T::read(self.field.as_ref(), memory, base)
    }

    /// Value of a static field.
    ///
    /// ## Errors
    ///
    /// `InstanceField` if the field is not static; memory errors.
    pub fn static_value(&self, memory: &dyn RemoteMemory) -> TypeDbResult<T>
    {
        T::read_static(self.field.as_ref(), memory)
    }
}

impl<T> Clone for TypedField<T>
{
    fn clone(&self) -> Self
    {
        Self {
            field: Arc::clone(&self.field),
            _value: PhantomData,
        }
    }
}

impl<T> fmt::Debug for TypedField<T>
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        f.debug_struct("TypedField")
            .field("field", &self.field)
            .field("value", &std::any::type_name::<T>())
            .finish()
    }
}

/// A field whose declared type is a native integer type.
#[derive(Debug, Clone)]
pub struct CIntegerField
{
    field: Arc<dyn Field>,
    kind: CIntegerKind,
}

impl CIntegerField
{
    pub fn new(field: Arc<dyn Field>, kind: CIntegerKind) -> Self
    {
        Self { field, kind }
    }

    pub fn field(&self) -> &Arc<dyn Field>
    {
        &self.field
    }

    /// Width and signedness of the declared type.
    pub fn kind(&self) -> CIntegerKind
    {
        self.kind
    }

    /// Value in the object at `base`, sign-extended unless unsigned.
    ///
    /// ## Errors
    ///
    /// `StaticField` if the field is static; memory errors.
    pub fn value(&self, memory: &dyn RemoteMemory, base: Address) -> TypeDbResult<i64>
    {
        self.field.read_c_integer(memory, base, self.kind)
    }

    /// Value of a static field.
    ///
    /// ## Errors
    ///
    /// `InstanceField` if the field is not static; memory errors.
    pub fn static_value(&self, memory: &dyn RemoteMemory) -> TypeDbResult<i64>
    {
        self.field.read_static_c_integer(memory, self.kind)
    }
}

/// Reading an object reference, however it is stored.
///
/// Implemented by [`OopField`] and [`NarrowOopField`] so callers can handle
/// compressed and uncompressed references uniformly.
pub trait OopFieldAccess
{
    /// The underlying field.
    fn field(&self) -> &dyn Field;

    /// Referenced object address in the object at `base`.
    ///
    /// ## Errors
    ///
    /// `StaticField` if the field is static; memory errors.
    fn value(&self, memory: &dyn RemoteMemory, base: Address) -> TypeDbResult<Address>;

    /// Referenced object address of a static field.
    ///
    /// ## Errors
    ///
    /// `InstanceField` if the field is not static; memory errors.
    fn static_value(&self, memory: &dyn RemoteMemory) -> TypeDbResult<Address>;
}

/// A field holding a full-width oop.
#[derive(Debug, Clone)]
pub struct OopField
{
    field: Arc<dyn Field>,
}

impl OopField
{
    pub fn new(field: Arc<dyn Field>) -> Self
    {
        Self { field }
    }
}

impl OopFieldAccess for OopField
{
    fn field(&self) -> &dyn Field
    {
        self.field.as_ref()
    }

    fn value(&self, memory: &dyn RemoteMemory, base: Address) -> TypeDbResult<Address>
    {
        self.field.read_oop(memory, base)
    }

    fn static_value(&self, memory: &dyn RemoteMemory) -> TypeDbResult<Address>
    {
        self.field.read_static_oop(memory)
    }
}

/// A field holding a compressed oop, presented like an [`OopField`].
#[derive(Debug, Clone)]
pub struct NarrowOopField
{
    field: FieldWrapper,
}

impl NarrowOopField
{
    pub fn new(field: Arc<dyn Field>) -> Self
    {
        Self {
            field: FieldWrapper::new(field),
        }
    }
}

impl OopFieldAccess for NarrowOopField
{
    fn field(&self) -> &dyn Field
    {
        &self.field
    }

    fn value(&self, memory: &dyn RemoteMemory, base: Address) -> TypeDbResult<Address>
    {
        self.field.read_narrow_oop(memory, base)
    }

    fn static_value(&self, memory: &dyn RemoteMemory) -> TypeDbResult<Address>
    {
        self.field.read_static_narrow_oop(memory)
    }
}

/// Any field, read as a native address.
///
/// No declared-type check backs this view: native pointer types are not
/// uniformly recognisable, so whatever field was found is wrapped as-is and
/// read through its own `read_address`.
#[derive(Debug, Clone)]
pub struct AddressField
{
    field: FieldWrapper,
}

impl AddressField
{
    pub fn new(field: Arc<dyn Field>) -> Self
    {
        Self {
            field: FieldWrapper::new(field),
        }
    }

    pub fn field(&self) -> &dyn Field
    {
        &self.field
    }

    /// Address stored in the object at `base`.
    ///
    /// ## Errors
    ///
    /// `StaticField` if the field is static; memory errors.
    pub fn value(&self, memory: &dyn RemoteMemory, base: Address) -> TypeDbResult<Address>
    {
        self.field.read_address(memory, base)
    }

    /// Address stored in a static field.
    ///
    /// ## Errors
    ///
    /// `InstanceField` if the field is not static; memory errors.
    pub fn static_value(&self, memory: &dyn RemoteMemory) -> TypeDbResult<Address>
    {
        self.field.read_static_address(memory)
    }
}
