//! # Type Nodes
//!
//! One named type of the inspected program: its size, superclass, flags and
//! the fields it declares directly.
//!
//! Nodes live in the registry's arena and refer to each other by [`TypeId`],
//! so superclass links and self-referential pointer types need no shared
//! ownership. Walking a superclass chain needs the registry; see
//! [`TypeHandle`](crate::handle::TypeHandle).

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::{NameKind, TypeDbError, TypeDbResult};
use crate::field::Field;

/// Identity of a type inside one registry.
///
/// Two nodes with the same name but different ids are different types; this
/// is what identity-checked removal compares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(u32);

impl TypeId
{
    #[allow(clippy::cast_possible_truncation)]
    pub(crate) const fn from_index(index: usize) -> Self
    {
        TypeId(index as u32)
    }

    /// Arena index of the type.
    #[must_use]
    pub const fn index(self) -> usize
    {
        self.0 as usize
    }
}

impl From<u32> for TypeId
{
    fn from(index: u32) -> Self
    {
        TypeId(index)
    }
}

impl fmt::Display for TypeId
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        write!(f, "TypeId({})", self.0)
    }
}

/// Size and signedness of a native integer type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CIntegerKind
{
    /// Width in bytes
    pub size: u64,
    /// Whether values are zero-extended
    pub is_unsigned: bool,
}

/// Structural variant of a type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeKind
{
    /// Classes, structs, Java primitives, oop types.
    Plain,
    /// Native integer with explicit signedness.
    CInteger
    {
        /// Whether values are zero-extended
        is_unsigned: bool,
    },
    /// Native pointer; the target may be unknown.
    Pointer
    {
        /// Pointed-to type
        target: Option<TypeId>,
    },
}

/// A named type and the fields it declares directly.
///
/// ## Invariants
///
/// - Own field names are unique ([`TypeNode::add_field`] rejects duplicates).
/// - Fields iterate in insertion order.
///
/// Mutation is only reachable through
/// [`TypeRegistryBuilder::type_mut`](crate::registry::TypeRegistryBuilder::type_mut);
/// a frozen registry hands out `&TypeNode` only.
#[derive(Debug, Clone)]
pub struct TypeNode
{
    name: String,
    size: u64,
    superclass: Option<TypeId>,
    is_primitive: bool,
    is_oop: bool,
    kind: TypeKind,
    fields: Vec<Arc<dyn Field>>,
    field_index: HashMap<String, usize>,
}

impl TypeNode
{
    /// A plain type (class, struct, primitive, oop).
    pub fn new(name: impl Into<String>, size: u64) -> Self
    {
        Self {
            name: name.into(),
            size,
            superclass: None,
            is_primitive: false,
            is_oop: false,
            kind: TypeKind::Plain,
            fields: Vec::new(),
            field_index: HashMap::new(),
        }
    }

    /// A native integer type.
    pub fn c_integer(name: impl Into<String>, size: u64, is_unsigned: bool) -> Self
    {
        Self {
            kind: TypeKind::CInteger { is_unsigned },
            ..Self::new(name, size)
        }
    }

    /// A native pointer type.
    pub fn pointer(name: impl Into<String>, size: u64, target: Option<TypeId>) -> Self
    {
        Self {
            kind: TypeKind::Pointer { target },
            ..Self::new(name, size)
        }
    }

    /// Set the superclass.
    #[must_use]
    pub fn with_superclass(mut self, superclass: TypeId) -> Self
    {
        self.superclass = Some(superclass);
        self
    }

    /// Mark as a Java primitive type.
    #[must_use]
    pub fn with_primitive(mut self) -> Self
    {
        self.is_primitive = true;
        self
    }

    /// Mark as an oop type.
    #[must_use]
    pub fn with_oop(mut self) -> Self
    {
        self.is_oop = true;
        self
    }

    pub fn name(&self) -> &str
    {
        &self.name
    }

    pub fn size(&self) -> u64
    {
        self.size
    }

    pub fn superclass(&self) -> Option<TypeId>
    {
        self.superclass
    }

    pub fn kind(&self) -> TypeKind
    {
        self.kind
    }

    pub fn is_primitive(&self) -> bool
    {
        self.is_primitive
    }

    pub fn is_oop(&self) -> bool
    {
        self.is_oop
    }

    pub fn is_c_integer(&self) -> bool
    {
        matches!(self.kind, TypeKind::CInteger { .. })
    }

    /// Whether this is an unsigned C-integer type (`false` for any other kind).
    pub fn is_unsigned(&self) -> bool
    {
        matches!(self.kind, TypeKind::CInteger { is_unsigned: true })
    }

    pub fn is_pointer(&self) -> bool
    {
        matches!(self.kind, TypeKind::Pointer { .. })
    }

    /// Pointed-to type of a pointer type.
    pub fn pointer_target(&self) -> Option<TypeId>
    {
        match self.kind {
            TypeKind::Pointer { target } => target,
            _ => None,
        }
    }

    /// Width and signedness, for C-integer types.
    pub fn c_integer_kind(&self) -> Option<CIntegerKind>
    {
        match self.kind {
            TypeKind::CInteger { is_unsigned } => Some(CIntegerKind {
                size: self.size,
                is_unsigned,
            }),
            _ => None,
        }
    }

    /// Change the size; builder only.
    pub fn set_size(&mut self, size: u64)
    {
        self.size = size;
    }

    /// Change the superclass; builder only.
    pub fn set_superclass(&mut self, superclass: Option<TypeId>)
    {
        self.superclass = superclass;
    }

    /// Resolve a pointer's target once it is known; builder only.
    ///
    /// ## Errors
    ///
    /// `TypeMismatch` if this is not a pointer type.
    pub fn set_pointer_target(&mut self, target: TypeId) -> TypeDbResult<()>
    {
        match &mut self.kind {
            TypeKind::Pointer { target: slot } => {
                *slot = Some(target);
                Ok(())
            }
            _ => Err(TypeDbError::TypeMismatch(format!("{} is not a pointer type", self.name))),
        }
    }

    /// Declare a field directly on this type.
    ///
    /// ## Errors
    ///
    /// `DuplicateField` if this type already declares a field of that name.
    pub fn add_field(&mut self, field: Arc<dyn Field>) -> TypeDbResult<()>
    {
        if self.field_index.contains_key(field.name()) {
            return Err(TypeDbError::DuplicateField {
                owner: self.name.clone(),
                field: field.name().to_string(),
            });
        }
        self.field_index.insert(field.name().to_string(), self.fields.len());
        self.fields.push(field);
        Ok(())
    }

    /// Remove a field declared directly on this type.
    ///
    /// ## Errors
    ///
    /// `NameNotFound` if this type declares no such field.
    pub fn remove_field(&mut self, name: &str) -> TypeDbResult<Arc<dyn Field>>
    {
        let index = self
            .field_index
            .remove(name)
            .ok_or_else(|| TypeDbError::not_found(NameKind::Field, format!("{}::{name}", self.name)))?;
        let field = self.fields.remove(index);
        for slot in self.field_index.values_mut() {
            if *slot > index {
                *slot -= 1;
            }
        }
        Ok(field)
    }

    /// Field declared directly on this type (superclasses are not searched).
    pub fn own_field(&self, name: &str) -> Option<&Arc<dyn Field>>
    {
        self.field_index.get(name).map(|index| &self.fields[*index])
    }

    /// Fields declared directly on this type, in insertion order.
    pub fn fields(&self) -> impl Iterator<Item = &Arc<dyn Field>> + '_
    {
        self.fields.iter()
    }
}

impl PartialEq for TypeNode
{
    fn eq(&self, other: &Self) -> bool
    {
        if self.name != other.name {
            return false;
        }
        match (self.kind, other.kind) {
            (TypeKind::CInteger { is_unsigned: a }, TypeKind::CInteger { is_unsigned: b }) => a == b,
            (TypeKind::CInteger { .. }, _) | (_, TypeKind::CInteger { .. }) => false,
            _ => true,
        }
    }
}

impl Eq for TypeNode {}

impl fmt::Display for TypeNode
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        if self.is_unsigned() {
            write!(f, "unsigned {}", self.name)
        } else {
            write!(f, "{}", self.name)
        }
    }
}
