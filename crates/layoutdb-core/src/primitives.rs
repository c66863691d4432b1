//! The eight Java primitive kinds and the registry slots that name them.

use std::fmt;

use crate::error::{TypeDbError, TypeDbResult};
use crate::node::TypeId;

/// A Java primitive kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind
{
    /// `jboolean`
    Boolean,
    /// `jbyte`
    Byte,
    /// `jchar`
    Char,
    /// `jdouble`
    Double,
    /// `jfloat`
    Float,
    /// `jint`
    Int,
    /// `jlong`
    Long,
    /// `jshort`
    Short,
}

impl PrimitiveKind
{
    /// All kinds, in slot order.
    pub const ALL: [PrimitiveKind; 8] = [
        PrimitiveKind::Boolean,
        PrimitiveKind::Byte,
        PrimitiveKind::Char,
        PrimitiveKind::Double,
        PrimitiveKind::Float,
        PrimitiveKind::Int,
        PrimitiveKind::Long,
        PrimitiveKind::Short,
    ];

    const fn slot(self) -> usize
    {
        self as usize
    }
}

impl fmt::Display for PrimitiveKind
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        let label = match self {
            PrimitiveKind::Boolean => "jboolean",
            PrimitiveKind::Byte => "jbyte",
            PrimitiveKind::Char => "jchar",
            PrimitiveKind::Double => "jdouble",
            PrimitiveKind::Float => "jfloat",
            PrimitiveKind::Int => "jint",
            PrimitiveKind::Long => "jlong",
            PrimitiveKind::Short => "jshort",
        };
        write!(f, "{label}")
    }
}

/// Which registered type stands for each primitive kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PrimitiveTypes
{
    slots: [Option<TypeId>; 8],
}

impl PrimitiveTypes
{
    /// Type registered for `kind`, if any.
    #[must_use]
    pub fn get(&self, kind: PrimitiveKind) -> Option<TypeId>
    {
        self.slots[kind.slot()]
    }

    /// Fill the slot for `kind`.
    ///
    /// ## Errors
    ///
    /// `AlreadySet` if the slot was filled before.
    pub fn set(&mut self, kind: PrimitiveKind, id: TypeId) -> TypeDbResult<()>
    {
        let slot = &mut self.slots[kind.slot()];
        if slot.is_some() {
            return Err(TypeDbError::AlreadySet(format!("{kind} type")));
        }
        *slot = Some(id);
        Ok(())
    }

    /// Filled slots as `(kind, type)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (PrimitiveKind, TypeId)> + '_
    {
        PrimitiveKind::ALL
            .iter()
            .filter_map(|kind| self.get(*kind).map(|id| (*kind, id)))
    }
}
