//! # Error Types
//!
//! General error handling for the type database.
//!
//! We use `thiserror` to automatically generate `Error` trait implementations
//! and nice error messages.

use std::fmt;

use thiserror::Error;

use crate::memory::MemoryError;

/// What kind of entity a failed name lookup was looking for.
///
/// Carried by [`TypeDbError::NameNotFound`] so the message echoes both the
/// name and what it was supposed to name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameKind
{
    /// A type registered in the database.
    Type,
    /// A field declared on a type (or one of its superclasses).
    Field,
    /// A named `i32` constant.
    IntConstant,
    /// A named `i64` constant.
    LongConstant,
}

impl fmt::Display for NameKind
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        let label = match self {
            NameKind::Type => "type",
            NameKind::Field => "field",
            NameKind::IntConstant => "int constant",
            NameKind::LongConstant => "long constant",
        };
        write!(f, "{label}")
    }
}

/// Main error type for type database operations
///
/// This enum represents all the ways a structural query, a builder operation,
/// or a typed field read can fail.
///
/// ## Error Categories
///
/// 1. **Lookup errors**: NameNotFound
/// 2. **Uniqueness errors**: DuplicateType, DuplicateField, DuplicateConstant, AlreadySet
/// 3. **Kind errors**: TypeMismatch, StaticField, InstanceField
/// 4. **Build errors**: DanglingType, MissingCollaborator
/// 5. **Memory errors**: Memory (unmapped/unaligned reads from the inspected process)
/// 6. **I/O errors**: Io, Object (loading symbol tables from binaries)
///
/// Dynamic type recovery never returns these: probing memory for a vtable
/// signature reports "unknown" instead.
#[derive(Error, Debug)]
pub enum TypeDbError
{
    /// A type, field, or constant lookup failed and the caller asked for the
    /// failing (rather than optional) variant.
    #[error("{kind} not found: {name}")]
    NameNotFound
    {
        /// What the name was supposed to refer to
        kind: NameKind,
        /// The name that was looked up
        name: String,
    },

    /// A type with this name is already registered.
    #[error("Duplicate type: {0}")]
    DuplicateType(String),

    /// The owning type already declares a field with this name.
    #[error("Duplicate field {field} in type {owner}")]
    DuplicateField
    {
        /// Name of the type the field was added to
        owner: String,
        /// Name of the duplicated field
        field: String,
    },

    /// A named constant with this name is already registered.
    #[error("Duplicate constant: {0}")]
    DuplicateConstant(String),

    /// A found entity does not have the expected type or kind.
    ///
    /// Examples:
    /// - A field's declared type differs from the requested type
    /// - Asking for a C-integer field on a field of an oop type
    /// - Removing a type whose identity differs from the one stored under its name
    #[error("Type mismatch: {0}")]
    TypeMismatch(String),

    /// An instance-only operation was invoked on a static field.
    #[error("Field {0} is static")]
    StaticField(String),

    /// A static-only operation was invoked on an instance field.
    #[error("Field {0} is not static")]
    InstanceField(String),

    /// A builder slot that may only be set once was set again.
    #[error("{0} already set")]
    AlreadySet(String),

    /// A type refers to a type that is no longer registered.
    ///
    /// Raised by [`TypeRegistryBuilder::build`](crate::registry::TypeRegistryBuilder::build)
    /// when a superclass, pointer target, or field type was removed after
    /// being referenced.
    #[error("Dangling type reference: {0}")]
    DanglingType(String),

    /// The registry was frozen without a required collaborator.
    #[error("Missing collaborator: {0}")]
    MissingCollaborator(&'static str),

    /// Reading the inspected process failed.
    ///
    /// Field reads propagate [`MemoryError`] unchanged inside this variant.
    #[error(transparent)]
    Memory(#[from] MemoryError),

    /// A binary image could not be parsed.
    #[error("Failed to parse {path}: {details}")]
    Object
    {
        /// Path (or label) of the image
        path: String,
        /// Parser error details
        details: String,
    },

    /// I/O error (reading binaries from disk, etc.)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl TypeDbError
{
    pub(crate) fn not_found(kind: NameKind, name: impl Into<String>) -> Self
    {
        TypeDbError::NameNotFound { kind, name: name.into() }
    }

    /// The memory error carried by this error, if any.
    #[must_use]
    pub fn memory_error(&self) -> Option<&MemoryError>
    {
        match self {
            TypeDbError::Memory(err) => Some(err),
            _ => None,
        }
    }
}

/// Convenience type alias for `Result<T, TypeDbError>`
///
/// ```rust
/// use layoutdb_core::error::TypeDbResult;
/// fn foo() -> TypeDbResult<()>
/// {
///     Ok(())
/// }
/// ```
pub type TypeDbResult<T> = std::result::Result<T, TypeDbError>;
