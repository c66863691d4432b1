//! # layoutdb-core
//!
//! A native type and layout database for inspecting the memory of another
//! process.
//!
//! The database models the C++ type graph of the inspected program (named
//! types, sizes, single-inheritance superclass links, static and instance
//! fields, integer signedness, pointer targets) and answers two kinds of
//! question:
//!
//! - **Structural**: what is the offset, size or signedness of field F in
//!   type T? See [`handle::TypeHandle`] and [`field`].
//! - **Dynamic type**: given an object whose static type is T, what is its
//!   most derived type? Answered without RTTI, by matching the vtable
//!   pointers in the object against the vtables of T's subtypes. See
//!   [`registry::TypeRegistry::find_dynamic_type`].
//!
//! ## Collaborators
//!
//! The database never touches the inspected process directly. It is handed:
//!
//! - a [`memory::RemoteMemory`] to read bytes,
//! - a [`symbols::SymbolResolver`] (through a [`vtbl::VtblCache`]) to find
//!   vtable symbols,
//! - a [`machine::MachineModel`] for pointer width and integer ranges.
//!
//! Each has a reference implementation in this crate so the database can be
//! driven from a snapshot or a binary on disk.
//!
//! ## Lifecycle
//!
//! Populate a [`registry::TypeRegistryBuilder`], freeze it with `build()`,
//! then query the resulting [`registry::TypeRegistry`] from as many threads
//! as needed. Call `invalidate_vtbl_cache()` whenever the inspected process
//! has run between two inspection pauses.

pub mod config;
pub mod error;
pub mod field;
pub mod handle;
pub mod machine;
pub mod memory;
pub mod node;
pub mod prelude;
pub mod primitives;
pub mod registry;
pub mod symbols;
pub mod types;
pub mod vtbl;

// Re-export commonly used types
pub use error::{TypeDbError, TypeDbResult};
pub use registry::{TypeRegistry, TypeRegistryBuilder};
pub use types::Address;
