//! Common module for library exports

pub use crate::config::RegistryConfig;
pub use crate::error::{NameKind, TypeDbError, TypeDbResult};
pub use crate::field::{Field, FieldLocation, OopFieldAccess};
pub use crate::handle::TypeHandle;
pub use crate::machine::{MachineModel, TwosComplement};
pub use crate::memory::{MemoryError, RemoteMemory, SnapshotMemory};
pub use crate::node::{TypeId, TypeNode};
pub use crate::primitives::PrimitiveKind;
pub use crate::registry::{TypeRegistry, TypeRegistryBuilder};
pub use crate::symbols::{ImageSymbols, SymbolResolver, SymbolTable};
pub use crate::types::{Address, MemoryRange};
pub use crate::vtbl::{Itanium, Msvc, VtblCache, VtblSymbolNaming};
