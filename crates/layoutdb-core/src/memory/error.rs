//! # Remote Memory Errors
//!
//! Failures raised when reading the inspected process.
//!
//! These come from the [`RemoteMemory`](super::RemoteMemory) backend and are
//! propagated unchanged through field reads. Dynamic type recovery is the one
//! place that deliberately swallows them.

use thiserror::Error;

use crate::types::Address;

/// Remote memory access error
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryError
{
    /// No mapping covers the requested bytes.
    ///
    /// Typical causes:
    /// - A stale or garbage pointer
    /// - Probing a candidate vptr slot past the end of an object
    /// - A core file that omitted the page
    #[error("Unmapped address {address}")]
    UnmappedAddress
    {
        /// First address of the failed read
        address: Address,
    },

    /// The address is not naturally aligned for the value being read.
    #[error("Unaligned address {address} (required alignment {alignment})")]
    UnalignedAddress
    {
        /// Address of the failed read
        address: Address,
        /// Alignment the read required, in bytes
        alignment: u64,
    },

    /// The requested integer or pointer width is not 1, 2, 4 or 8 bytes.
    #[error("Unsupported value size: {size} bytes")]
    InvalidSize
    {
        /// Requested width in bytes
        size: u64,
    },
}

/// Convenience type alias for `Result<T, MemoryError>`
pub type MemoryResult<T> = std::result::Result<T, MemoryError>;
