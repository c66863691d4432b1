//! # Remote Memory
//!
//! The capability the database uses to read the inspected process.
//!
//! The transport behind it (a live process, a core file, a remote agent) is
//! not the database's business. Implementors provide raw byte reads plus a
//! few machine facts; the typed reads (`read_int_at`, `read_address_at`, ...)
//! are provided on top and enforce natural alignment.
//!
//! ## Offsets
//!
//! Every typed read takes a `base` address and a signed byte `offset`, the
//! same shape fields use: a field read is `read_*_at(object, field_offset)`,
//! a static field read is `read_*_at(static_address, 0)`.

mod error;
pub mod snapshot;

pub use error::{MemoryError, MemoryResult};
pub use snapshot::SnapshotMemory;

use crate::types::Address;

/// Byte order of the inspected process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ByteOrder
{
    /// Least significant byte first (x86-64, AArch64 in practice).
    #[default]
    Little,
    /// Most significant byte first.
    Big,
}

/// Decoding rule for 32-bit compressed ("narrow") oops.
///
/// A non-zero narrow value decodes to `base + (value << shift)`; zero stays
/// null.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NarrowOopEncoding
{
    /// Heap base added to every decoded oop
    pub base: Address,
    /// Left shift applied to the narrow value
    pub shift: u32,
}

impl NarrowOopEncoding
{
    /// Decode a narrow oop value.
    #[must_use]
    pub fn decode(self, narrow: u32) -> Address
    {
        if narrow == 0 {
            return Address::NULL;
        }
        self.base + (u64::from(narrow) << self.shift)
    }
}

fn read_array<M, const N: usize>(memory: &M, base: Address, offset: i64) -> MemoryResult<[u8; N]>
where
    M: RemoteMemory + ?Sized,
{
    let address = base.offset(offset);
    let alignment = N as u64;
    if !address.is_aligned(alignment) {
        return Err(MemoryError::UnalignedAddress { address, alignment });
    }
    let mut buf = [0u8; N];
    memory.read_bytes(address, &mut buf)?;
    Ok(buf)
}

fn read_unsigned<M>(memory: &M, base: Address, offset: i64, size: u64) -> MemoryResult<u64>
where
    M: RemoteMemory + ?Sized,
{
    let order = memory.byte_order();
    let value = match size {
        1 => u64::from(read_array::<M, 1>(memory, base, offset)?[0]),
        2 => {
            let bytes = read_array::<M, 2>(memory, base, offset)?;
            u64::from(match order {
                ByteOrder::Little => u16::from_le_bytes(bytes),
                ByteOrder::Big => u16::from_be_bytes(bytes),
            })
        }
        4 => {
            let bytes = read_array::<M, 4>(memory, base, offset)?;
            u64::from(match order {
                ByteOrder::Little => u32::from_le_bytes(bytes),
                ByteOrder::Big => u32::from_be_bytes(bytes),
            })
        }
        8 => {
            let bytes = read_array::<M, 8>(memory, base, offset)?;
            match order {
                ByteOrder::Little => u64::from_le_bytes(bytes),
                ByteOrder::Big => u64::from_be_bytes(bytes),
            }
        }
        _ => return Err(MemoryError::InvalidSize { size }),
    };
    Ok(value)
}

/// Read access to the memory of the inspected process.
///
/// ## Errors
///
/// Every read fails with [`MemoryError::UnmappedAddress`] when no mapping
/// covers the bytes, and the typed reads fail with
/// [`MemoryError::UnalignedAddress`] when the computed address is not a
/// multiple of the value's size.
///
/// ## Thread Safety
///
/// Reads take `&self`; implementations must be `Send + Sync` so a frozen
/// registry can be shared between reader threads.
#[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
pub trait RemoteMemory: Send + Sync
{
    /// Size of a pointer in the inspected process, in bytes (4 or 8).
    fn address_size(&self) -> u64;

    /// Fill `buf` with the bytes starting at `address`.
    fn read_bytes(&self, address: Address, buf: &mut [u8]) -> MemoryResult<()>;

    /// Byte order of the inspected process.
    fn byte_order(&self) -> ByteOrder
    {
        ByteOrder::Little
    }

    /// How 32-bit compressed oops decode to full addresses.
    fn narrow_oop_encoding(&self) -> NarrowOopEncoding
    {
        NarrowOopEncoding::default()
    }

    /// Read a one-byte boolean (any non-zero byte is `true`).
    fn read_boolean_at(&self, base: Address, offset: i64) -> MemoryResult<bool>
    {
        Ok(read_unsigned(self, base, offset, 1)? != 0)
    }

    /// Read a signed byte.
    fn read_byte_at(&self, base: Address, offset: i64) -> MemoryResult<i8>
    {
        Ok(read_unsigned(self, base, offset, 1)? as u8 as i8)
    }

    /// Read a 16-bit UTF-16 code unit.
    fn read_char_at(&self, base: Address, offset: i64) -> MemoryResult<u16>
    {
        Ok(read_unsigned(self, base, offset, 2)? as u16)
    }

    /// Read a 64-bit IEEE double.
    fn read_double_at(&self, base: Address, offset: i64) -> MemoryResult<f64>
    {
        Ok(f64::from_bits(read_unsigned(self, base, offset, 8)?))
    }

    /// Read a 32-bit IEEE float.
    fn read_float_at(&self, base: Address, offset: i64) -> MemoryResult<f32>
    {
        Ok(f32::from_bits(read_unsigned(self, base, offset, 4)? as u32))
    }

    /// Read a signed 32-bit integer.
    fn read_int_at(&self, base: Address, offset: i64) -> MemoryResult<i32>
    {
        Ok(read_unsigned(self, base, offset, 4)? as u32 as i32)
    }

    /// Read a signed 64-bit integer.
    fn read_long_at(&self, base: Address, offset: i64) -> MemoryResult<i64>
    {
        Ok(read_unsigned(self, base, offset, 8)? as i64)
    }

    /// Read a signed 16-bit integer.
    fn read_short_at(&self, base: Address, offset: i64) -> MemoryResult<i16>
    {
        Ok(read_unsigned(self, base, offset, 2)? as u16 as i16)
    }

    /// Read a native integer of `size` bytes, sign-extending unless
    /// `is_unsigned`.
    ///
    /// Unsigned 8-byte values come back as their raw bit pattern.
    fn read_c_integer_at(&self, base: Address, offset: i64, size: u64, is_unsigned: bool) -> MemoryResult<i64>
    {
        let raw = read_unsigned(self, base, offset, size)?;
        if is_unsigned || size == 8 {
            return Ok(raw as i64);
        }
        let unused = 64 - (size * 8) as u32;
        Ok(((raw << unused) as i64) >> unused)
    }

    /// Read a pointer-sized address.
    fn read_address_at(&self, base: Address, offset: i64) -> MemoryResult<Address>
    {
        read_unsigned(self, base, offset, self.address_size()).map(Address::new)
    }

    /// Read an uncompressed oop.
    fn read_oop_at(&self, base: Address, offset: i64) -> MemoryResult<Address>
    {
        self.read_address_at(base, offset)
    }

    /// Read a 32-bit compressed oop and decode it.
    fn read_narrow_oop_at(&self, base: Address, offset: i64) -> MemoryResult<Address>
    {
        let narrow = read_unsigned(self, base, offset, 4)? as u32;
        Ok(self.narrow_oop_encoding().decode(narrow))
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn test_narrow_oop_decode()
    {
        let encoding = NarrowOopEncoding {
            base: Address::new(0x8_0000_0000),
            shift: 3,
        };
        assert_eq!(encoding.decode(0), Address::NULL);
        assert_eq!(encoding.decode(0x10), Address::new(0x8_0000_0080));
    }
}
