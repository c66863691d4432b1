//! In-memory snapshot of a process address space.
//!
//! `SnapshotMemory` holds a set of mapped byte segments, the way a core file
//! does. It is a reasonable [`RemoteMemory`] for any capture that fits in
//! memory, and backs the test suites.

use std::collections::BTreeMap;

use super::{ByteOrder, MemoryError, MemoryResult, NarrowOopEncoding, RemoteMemory};
use crate::types::{Address, MemoryRange};

/// A captured address space made of non-overlapping segments.
///
/// Reads must fall entirely inside one segment; a read that straddles two
/// adjacent segments is reported as unmapped.
///
/// ## Example
///
/// ```rust
/// use layoutdb_core::memory::{RemoteMemory, SnapshotMemory};
/// use layoutdb_core::types::Address;
///
/// let mut memory = SnapshotMemory::new(8);
/// memory.map(Address::new(0x1000), vec![0u8; 0x40]);
/// memory.write_address(Address::new(0x1000), Address::new(0xdead_b000)).unwrap();
///
/// assert_eq!(memory.read_address_at(Address::new(0x1000), 0).unwrap(), Address::new(0xdead_b000));
/// assert!(memory.read_int_at(Address::new(0x2000), 0).is_err());
/// ```
#[derive(Debug, Clone)]
pub struct SnapshotMemory
{
    address_size: u64,
    byte_order: ByteOrder,
    narrow_oops: NarrowOopEncoding,
    segments: BTreeMap<u64, Vec<u8>>,
}

impl SnapshotMemory
{
    /// Empty snapshot of a little-endian process with `address_size`-byte
    /// pointers.
    #[must_use]
    pub fn new(address_size: u64) -> Self
    {
        Self {
            address_size,
            byte_order: ByteOrder::Little,
            narrow_oops: NarrowOopEncoding::default(),
            segments: BTreeMap::new(),
        }
    }

    /// Use the given byte order for typed reads and writes.
    #[must_use]
    pub fn with_byte_order(mut self, byte_order: ByteOrder) -> Self
    {
        self.byte_order = byte_order;
        self
    }

    /// Use the given compressed-oop encoding.
    #[must_use]
    pub fn with_narrow_oop_encoding(mut self, encoding: NarrowOopEncoding) -> Self
    {
        self.narrow_oops = encoding;
        self
    }

    /// Map `bytes` at `start`, replacing any segment that starts at the same
    /// address.
    pub fn map(&mut self, start: Address, bytes: Vec<u8>)
    {
        self.segments.insert(start.value(), bytes);
    }

    /// Map `len` zero bytes at `start`.
    pub fn map_zeroed(&mut self, start: Address, len: usize)
    {
        self.map(start, vec![0u8; len]);
    }

    /// Ranges currently mapped, in address order.
    pub fn ranges(&self) -> impl Iterator<Item = MemoryRange> + '_
    {
        self.segments
            .iter()
            .map(|(start, bytes)| MemoryRange::new(Address::new(*start), bytes.len() as u64))
    }

    fn segment_for(&self, address: Address, len: usize) -> Option<(u64, &Vec<u8>)>
    {
        let (start, bytes) = self.segments.range(..=address.value()).next_back()?;
        let range = MemoryRange::new(Address::new(*start), bytes.len() as u64);
        range.contains_span(address, len as u64).then_some((*start, bytes))
    }

    /// Overwrite mapped bytes at `address`.
    ///
    /// ## Errors
    ///
    /// [`MemoryError::UnmappedAddress`] if the bytes do not fall inside one
    /// mapped segment.
    #[allow(clippy::cast_possible_truncation)]
    pub fn write_bytes(&mut self, address: Address, data: &[u8]) -> MemoryResult<()>
    {
        let start = self
            .segment_for(address, data.len())
            .map(|(start, _)| start)
            .ok_or(MemoryError::UnmappedAddress { address })?;
        let segment = self
            .segments
            .get_mut(&start)
            .ok_or(MemoryError::UnmappedAddress { address })?;
        let from = (address.value() - start) as usize;
        segment[from..from + data.len()].copy_from_slice(data);
        Ok(())
    }

    /// Store a 32-bit value using the snapshot's byte order.
    ///
    /// ## Errors
    ///
    /// See [`SnapshotMemory::write_bytes`].
    pub fn write_u32(&mut self, address: Address, value: u32) -> MemoryResult<()>
    {
        let bytes = match self.byte_order {
            ByteOrder::Little => value.to_le_bytes(),
            ByteOrder::Big => value.to_be_bytes(),
        };
        self.write_bytes(address, &bytes)
    }

    /// Store a 64-bit value using the snapshot's byte order.
    ///
    /// ## Errors
    ///
    /// See [`SnapshotMemory::write_bytes`].
    pub fn write_u64(&mut self, address: Address, value: u64) -> MemoryResult<()>
    {
        let bytes = match self.byte_order {
            ByteOrder::Little => value.to_le_bytes(),
            ByteOrder::Big => value.to_be_bytes(),
        };
        self.write_bytes(address, &bytes)
    }

    /// Store a pointer-sized value.
    ///
    /// ## Errors
    ///
    /// See [`SnapshotMemory::write_bytes`]. Also fails with
    /// [`MemoryError::InvalidSize`] when the snapshot's pointer width is
    /// neither 4 nor 8, and with [`MemoryError::UnmappedAddress`] when a
    /// 4-byte snapshot is asked to store an address above 4 GiB.
    pub fn write_address(&mut self, address: Address, value: Address) -> MemoryResult<()>
    {
        match self.address_size {
            8 => self.write_u64(address, value.value()),
            4 => {
                let narrow = u32::try_from(value.value()).map_err(|_| MemoryError::UnmappedAddress { address: value })?;
                self.write_u32(address, narrow)
            }
            size => Err(MemoryError::InvalidSize { size }),
        }
    }
}

impl RemoteMemory for SnapshotMemory
{
    fn address_size(&self) -> u64
    {
        self.address_size
    }

    #[allow(clippy::cast_possible_truncation)]
    fn read_bytes(&self, address: Address, buf: &mut [u8]) -> MemoryResult<()>
    {
        let (start, bytes) = self
            .segment_for(address, buf.len())
            .ok_or(MemoryError::UnmappedAddress { address })?;
        let from = (address.value() - start) as usize;
        buf.copy_from_slice(&bytes[from..from + buf.len()]);
        Ok(())
    }

    fn byte_order(&self) -> ByteOrder
    {
        self.byte_order
    }

    fn narrow_oop_encoding(&self) -> NarrowOopEncoding
    {
        self.narrow_oops
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    fn snapshot() -> SnapshotMemory
    {
        let mut memory = SnapshotMemory::new(8);
        memory.map_zeroed(Address::new(0x1000), 0x20);
        memory
    }

    #[test]
    fn test_typed_reads_little_endian()
    {
        let mut memory = snapshot();
        memory.write_bytes(Address::new(0x1000), &[0xfe, 0xff, 0xff, 0xff]).unwrap();
        assert_eq!(memory.read_int_at(Address::new(0x1000), 0).unwrap(), -2);
        assert_eq!(memory.read_short_at(Address::new(0x1000), 0).unwrap(), -2);
        assert_eq!(memory.read_char_at(Address::new(0x1000), 0).unwrap(), 0xfffe);
        assert_eq!(memory.read_c_integer_at(Address::new(0x1000), 0, 4, true).unwrap(), 0xffff_fffe);
        assert_eq!(memory.read_c_integer_at(Address::new(0x1000), 0, 4, false).unwrap(), -2);
    }

    #[test]
    fn test_big_endian_snapshot()
    {
        let mut memory = snapshot().with_byte_order(ByteOrder::Big);
        memory.write_u32(Address::new(0x1008), 0x0102_0304).unwrap();
        assert_eq!(memory.read_int_at(Address::new(0x1008), 0).unwrap(), 0x0102_0304);
        assert_eq!(memory.read_byte_at(Address::new(0x1008), 0).unwrap(), 1);
    }

    #[test]
    fn test_unmapped_read()
    {
        let memory = snapshot();
        let err = memory.read_long_at(Address::new(0x2000), 0).unwrap_err();
        assert_eq!(err, MemoryError::UnmappedAddress { address: Address::new(0x2000) });
    }

    #[test]
    fn test_read_past_segment_end_is_unmapped()
    {
        let memory = snapshot();
        assert!(matches!(
            memory.read_long_at(Address::new(0x1000), 0x20),
            Err(MemoryError::UnmappedAddress { .. })
        ));
    }

    #[test]
    fn test_unaligned_read()
    {
        let memory = snapshot();
        let err = memory.read_int_at(Address::new(0x1000), 2).unwrap_err();
        assert_eq!(
            err,
            MemoryError::UnalignedAddress {
                address: Address::new(0x1002),
                alignment: 4
            }
        );
        // single bytes are always aligned
        assert!(memory.read_boolean_at(Address::new(0x1000), 3).is_ok());
    }

    #[test]
    fn test_negative_offset()
    {
        let mut memory = snapshot();
        memory.write_u64(Address::new(0x1000), 7).unwrap();
        assert_eq!(memory.read_long_at(Address::new(0x1010), -0x10).unwrap(), 7);
    }

    #[test]
    fn test_narrow_oop_read_uses_encoding()
    {
        let mut memory = snapshot().with_narrow_oop_encoding(NarrowOopEncoding {
            base: Address::new(0x1_0000_0000),
            shift: 3,
        });
        memory.write_u32(Address::new(0x1004), 2).unwrap();
        assert_eq!(
            memory.read_narrow_oop_at(Address::new(0x1000), 4).unwrap(),
            Address::new(0x1_0000_0010)
        );
    }

    #[test]
    fn test_four_byte_addresses()
    {
        let mut memory = SnapshotMemory::new(4);
        memory.map_zeroed(Address::new(0x1000), 8);
        memory.write_address(Address::new(0x1004), Address::new(0xcafe_0000)).unwrap();
        assert_eq!(memory.read_address_at(Address::new(0x1004), 0).unwrap(), Address::new(0xcafe_0000));
        assert!(memory.write_address(Address::new(0x1000), Address::new(0x1_0000_0000)).is_err());
    }
}
