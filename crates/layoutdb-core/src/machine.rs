//! # Machine Model
//!
//! Facts about the inspected process's machine that the type database needs
//! but cannot derive from the type graph itself: the pointer width and the
//! value range of an N-byte integer.

/// Machine description of the inspected process.
///
/// Implementations must be cheap to query; the registry asks for the address
/// size on every dynamic-type probe.
pub trait MachineModel: Send + Sync
{
    /// Size of a native pointer in bytes.
    fn address_size(&self) -> u64;

    /// Size of an (uncompressed) oop in bytes.
    fn oop_size(&self) -> u64
    {
        self.address_size()
    }

    /// Smallest value representable by a `size_bytes` integer.
    ///
    /// ## Panics
    ///
    /// Panics if `size_bytes` is not in `1..=8`.
    fn min_for(&self, size_bytes: u64, is_unsigned: bool) -> i64;

    /// Largest value representable by a `size_bytes` integer.
    ///
    /// Unsigned 8-byte integers report the bit pattern of `u64::MAX`
    /// (`-1` as an `i64`).
    ///
    /// ## Panics
    ///
    /// Panics if `size_bytes` is not in `1..=8`.
    fn max_for(&self, size_bytes: u64, is_unsigned: bool) -> i64;
}

/// Two's-complement machine with a configurable pointer width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TwosComplement
{
    address_size: u64,
}

impl TwosComplement
{
    /// 64-bit machine (8-byte pointers).
    pub const LP64: Self = Self { address_size: 8 };
    /// 32-bit machine (4-byte pointers).
    pub const ILP32: Self = Self { address_size: 4 };

    /// Machine with `address_size`-byte pointers.
    #[must_use]
    pub const fn new(address_size: u64) -> Self
    {
        Self { address_size }
    }
}

impl Default for TwosComplement
{
    fn default() -> Self
    {
        Self::LP64
    }
}

fn integer_bits(size_bytes: u64) -> u32
{
    assert!(
        (1..=8).contains(&size_bytes),
        "unsupported integer size: {size_bytes} bytes"
    );
    // size_bytes <= 8, so this fits comfortably
    (size_bytes * 8) as u32
}

impl MachineModel for TwosComplement
{
    fn address_size(&self) -> u64
    {
        self.address_size
    }

    fn min_for(&self, size_bytes: u64, is_unsigned: bool) -> i64
    {
        let bits = integer_bits(size_bytes);
        if is_unsigned {
            0
        } else {
            i64::MIN >> (64 - bits)
        }
    }

    #[allow(clippy::cast_possible_wrap)]
    fn max_for(&self, size_bytes: u64, is_unsigned: bool) -> i64
    {
        let bits = integer_bits(size_bytes);
        if is_unsigned {
            (u64::MAX >> (64 - bits)) as i64
        } else {
            i64::MAX >> (64 - bits)
        }
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn test_signed_ranges()
    {
        let machine = TwosComplement::LP64;
        assert_eq!(machine.min_for(1, false), i64::from(i8::MIN));
        assert_eq!(machine.max_for(1, false), i64::from(i8::MAX));
        assert_eq!(machine.min_for(2, false), i64::from(i16::MIN));
        assert_eq!(machine.max_for(4, false), i64::from(i32::MAX));
        assert_eq!(machine.min_for(8, false), i64::MIN);
        assert_eq!(machine.max_for(8, false), i64::MAX);
    }

    #[test]
    fn test_unsigned_ranges()
    {
        let machine = TwosComplement::LP64;
        assert_eq!(machine.min_for(4, true), 0);
        assert_eq!(machine.max_for(1, true), 255);
        assert_eq!(machine.max_for(4, true), i64::from(u32::MAX));
        assert_eq!(machine.max_for(8, true), -1);
    }

    #[test]
    #[should_panic(expected = "unsupported integer size")]
    fn test_rejects_oversized_integers()
    {
        TwosComplement::LP64.max_for(16, false);
    }
}
