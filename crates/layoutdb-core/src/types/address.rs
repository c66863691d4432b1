//! Addresses in the inspected process.

use std::fmt;
use std::ops::{Add, Sub};

/// Strongly typed address in the inspected process
///
/// This wrapper around `u64` keeps addresses of the *target* separate from
/// sizes, offsets, and constants. The database never dereferences an
/// `Address` itself; every access goes through a
/// [`RemoteMemory`](crate::memory::RemoteMemory) implementation, which
/// validates it.
///
/// ## Example
///
/// ```rust
/// use layoutdb_core::types::Address;
///
/// let object = Address::from(0x1000);
/// assert_eq!(object.offset(-8), Address::new(0xff8));
/// assert_eq!(object + 0x10, Address::new(0x1010));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Address(u64);

impl Address
{
    /// The null address (0x0)
    ///
    /// Dynamic type recovery treats it as "no object" rather than probing it.
    pub const NULL: Self = Address(0);

    /// Create a new address from a `u64` value
    pub const fn new(value: u64) -> Self
    {
        Address(value)
    }

    /// Get the raw `u64` value of this address
    pub const fn value(self) -> u64
    {
        self.0
    }

    /// Whether this is the null address.
    pub const fn is_null(self) -> bool
    {
        self.0 == 0
    }

    /// Apply a signed byte offset, wrapping on overflow
    ///
    /// Field offsets are signed; a wrapped result simply names an address the
    /// memory backend will refuse to read.
    ///
    /// ```rust
    /// use layoutdb_core::types::Address;
    ///
    /// assert_eq!(Address::new(0x20).offset(0x10), Address::new(0x30));
    /// assert_eq!(Address::new(0x20).offset(-0x10), Address::new(0x10));
    /// ```
    #[must_use]
    pub const fn offset(self, offset: i64) -> Self
    {
        Address(self.0.wrapping_add_signed(offset))
    }

    /// Add an offset to this address, checking for overflow
    pub fn checked_add(self, offset: u64) -> Option<Self>
    {
        self.0.checked_add(offset).map(Address)
    }

    /// Whether the address is a multiple of `alignment` (a power of two).
    pub const fn is_aligned(self, alignment: u64) -> bool
    {
        alignment <= 1 || self.0 & (alignment - 1) == 0
    }
}

impl From<u64> for Address
{
    fn from(value: u64) -> Self
    {
        Address(value)
    }
}

impl From<Address> for u64
{
    fn from(address: Address) -> Self
    {
        address.0
    }
}

impl fmt::Display for Address
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        write!(f, "0x{:016x}", self.0)
    }
}

impl fmt::LowerHex for Address
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        fmt::LowerHex::fmt(&self.0, f)
    }
}

impl Add<u64> for Address
{
    type Output = Address;

    fn add(self, rhs: u64) -> Self::Output
    {
        Address(self.0.wrapping_add(rhs))
    }
}

impl Sub<u64> for Address
{
    type Output = Address;

    fn sub(self, rhs: u64) -> Self::Output
    {
        Address(self.0.wrapping_sub(rhs))
    }
}

/// Half-open address range `[start, end)`
///
/// Used for mapped segments of a memory snapshot and for "is this address
/// inside region R" questions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MemoryRange
{
    /// First address inside the range
    pub start: Address,
    /// First address past the range
    pub end: Address,
}

impl MemoryRange
{
    /// Range covering `len` bytes starting at `start` (saturating at the top
    /// of the address space).
    #[must_use]
    pub fn new(start: Address, len: u64) -> Self
    {
        Self {
            start,
            end: Address(start.0.saturating_add(len)),
        }
    }

    /// Number of bytes covered.
    #[must_use]
    pub fn len(&self) -> u64
    {
        self.end.0.saturating_sub(self.start.0)
    }

    /// Whether the range covers no bytes.
    #[must_use]
    pub fn is_empty(&self) -> bool
    {
        self.len() == 0
    }

    /// Whether `address` lies inside the range.
    #[must_use]
    pub fn contains(&self, address: Address) -> bool
    {
        self.start <= address && address < self.end
    }

    /// Whether `len` bytes starting at `address` all lie inside the range.
    #[must_use]
    pub fn contains_span(&self, address: Address, len: u64) -> bool
    {
        match address.0.checked_add(len) {
            Some(end) => self.start <= address && end <= self.end.0,
            None => false,
        }
    }
}
