//! Tests for platform-agnostic types

use layoutdb_core::machine::{MachineModel, TwosComplement};
use layoutdb_core::node::TypeNode;
use layoutdb_core::types::{Address, MemoryRange};

#[test]
fn test_address_from_u64()
{
    let address = Address::from(0x7f00_0000_1000);
    assert_eq!(address.value(), 0x7f00_0000_1000);
}

#[test]
fn test_address_to_u64()
{
    let address = Address::new(0x1000);
    let value: u64 = address.into();
    assert_eq!(value, 0x1000);
}

#[test]
fn test_address_equality()
{
    let a1 = Address::new(0x1000);
    let a2 = Address::new(0x1000);
    let a3 = Address::new(0x2000);

    assert_eq!(a1, a2);
    assert_ne!(a1, a3);
    assert!(a1 < a3);
}

#[test]
fn test_address_display()
{
    assert_eq!(format!("{}", Address::new(0x1000)), "0x0000000000001000");
    assert!(Address::NULL.is_null());
    assert!(!Address::new(1).is_null());
}

#[test]
fn test_memory_range_contains()
{
    let range = MemoryRange::new(Address::new(0x1000), 0x100);
    assert_eq!(range.len(), 0x100);
    assert!(range.contains(Address::new(0x1000)));
    assert!(range.contains(Address::new(0x10ff)));
    assert!(!range.contains(Address::new(0x1100)));
    assert!(range.contains_span(Address::new(0x10f8), 8));
    assert!(!range.contains_span(Address::new(0x10fc), 8));
}

#[test]
fn test_c_integer_ranges()
{
    let machine = TwosComplement::LP64;
    assert_eq!(machine.min_for(1, false), -128);
    assert_eq!(machine.max_for(1, false), 127);
    assert_eq!(machine.min_for(4, true), 0);
    assert_eq!(machine.max_for(4, true), 0xffff_ffff);
    assert_eq!(machine.min_for(8, false), i64::MIN);
    assert_eq!(machine.max_for(8, false), i64::MAX);
    assert_eq!(machine.max_for(8, true), -1);
}

#[test]
fn test_type_node_display()
{
    assert_eq!(TypeNode::c_integer("long", 8, true).to_string(), "unsigned long");
    assert_eq!(TypeNode::new("JavaThread", 512).to_string(), "JavaThread");
}
