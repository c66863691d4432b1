//! Dynamic type recovery from vtable pointers

use std::sync::Arc;

use layoutdb_core::config::RegistryConfig;
use layoutdb_core::machine::TwosComplement;
use layoutdb_core::memory::SnapshotMemory;
use layoutdb_core::node::{TypeId, TypeNode};
use layoutdb_core::registry::{MetadataRegion, TypeRegistry, TypeRegistryBuilder, VptrLayout};
use layoutdb_core::symbols::SymbolTable;
use layoutdb_core::types::{Address, MemoryRange};
use layoutdb_core::vtbl::{Itanium, VtblCache};
use smallvec::SmallVec;

const LIBJVM: &str = "libjvm.so";

// Address points: Itanium vptrs sit two words past the symbol.
const THREAD_VTBL: Address = Address::new(0x7010);
const JAVA_THREAD_VTBL: Address = Address::new(0x7110);
const COMPILER_THREAD_VTBL: Address = Address::new(0x7210);
const KLASS_VTBL: Address = Address::new(0x7310);

const HEAP: Address = Address::new(0x10000);
const AT_OFFSET_0: Address = Address::new(0x10000);
const BOTH_LOCATIONS: Address = Address::new(0x10100);
const SECOND_ONLY: Address = Address::new(0x10200);
const SECOND_AND_THIRD: Address = Address::new(0x10300);
const FOREIGN: Address = Address::new(0x10400);
const METADATA_OBJECT: Address = Address::new(0x10500);
const THIRD_ONLY: Address = Address::new(0x10600);
const UNMAPPED: Address = Address::new(0x9999_0000);

fn symbols() -> SymbolTable
{
    let mut table = SymbolTable::new();
    table.insert(LIBJVM, "_ZTV6Thread", Address::new(0x7000));
    table.insert(LIBJVM, "_ZTV10JavaThread", Address::new(0x7100));
    table.insert(LIBJVM, "_ZTV14CompilerThread", Address::new(0x7200));
    table.insert(LIBJVM, "_ZTV5Klass", Address::new(0x7300));
    table
}

fn memory() -> SnapshotMemory
{
    let mut memory = SnapshotMemory::new(8);
    memory.map_zeroed(HEAP, 0x700);

    memory.write_address(AT_OFFSET_0, JAVA_THREAD_VTBL).unwrap();

    memory.write_address(BOTH_LOCATIONS, COMPILER_THREAD_VTBL).unwrap();
    memory.write_address(BOTH_LOCATIONS + 56, JAVA_THREAD_VTBL).unwrap();

    memory.write_address(SECOND_ONLY, Address::new(0x1234)).unwrap();
    memory.write_address(SECOND_ONLY + 56, COMPILER_THREAD_VTBL).unwrap();

    memory.write_address(SECOND_AND_THIRD + 56, COMPILER_THREAD_VTBL).unwrap();
    memory.write_address(SECOND_AND_THIRD + 48, JAVA_THREAD_VTBL).unwrap();

    memory.write_address(FOREIGN, KLASS_VTBL).unwrap();

    memory.write_address(METADATA_OBJECT, Address::new(0x20010)).unwrap();

    memory.write_address(THIRD_ONLY, Address::new(0x1234)).unwrap();
    memory.write_address(THIRD_ONLY + 56, Address::new(0x5678)).unwrap();
    memory.write_address(THIRD_ONLY + 48, JAVA_THREAD_VTBL).unwrap();
    memory
}

struct Ids
{
    thread: TypeId,
    java_thread: TypeId,
    compiler_thread: TypeId,
    klass: TypeId,
    mutex: TypeId,
}

fn builder() -> (TypeRegistryBuilder, Ids)
{
    let mut builder = TypeRegistryBuilder::new(Arc::new(TwosComplement::LP64));
    let thread = builder.add_type(TypeNode::new("Thread", 64)).unwrap();
    let java_thread = builder
        .add_type(TypeNode::new("JavaThread", 128).with_superclass(thread))
        .unwrap();
    let compiler_thread = builder
        .add_type(TypeNode::new("CompilerThread", 160).with_superclass(java_thread))
        .unwrap();
    let klass = builder.add_type(TypeNode::new("Klass", 200)).unwrap();
    let mutex = builder.add_type(TypeNode::new("Mutex", 48)).unwrap();
    builder.add_type(TypeNode::new("jint", 4).with_primitive()).unwrap();

    let builder = builder
        .with_memory(Arc::new(memory()))
        .with_vtbl_cache(VtblCache::new(
            Arc::new(symbols()),
            Arc::new(Itanium),
            vec![LIBJVM.to_string()],
        ))
        .with_config(RegistryConfig { trace_probes: true });
    (
        builder,
        Ids {
            thread,
            java_thread,
            compiler_thread,
            klass,
            mutex,
        },
    )
}

fn registry() -> (TypeRegistry, Ids)
{
    let (builder, ids) = builder();
    (builder.build().unwrap(), ids)
}

#[test]
fn test_vtbl_for_type_applies_address_point()
{
    let (registry, ids) = registry();
    assert_eq!(registry.vtbl_for_type(ids.thread), Some(THREAD_VTBL));
    assert_eq!(registry.vtbl_for_type(ids.klass), Some(KLASS_VTBL));
    assert_eq!(registry.vtbl_for_type(ids.mutex), None);
}

#[test]
fn test_match_at_offset_zero()
{
    let (registry, ids) = registry();
    assert_eq!(registry.find_dynamic_type(AT_OFFSET_0, ids.thread), Some(ids.java_thread));
    assert_eq!(registry.find_dynamic_type(AT_OFFSET_0, ids.java_thread), Some(ids.java_thread));
}

#[test]
fn test_offset_zero_beats_secondary_location()
{
    let (registry, ids) = registry();
    assert_eq!(
        registry.find_dynamic_type(BOTH_LOCATIONS, ids.thread),
        Some(ids.compiler_thread)
    );
}

#[test]
fn test_secondary_location_only()
{
    let (registry, ids) = registry();
    assert_eq!(registry.find_dynamic_type(SECOND_ONLY, ids.thread), Some(ids.compiler_thread));
}

#[test]
fn test_earlier_secondary_location_preferred()
{
    let (registry, ids) = registry();
    assert_eq!(
        registry.find_dynamic_type(SECOND_AND_THIRD, ids.thread),
        Some(ids.compiler_thread)
    );
}

#[test]
fn test_third_location_only()
{
    let (registry, ids) = registry();
    assert_eq!(registry.find_dynamic_type(THIRD_ONLY, ids.thread), Some(ids.java_thread));
}

#[test]
fn test_no_dynamic_type()
{
    let (registry, ids) = registry();
    assert_eq!(registry.find_dynamic_type(FOREIGN, ids.thread), None);
    assert_eq!(registry.find_dynamic_type(UNMAPPED, ids.thread), None);
    assert_eq!(registry.find_dynamic_type(Address::NULL, ids.thread), None);
}

#[test]
#[should_panic(expected = "does not appear to be polymorphic")]
fn test_non_polymorphic_base_panics()
{
    let (registry, ids) = registry();
    registry.find_dynamic_type(AT_OFFSET_0, ids.mutex);
}

#[test]
fn test_addresses_match_type()
{
    let (registry, ids) = registry();
    assert!(registry.addresses_match_type(AT_OFFSET_0, ids.java_thread));
    assert!(!registry.addresses_match_type(AT_OFFSET_0, ids.thread));
    assert!(!registry.addresses_match_type(Address::NULL, ids.java_thread));
    assert!(!registry.addresses_match_type(UNMAPPED, ids.java_thread));
    assert!(!registry.addresses_match_type(AT_OFFSET_0, ids.mutex));
}

#[test]
fn test_guess_type_for_address()
{
    let (registry, ids) = registry();
    assert_eq!(registry.guess_type_for_address(AT_OFFSET_0), Some(ids.java_thread));
    assert_eq!(registry.guess_type_for_address(FOREIGN), Some(ids.klass));
    assert_eq!(registry.guess_type_for_address(SECOND_ONLY), None);
    assert_eq!(registry.guess_type_for_address(Address::NULL), None);
    assert_eq!(registry.guess_type_for_address(UNMAPPED), None);
}

#[test]
fn test_vtbl_lookups_are_memoised()
{
    let (registry, ids) = registry();
    registry.find_dynamic_type(SECOND_ONLY, ids.thread);
    let probes = registry.vtbl_cache().lookups();
    assert!(probes > 0);

    registry.find_dynamic_type(SECOND_ONLY, ids.thread);
    assert_eq!(registry.vtbl_cache().lookups(), probes);

    // Klass and Mutex are new to the cache; jint never reaches the resolver.
    registry.guess_type_for_address(SECOND_ONLY);
    assert_eq!(registry.vtbl_cache().lookups(), probes + 2);
    registry.guess_type_for_address(SECOND_ONLY);
    assert_eq!(registry.vtbl_cache().lookups(), probes + 2);

    registry.invalidate_vtbl_cache();
    registry.find_dynamic_type(SECOND_ONLY, ids.thread);
    assert_eq!(registry.vtbl_cache().lookups(), probes * 2 + 2);
}

struct OffsetZeroOnly;

impl VptrLayout for OffsetZeroOnly
{
    fn secondary_offsets(&self, _base_size: u64, _address_size: u64) -> SmallVec<[i64; 2]>
    {
        SmallVec::new()
    }
}

#[test]
fn test_custom_vptr_layout()
{
    let (builder, ids) = builder();
    let registry = builder.with_vptr_layout(OffsetZeroOnly).build().unwrap();
    assert_eq!(registry.find_dynamic_type(SECOND_ONLY, ids.thread), None);
    assert_eq!(registry.find_dynamic_type(AT_OFFSET_0, ids.thread), Some(ids.java_thread));
}

struct ClassSpace
{
    range: MemoryRange,
    answer: TypeId,
}

impl MetadataRegion for ClassSpace
{
    fn contains(&self, address: Address) -> bool
    {
        self.range.contains(address)
    }

    fn type_for_vptr(&self, _vptr: Address) -> Option<TypeId>
    {
        Some(self.answer)
    }
}

#[test]
fn test_metadata_region_short_circuits()
{
    let (builder, ids) = builder();
    let registry = builder
        .with_metadata_region(Arc::new(ClassSpace {
            range: MemoryRange::new(Address::new(0x20000), 0x1000),
            answer: ids.klass,
        }))
        .build()
        .unwrap();

    assert_eq!(registry.find_dynamic_type(METADATA_OBJECT, ids.thread), Some(ids.klass));
    assert_eq!(registry.find_dynamic_type(AT_OFFSET_0, ids.thread), Some(ids.java_thread));
}
