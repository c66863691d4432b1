//! Loading vtable symbols from object files

use std::sync::Arc;

use layoutdb_core::error::TypeDbError;
use layoutdb_core::node::{TypeId, TypeNode};
use layoutdb_core::symbols::{ImageSymbols, SymbolResolver};
use layoutdb_core::types::Address;
use layoutdb_core::vtbl::{Itanium, VtblCache};
use object::write::{Object, StandardSection, Symbol, SymbolSection};
use object::{Architecture, BinaryFormat, Endianness, SymbolFlags, SymbolKind, SymbolScope};

const LOAD_ADDRESS: Address = Address::new(0x7f00_0000_0000);

fn data_symbol(name: &str, value: u64, section: SymbolSection) -> Symbol
{
    Symbol {
        name: name.as_bytes().to_vec(),
        value,
        size: if matches!(section, SymbolSection::Undefined) { 0 } else { 0x18 },
        kind: SymbolKind::Data,
        scope: SymbolScope::Dynamic,
        weak: false,
        section,
        flags: SymbolFlags::None,
    }
}

fn elf_image() -> Vec<u8>
{
    let mut image = Object::new(BinaryFormat::Elf, Architecture::X86_64, Endianness::Little);
    let rodata = image.section_id(StandardSection::ReadOnlyData);
    image.append_section_data(rodata, &[0u8; 0x60], 8);

    image.add_symbol(data_symbol("_ZTV6Thread", 0x10, SymbolSection::Section(rodata)));
    image.add_symbol(data_symbol("_ZTV10JavaThread", 0x28, SymbolSection::Section(rodata)));
    image.add_symbol(data_symbol("_ZTV5Klass", 0, SymbolSection::Undefined));
    image.write().unwrap()
}

/// Minimal x86-64 Mach-O executable: `__PAGEZERO`, `__TEXT` and one
/// exported `_ZTV6Thread` at link address 0x1_0000_3f00.
fn macho_executable() -> Vec<u8>
{
    fn segment(out: &mut Vec<u8>, name: &str, vmaddr: u64, vmsize: u64, filesize: u64)
    {
        let mut segname = [0u8; 16];
        segname[..name.len()].copy_from_slice(name.as_bytes());
        out.extend_from_slice(&0x19u32.to_le_bytes()); // LC_SEGMENT_64
        out.extend_from_slice(&72u32.to_le_bytes());
        out.extend_from_slice(&segname);
        for value in [vmaddr, vmsize, 0, filesize] {
            out.extend_from_slice(&value.to_le_bytes());
        }
        for value in [0u32, 0, 0, 0] {
            out.extend_from_slice(&value.to_le_bytes());
        }
    }

    let strings = b"\0__ZTV6Thread\0";
    let mut out = Vec::new();
    for value in [0xfeed_facfu32, 0x0100_0007, 3, 2, 3, 72 + 72 + 24, 0, 0] {
        out.extend_from_slice(&value.to_le_bytes());
    }
    segment(&mut out, "__PAGEZERO", 0, 0x1_0000_0000, 0);
    segment(&mut out, "__TEXT", 0x1_0000_0000, 0x4000, 0x4000);

    let symoff = 32 + 72 + 72 + 24;
    let stroff = symoff + 16;
    for value in [2u32, 24, symoff, 1, stroff, strings.len() as u32] {
        out.extend_from_slice(&value.to_le_bytes()); // LC_SYMTAB
    }
    out.extend_from_slice(&1u32.to_le_bytes());
    out.extend_from_slice(&[0x0f, 1]); // N_SECT | N_EXT, section 1
    out.extend_from_slice(&0u16.to_le_bytes());
    out.extend_from_slice(&0x1_0000_3f00u64.to_le_bytes());
    out.extend_from_slice(strings);
    out
}

fn macho_object() -> Vec<u8>
{
    let mut image = Object::new(BinaryFormat::MachO, Architecture::X86_64, Endianness::Little);
    let rodata = image.section_id(StandardSection::ReadOnlyData);
    image.append_section_data(rodata, &[0u8; 0x40], 8);
    image.add_symbol(data_symbol("_ZTV6Thread", 0x10, SymbolSection::Section(rodata)));
    image.write().unwrap()
}

#[test]
fn test_defined_symbols_are_relocated()
{
    let symbols = ImageSymbols::parse("libjvm.so", &elf_image(), Some(LOAD_ADDRESS)).unwrap();
    assert_eq!(symbols.name(), "libjvm.so");
    assert_eq!(symbols.address_size(), 8);
    assert!(!symbols.is_empty());

    assert_eq!(symbols.lookup("libjvm.so", "_ZTV6Thread"), Some(LOAD_ADDRESS + 0x10));
    assert_eq!(symbols.lookup("libjvm.so", "_ZTV10JavaThread"), Some(LOAD_ADDRESS + 0x28));
    assert_eq!(symbols.lookup("libjvm.so", "_ZTV5Klass"), None);
    assert_eq!(symbols.lookup("libc.so.6", "_ZTV6Thread"), None);
}

#[test]
fn test_macho_slide_is_anchored_on_text_segment()
{
    let unslid = ImageSymbols::parse("hotspot", &macho_executable(), Some(Address::new(0x1_0000_0000))).unwrap();
    assert_eq!(unslid.address_of("_ZTV6Thread"), Some(Address::new(0x1_0000_3f00)));

    let slid = ImageSymbols::parse("hotspot", &macho_executable(), Some(Address::new(0x1_0800_0000))).unwrap();
    assert_eq!(slid.lookup("hotspot", "_ZTV6Thread"), Some(Address::new(0x1_0800_3f00)));
}

#[test]
fn test_macho_symbols_match_without_leading_underscore()
{
    let linked = ImageSymbols::parse("libjvm.dylib", &macho_object(), None).unwrap();
    let loaded = ImageSymbols::parse("libjvm.dylib", &macho_object(), Some(LOAD_ADDRESS)).unwrap();

    let link_address = linked.address_of("_ZTV6Thread").unwrap();
    assert_eq!(linked.address_of("__ZTV6Thread"), Some(link_address));
    assert_eq!(loaded.lookup("libjvm.dylib", "_ZTV6Thread"), Some(LOAD_ADDRESS + link_address.value()));

    let elf = ImageSymbols::parse("libjvm.so", &elf_image(), None).unwrap();
    assert_eq!(elf.address_of("ZTV6Thread"), None);
}

#[test]
fn test_link_addresses_without_load_address()
{
    let symbols = ImageSymbols::parse("libjvm.so", &elf_image(), None).unwrap();
    assert_eq!(symbols.address_of("_ZTV6Thread"), Some(Address::new(0x10)));
}

#[test]
fn test_vtbl_cache_over_image()
{
    let symbols = ImageSymbols::parse("libjvm.so", &elf_image(), Some(LOAD_ADDRESS)).unwrap();
    let cache = VtblCache::new(Arc::new(symbols), Arc::new(Itanium), vec!["libjvm.so".to_string()]);

    let thread = TypeNode::new("Thread", 64);
    assert_eq!(
        cache.resolve(TypeId::from(0u32), &thread, 8),
        Some(LOAD_ADDRESS + 0x20)
    );
    let klass = TypeNode::new("Klass", 200);
    assert_eq!(cache.resolve(TypeId::from(1u32), &klass, 8), None);
}

#[test]
fn test_garbage_is_an_object_error()
{
    let err = ImageSymbols::parse("notes.txt", b"definitely not an object file", None).unwrap_err();
    assert!(matches!(err, TypeDbError::Object { ref path, .. } if path == "notes.txt"));
}

#[test]
fn test_load_from_disk()
{
    let path = std::env::temp_dir().join(format!("layoutdb-image-{}.o", std::process::id()));
    std::fs::write(&path, elf_image()).unwrap();

    let symbols = ImageSymbols::load(&path, Some(LOAD_ADDRESS)).unwrap();
    let name = path.file_name().unwrap().to_string_lossy().into_owned();
    assert_eq!(symbols.name(), name);
    assert_eq!(symbols.lookup(&name, "_ZTV6Thread"), Some(LOAD_ADDRESS + 0x10));

    std::fs::remove_file(&path).unwrap();
    assert!(matches!(
        ImageSymbols::load(&path, None),
        Err(TypeDbError::Io(_))
    ));
}
