//! Vtable symbol naming.
//!
//! Each C++ ABI names a class's vtable differently and places the address
//! that object vptrs hold (the *address point*) at a different spot inside
//! the symbol. A [`VtblSymbolNaming`] captures both.

use crate::node::TypeNode;

/// Platform rule mapping a type to its vtable symbol.
pub trait VtblSymbolNaming: Send + Sync
{
    /// Mangled vtable symbol of `node`, or `None` if the type cannot have a
    /// vtable (primitives, oops, C integers, pointers).
    fn symbol_name_for(&self, node: &TypeNode) -> Option<String>;

    /// Bytes between the vtable symbol and the address object vptrs hold.
    fn address_point_offset(&self, address_size: u64) -> u64;
}

/// Types that never carry a vtable.
fn has_no_vtable(node: &TypeNode) -> bool
{
    node.is_primitive() || node.is_oop() || node.is_c_integer() || node.is_pointer()
}

fn nested_components(name: &str) -> Vec<&str>
{
    name.split("::").collect()
}

/// Itanium C++ ABI (GCC, Clang on Linux, macOS and the BSDs).
///
/// `Thread` becomes `_ZTV6Thread`; `gc::Space` becomes `_ZTVN2gc5SpaceE`.
/// Vptrs point two words past the symbol, after the offset-to-top and RTTI
/// slots.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Itanium;

impl VtblSymbolNaming for Itanium
{
    fn symbol_name_for(&self, node: &TypeNode) -> Option<String>
    {
        if has_no_vtable(node) {
            return None;
        }

        let components = nested_components(node.name());
        if components.len() == 1 {
            return Some(format!("_ZTV{}{}", node.name().len(), node.name()));
        }

        let mut symbol = String::from("_ZTVN");
        for component in components {
            symbol.push_str(&component.len().to_string());
            symbol.push_str(component);
        }
        symbol.push('E');
        Some(symbol)
    }

    fn address_point_offset(&self, address_size: u64) -> u64
    {
        2 * address_size
    }
}

/// Microsoft Visual C++ ABI.
///
/// `Thread` becomes `??_7Thread@@6B@`; `gc::Space` becomes
/// `??_7Space@gc@@6B@`. Vptrs point at the symbol itself.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Msvc;

impl VtblSymbolNaming for Msvc
{
    fn symbol_name_for(&self, node: &TypeNode) -> Option<String>
    {
        if has_no_vtable(node) {
            return None;
        }

        let mut components = nested_components(node.name());
        components.reverse();
        Some(format!("??_7{}@@6B@", components.join("@")))
    }

    fn address_point_offset(&self, _address_size: u64) -> u64
    {
        0
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn test_itanium_names()
    {
        assert_eq!(
            Itanium.symbol_name_for(&TypeNode::new("JavaThread", 512)).as_deref(),
            Some("_ZTV10JavaThread")
        );
        assert_eq!(
            Itanium.symbol_name_for(&TypeNode::new("gc::Space", 64)).as_deref(),
            Some("_ZTVN2gc5SpaceE")
        );
        assert_eq!(Itanium.address_point_offset(8), 16);
        assert_eq!(Itanium.address_point_offset(4), 8);
    }

    #[test]
    fn test_msvc_names()
    {
        assert_eq!(
            Msvc.symbol_name_for(&TypeNode::new("JavaThread", 512)).as_deref(),
            Some("??_7JavaThread@@6B@")
        );
        assert_eq!(
            Msvc.symbol_name_for(&TypeNode::new("gc::Space", 64)).as_deref(),
            Some("??_7Space@gc@@6B@")
        );
        assert_eq!(Msvc.address_point_offset(8), 0);
    }

    #[test]
    fn test_non_polymorphic_kinds_have_no_symbol()
    {
        let nodes = [
            TypeNode::new("jint", 4).with_primitive(),
            TypeNode::new("oop", 8).with_oop(),
            TypeNode::c_integer("uint32_t", 4, true),
            TypeNode::pointer("Thread*", 8, None),
        ];
        for node in &nodes {
            assert_eq!(Itanium.symbol_name_for(node), None, "{node}");
            assert_eq!(Msvc.symbol_name_for(node), None, "{node}");
        }
    }
}
