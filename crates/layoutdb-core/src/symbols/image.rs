//! Symbol tables of binary images on disk.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use object::{BinaryFormat, Object, ObjectSegment, ObjectSymbol};
use tracing::debug;

use super::SymbolResolver;
use crate::error::{TypeDbError, TypeDbResult};
use crate::types::Address;

/// Defined symbols of one binary image, relocated to its runtime load address.
///
/// The image is identified by its file name (`libjvm.so`, `jvm.dll`), which
/// is the name vtable lookups pass as the `binary` argument.
///
/// ## Relocation
///
/// Symbol values are link-time addresses. The image's link-time base is the
/// `__TEXT` segment for Mach-O, and otherwise the lowest segment backed by
/// file bytes (zero when there are no segments). The difference between the
/// load address and that base is the slide applied to every symbol.
#[derive(Debug, Clone)]
pub struct ImageSymbols
{
    name: String,
    format: BinaryFormat,
    address_size: u64,
    slide: i64,
    symbols: HashMap<String, u64>,
}

impl ImageSymbols
{
    /// Read and parse the binary at `path`.
    ///
    /// `load_address` is where the image's link-time base (see
    /// [Relocation](Self#relocation)) is mapped in the inspected process;
    /// `None` keeps link-time addresses.
    ///
    /// ## Errors
    ///
    /// - `Io`: the file cannot be read
    /// - `Object`: the file is not a supported object format
    pub fn load(path: impl AsRef<Path>, load_address: Option<Address>) -> TypeDbResult<Self>
    {
        let path = path.as_ref();
        let bytes = fs::read(path)?;
        let name = path
            .file_name()
            .map_or_else(|| path.display().to_string(), |name| name.to_string_lossy().into_owned());
        Self::parse(name, &bytes, load_address)
    }

    /// Parse an in-memory image and register it under `name`.
    ///
    /// ## Errors
    ///
    /// `Object` if the bytes are not a supported object format.
    #[allow(clippy::cast_possible_wrap)]
    pub fn parse(name: impl Into<String>, bytes: &[u8], load_address: Option<Address>) -> TypeDbResult<Self>
    {
        let name = name.into();
        let file = object::File::parse(bytes).map_err(|err| TypeDbError::Object {
            path: name.clone(),
            details: err.to_string(),
        })?;

        let link_base = link_base(&file);
        let slide = load_address.map_or(0, |load| (load.value() as i64).wrapping_sub(link_base as i64));

        let mut symbols = HashMap::new();
        for symbol in file.symbols().chain(file.dynamic_symbols()) {
            if !symbol.is_definition() {
                continue;
            }
            if let Ok(symbol_name) = symbol.name() {
                if !symbol_name.is_empty() {
                    symbols.entry(symbol_name.to_string()).or_insert(symbol.address());
                }
            }
        }

        debug!(image = %name, symbols = symbols.len(), slide, "loaded image symbols");
        Ok(Self {
            name,
            format: file.format(),
            address_size: if file.is_64() { 8 } else { 4 },
            slide,
            symbols,
        })
    }

    /// File name the image answers to.
    #[must_use]
    pub fn name(&self) -> &str
    {
        &self.name
    }

    /// Pointer width of the image's architecture, in bytes.
    #[must_use]
    pub fn address_size(&self) -> u64
    {
        self.address_size
    }

    /// Number of defined symbols.
    #[must_use]
    pub fn len(&self) -> usize
    {
        self.symbols.len()
    }

    /// Whether the image defines no symbols.
    #[must_use]
    pub fn is_empty(&self) -> bool
    {
        self.symbols.is_empty()
    }

    fn relocated(&self, link_address: u64) -> Address
    {
        Address::new(link_address.wrapping_add_signed(self.slide))
    }

    /// Runtime address of `symbol`, ignoring the binary name.
    ///
    /// Mach-O prefixes C and C++ symbols with an underscore; the unprefixed
    /// spelling is accepted as well.
    #[must_use]
    pub fn address_of(&self, symbol: &str) -> Option<Address>
    {
        let found = self.symbols.get(symbol).copied().or_else(|| {
            if self.format == BinaryFormat::MachO {
                self.symbols.get(&format!("_{symbol}")).copied()
            } else {
                None
            }
        });
        found.map(|link_address| self.relocated(link_address))
    }
}

/// Link-time address the load address corresponds to.
///
/// `__PAGEZERO` and similar reservations map no file bytes and never count.
fn link_base(file: &object::File<'_>) -> u64
{
    if file.format() == BinaryFormat::MachO {
        let text = file
            .segments()
            .find(|segment| matches!(segment.name(), Ok(Some("__TEXT"))));
        if let Some(text) = text {
            return text.address();
        }
    }
    file.segments()
        .filter(|segment| segment.size() > 0 && segment.file_range().1 > 0)
        .map(|segment| segment.address())
        .min()
        .unwrap_or(0)
}

impl SymbolResolver for ImageSymbols
{
    fn lookup(&self, binary: &str, symbol: &str) -> Option<Address>
    {
        if binary != self.name {
            return None;
        }
        self.address_of(symbol)
    }
}
