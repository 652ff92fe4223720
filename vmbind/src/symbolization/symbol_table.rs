//! Name → address index over a runtime image's symbol tables

use log::{debug, info, warn};
use object::{Object, ObjectSegment, ObjectSymbol};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use super::debuginfo;
use super::memory_maps::LoadedImage;
use crate::domain::{Address, BindError, PointerWidth};

/// Page granularity used to align the lowest `PT_LOAD` address
const PAGE_SIZE: u64 = 0x1000;

/// One named symbol of the loaded image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolEntry {
    pub name: String,
    pub address: Address,
}

impl SymbolEntry {
    pub fn new(name: impl Into<String>, address: usize) -> Self {
        Self { name: name.into(), address: Address(address) }
    }
}

/// Read-only symbol index of one runtime image
///
/// Built once by scanning `.dynsym` and `.symtab` (plus a separate debuginfo
/// file when the image is stripped). Addresses are already relocated to the
/// image's load base.
#[derive(Debug, Clone)]
pub struct SymbolTable {
    pointer_width: PointerWidth,
    symbols: HashMap<String, Address>,
}

impl SymbolTable {
    /// Build a table from explicit entries; the first entry for a name wins
    pub fn from_entries<I>(pointer_width: PointerWidth, entries: I) -> Self
    where
        I: IntoIterator<Item = SymbolEntry>,
    {
        let mut symbols = HashMap::new();
        for entry in entries {
            symbols.entry(entry.name).or_insert(entry.address);
        }
        Self { pointer_width, symbols }
    }

    /// Scan the image's file and relocate its symbols to the image's base
    ///
    /// # Errors
    /// Returns `ImageUnreadable` if the file cannot be read or parsed
    pub fn load(image: &LoadedImage) -> Result<Self, BindError> {
        let data = fs::read(&image.path).map_err(|e| unreadable(&image.path, &e))?;
        let mut table = Self::parse(&image.path, &data, image.base())?;

        if !table.has_local_symbols {
            table.merge_debuginfo(image, &data)?;
        }

        let table = table.finish();
        if table.is_empty() {
            warn!("⚠️  No usable symbols in {}", image.path.display());
        }
        Ok(table)
    }

    /// Scan an in-memory image, adding `base` to every symbol value
    ///
    /// # Errors
    /// Returns `ImageUnreadable` if the bytes are not a parsable object file
    pub fn from_bytes(data: &[u8], base: u64) -> Result<Self, BindError> {
        Ok(Self::parse(Path::new("<memory>"), data, base)?.finish())
    }

    fn parse(path: &Path, data: &[u8], base: u64) -> Result<PartialTable, BindError> {
        let file = object::File::parse(data).map_err(|e| unreadable(path, &e))?;
        let pointer_width = if file.is_64() { PointerWidth::Bits64 } else { PointerWidth::Bits32 };
        let bias = load_bias(&file, base);

        let mut table =
            PartialTable { pointer_width, symbols: HashMap::new(), has_local_symbols: false };
        // Exported names first so a local alias never shadows the dynamic entry
        table.collect(file.dynamic_symbols(), bias);
        // A .symtab holding only section and file symbols is as good as stripped
        table.has_local_symbols = table.collect(file.symbols(), bias) > 0;

        debug!(
            "Scanned {} symbols from {} ({pointer_width}, bias 0x{bias:x})",
            table.symbols.len(),
            path.display()
        );
        Ok(table)
    }

    /// Look up the live address of `name`
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<Address> {
        self.symbols.get(name).copied()
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.symbols.contains_key(name)
    }

    #[must_use]
    pub fn pointer_width(&self) -> PointerWidth {
        self.pointer_width
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

/// Table under construction, before the debuginfo fallback is decided
struct PartialTable {
    pointer_width: PointerWidth,
    symbols: HashMap<String, Address>,
    has_local_symbols: bool,
}

impl PartialTable {
    /// Add defined, named symbols; returns how many the scan saw
    fn collect<'data, S, I>(&mut self, symbols: I, bias: u64) -> usize
    where
        S: ObjectSymbol<'data>,
        I: Iterator<Item = S>,
    {
        let mut defined = 0;
        for symbol in symbols {
            if symbol.is_undefined() || symbol.address() == 0 {
                continue;
            }
            let Ok(name) = symbol.name() else {
                continue;
            };
            if name.is_empty() {
                continue;
            }
            let Some(address) = relocate(symbol.address(), bias) else {
                continue;
            };
            self.symbols.entry(name.to_string()).or_insert(address);
            defined += 1;
        }
        defined
    }

    fn merge_debuginfo(&mut self, image: &LoadedImage, data: &[u8]) -> Result<(), BindError> {
        match debuginfo::find_for(&image.path, data) {
            Some(debug_path) => match fs::read(&debug_path) {
                Ok(debug_data) => {
                    info!("Merging symbols from debuginfo {}", debug_path.display());
                    self.merge_from(&debug_path, &debug_data, image.base())?;
                }
                Err(e) => warn!("⚠️  Could not read debuginfo {}: {e}", debug_path.display()),
            },
            None => warn!(
                "⚠️  {} has no .symtab and no debuginfo; local entry points are unavailable",
                image.path.display()
            ),
        }
        Ok(())
    }

    fn merge_from(&mut self, path: &Path, data: &[u8], base: u64) -> Result<(), BindError> {
        let file = object::File::parse(data).map_err(|e| unreadable(path, &e))?;
        let bias = load_bias(&file, base);
        let merged = self.collect(file.symbols(), bias);
        debug!("Merged {merged} symbols from {}", path.display());
        Ok(())
    }

    fn finish(self) -> SymbolTable {
        SymbolTable { pointer_width: self.pointer_width, symbols: self.symbols }
    }
}

/// Difference between the load base and the page-aligned lowest segment address
fn load_bias(file: &object::File<'_>, base: u64) -> u64 {
    if base == 0 {
        return 0;
    }
    let link_base = file.segments().map(|s| s.address()).min().unwrap_or(0) & !(PAGE_SIZE - 1);
    base.wrapping_sub(link_base)
}

/// Live address of a link-time `value`; ELF relocation is modular, so a
/// negative bias (image mapped below its link address) wraps
fn relocate(value: u64, bias: u64) -> Option<Address> {
    usize::try_from(value.wrapping_add(bias)).ok().map(Address)
}

fn unreadable(path: &Path, err: &dyn std::fmt::Display) -> BindError {
    BindError::ImageUnreadable { path: path.display().to_string(), reason: err.to_string() }
}
