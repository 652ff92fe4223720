//! # Symbol Table Index
//!
//! Reads the symbol tables of the host runtime's loaded image and offers
//! name → live address lookup.
//!
//! ## Address Translation
//!
//! Symbol values in `libjvm.so` are link-time virtual addresses. The live
//! address is the value plus the image's load bias:
//!
//! ```text
//! bias = load base (lowest mapping in /proc/<pid>/maps) - lowest PT_LOAD vaddr (page aligned)
//! live = st_value + bias
//! ```
//!
//! ## Sources
//!
//! - `.dynsym`: exported entry points (always present)
//! - `.symtab`: local entry points such as `Unsafe_Park` (stripped in most
//!   distribution builds)
//! - debuginfo file named by `.gnu_debuglink`, merged when `.symtab` is absent
//!
//! ## Module Structure
//!
//! - **`memory_maps`**: finds the image path and load base via `/proc/<pid>/maps`
//! - **`symbol_table`**: the index itself
//! - **`debuginfo`**: companion debug file lookup
//!
//! ```rust,ignore
//! let image = locate_in_self("libjvm.so")?;
//! let table = SymbolTable::load(&image)?;
//! let addr = table.lookup("_ZN16java_lang_Thread9thread_idEP7oopDesc");
//! ```

pub mod debuginfo;
pub mod memory_maps;
pub mod symbol_table;

pub use memory_maps::{
    locate_in_process, locate_in_self, parse_memory_maps, LoadedImage, MemoryRange,
};
pub use symbol_table::{SymbolEntry, SymbolTable};

use crate::domain::BindError;

/// Anything that can produce the symbol table of the runtime image
///
/// The registry asks its source exactly once per process.
pub trait SymbolSource {
    /// Human-readable origin, used in logs and reports
    fn describe(&self) -> String;

    /// Scan the image
    ///
    /// # Errors
    /// Returns `ImageUnreadable` when the image cannot be scanned
    fn load_symbols(&self) -> Result<SymbolTable, BindError>;
}

impl SymbolSource for LoadedImage {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    fn load_symbols(&self) -> Result<SymbolTable, BindError> {
        SymbolTable::load(self)
    }
}

impl SymbolSource for SymbolTable {
    fn describe(&self) -> String {
        format!("<in-memory table, {} symbols>", self.len())
    }

    fn load_symbols(&self) -> Result<SymbolTable, BindError> {
        Ok(self.clone())
    }
}
