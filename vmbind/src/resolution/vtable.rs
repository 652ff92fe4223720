//! VTable slot capture
//!
//! The one place that makes layout assumptions about the runtime's C++
//! object model. A slot's address is `base + slot * pointer_size`, where
//! `base` is the vtable symbol's address and the bound comes from the
//! class layout of the resolved era, not from the live table.

#![allow(unsafe_code)] // reading a slot of the live vtable

use super::candidates::{ResolveContext, VTableCandidate, VTableSet};
use super::resolver::CandidateResolver;
use crate::domain::{Address, BindError, Capability};

/// Pointer size and slot bound of one vtable layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VTableLayout {
    pub pointer_size: usize,
    pub slot_bound: usize,
}

/// Address of one vtable slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VTableSlot {
    pub capability: Capability,
    pub index: usize,
    pub address: Address,
}

impl VTableSlot {
    /// Read the function pointer stored in this slot
    ///
    /// # Safety
    /// The slot must belong to a vtable mapped in the current process, i.e.
    /// the symbol table was relocated to this process's load base.
    #[must_use]
    pub unsafe fn read_target(&self) -> Address {
        Address(std::ptr::read(self.address.0 as *const usize))
    }
}

/// Compute the address of `slot` in the vtable at `base`
///
/// # Errors
/// - `VTableSlotOutOfRange` if `slot` is not below the layout's bound
/// - `AddressOverflow` if the arithmetic overflows
pub fn capture(
    capability: Capability,
    base: Address,
    layout: VTableLayout,
    slot: usize,
) -> Result<VTableSlot, BindError> {
    if slot >= layout.slot_bound {
        return Err(BindError::VTableSlotOutOfRange {
            capability,
            slot,
            bound: layout.slot_bound,
        });
    }
    let offset = slot
        .checked_mul(layout.pointer_size)
        .ok_or(BindError::AddressOverflow { base, offset: usize::MAX })?;
    let address = base.checked_add(offset).ok_or(BindError::AddressOverflow { base, offset })?;
    Ok(VTableSlot { capability, index: slot, address })
}

/// A resolved vtable: base address plus the layout of the matched era
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VTableBinding {
    pub capability: Capability,
    pub symbol: &'static str,
    pub base: Address,
    pub rank: usize,
    pub layout: VTableLayout,
    pub default_slot: usize,
}

impl VTableBinding {
    /// # Errors
    /// See [`capture`]
    pub fn capture(&self, slot: usize) -> Result<VTableSlot, BindError> {
        capture(self.capability, self.base, self.layout, slot)
    }

    /// # Errors
    /// See [`capture`]
    pub fn capture_default(&self) -> Result<VTableSlot, BindError> {
        self.capture(self.default_slot)
    }
}

/// Resolves vtable symbols through the candidate resolver
#[derive(Debug, Clone, Copy)]
pub struct VTableCapture<'t> {
    resolver: CandidateResolver<'t>,
}

impl<'t> VTableCapture<'t> {
    #[must_use]
    pub fn new(resolver: CandidateResolver<'t>) -> Self {
        Self { resolver }
    }

    /// Resolve the vtable of `set` and validate its default slot
    ///
    /// # Errors
    /// `SymbolNotFound`, `VTableSlotOutOfRange` or `AddressOverflow`
    pub fn resolve(
        &self,
        set: &VTableSet,
        ctx: &ResolveContext,
    ) -> Result<VTableBinding, BindError> {
        let candidates: Vec<_> = set.candidates.iter().map(|c| c.candidate).collect();
        let resolved = self.resolver.resolve(set.capability, &candidates, ctx)?;
        let era: &VTableCandidate = &set.candidates[resolved.rank];

        let binding = VTableBinding {
            capability: set.capability,
            symbol: resolved.symbol,
            base: resolved.address,
            rank: resolved.rank,
            layout: VTableLayout {
                pointer_size: ctx.pointer_width.bytes(),
                slot_bound: era.slot_bound,
            },
            default_slot: era.default_slot,
        };
        binding.capture_default()?;
        Ok(binding)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{PointerWidth, Requirement};
    use crate::resolution::candidates::Candidate;
    use crate::symbolization::{SymbolEntry, SymbolTable};

    const LAYOUT: VTableLayout = VTableLayout { pointer_size: 8, slot_bound: 10 };

    #[test]
    fn test_capture_slot_arithmetic() {
        let slot = capture(Capability::G1ScanClosureVTable, Address(0x2000), LAYOUT, 3).unwrap();
        assert_eq!(slot.address, Address(0x2018));
        assert_eq!(slot.index, 3);
    }

    #[test]
    fn test_capture_last_slot_in_bound() {
        let slot = capture(Capability::G1ScanClosureVTable, Address(0x2000), LAYOUT, 9).unwrap();
        assert_eq!(slot.address, Address(0x2048));
    }

    #[test]
    fn test_capture_out_of_range() {
        let err =
            capture(Capability::G1ScanClosureVTable, Address(0x2000), LAYOUT, 40).unwrap_err();
        assert_eq!(
            err,
            BindError::VTableSlotOutOfRange {
                capability: Capability::G1ScanClosureVTable,
                slot: 40,
                bound: 10,
            }
        );
        assert!(capture(Capability::G1ScanClosureVTable, Address(0x2000), LAYOUT, 10).is_err());
    }

    #[test]
    fn test_capture_overflow() {
        let err = capture(Capability::G1ScanClosureVTable, Address(usize::MAX - 4), LAYOUT, 1)
            .unwrap_err();
        assert!(matches!(err, BindError::AddressOverflow { .. }));
    }

    #[test]
    fn test_capture_32bit_layout() {
        let layout = VTableLayout { pointer_size: 4, slot_bound: 10 };
        let slot = capture(Capability::G1ScanClosureVTable, Address(0x2000), layout, 3).unwrap();
        assert_eq!(slot.address, Address(0x200c));
    }

    static ERAS: [VTableCandidate; 2] = [
        VTableCandidate {
            candidate: Candidate::any("_ZTV_modern"),
            default_slot: 3,
            slot_bound: 10,
        },
        VTableCandidate {
            candidate: Candidate::any("_ZTV_legacy"),
            default_slot: 2,
            slot_bound: 4,
        },
    ];

    static SET: VTableSet = VTableSet {
        capability: Capability::G1ScanClosureVTable,
        requirement: Requirement::Optional,
        candidates: &ERAS,
    };

    #[test]
    fn test_resolve_uses_layout_of_matched_era() {
        let table = SymbolTable::from_entries(
            PointerWidth::Bits64,
            [SymbolEntry::new("_ZTV_legacy", 0x2000)],
        );
        let ctx = ResolveContext { pointer_width: PointerWidth::Bits64, collector: None };
        let binding =
            VTableCapture::new(CandidateResolver::new(&table)).resolve(&SET, &ctx).unwrap();

        assert_eq!(binding.rank, 1);
        assert_eq!(binding.layout.slot_bound, 4);
        assert_eq!(binding.capture_default().unwrap().address, Address(0x2010));
        // Slot 5 exists in the modern layout only
        assert!(matches!(
            binding.capture(5),
            Err(BindError::VTableSlotOutOfRange { bound: 4, .. })
        ));
    }

    #[test]
    fn test_read_target_of_local_table() {
        let fake_vtable: [usize; 3] = [0, 0, 0xdead_beef];
        let slot = capture(
            Capability::G1ScanClosureVTable,
            Address(fake_vtable.as_ptr() as usize),
            VTableLayout { pointer_size: std::mem::size_of::<usize>(), slot_bound: 3 },
            2,
        )
        .unwrap();
        assert_eq!(unsafe { slot.read_target() }, Address(0xdead_beef));
    }
}
