//! First-match resolution of a candidate list against the symbol table

use log::debug;

use super::candidates::{Candidate, ResolveContext};
use crate::domain::{Address, BindError, Capability};
use crate::symbolization::SymbolTable;

/// A candidate that matched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolved {
    pub symbol: &'static str,
    pub address: Address,
    /// Position in the declared list; 0 is the newest layout
    pub rank: usize,
}

/// Probes candidates in priority order against one symbol table
#[derive(Debug, Clone, Copy)]
pub struct CandidateResolver<'t> {
    table: &'t SymbolTable,
}

impl<'t> CandidateResolver<'t> {
    #[must_use]
    pub fn new(table: &'t SymbolTable) -> Self {
        Self { table }
    }

    #[must_use]
    pub fn table(&self) -> &'t SymbolTable {
        self.table
    }

    /// Return the first applicable candidate present in the table
    ///
    /// A later candidate is never preferred over an earlier one, even when
    /// both exist: older names are often kept as compatibility shims with
    /// different semantics.
    ///
    /// # Errors
    /// Returns `SymbolNotFound` listing the applicable candidates tried
    pub fn resolve(
        &self,
        capability: Capability,
        candidates: &[Candidate],
        ctx: &ResolveContext,
    ) -> Result<Resolved, BindError> {
        let mut tried = Vec::new();

        for (rank, candidate) in candidates.iter().enumerate() {
            if !candidate.applies.applies(ctx) {
                continue;
            }
            if let Some(address) = self.table.lookup(candidate.symbol) {
                debug!("{capability}: {} -> {address} (rank {rank})", candidate.symbol);
                return Ok(Resolved { symbol: candidate.symbol, address, rank });
            }
            tried.push(candidate.symbol);
        }

        Err(BindError::SymbolNotFound { capability, tried })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CollectorVariant, PointerWidth};
    use crate::symbolization::SymbolEntry;

    const CTX64: ResolveContext =
        ResolveContext { pointer_width: PointerWidth::Bits64, collector: None };

    static OBJECT_SIZE: [Candidate; 2] =
        [Candidate::any("modern_get_object_size"), Candidate::any("legacy_get_object_size")];

    fn table(entries: &[(&str, usize)]) -> SymbolTable {
        SymbolTable::from_entries(
            PointerWidth::Bits64,
            entries.iter().map(|(n, a)| SymbolEntry::new(*n, *a)),
        )
    }

    #[test]
    fn test_falls_back_to_legacy() {
        let table = table(&[("legacy_get_object_size", 0x1000)]);
        let resolved = CandidateResolver::new(&table)
            .resolve(Capability::GetObjectSize, &OBJECT_SIZE, &CTX64)
            .unwrap();
        assert_eq!(resolved.address, Address(0x1000));
        assert_eq!(resolved.symbol, "legacy_get_object_size");
        assert_eq!(resolved.rank, 1);
    }

    #[test]
    fn test_prefers_newest_when_both_present() {
        let table =
            table(&[("legacy_get_object_size", 0x1000), ("modern_get_object_size", 0x3000)]);
        let resolved = CandidateResolver::new(&table)
            .resolve(Capability::GetObjectSize, &OBJECT_SIZE, &CTX64)
            .unwrap();
        assert_eq!(resolved.address, Address(0x3000));
        assert_eq!(resolved.rank, 0);
    }

    #[test]
    fn test_symbol_not_found_lists_tried() {
        let table = table(&[("unrelated", 0x10)]);
        let err = CandidateResolver::new(&table)
            .resolve(Capability::GetObjectSize, &OBJECT_SIZE, &CTX64)
            .unwrap_err();
        assert_eq!(
            err,
            BindError::SymbolNotFound {
                capability: Capability::GetObjectSize,
                tried: vec!["modern_get_object_size", "legacy_get_object_size"],
            }
        );
    }

    #[test]
    fn test_inapplicable_candidates_are_skipped() {
        static BY_WIDTH: [Candidate; 2] = [
            Candidate::width(PointerWidth::Bits64, "size_lp64"),
            Candidate::width(PointerWidth::Bits32, "size_ilp32"),
        ];
        // Only the 32-bit name exists, but the image is 64-bit
        let table = table(&[("size_ilp32", 0x40)]);
        let err = CandidateResolver::new(&table)
            .resolve(Capability::GetObjectSize, &BY_WIDTH, &CTX64)
            .unwrap_err();
        assert_eq!(
            err,
            BindError::SymbolNotFound {
                capability: Capability::GetObjectSize,
                tried: vec!["size_lp64"],
            }
        );
    }

    #[test]
    fn test_first_present_candidate_wins_for_every_subset() {
        static THREE: [Candidate; 3] =
            [Candidate::any("c0"), Candidate::any("c1"), Candidate::any("c2")];

        for mask in 0u8..8 {
            let entries: Vec<(&str, usize)> = (0..3)
                .filter(|i| mask & (1 << i) != 0)
                .map(|i| (THREE[i].symbol, 0x100 * (i + 1)))
                .collect();
            let table = table(&entries);
            let result =
                CandidateResolver::new(&table).resolve(Capability::ThreadId, &THREE, &CTX64);

            match (0..3).find(|i| mask & (1 << i) != 0) {
                Some(first) => {
                    let resolved = result.unwrap();
                    assert_eq!(resolved.rank, first);
                    assert_eq!(resolved.address, Address(0x100 * (first + 1)));
                }
                None => assert!(matches!(result, Err(BindError::SymbolNotFound { .. }))),
            }
        }
    }

    #[test]
    fn test_collector_gated_candidates() {
        static GATED: [Candidate; 2] = [
            Candidate::collector(CollectorVariant::Parallel, "parallel_is_in_permanent"),
            Candidate::collector(CollectorVariant::SharedHeap, "shared_heap_is_in_permanent"),
        ];
        let table =
            table(&[("parallel_is_in_permanent", 0x10), ("shared_heap_is_in_permanent", 0x20)]);
        let ctx = ResolveContext { collector: Some(CollectorVariant::SharedHeap), ..CTX64 };

        let resolved = CandidateResolver::new(&table)
            .resolve(Capability::IsInPermanent, &GATED, &ctx)
            .unwrap();
        assert_eq!(resolved.symbol, "shared_heap_is_in_permanent");
    }
}
