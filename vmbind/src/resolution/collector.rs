//! Collector-variant selection from signature symbols

use log::{debug, info, warn};

use super::candidates::CollectorProbe;
use crate::domain::{BindError, CollectorVariant};
use crate::symbolization::SymbolTable;

/// What to do when more than one collector signature is present
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AmbiguityPolicy {
    /// Take the highest-priority probe that matched
    #[default]
    ByPriority,
    /// Fail with `VariantAmbiguous`
    Strict,
}

/// Determines the one collector implementation the registry binds against
#[derive(Debug, Clone, Copy)]
pub struct CollectorSelector<'p> {
    probes: &'p [CollectorProbe],
    policy: AmbiguityPolicy,
    hint: Option<CollectorVariant>,
}

impl<'p> CollectorSelector<'p> {
    /// `probes` are ordered by priority, highest first
    #[must_use]
    pub fn new(probes: &'p [CollectorProbe], policy: AmbiguityPolicy) -> Self {
        Self { probes, policy, hint: None }
    }

    /// Use a variant already known from the runtime's own flags
    #[must_use]
    pub fn with_hint(mut self, hint: Option<CollectorVariant>) -> Self {
        self.hint = hint;
        self
    }

    /// Select exactly one variant
    ///
    /// No signature present selects `Other`.
    ///
    /// # Errors
    /// - `VariantAmbiguous` under `Strict` when several signatures match
    /// - `CollectorSignatureMissing` when a hinted variant's signature is absent
    pub fn select(&self, table: &SymbolTable) -> Result<CollectorVariant, BindError> {
        if let Some(hint) = self.hint {
            return self.verify_hint(hint, table);
        }

        let present: Vec<&CollectorProbe> =
            self.probes.iter().filter(|p| table.contains(p.symbol)).collect();
        for probe in &present {
            debug!("Collector signature present: {} ({})", probe.symbol, probe.variant);
        }

        let variant = match present.as_slice() {
            [] => CollectorVariant::Other,
            [only] => only.variant,
            [first, second, ..] => match self.policy {
                AmbiguityPolicy::Strict => {
                    return Err(BindError::VariantAmbiguous {
                        first: first.variant,
                        second: second.variant,
                    });
                }
                AmbiguityPolicy::ByPriority => {
                    warn!(
                        "⚠️  {} collector signatures present, selecting {} by priority",
                        present.len(),
                        first.variant
                    );
                    first.variant
                }
            },
        };

        info!("✓ Collector variant: {variant}");
        Ok(variant)
    }

    fn verify_hint(
        &self,
        hint: CollectorVariant,
        table: &SymbolTable,
    ) -> Result<CollectorVariant, BindError> {
        let signatures: Vec<&'static str> =
            self.probes.iter().filter(|p| p.variant == hint).map(|p| p.symbol).collect();

        // `Other` has no signature of its own
        if signatures.is_empty() || signatures.iter().any(|s| table.contains(s)) {
            info!("✓ Collector variant: {hint} (hinted)");
            return Ok(hint);
        }
        Err(BindError::CollectorSignatureMissing(hint))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PointerWidth;
    use crate::symbolization::SymbolEntry;

    static PROBES: [CollectorProbe; 2] = [
        CollectorProbe { variant: CollectorVariant::Parallel, symbol: "parallel_is_in_permanent" },
        CollectorProbe {
            variant: CollectorVariant::SharedHeap,
            symbol: "shared_heap_is_in_permanent",
        },
    ];

    fn table(names: &[&str]) -> SymbolTable {
        SymbolTable::from_entries(
            PointerWidth::Bits64,
            names.iter().enumerate().map(|(i, n)| SymbolEntry::new(*n, 0x1000 + i * 0x10)),
        )
    }

    #[test]
    fn test_single_signature_selects_its_variant() {
        let selector = CollectorSelector::new(&PROBES, AmbiguityPolicy::ByPriority);
        assert_eq!(
            selector.select(&table(&["parallel_is_in_permanent"])).unwrap(),
            CollectorVariant::Parallel
        );
        assert_eq!(
            selector.select(&table(&["shared_heap_is_in_permanent"])).unwrap(),
            CollectorVariant::SharedHeap
        );
    }

    #[test]
    fn test_no_signature_selects_other() {
        let selector = CollectorSelector::new(&PROBES, AmbiguityPolicy::Strict);
        assert_eq!(selector.select(&table(&["unrelated"])).unwrap(), CollectorVariant::Other);
    }

    #[test]
    fn test_both_signatures_select_by_priority() {
        let both = table(&["shared_heap_is_in_permanent", "parallel_is_in_permanent"]);
        let selector = CollectorSelector::new(&PROBES, AmbiguityPolicy::ByPriority);

        // Deterministic across repeated selections
        for _ in 0..3 {
            assert_eq!(selector.select(&both).unwrap(), CollectorVariant::Parallel);
        }
    }

    #[test]
    fn test_both_signatures_rejected_when_strict() {
        let both = table(&["parallel_is_in_permanent", "shared_heap_is_in_permanent"]);
        let err =
            CollectorSelector::new(&PROBES, AmbiguityPolicy::Strict).select(&both).unwrap_err();
        assert_eq!(
            err,
            BindError::VariantAmbiguous {
                first: CollectorVariant::Parallel,
                second: CollectorVariant::SharedHeap,
            }
        );
    }

    #[test]
    fn test_hint_overrides_priority() {
        let both = table(&["parallel_is_in_permanent", "shared_heap_is_in_permanent"]);
        let selector = CollectorSelector::new(&PROBES, AmbiguityPolicy::Strict)
            .with_hint(Some(CollectorVariant::SharedHeap));
        assert_eq!(selector.select(&both).unwrap(), CollectorVariant::SharedHeap);
    }

    #[test]
    fn test_hint_without_signature_fails() {
        let selector = CollectorSelector::new(&PROBES, AmbiguityPolicy::ByPriority)
            .with_hint(Some(CollectorVariant::Parallel));
        let err = selector.select(&table(&["shared_heap_is_in_permanent"])).unwrap_err();
        assert_eq!(err, BindError::CollectorSignatureMissing(CollectorVariant::Parallel));
    }

    #[test]
    fn test_hint_other_needs_no_signature() {
        let selector = CollectorSelector::new(&PROBES, AmbiguityPolicy::ByPriority)
            .with_hint(Some(CollectorVariant::Other));
        assert_eq!(selector.select(&table(&[])).unwrap(), CollectorVariant::Other);
    }
}
