//! Candidate sets: ordered linker-name variants per capability
//!
//! Candidates are plain data. Order is priority: newest or most specific
//! first, legacy fallback last. Applicability is a tag, not a closure, so
//! catalogs can live in statics and be inspected by tests.

use crate::domain::{Capability, CollectorVariant, PointerWidth, Requirement, Signature};

/// When a candidate may be used
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applicability {
    /// Any image
    Any,
    /// Only images of this pointer width
    Width(PointerWidth),
    /// Only when this collector is active
    Collector(CollectorVariant),
}

impl Applicability {
    #[must_use]
    pub fn applies(self, ctx: &ResolveContext) -> bool {
        match self {
            Applicability::Any => true,
            Applicability::Width(width) => width == ctx.pointer_width,
            Applicability::Collector(variant) => ctx.collector == Some(variant),
        }
    }
}

/// One acceptable linker name for a capability
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Candidate {
    pub symbol: &'static str,
    pub applies: Applicability,
}

impl Candidate {
    #[must_use]
    pub const fn any(symbol: &'static str) -> Self {
        Self { symbol, applies: Applicability::Any }
    }

    #[must_use]
    pub const fn width(width: PointerWidth, symbol: &'static str) -> Self {
        Self { symbol, applies: Applicability::Width(width) }
    }

    #[must_use]
    pub const fn collector(variant: CollectorVariant, symbol: &'static str) -> Self {
        Self { symbol, applies: Applicability::Collector(variant) }
    }
}

/// Directly callable capability: candidates plus declared contract
#[derive(Debug, Clone, Copy)]
pub struct CandidateSet {
    pub capability: Capability,
    pub requirement: Requirement,
    pub signature: Signature,
    pub candidates: &'static [Candidate],
}

impl CandidateSet {
    /// Whether any candidate is gated on the collector variant
    #[must_use]
    pub fn is_collector_dependent(&self) -> bool {
        self.candidates.iter().any(|c| matches!(c.applies, Applicability::Collector(_)))
    }
}

/// Vtable candidate with the class layout of its era
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VTableCandidate {
    pub candidate: Candidate,
    /// Slot the agent uses, counted from the vtable symbol (Itanium: 0 is
    /// offset-to-top, 1 is the typeinfo pointer)
    pub default_slot: usize,
    /// Number of slots known to exist in this era's layout
    pub slot_bound: usize,
}

/// Capability only reachable through a vtable slot
#[derive(Debug, Clone, Copy)]
pub struct VTableSet {
    pub capability: Capability,
    pub requirement: Requirement,
    pub candidates: &'static [VTableCandidate],
}

/// Signature symbol whose presence identifies a collector implementation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollectorProbe {
    pub variant: CollectorVariant,
    pub symbol: &'static str,
}

/// Facts about the image that candidates are filtered by
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolveContext {
    pub pointer_width: PointerWidth,
    /// `None` while the collector is still being determined
    pub collector: Option<CollectorVariant>,
}
