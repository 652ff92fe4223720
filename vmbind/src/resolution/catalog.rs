//! HotSpot capability catalog
//!
//! Every linker name the registry may bind, grouped per capability and
//! ordered newest first. Adding a runtime era or collector is an edit here,
//! never in the resolver.

use std::collections::HashSet;

use super::candidates::{
    Applicability, Candidate, CandidateSet, CollectorProbe, VTableCandidate, VTableSet,
};
use crate::domain::{Capability, CollectorVariant, PointerWidth, Requirement, Signature};

/// Complete build-time description of what to resolve
#[derive(Debug, Clone, Copy)]
pub struct Catalog {
    /// Ordered by priority, highest first
    pub collector_probes: &'static [CollectorProbe],
    pub functions: &'static [CandidateSet],
    pub vtables: &'static [VTableSet],
}

impl Catalog {
    /// Check the structural rules the resolver relies on
    ///
    /// - every capability is declared once
    /// - collector-gated candidates name each variant at most once, so a
    ///   selected variant binds exactly one implementation
    ///
    /// # Errors
    /// Returns a description of the first violation
    pub fn validate(&self) -> Result<(), String> {
        let mut seen = HashSet::new();
        let capabilities = self
            .functions
            .iter()
            .map(|f| f.capability)
            .chain(self.vtables.iter().map(|v| v.capability));
        for capability in capabilities {
            if !seen.insert(capability) {
                return Err(format!("{capability} is declared more than once"));
            }
        }

        for set in self.functions.iter().filter(|f| f.is_collector_dependent()) {
            let mut variants = HashSet::new();
            for candidate in set.candidates {
                let Applicability::Collector(variant) = candidate.applies else {
                    return Err(format!(
                        "{} mixes collector-gated and ungated candidates",
                        set.capability
                    ));
                };
                if !variants.insert(variant) {
                    return Err(format!("{} has two candidates for {variant}", set.capability));
                }
            }
        }

        let mut probed = HashSet::new();
        for probe in self.collector_probes {
            if !probed.insert(probe.variant) {
                return Err(format!("collector {} is probed more than once", probe.variant));
            }
        }
        Ok(())
    }

    /// Requirement of `capability`, if the catalog declares it
    #[must_use]
    pub fn requirement_of(&self, capability: Capability) -> Option<Requirement> {
        self.functions
            .iter()
            .find(|f| f.capability == capability)
            .map(|f| f.requirement)
            .or_else(|| {
                self.vtables.iter().find(|v| v.capability == capability).map(|v| v.requirement)
            })
    }
}

// ============================================================================
// Linker names
// ============================================================================

/// `ParallelScavengeHeap::is_in_permanent(const void*) const`
pub const PARALLEL_IS_IN_PERMANENT: &str = "_ZNK20ParallelScavengeHeap15is_in_permanentEPKv";

/// `SharedHeap::is_in_permanent(const void*) const`
pub const SHARED_HEAP_IS_IN_PERMANENT: &str = "_ZNK10SharedHeap15is_in_permanentEPKv";

static COLLECTOR_PROBES: [CollectorProbe; 2] = [
    CollectorProbe { variant: CollectorVariant::Parallel, symbol: PARALLEL_IS_IN_PERMANENT },
    CollectorProbe { variant: CollectorVariant::SharedHeap, symbol: SHARED_HEAP_IS_IN_PERMANENT },
];

// `jlong` mangles as `l` (long) on LP64 and `x` (long long) on ILP32
static GET_OBJECT_SIZE: [Candidate; 2] = [
    Candidate::width(PointerWidth::Bits64, "_ZN8JvmtiEnv13GetObjectSizeEP8_jobjectPl"),
    Candidate::width(PointerWidth::Bits32, "_ZN8JvmtiEnv13GetObjectSizeEP8_jobjectPx"),
];

// as_Klass replaced as_klassOop with the metaspace change (CR6964458)
static AS_KLASS: [Candidate; 2] = [
    Candidate::any("_ZN15java_lang_Class8as_KlassEP7oopDesc"),
    Candidate::any("_ZN15java_lang_Class11as_klassOopEP7oopDesc"),
];

// klass_holder() replaced class_loader() in CR8004883
static CLASS_LOADER_FOR_INSTANCE: [Candidate; 2] = [
    Candidate::any("_ZNK13InstanceKlass12klass_holderEv"),
    Candidate::any("_ZNK13instanceKlass12class_loaderEv"),
];

static CLASS_LOADER_FOR_OBJ_ARRAY: [Candidate; 2] = [
    Candidate::any("_ZNK5Klass12klass_holderEv"),
    Candidate::any("_ZNK13objArrayKlass12class_loaderEv"),
];

static THREAD_ID: [Candidate; 1] = [Candidate::any("_ZN16java_lang_Thread9thread_idEP7oopDesc")];

static UNSAFE_PARK: [Candidate; 1] = [Candidate::any("Unsafe_Park")];

static IS_IN_PERMANENT: [Candidate; 2] = [
    Candidate::collector(CollectorVariant::Parallel, PARALLEL_IS_IN_PERMANENT),
    Candidate::collector(CollectorVariant::SharedHeap, SHARED_HEAP_IS_IN_PERMANENT),
];

static FUNCTIONS: [CandidateSet; 7] = [
    CandidateSet {
        capability: Capability::GetObjectSize,
        requirement: Requirement::Mandatory,
        signature: Signature::ObjectSize,
        candidates: &GET_OBJECT_SIZE,
    },
    CandidateSet {
        capability: Capability::AsKlass,
        requirement: Requirement::Mandatory,
        signature: Signature::MirrorToKlass,
        candidates: &AS_KLASS,
    },
    CandidateSet {
        capability: Capability::ClassLoaderForInstanceKlass,
        requirement: Requirement::Mandatory,
        signature: Signature::ClassLoader,
        candidates: &CLASS_LOADER_FOR_INSTANCE,
    },
    CandidateSet {
        capability: Capability::ClassLoaderForObjArrayKlass,
        requirement: Requirement::Mandatory,
        signature: Signature::ClassLoader,
        candidates: &CLASS_LOADER_FOR_OBJ_ARRAY,
    },
    CandidateSet {
        capability: Capability::ThreadId,
        requirement: Requirement::Mandatory,
        signature: Signature::ThreadId,
        candidates: &THREAD_ID,
    },
    // Local symbol: only present with .symtab or debuginfo
    CandidateSet {
        capability: Capability::UnsafePark,
        requirement: Requirement::Optional,
        signature: Signature::Park,
        candidates: &UNSAFE_PARK,
    },
    // Permanent generation is gone since JDK 8
    CandidateSet {
        capability: Capability::IsInPermanent,
        requirement: Requirement::Optional,
        signature: Signature::IsInPermanent,
        candidates: &IS_IN_PERMANENT,
    },
];

// Itanium layout: [offset-to-top, typeinfo, do_oop(oop*), do_oop(narrowOop*), ...]
static G1_SCAN_CLOSURE: [VTableCandidate; 2] = [
    VTableCandidate {
        candidate: Candidate::any("_ZTV16G1ParScanClosure"),
        default_slot: 2,
        slot_bound: 10,
    },
    VTableCandidate {
        candidate: Candidate::any("_ZTV24G1ParScanHeapEvacClosure"),
        default_slot: 2,
        slot_bound: 8,
    },
];

static VTABLES: [VTableSet; 1] = [VTableSet {
    capability: Capability::G1ScanClosureVTable,
    requirement: Requirement::Optional,
    candidates: &G1_SCAN_CLOSURE,
}];

/// The catalog used by the agent against HotSpot's `libjvm.so`
pub static HOTSPOT: Catalog =
    Catalog { collector_probes: &COLLECTOR_PROBES, functions: &FUNCTIONS, vtables: &VTABLES };

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hotspot_catalog_is_valid() {
        assert_eq!(HOTSPOT.validate(), Ok(()));
    }

    #[test]
    fn test_object_size_covers_both_widths_once() {
        let widths: Vec<_> = GET_OBJECT_SIZE
            .iter()
            .map(|c| match c.applies {
                Applicability::Width(w) => w,
                other => panic!("unexpected applicability {other:?}"),
            })
            .collect();
        assert_eq!(widths, vec![PointerWidth::Bits64, PointerWidth::Bits32]);
    }

    #[test]
    fn test_every_probe_has_a_permanent_candidate() {
        for probe in HOTSPOT.collector_probes {
            assert!(IS_IN_PERMANENT
                .iter()
                .any(|c| c.applies == Applicability::Collector(probe.variant)
                    && c.symbol == probe.symbol));
        }
    }

    #[test]
    fn test_requirements() {
        assert_eq!(HOTSPOT.requirement_of(Capability::ThreadId), Some(Requirement::Mandatory));
        assert_eq!(HOTSPOT.requirement_of(Capability::UnsafePark), Some(Requirement::Optional));
        assert_eq!(
            HOTSPOT.requirement_of(Capability::G1ScanClosureVTable),
            Some(Requirement::Optional)
        );
    }

    #[test]
    fn test_validate_rejects_overlapping_collector_candidates() {
        static OVERLAP: [Candidate; 2] = [
            Candidate::collector(CollectorVariant::Parallel, "a"),
            Candidate::collector(CollectorVariant::Parallel, "b"),
        ];
        static SETS: [CandidateSet; 1] = [CandidateSet {
            capability: Capability::IsInPermanent,
            requirement: Requirement::Optional,
            signature: Signature::IsInPermanent,
            candidates: &OVERLAP,
        }];
        let catalog = Catalog { collector_probes: &[], functions: &SETS, vtables: &[] };
        assert!(catalog.validate().unwrap_err().contains("two candidates for parallel"));
    }

    #[test]
    fn test_validate_rejects_duplicate_capability() {
        static SETS: [CandidateSet; 2] = [
            CandidateSet {
                capability: Capability::ThreadId,
                requirement: Requirement::Mandatory,
                signature: Signature::ThreadId,
                candidates: &THREAD_ID,
            },
            CandidateSet {
                capability: Capability::ThreadId,
                requirement: Requirement::Optional,
                signature: Signature::ThreadId,
                candidates: &THREAD_ID,
            },
        ];
        let catalog = Catalog { collector_probes: &[], functions: &SETS, vtables: &[] };
        assert!(catalog.validate().is_err());
    }
}
