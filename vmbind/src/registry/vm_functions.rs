//! Function Binding Registry
//!
//! One resolution pass over the catalog produces a [`Resolution`]; if every
//! mandatory capability bound, it becomes an immutable [`VmFunctions`] whose
//! accessors forward straight to the runtime.

#![allow(unsafe_code)] // forwarding calls into the runtime

use log::{error, info, warn};
use std::collections::HashMap;

use vmbind_sys::{
    jboolean, jlong, jobject, jvmtiError, oop, AsKlassFn, ClassLoaderFn, GetObjectSizeFn,
    IsInPermanentFn, JNIEnv, KlassPtr, ThisPtr, ThreadIdFn, UnsafeParkFn,
};

use super::binding::RawBinding;
use crate::domain::{
    Address, BindError, Capability, CapabilityFailure, CollectorVariant, PointerWidth,
    Requirement, Signature,
};
use crate::resolution::{
    AmbiguityPolicy, CandidateResolver, Catalog, CollectorSelector, ResolveContext, VTableBinding,
    VTableCapture, VTableSlot,
};
use crate::symbolization::SymbolTable;

/// Knobs for one resolution pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolveOptions {
    /// Collector known from the runtime's flags; skips probing
    pub collector_hint: Option<CollectorVariant>,
    pub ambiguity: AmbiguityPolicy,
}

/// What a capability was bound to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    Function(RawBinding),
    VTable(VTableBinding),
}

impl Bound {
    #[must_use]
    pub fn symbol(&self) -> &'static str {
        match self {
            Bound::Function(b) => b.symbol,
            Bound::VTable(v) => v.symbol,
        }
    }

    #[must_use]
    pub fn address(&self) -> Address {
        match self {
            Bound::Function(b) => b.address,
            Bound::VTable(v) => v.base,
        }
    }

    #[must_use]
    pub fn rank(&self) -> usize {
        match self {
            Bound::Function(b) => b.rank,
            Bound::VTable(v) => v.rank,
        }
    }
}

/// Result of resolving one declared capability
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapabilityOutcome {
    pub capability: Capability,
    pub requirement: Requirement,
    pub signature: Signature,
    pub result: Result<Bound, BindError>,
}

/// Everything one pass found, before the mandatory check
#[derive(Debug, Clone)]
pub struct Resolution {
    pub pointer_width: PointerWidth,
    pub collector: CollectorVariant,
    pub outcomes: Vec<CapabilityOutcome>,
}

impl Resolution {
    /// Select the collector, then resolve every capability of `catalog`
    ///
    /// # Errors
    /// Only collector selection errors abort the pass; per-capability
    /// failures are recorded in the outcomes.
    pub fn run(
        table: &SymbolTable,
        catalog: &Catalog,
        options: ResolveOptions,
    ) -> Result<Self, BindError> {
        debug_assert_eq!(catalog.validate(), Ok(()), "malformed capability catalog");
        let collector = CollectorSelector::new(catalog.collector_probes, options.ambiguity)
            .with_hint(options.collector_hint)
            .select(table)?;
        let ctx =
            ResolveContext { pointer_width: table.pointer_width(), collector: Some(collector) };
        let resolver = CandidateResolver::new(table);
        let vtables = VTableCapture::new(resolver);

        let mut outcomes = Vec::with_capacity(catalog.functions.len() + catalog.vtables.len());

        for set in catalog.functions {
            let result = resolver.resolve(set.capability, set.candidates, &ctx).map(|r| {
                Bound::Function(RawBinding {
                    capability: set.capability,
                    symbol: r.symbol,
                    address: r.address,
                    signature: set.signature,
                    rank: r.rank,
                })
            });
            outcomes.push(log_outcome(CapabilityOutcome {
                capability: set.capability,
                requirement: set.requirement,
                signature: set.signature,
                result,
            }));
        }

        for set in catalog.vtables {
            let result = vtables.resolve(set, &ctx).map(Bound::VTable);
            outcomes.push(log_outcome(CapabilityOutcome {
                capability: set.capability,
                requirement: set.requirement,
                signature: Signature::VTable,
                result,
            }));
        }

        Ok(Self { pointer_width: ctx.pointer_width, collector, outcomes })
    }

    /// Capabilities that did not bind
    #[must_use]
    pub fn failures(&self) -> Vec<CapabilityFailure> {
        self.outcomes
            .iter()
            .filter_map(|o| {
                o.result.as_ref().err().map(|error| CapabilityFailure {
                    capability: o.capability,
                    requirement: o.requirement,
                    error: error.clone(),
                })
            })
            .collect()
    }

    /// Freeze into a registry
    ///
    /// # Errors
    /// `InitializationFailed` (carrying every failure) if a mandatory capability is missing
    pub fn into_registry(self) -> Result<VmFunctions, BindError> {
        let failures = self.failures();
        if failures.iter().any(CapabilityFailure::is_mandatory) {
            return Err(BindError::InitializationFailed { failures });
        }

        let mut functions = HashMap::new();
        let mut vtables = HashMap::new();
        for outcome in &self.outcomes {
            match &outcome.result {
                Ok(Bound::Function(binding)) => {
                    functions.insert(outcome.capability, *binding);
                }
                Ok(Bound::VTable(binding)) => {
                    vtables.insert(outcome.capability, *binding);
                }
                Err(_) => {}
            }
        }

        Ok(VmFunctions {
            pointer_width: self.pointer_width,
            collector: self.collector,
            functions,
            vtables,
            outcomes: self.outcomes,
        })
    }
}

fn log_outcome(outcome: CapabilityOutcome) -> CapabilityOutcome {
    match (&outcome.result, outcome.requirement) {
        (Ok(bound), _) => {
            info!("✓ Bound {}: {} @ {}", outcome.capability, bound.symbol(), bound.address());
        }
        (Err(e), Requirement::Mandatory) => error!("Mandatory capability unavailable: {e}"),
        (Err(e), Requirement::Optional) => warn!("⚠️  Optional capability unavailable: {e}"),
    }
    outcome
}

/// Immutable set of bound HotSpot entry points
///
/// `Send + Sync`: after construction nothing is mutated, so any number of
/// runtime threads may call through it concurrently.
#[derive(Debug, Clone)]
pub struct VmFunctions {
    pointer_width: PointerWidth,
    collector: CollectorVariant,
    functions: HashMap<Capability, RawBinding>,
    vtables: HashMap<Capability, VTableBinding>,
    outcomes: Vec<CapabilityOutcome>,
}

impl VmFunctions {
    /// Run one pass and freeze it
    ///
    /// # Errors
    /// Collector selection errors, or `InitializationFailed`
    pub fn resolve(
        table: &SymbolTable,
        catalog: &Catalog,
        options: ResolveOptions,
    ) -> Result<Self, BindError> {
        Resolution::run(table, catalog, options)?.into_registry()
    }

    #[must_use]
    pub fn collector(&self) -> CollectorVariant {
        self.collector
    }

    #[must_use]
    pub fn pointer_width(&self) -> PointerWidth {
        self.pointer_width
    }

    /// Per-capability results in catalog order
    #[must_use]
    pub fn outcomes(&self) -> &[CapabilityOutcome] {
        &self.outcomes
    }

    #[must_use]
    pub fn is_available(&self, capability: Capability) -> bool {
        self.functions.contains_key(&capability) || self.vtables.contains_key(&capability)
    }

    /// # Errors
    /// `CapabilityUnavailable` if `capability` is not a bound function
    pub fn binding(&self, capability: Capability) -> Result<&RawBinding, BindError> {
        self.functions.get(&capability).ok_or(BindError::CapabilityUnavailable(capability))
    }

    /// # Errors
    /// `CapabilityUnavailable` if `capability` is not a bound vtable
    pub fn vtable(&self, capability: Capability) -> Result<&VTableBinding, BindError> {
        self.vtables.get(&capability).ok_or(BindError::CapabilityUnavailable(capability))
    }

    /// Entry point address, or vtable base for vtable capabilities
    ///
    /// # Errors
    /// `CapabilityUnavailable` if `capability` did not bind
    pub fn address_of(&self, capability: Capability) -> Result<Address, BindError> {
        self.binding(capability)
            .map(|b| b.address)
            .or_else(|_| self.vtable(capability).map(|v| v.base))
    }

    fn function<F: Copy>(
        &self,
        capability: Capability,
        signature: Signature,
    ) -> Result<F, BindError> {
        let binding = self.binding(capability)?;
        // SAFETY: every F below is the vmbind_sys type of `signature`
        Ok(unsafe { binding.cast(signature) })
    }

    /// `JvmtiEnv::GetObjectSize(object, size_ptr)` on `jvmti_env`
    ///
    /// # Safety
    /// `jvmti_env` must be the runtime's `JvmtiEnv*`, `object` a live
    /// reference and `size_ptr` writable.
    ///
    /// # Errors
    /// `CapabilityUnavailable`
    pub unsafe fn get_object_size(
        &self,
        jvmti_env: ThisPtr,
        object: jobject,
        size_ptr: *mut jlong,
    ) -> Result<jvmtiError, BindError> {
        let f: GetObjectSizeFn = self.function(Capability::GetObjectSize, Signature::ObjectSize)?;
        Ok(f(jvmti_env, object, size_ptr))
    }

    /// Klass of a `java.lang.Class` mirror
    ///
    /// # Safety
    /// `mirror` must be a live `java.lang.Class` oop, called at a safepoint
    /// or from a thread in VM state.
    ///
    /// # Errors
    /// `CapabilityUnavailable`
    pub unsafe fn as_klass(&self, mirror: oop) -> Result<KlassPtr, BindError> {
        let f: AsKlassFn = self.function(Capability::AsKlass, Signature::MirrorToKlass)?;
        Ok(f(mirror))
    }

    /// Class loader (holder) oop of an instance klass, possibly null
    ///
    /// # Safety
    /// `klass` must point to a live instance klass.
    ///
    /// # Errors
    /// `CapabilityUnavailable`
    pub unsafe fn class_loader_for_instance_klass(
        &self,
        klass: KlassPtr,
    ) -> Result<oop, BindError> {
        let f: ClassLoaderFn =
            self.function(Capability::ClassLoaderForInstanceKlass, Signature::ClassLoader)?;
        Ok(f(klass))
    }

    /// Class loader (holder) oop of an object-array klass, possibly null
    ///
    /// # Safety
    /// `klass` must point to a live object-array klass.
    ///
    /// # Errors
    /// `CapabilityUnavailable`
    pub unsafe fn class_loader_for_obj_array_klass(
        &self,
        klass: KlassPtr,
    ) -> Result<oop, BindError> {
        let f: ClassLoaderFn =
            self.function(Capability::ClassLoaderForObjArrayKlass, Signature::ClassLoader)?;
        Ok(f(klass))
    }

    /// `Thread#getId()` of a `java.lang.Thread` oop
    ///
    /// # Safety
    /// `thread_oop` must be a live `java.lang.Thread` oop.
    ///
    /// # Errors
    /// `CapabilityUnavailable`
    pub unsafe fn thread_id(&self, thread_oop: oop) -> Result<jlong, BindError> {
        let f: ThreadIdFn = self.function(Capability::ThreadId, Signature::ThreadId)?;
        Ok(f(thread_oop))
    }

    /// Blocking park, exactly as `sun.misc.Unsafe#park` would
    ///
    /// # Safety
    /// Must be called from a Java thread with its own `env`.
    ///
    /// # Errors
    /// `CapabilityUnavailable`
    pub unsafe fn unsafe_park(
        &self,
        env: *mut JNIEnv,
        unsafe_obj: jobject,
        is_absolute: jboolean,
        time: jlong,
    ) -> Result<(), BindError> {
        let f: UnsafeParkFn = self.function(Capability::UnsafePark, Signature::Park)?;
        f(env, unsafe_obj, is_absolute, time);
        Ok(())
    }

    /// Original `Unsafe_Park` address, for installing a park interceptor
    ///
    /// # Errors
    /// `CapabilityUnavailable`
    pub fn unsafe_park_address(&self) -> Result<Address, BindError> {
        self.binding(Capability::UnsafePark).map(|b| b.address)
    }

    /// `is_in_permanent` of the active heap
    ///
    /// # Safety
    /// `heap` must be the runtime's `CollectedHeap*` of the selected variant.
    ///
    /// # Errors
    /// `CapabilityUnavailable`
    pub unsafe fn is_in_permanent(
        &self,
        heap: ThisPtr,
        p: *const std::ffi::c_void,
    ) -> Result<bool, BindError> {
        let f: IsInPermanentFn =
            self.function(Capability::IsInPermanent, Signature::IsInPermanent)?;
        Ok(f(heap, p))
    }

    /// Address of slot `slot` in a bound vtable
    ///
    /// # Errors
    /// `CapabilityUnavailable` or `VTableSlotOutOfRange`
    pub fn capture_vtable_slot(
        &self,
        capability: Capability,
        slot: usize,
    ) -> Result<VTableSlot, BindError> {
        self.vtable(capability)?.capture(slot)
    }

    /// Slot the catalog designates for `capability` in the matched era
    ///
    /// # Errors
    /// `CapabilityUnavailable`
    pub fn default_vtable_slot(&self, capability: Capability) -> Result<VTableSlot, BindError> {
        self.vtable(capability)?.capture_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolution::{Candidate, CandidateSet, CollectorProbe, VTableCandidate, VTableSet};
    use crate::symbolization::SymbolEntry;

    static SIZE: [Candidate; 2] =
        [Candidate::any("modern_get_object_size"), Candidate::any("legacy_get_object_size")];
    static PARK: [Candidate; 1] = [Candidate::any("park")];
    static PERM: [Candidate; 2] = [
        Candidate::collector(CollectorVariant::Parallel, "parallel_is_in_permanent"),
        Candidate::collector(CollectorVariant::SharedHeap, "shared_heap_is_in_permanent"),
    ];
    static PROBES: [CollectorProbe; 2] = [
        CollectorProbe { variant: CollectorVariant::Parallel, symbol: "parallel_is_in_permanent" },
        CollectorProbe {
            variant: CollectorVariant::SharedHeap,
            symbol: "shared_heap_is_in_permanent",
        },
    ];
    static FUNCTIONS: [CandidateSet; 3] = [
        CandidateSet {
            capability: Capability::GetObjectSize,
            requirement: Requirement::Mandatory,
            signature: Signature::ObjectSize,
            candidates: &SIZE,
        },
        CandidateSet {
            capability: Capability::UnsafePark,
            requirement: Requirement::Optional,
            signature: Signature::Park,
            candidates: &PARK,
        },
        CandidateSet {
            capability: Capability::IsInPermanent,
            requirement: Requirement::Optional,
            signature: Signature::IsInPermanent,
            candidates: &PERM,
        },
    ];
    static CLOSURE: [VTableCandidate; 1] = [VTableCandidate {
        candidate: Candidate::any("_ZTV7Closure"),
        default_slot: 3,
        slot_bound: 10,
    }];
    static VTABLES: [VTableSet; 1] = [VTableSet {
        capability: Capability::G1ScanClosureVTable,
        requirement: Requirement::Optional,
        candidates: &CLOSURE,
    }];
    static CATALOG: Catalog =
        Catalog { collector_probes: &PROBES, functions: &FUNCTIONS, vtables: &VTABLES };

    fn table(entries: &[(&str, usize)]) -> SymbolTable {
        SymbolTable::from_entries(
            PointerWidth::Bits64,
            entries.iter().map(|(n, a)| SymbolEntry::new(*n, *a)),
        )
    }

    #[test]
    fn test_ready_with_optional_gaps() {
        let registry = VmFunctions::resolve(
            &table(&[("legacy_get_object_size", 0x1000), ("_ZTV7Closure", 0x2000)]),
            &CATALOG,
            ResolveOptions::default(),
        )
        .unwrap();

        assert_eq!(registry.address_of(Capability::GetObjectSize), Ok(Address(0x1000)));
        assert_eq!(registry.collector(), CollectorVariant::Other);
        assert_eq!(
            registry.unsafe_park_address(),
            Err(BindError::CapabilityUnavailable(Capability::UnsafePark))
        );
        assert!(!registry.is_available(Capability::IsInPermanent));
        assert_eq!(
            registry.default_vtable_slot(Capability::G1ScanClosureVTable).unwrap().address,
            Address(0x2018)
        );
    }

    #[test]
    fn test_unavailable_accessor_reports_every_call() {
        let registry = VmFunctions::resolve(
            &table(&[("modern_get_object_size", 0x1000)]),
            &CATALOG,
            ResolveOptions::default(),
        )
        .unwrap();

        for _ in 0..2 {
            let err = unsafe {
                registry.unsafe_park(std::ptr::null_mut(), std::ptr::null_mut(), 0, 0)
            }
            .unwrap_err();
            assert_eq!(err, BindError::CapabilityUnavailable(Capability::UnsafePark));
        }
    }

    #[test]
    fn test_missing_mandatory_fails_registry() {
        let err =
            VmFunctions::resolve(&table(&[("park", 0x10)]), &CATALOG, ResolveOptions::default())
                .unwrap_err();
        let BindError::InitializationFailed { failures } = err else {
            panic!("expected InitializationFailed, got {err}");
        };
        assert!(failures
            .iter()
            .any(|f| f.capability == Capability::GetObjectSize && f.is_mandatory()));
        // Optional failures travel along for reporting
        assert!(failures.iter().any(|f| f.capability == Capability::G1ScanClosureVTable));
    }

    #[test]
    fn test_collector_gated_binding_is_exclusive() {
        let registry = VmFunctions::resolve(
            &table(&[
                ("modern_get_object_size", 0x1000),
                ("parallel_is_in_permanent", 0x3000),
                ("shared_heap_is_in_permanent", 0x4000),
            ]),
            &CATALOG,
            ResolveOptions::default(),
        )
        .unwrap();

        assert_eq!(registry.collector(), CollectorVariant::Parallel);
        let binding = registry.binding(Capability::IsInPermanent).unwrap();
        assert_eq!(binding.symbol, "parallel_is_in_permanent");
        assert_eq!(binding.address, Address(0x3000));
    }

    #[test]
    fn test_strict_policy_rejects_both_collectors() {
        let err = VmFunctions::resolve(
            &table(&[
                ("modern_get_object_size", 0x1000),
                ("parallel_is_in_permanent", 0x3000),
                ("shared_heap_is_in_permanent", 0x4000),
            ]),
            &CATALOG,
            ResolveOptions { ambiguity: AmbiguityPolicy::Strict, ..ResolveOptions::default() },
        )
        .unwrap_err();
        assert!(matches!(err, BindError::VariantAmbiguous { .. }));
    }

    #[test]
    fn test_resolution_keeps_catalog_order() {
        let resolution =
            Resolution::run(&table(&[]), &CATALOG, ResolveOptions::default()).unwrap();
        let order: Vec<_> = resolution.outcomes.iter().map(|o| o.capability).collect();
        assert_eq!(
            order,
            vec![
                Capability::GetObjectSize,
                Capability::UnsafePark,
                Capability::IsInPermanent,
                Capability::G1ScanClosureVTable,
            ]
        );
        assert_eq!(resolution.failures().len(), 4);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "malformed capability catalog")]
    fn test_malformed_catalog_is_rejected() {
        static TWICE: [CandidateSet; 2] = [
            CandidateSet {
                capability: Capability::GetObjectSize,
                requirement: Requirement::Mandatory,
                signature: Signature::ObjectSize,
                candidates: &SIZE,
            },
            CandidateSet {
                capability: Capability::GetObjectSize,
                requirement: Requirement::Optional,
                signature: Signature::ObjectSize,
                candidates: &SIZE,
            },
        ];
        static MALFORMED: Catalog =
            Catalog { collector_probes: &PROBES, functions: &TWICE, vtables: &[] };
        let _ = Resolution::run(&table(&[]), &MALFORMED, ResolveOptions::default());
    }

    #[test]
    fn test_registry_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<VmFunctions>();
    }
}
