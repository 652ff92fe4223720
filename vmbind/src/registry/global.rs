//! Process-wide registry facade
//!
//! `initialize` is explicit: agent bootstrap calls it once, before
//! subscribing to any runtime callback, so no observer can see a
//! half-populated registry. There is no teardown; every binding is an
//! address into an image that stays mapped until process exit.

use log::{error, info};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::OnceLock;

use super::vm_functions::{ResolveOptions, VmFunctions};
use crate::domain::BindError;
use crate::resolution::{Catalog, HOTSPOT};
use crate::symbolization::{locate_in_self, SymbolSource};

/// File name prefix of HotSpot's runtime library
pub const DEFAULT_LIBRARY: &str = "libjvm.so";

static REGISTRY: OnceLock<Result<VmFunctions, BindError>> = OnceLock::new();
static RESOLVING: AtomicBool = AtomicBool::new(false);

/// Lifecycle of the process-wide registry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryState {
    Uninitialized,
    /// Transient, only observable while `initialize` runs on another thread
    Resolving,
    Ready,
    Failed,
}

/// Resolve the HotSpot catalog against `source`, once per process
///
/// # Errors
/// The failure of the (single) resolution pass, on every call
pub fn initialize(source: &dyn SymbolSource) -> Result<&'static VmFunctions, BindError> {
    initialize_with(source, &HOTSPOT, ResolveOptions::default())
}

/// Like [`initialize`] with an explicit catalog and options
///
/// Later calls return the first call's outcome without touching `source`.
///
/// # Errors
/// The failure of the (single) resolution pass, on every call
pub fn initialize_with(
    source: &dyn SymbolSource,
    catalog: &Catalog,
    options: ResolveOptions,
) -> Result<&'static VmFunctions, BindError> {
    REGISTRY
        .get_or_init(|| {
            RESOLVING.store(true, Ordering::Release);
            let outcome = resolve_once(source, catalog, options);
            RESOLVING.store(false, Ordering::Release);
            outcome
        })
        .as_ref()
        .map_err(Clone::clone)
}

/// Locate `libjvm.so` in this process and initialize against it
///
/// # Errors
/// `ImageUnreadable` if the library is not mapped, else as [`initialize`]
pub fn initialize_in_process() -> Result<&'static VmFunctions, BindError> {
    let image = locate_in_self(DEFAULT_LIBRARY).map_err(|e| BindError::ImageUnreadable {
        path: DEFAULT_LIBRARY.to_string(),
        reason: format!("{e:#}"),
    })?;
    initialize(&image)
}

fn resolve_once(
    source: &dyn SymbolSource,
    catalog: &Catalog,
    options: ResolveOptions,
) -> Result<VmFunctions, BindError> {
    info!("Resolving runtime entry points from {}", source.describe());

    let table = source.load_symbols().inspect_err(|e| error!("Cannot scan runtime image: {e}"))?;
    let registry = VmFunctions::resolve(&table, catalog, options);

    match &registry {
        Ok(r) => {
            let bound = r.outcomes().iter().filter(|o| o.result.is_ok()).count();
            info!(
                "✓ Function registry ready: {bound}/{} capabilities bound ({} collector)",
                r.outcomes().len(),
                r.collector()
            );
        }
        Err(e) => error!("Function registry failed: {e}"),
    }
    registry
}

/// The registry, once a successful `initialize` has completed
///
/// # Errors
/// `NotReady` before initialization or after a failed one
pub fn get_instance() -> Result<&'static VmFunctions, BindError> {
    match REGISTRY.get() {
        Some(Ok(registry)) => Ok(registry),
        _ => Err(BindError::NotReady),
    }
}

#[must_use]
pub fn state() -> RegistryState {
    match REGISTRY.get() {
        Some(Ok(_)) => RegistryState::Ready,
        Some(Err(_)) => RegistryState::Failed,
        None if RESOLVING.load(Ordering::Acquire) => RegistryState::Resolving,
        None => RegistryState::Uninitialized,
    }
}
