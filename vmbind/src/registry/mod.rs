//! Function Binding Registry
//!
//! - **`binding`**: the address + signature pair and its single unsafe cast
//! - **`vm_functions`**: one resolution pass and the immutable registry
//! - **`global`**: the process-wide `initialize` / `get_instance` facade
//!
//! ```text
//! Uninitialized ──initialize()──▶ Resolving ──▶ Ready
//!                                          └──▶ Failed
//! ```

pub mod binding;
pub mod global;
pub mod vm_functions;

pub use binding::RawBinding;
pub use global::{
    get_instance, initialize, initialize_in_process, initialize_with, state, RegistryState,
    DEFAULT_LIBRARY,
};
pub use vm_functions::{Bound, CapabilityOutcome, ResolveOptions, Resolution, VmFunctions};
