//! Domain model for vmbind
//!
//! Core domain types and errors shared by symbol scanning, resolution and
//! the binding registry.

pub mod errors;
pub mod types;

// Re-export common types for convenience
pub use types::{Address, Capability, CollectorVariant, PointerWidth, Requirement, Signature};

pub use errors::{BindError, CapabilityFailure};
