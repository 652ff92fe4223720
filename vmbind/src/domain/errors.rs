//! Structured error types for vmbind
//!
//! Using thiserror for automatic Display implementation. Errors are `Clone`
//! so a failed registry can hand the same failure to every later caller.

use super::types::{Address, Capability, CollectorVariant, Requirement};
use std::fmt::Write as _;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BindError {
    #[error("Runtime image {path} is unreadable: {reason}")]
    ImageUnreadable { path: String, reason: String },

    #[error("No symbol found for {capability} (tried: {})", format_tried(.tried))]
    SymbolNotFound { capability: Capability, tried: Vec<&'static str> },

    #[error("Collector signatures for both {first} and {second} are present")]
    VariantAmbiguous { first: CollectorVariant, second: CollectorVariant },

    #[error("Collector {0} was requested but its signature is absent from the image")]
    CollectorSignatureMissing(CollectorVariant),

    #[error("VTable slot {slot} of {capability} is out of range (bound {bound})")]
    VTableSlotOutOfRange { capability: Capability, slot: usize, bound: usize },

    #[error("Address arithmetic overflowed: {base} + {offset:#x}")]
    AddressOverflow { base: Address, offset: usize },

    #[error("Function registry is not ready")]
    NotReady,

    #[error("Capability {0} is unavailable")]
    CapabilityUnavailable(Capability),

    #[error("Failed to bind mandatory capabilities: {}", summarize(.failures))]
    InitializationFailed { failures: Vec<CapabilityFailure> },
}

/// A single capability that could not be bound, and why
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapabilityFailure {
    pub capability: Capability,
    pub requirement: Requirement,
    pub error: BindError,
}

impl CapabilityFailure {
    #[must_use]
    pub fn is_mandatory(&self) -> bool {
        self.requirement == Requirement::Mandatory
    }
}

fn format_tried(tried: &[&'static str]) -> String {
    if tried.is_empty() {
        "no applicable candidates".to_string()
    } else {
        tried.join(", ")
    }
}

fn summarize(failures: &[CapabilityFailure]) -> String {
    let mut out = String::new();
    for failure in failures.iter().filter(|f| f.is_mandatory()) {
        if !out.is_empty() {
            out.push_str("; ");
        }
        let _ = write!(out, "{}", failure.error);
    }
    out
}
