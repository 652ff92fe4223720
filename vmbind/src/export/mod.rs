//! Report export
//!
//! Renders the outcome of a resolution pass as text for the console or as
//! JSON for tooling.

pub mod report;

pub use report::{AttachReport, CapabilityReport, Status};
