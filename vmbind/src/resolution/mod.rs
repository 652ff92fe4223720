//! # Candidate Resolution
//!
//! Turns capability ids into live addresses:
//!
//! ```text
//! Catalog (static data)
//!   │
//!   ├─ collector probes ──▶ CollectorSelector ──▶ CollectorVariant
//!   │                                                  │
//!   ├─ CandidateSet ─────▶ CandidateResolver ◀─────────┘ (filters gated candidates)
//!   │                         │ first hit wins
//!   └─ VTableSet ────────▶ VTableCapture ──▶ base + slot * pointer_size
//! ```
//!
//! - **`candidates`**: data types (candidates, applicability, sets, probes)
//! - **`catalog`**: the HotSpot names
//! - **`resolver`**: first-match lookup
//! - **`collector`**: collector-variant selection
//! - **`vtable`**: bounds-checked slot capture

pub mod candidates;
pub mod catalog;
pub mod collector;
pub mod resolver;
pub mod vtable;

pub use candidates::{
    Applicability, Candidate, CandidateSet, CollectorProbe, ResolveContext, VTableCandidate,
    VTableSet,
};
pub use catalog::{Catalog, HOTSPOT};
pub use collector::{AmbiguityPolicy, CollectorSelector};
pub use resolver::{CandidateResolver, Resolved};
pub use vtable::{capture, VTableBinding, VTableCapture, VTableLayout, VTableSlot};
