//! # vmbind - Version-Adaptive Binding of HotSpot Internals
//!
//! A native agent attached to a HotSpot JVM needs object sizes, class
//! loaders, thread ids and park hooks that JNI/JVMTI do not expose. vmbind
//! finds the internal, unexported entry points behind them in the loaded
//! `libjvm.so` and hands out typed, callable bindings.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                     Host JVM (libjvm.so)                        │
//! └───────────────────────┬─────────────────────────────────────────┘
//!                         │ /proc/self/maps, .dynsym/.symtab/debuginfo
//!                         ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                     vmbind (This Crate)                         │
//! │                                                                 │
//! │  ┌──────────────┐   ┌──────────────┐   ┌──────────────┐         │
//! │  │ Symbolization│──▶│  Resolution  │──▶│   Registry   │──▶ agent│
//! │  │ (SymbolTable)│   │ (candidates) │   │ (VmFunctions)│         │
//! │  └──────────────┘   └──────────────┘   └──────────────┘         │
//! │                            │                   │                │
//! │                     collector variant,   ┌──────────────┐       │
//! │                     vtable capture       │    Export    │       │
//! │                                          │  (report)    │       │
//! │                                          └──────────────┘       │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Structure
//!
//! - [`symbolization`]: locate the image and index its symbols
//! - [`resolution`]: candidate sets, first-match resolver, collector
//!   selection, vtable slot capture, and the HotSpot catalog
//! - [`registry`]: the immutable [`registry::VmFunctions`] and the
//!   process-wide `initialize` / `get_instance` facade
//! - [`export`]: attach report (text and JSON)
//! - [`domain`]: addresses, capabilities, variants, errors
//! - [`cli`], [`preflight`]: the `vmbind` probe binary
//!
//! ## Typical Usage (inside an agent)
//!
//! ```rust,ignore
//! // Agent_OnLoad / Agent_OnAttach, before enabling any JVMTI event
//! let vm = vmbind::registry::initialize_in_process()?;
//!
//! // Later, from any JVMTI callback thread
//! let vm = vmbind::registry::get_instance()?;
//! let id = unsafe { vm.thread_id(thread_oop)? };
//! ```

pub mod cli;
pub mod domain;
pub mod export;
pub mod preflight;
pub mod registry;
pub mod resolution;
pub mod symbolization;
