//! Command-line interface of the vmbind probe

pub mod args;

pub use args::Args;
