//! The unsafe boundary: an address paired with its declared signature
//!
//! Nothing outside this crate turns an address into a function pointer.
//! [`RawBinding::cast`] is the only such conversion, and the registry only
//! calls it with the `vmbind_sys` type that matches the binding's signature.

#![allow(unsafe_code)] // address → function pointer

use std::mem;

use crate::domain::{Address, Capability, Signature};

/// A resolved, directly callable entry point
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawBinding {
    pub capability: Capability,
    pub symbol: &'static str,
    pub address: Address,
    pub signature: Signature,
    /// Position of the matched candidate; 0 is the newest layout
    pub rank: usize,
}

impl RawBinding {
    /// Reinterpret the address as a function pointer of type `F`
    ///
    /// # Safety
    /// `F` must be the `unsafe extern "C" fn` type described by `expected`,
    /// and `expected` must be this binding's declared signature.
    pub(crate) unsafe fn cast<F: Copy>(&self, expected: Signature) -> F {
        debug_assert_eq!(
            self.signature, expected,
            "{} is declared as {}, not {}",
            self.capability, self.signature, expected
        );
        debug_assert_eq!(mem::size_of::<F>(), mem::size_of::<usize>());
        mem::transmute_copy::<usize, F>(&self.address.0)
    }
}
