//! A RAL-like module to support XDMAC register access
//!
//! There's no SVD-generated RAL for these parts that we'd like to
//! depend on. Besides, the generated crates don't represent the 24
//! per-channel register clusters as an array of structs, and that's
//! exactly what the driver wants to index.
//!
//! This module lets us hit those ideals. At the same time, we can expose an
//! interface that lets us use the RAL macros, where applicable.

#![allow(
    non_snake_case, // Compatibility with RAL
    non_upper_case_globals, // Compatibility with RAL field modules
    dead_code, // Not every register is driven
)]

pub use ral_registers::{read_reg, write_reg};
use ral_registers::{RORegister, RWRegister, WORegister};

/// Declares a RAL-compatible field module.
///
/// The RAL macros expect `offset`, `mask`, and the `R`, `W`, `RW`
/// modules for every field.
macro_rules! field {
    ($(#[$attr:meta])* $name:ident, $offset:expr, $width:expr) => {
        $(#[$attr])*
        pub mod $name {
            pub const offset: u32 = $offset;
            pub const mask: u32 = (((1u64 << $width) - 1) << $offset) as u32;
            pub mod R {}
            pub mod W {}
            pub mod RW {}
        }
    };
}
pub(crate) use field;

pub mod pmc;
pub mod xdmac;

//
// Helper types for static memory
//
// Similar to the RAL's `Instance` type, but more copy.
//

pub(super) struct Static<T>(pub(super) *const T);
impl<T> core::ops::Deref for Static<T> {
    type Target = T;
    fn deref(&self) -> &Self::Target {
        // Safety: pointer points to static memory (peripheral memory)
        unsafe { &*self.0 }
    }
}
impl<T> Clone for Static<T> {
    fn clone(&self) -> Self {
        *self
    }
}
impl<T> Copy for Static<T> {}
