#![cfg_attr(not(test), no_std)]

//! Facade crate re-exporting the individual helper crates in this
//! workspace behind Cargo features, so downstream crates can depend on
//! a single package and opt into only what they use.

extern crate alloc;

#[cfg(feature = "decompress")]
pub use brotli_decompress as decompress;
