//! Low-level bit primitives shared by the bitset types and the batched kernels.
//!
//! Submodules:
//! - [`platform`]: one-time runtime CPU-feature probe and implementation
//!   selection
//! - [`popcount`]: population count over words, word spans, and byte spans
//! - [`masks`]: precomputed partial-byte masks for range operations

pub mod masks;
pub mod platform;
pub mod popcount;

pub use platform::{capabilities, PlatformCapabilities, PopcountImpl};
pub use popcount::{popcount_bytes, popcount_word, popcount_words};
