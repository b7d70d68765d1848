//! Dense fixed-capacity bitsets with batched set-operation-count kernels.
//!
//! The crate has three layers:
//!
//! - [`Bitset`]: a fixed-capacity dense bit array with single-bit, bulk, and
//!   range mutation, byte import/export, and popcount queries.
//! - [`setops`]: the pairwise set algebra (union, intersection, symmetric
//!   difference, and difference) in value-producing and count forms, with an
//!   empty-operand convention (`None` stands for the empty set of the other
//!   operand's capacity).
//! - [`BitsetPack`] and [`batch`]: a contiguous array-of-bitsets container
//!   and the batched kernels that evaluate the full Cartesian product of
//!   set-operation counts between two containers, on a host worker pool or
//!   through the device-offload backend with reference-counted buffer
//!   residency.
//!
//! Popcount implementation selection (hardware instruction, vectorized span
//! kernel, portable SWAR) happens at runtime behind a one-time CPU probe and
//! is invisible to callers; the `simd` cargo feature disables the accelerated
//! paths entirely for a fully portable build.
//!
//! # Example
//!
//! ```
//! use densebit::{batch, Bitset, BitsetPack, SetOp};
//!
//! let mut probes = BitsetPack::new(1024, 2);
//! let mut refs = BitsetPack::new(1024, 2);
//!
//! let mut b = Bitset::new(1024);
//! b.set_many(&[42, 100]);
//! probes.put(0, &b);
//! refs.put(1, &b);
//!
//! // 2 × 2 row-major intersection counts, all host workers.
//! let counts = batch::host::count_matrix(SetOp::Intersection, &probes, &refs, 0);
//! assert_eq!(counts, vec![0, 2, 0, 0]);
//! ```
//!
//! # Failure model
//!
//! Precondition violations (out-of-range indices, capacity mismatches,
//! invalid devices) are programmer errors: the library logs one line naming
//! the violation and panics. No operation returns a recoverable error.

pub mod batch;
pub mod bits;
pub mod bitset;
pub mod error;
pub mod pack;
pub mod setops;

pub use batch::{device_count, DeviceOptions, MAX_WORKERS};
pub use bitset::{buffer_size, words_for, Bitset, MAX_BITS, WORD_BITS};
pub use error::{BatchError, BitsetError, DensebitError, DeviceError, PackError};
pub use pack::BitsetPack;
pub use setops::SetOp;
