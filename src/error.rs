//! Unified error handling for the densebit library.
//!
//! This module provides the error type hierarchy for all library operations.
//! All errors use the `thiserror` crate for ergonomic error handling.
//!
//! The library deliberately surfaces no recoverable errors: every condition in
//! this hierarchy is either API misuse (a precondition violation) or resource
//! exhaustion, neither of which a caller can meaningfully handle locally.
//! Public entry points validate their inputs through helpers that return
//! [`Result`] and route any violation through [`fatal`], which logs a one-line
//! diagnostic naming the violated precondition and panics.
//!
//! # Error Types
//!
//! - [`DensebitError`]: Root error type for all library operations
//! - [`BitsetError`]: Single-bitset errors (bad length, bad index, bad range)
//! - [`PackError`]: Packed-container errors (bad slot, undersized buffer)
//! - [`BatchError`]: Batched-kernel errors (operand mismatch, worker limits)
//! - [`DeviceError`]: Device-offload errors (bad device id, residency misuse)

use thiserror::Error;

/// Root error type for all library operations
///
/// All module-specific errors are converted to this type using `From` trait
/// implementations.
#[derive(Error, Debug)]
pub enum DensebitError {
    /// Single-bitset errors
    #[error("Bitset error: {0}")]
    Bitset(#[from] BitsetError),

    /// Packed-container errors
    #[error("Container error: {0}")]
    Pack(#[from] PackError),

    /// Batched-kernel errors
    #[error("Batch kernel error: {0}")]
    Batch(#[from] BatchError),

    /// Device-offload errors
    #[error("Device error: {0}")]
    Device(#[from] DeviceError),
}

/// Errors raised by operations on a single bitset
#[derive(Error, Debug)]
pub enum BitsetError {
    /// Capacity outside the supported `[1, 2^31)` range
    #[error("Invalid bitset length: {nbits} (valid range: 1..{max})")]
    InvalidLength { nbits: usize, max: usize },

    /// Bit index at or beyond the bitset capacity
    #[error("Bit index out of bounds: {index} (length: {nbits})")]
    IndexOutOfBounds { index: usize, nbits: usize },

    /// Inverted or out-of-bounds bit range
    #[error("Invalid bit range: [{lo}, {hi}] (length: {nbits})")]
    InvalidRange { lo: usize, hi: usize, nbits: usize },

    /// Byte buffer whose size does not match the bitset's storage size
    #[error("Buffer size mismatch: expected {expected} bytes, got {actual}")]
    BufferSizeMismatch { expected: usize, actual: usize },

    /// Two operands of a pairwise operation with different capacities
    #[error("Bitset length mismatch: {left} vs {right}")]
    LengthMismatch { left: usize, right: usize },

    /// Both operands of a pairwise operation absent
    #[error("Both operands of a pairwise set operation are empty handles")]
    NullOperands,
}

/// Errors raised by the packed container
#[derive(Error, Debug)]
pub enum PackError {
    /// Container constructed with no elements
    #[error("Invalid container element count: {nelem} (must be positive)")]
    InvalidElementCount { nelem: usize },

    /// Slot index at or beyond the element count
    #[error("Slot index out of bounds: {index} (elements: {nelem})")]
    SlotOutOfBounds { index: usize, nelem: usize },

    /// Bitset written into a container with a different element length
    #[error("Element length mismatch: container holds {pack}-bit slots, bitset is {bitset} bits")]
    LengthMismatch { pack: usize, bitset: usize },

    /// Caller buffer smaller than one slot's storage
    #[error("Slot buffer too small: need {needed} bytes, got {actual}")]
    BufferTooSmall { needed: usize, actual: usize },
}

/// Errors raised by the batched kernels
#[derive(Error, Debug)]
pub enum BatchError {
    /// Containers with different element lengths
    #[error("Container element length mismatch: {first} vs {second}")]
    LengthMismatch { first: usize, second: usize },

    /// Worker count above the hard cap
    #[error("Worker count {requested} exceeds the hard cap of {max}")]
    WorkerCountExceeded { requested: usize, max: usize },

    /// Caller-provided result buffer with the wrong cell count
    #[error("Result buffer size mismatch: expected {expected} cells, got {actual}")]
    ResultSizeMismatch { expected: usize, actual: usize },

    /// Worker pool construction failed
    #[error("Failed to build worker pool: {message}")]
    PoolBuild { message: String },
}

/// Errors raised by the device-offload backend
#[derive(Error, Debug)]
pub enum DeviceError {
    /// Device id outside the available range
    #[error("Invalid device id: {device} ({available} device(s) available)")]
    InvalidDevice { device: usize, available: usize },

    /// Residency bookkeeping out of step with the registry
    #[error("Device residency violation on device {device}: {message}")]
    ResidencyViolation { device: usize, message: String },
}

impl BitsetError {
    /// Create an invalid length error
    pub fn invalid_length(nbits: usize, max: usize) -> Self {
        Self::InvalidLength { nbits, max }
    }

    /// Create an index out of bounds error
    pub fn index_out_of_bounds(index: usize, nbits: usize) -> Self {
        Self::IndexOutOfBounds { index, nbits }
    }

    /// Create an invalid range error
    pub fn invalid_range(lo: usize, hi: usize, nbits: usize) -> Self {
        Self::InvalidRange { lo, hi, nbits }
    }

    /// Create a length mismatch error
    pub fn length_mismatch(left: usize, right: usize) -> Self {
        Self::LengthMismatch { left, right }
    }
}

impl BatchError {
    /// Create a pool build error
    pub fn pool_build<S: Into<String>>(message: S) -> Self {
        Self::PoolBuild { message: message.into() }
    }
}

impl DeviceError {
    /// Create a residency violation error
    pub fn residency<S: Into<String>>(device: usize, message: S) -> Self {
        Self::ResidencyViolation { device, message: message.into() }
    }
}

/// Convenience type alias for Result with DensebitError
pub type Result<T, E = DensebitError> = std::result::Result<T, E>;

/// Terminate on an unrecoverable violation.
///
/// Logs a one-line diagnostic naming the violated precondition, then panics.
/// Public API entry points funnel every failed validation through here; the
/// library never attempts recovery.
#[cold]
#[inline(never)]
pub(crate) fn fatal(err: impl Into<DensebitError>) -> ! {
    let err = err.into();
    log::error!("fatal: {err}");
    panic!("{err}");
}
