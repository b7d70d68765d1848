//! Batched Cartesian-product set-operation-count kernels.
//!
//! Given two packed containers `a` and `b` with equal element capacity, a
//! batched kernel fills an `a.nelem() × b.nelem()` row-major matrix where
//! entry `(i, j)` is the population count of `op(a[i], b[j])`. Two backends
//! share the contract:
//!
//! - [`host`]: a worker-pool sweep of the flattened pair space on the CPU;
//! - [`device`]: the same matrix computed through an accelerator abstraction
//!   with reference-counted buffer residency, so a pinned reference set can
//!   be probed repeatedly without re-uploading.
//!
//! Every cell is written exactly once by exactly one worker; results are
//! deterministic and identical across backends, worker counts, and schedules.

pub mod device;
pub mod host;

pub use device::{device_count, DeviceOptions};

use crate::error::BatchError;
use crate::pack::BitsetPack;

/// Hard cap on host worker counts.
pub const MAX_WORKERS: usize = 1024;

pub(crate) fn check_operands(a: &BitsetPack, b: &BitsetPack) -> Result<(), BatchError> {
    if a.nbits() == b.nbits() {
        Ok(())
    } else {
        Err(BatchError::LengthMismatch { first: a.nbits(), second: b.nbits() })
    }
}

pub(crate) fn check_result_len(
    a: &BitsetPack,
    b: &BitsetPack,
    actual: usize,
) -> Result<(), BatchError> {
    let expected = a.nelem() * b.nelem();
    if actual == expected {
        Ok(())
    } else {
        Err(BatchError::ResultSizeMismatch { expected, actual })
    }
}
