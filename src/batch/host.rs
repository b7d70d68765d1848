//! Host backend: multi-worker sweep of the pair space.
//!
//! The two outer loops over `(i, j)` collapse into one flat iteration space
//! dispatched across a rayon worker pool; rayon's adaptive work-stealing
//! splitter plays the role of a guided shrinking-chunk schedule. Each pair
//! runs a straight-line word loop over the element stride with the selected
//! combinator, accumulating popcounts with no per-pair allocation.

use rayon::prelude::*;
use rayon::ThreadPoolBuilder;

use crate::batch::{check_operands, check_result_len, MAX_WORKERS};
use crate::error::{fatal, BatchError};
use crate::pack::BitsetPack;
use crate::setops::{self, SetOp};

/// Minimum cells per dispatched chunk; keeps scheduling overhead off short
/// strides.
const PAIR_GRAIN: usize = 32;

/// Compute the `a.nelem() × b.nelem()` count matrix for `op`.
///
/// `workers <= 0` selects the platform default; positive values are used
/// as-is up to the hard cap of [`MAX_WORKERS`].
///
/// # Examples
/// ```
/// use densebit::{batch::host, Bitset, BitsetPack, SetOp};
///
/// let mut a = BitsetPack::new(256, 2);
/// let mut b = BitsetPack::new(256, 2);
/// let mut s = Bitset::new(256);
/// s.set_many(&[1, 3]);
/// a.put(0, &s);
/// b.put(1, &s);
///
/// let counts = host::count_matrix(SetOp::Intersection, &a, &b, 0);
/// assert_eq!(counts, vec![0, 2, 0, 0]);
/// ```
pub fn count_matrix(op: SetOp, a: &BitsetPack, b: &BitsetPack, workers: i32) -> Vec<i32> {
    let mut out = vec![0i32; a.nelem() * b.nelem()];
    count_matrix_into(op, a, b, workers, &mut out);
    out
}

/// As [`count_matrix`], writing into a caller-provided buffer of exactly
/// `a.nelem() * b.nelem()` cells.
pub fn count_matrix_into(
    op: SetOp,
    a: &BitsetPack,
    b: &BitsetPack,
    workers: i32,
    out: &mut [i32],
) {
    if let Err(e) = check_operands(a, b) {
        fatal(e);
    }
    if let Err(e) = check_result_len(a, b, out.len()) {
        fatal(e);
    }

    let nworkers = resolve_workers(workers);
    let ncols = b.nelem();

    let pool = ThreadPoolBuilder::new()
        .num_threads(nworkers)
        .build()
        .unwrap_or_else(|e| fatal(BatchError::pool_build(e.to_string())));

    pool.install(|| {
        out.par_iter_mut().enumerate().with_min_len(PAIR_GRAIN).for_each(|(k, cell)| {
            let (i, j) = (k / ncols, k % ncols);
            *cell = setops::count_pair(op, a.slot_words(i), b.slot_words(j)) as i32;
        });
    });
}

/// Map the caller's worker request onto a concrete pool size.
pub(crate) fn resolve_workers(requested: i32) -> usize {
    if requested <= 0 {
        num_cpus::get().clamp(1, MAX_WORKERS)
    } else {
        let n = requested as usize;
        if n > MAX_WORKERS {
            fatal(BatchError::WorkerCountExceeded { requested: n, max: MAX_WORKERS });
        }
        n
    }
}
