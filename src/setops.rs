//! Pairwise set algebra over equal-capacity bitsets.
//!
//! The four operations share one algorithmic skeleton parameterized by the
//! per-word Boolean combinator:
//!
//! | Operation             | Semantics | Combinator |
//! |-----------------------|-----------|------------|
//! | union                 | s ∪ t     | `a \| b`   |
//! | intersection          | s ∩ t     | `a & b`    |
//! | symmetric difference  | s ⊕ t     | `a ^ b`    |
//! | difference            | s \ t     | `a & !b`   |
//!
//! Each operation comes in a value-producing form ([`apply`] and the named
//! wrappers) and a count form ([`count`] and the `*_count` wrappers) that
//! returns the population count of the virtual result without materializing
//! it. Operands are `Option<&Bitset>`: `None` stands for the empty set of the
//! other operand's capacity, which spares callers an allocation when one side
//! is known-empty. Both operands `None` is a fatal error.
//!
//! Combinator dispatch happens once per call, outside the word loop; the
//! count forms accumulate combined words into a fixed stack tile and bulk
//! count it, which keeps the hot loop free of per-word dispatch and feeds the
//! vectorized span popcount.

use std::ptr;

#[cfg(not(feature = "simd"))]
use crate::bits::popcount::popcount_word;
#[cfg(feature = "simd")]
use crate::bits::popcount::popcount_words;
use crate::bitset::Bitset;
use crate::error::{fatal, BitsetError};

/// Words accumulated per stack tile in the count forms.
#[cfg(feature = "simd")]
const TILE_WORDS: usize = 1024;

/// The four pairwise set operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SetOp {
    /// `s ∪ t`
    Union,
    /// `s ∩ t`
    Intersection,
    /// `s ⊕ t`
    SymmetricDifference,
    /// `s \ t`
    Difference,
}

impl SetOp {
    /// All four operations, for exhaustive sweeps in tests and benchmarks.
    pub const ALL: [SetOp; 4] =
        [Self::Union, Self::Intersection, Self::SymmetricDifference, Self::Difference];

    /// Short operation name for diagnostics.
    pub fn name(self) -> &'static str {
        match self {
            Self::Union => "union",
            Self::Intersection => "intersection",
            Self::SymmetricDifference => "symmetric-difference",
            Self::Difference => "difference",
        }
    }
}

/// Compute `op(s, t)` as a new bitset.
///
/// `None` denotes the empty set of the other operand's capacity:
///
/// | call                | union       | intersection | sym. difference | difference  |
/// |---------------------|-------------|--------------|-----------------|-------------|
/// | `(Some(s), None)`   | copy of `s` | empty        | copy of `s`     | copy of `s` |
/// | `(None, Some(t))`   | copy of `t` | empty        | copy of `t`     | empty       |
/// | `(None, None)`      | fatal       | fatal        | fatal           | fatal       |
///
/// With both operands present the capacities must match.
pub fn apply(op: SetOp, s: Option<&Bitset>, t: Option<&Bitset>) -> Bitset {
    match (s, t) {
        (None, None) => fatal(BitsetError::NullOperands),
        (Some(s), None) => match op {
            SetOp::Union | SetOp::SymmetricDifference | SetOp::Difference => s.clone(),
            SetOp::Intersection => Bitset::new(s.len()),
        },
        (None, Some(t)) => match op {
            SetOp::Union | SetOp::SymmetricDifference => t.clone(),
            SetOp::Intersection | SetOp::Difference => Bitset::new(t.len()),
        },
        (Some(s), Some(t)) => {
            if ptr::eq(s, t) {
                return match op {
                    SetOp::Union | SetOp::Intersection => s.clone(),
                    SetOp::SymmetricDifference | SetOp::Difference => Bitset::new(s.len()),
                };
            }
            if s.len() != t.len() {
                fatal(BitsetError::length_mismatch(s.len(), t.len()));
            }
            let words = match op {
                SetOp::Union => zip_words(s.words(), t.words(), |a, b| a | b),
                SetOp::Intersection => zip_words(s.words(), t.words(), |a, b| a & b),
                SetOp::SymmetricDifference => zip_words(s.words(), t.words(), |a, b| a ^ b),
                SetOp::Difference => zip_words(s.words(), t.words(), |a, b| a & !b),
            };
            Bitset::from_words(s.len(), words)
        }
    }
}

/// Population count of `op(s, t)` without materializing the result.
///
/// Follows the same empty-operand algebra as [`apply`]; for example
/// `count(Union, Some(s), None) == s.count()` and
/// `count(Difference, None, Some(t)) == 0`.
pub fn count(op: SetOp, s: Option<&Bitset>, t: Option<&Bitset>) -> u64 {
    match (s, t) {
        (None, None) => fatal(BitsetError::NullOperands),
        (Some(s), None) => match op {
            SetOp::Union | SetOp::SymmetricDifference | SetOp::Difference => s.count(),
            SetOp::Intersection => 0,
        },
        (None, Some(t)) => match op {
            SetOp::Union | SetOp::SymmetricDifference => t.count(),
            SetOp::Intersection | SetOp::Difference => 0,
        },
        (Some(s), Some(t)) => {
            if ptr::eq(s, t) {
                return match op {
                    SetOp::Union | SetOp::Intersection => s.count(),
                    SetOp::SymmetricDifference | SetOp::Difference => 0,
                };
            }
            if s.len() != t.len() {
                fatal(BitsetError::length_mismatch(s.len(), t.len()));
            }
            count_pair(op, s.words(), t.words())
        }
    }
}

/// `s ∪ t`.
pub fn union(s: Option<&Bitset>, t: Option<&Bitset>) -> Bitset {
    apply(SetOp::Union, s, t)
}

/// `s ∩ t`.
pub fn intersection(s: Option<&Bitset>, t: Option<&Bitset>) -> Bitset {
    apply(SetOp::Intersection, s, t)
}

/// `s ⊕ t`.
pub fn symmetric_difference(s: Option<&Bitset>, t: Option<&Bitset>) -> Bitset {
    apply(SetOp::SymmetricDifference, s, t)
}

/// `s \ t`.
pub fn difference(s: Option<&Bitset>, t: Option<&Bitset>) -> Bitset {
    apply(SetOp::Difference, s, t)
}

/// `|s ∪ t|`.
pub fn union_count(s: Option<&Bitset>, t: Option<&Bitset>) -> u64 {
    count(SetOp::Union, s, t)
}

/// `|s ∩ t|`.
pub fn intersection_count(s: Option<&Bitset>, t: Option<&Bitset>) -> u64 {
    count(SetOp::Intersection, s, t)
}

/// `|s ⊕ t|`.
pub fn symmetric_difference_count(s: Option<&Bitset>, t: Option<&Bitset>) -> u64 {
    count(SetOp::SymmetricDifference, s, t)
}

/// `|s \ t|`.
pub fn difference_count(s: Option<&Bitset>, t: Option<&Bitset>) -> u64 {
    count(SetOp::Difference, s, t)
}

/// Combine-and-count over two word slices of equal length.
///
/// Shared with the batched kernels; dispatches the combinator once and keeps
/// the inner loop straight-line.
pub(crate) fn count_pair(op: SetOp, s: &[u64], t: &[u64]) -> u64 {
    debug_assert_eq!(s.len(), t.len());
    match op {
        SetOp::Union => count_zipped(s, t, |a, b| a | b),
        SetOp::Intersection => count_zipped(s, t, |a, b| a & b),
        SetOp::SymmetricDifference => count_zipped(s, t, |a, b| a ^ b),
        SetOp::Difference => count_zipped(s, t, |a, b| a & !b),
    }
}

#[inline]
fn zip_words<F: Fn(u64, u64) -> u64>(s: &[u64], t: &[u64], f: F) -> Vec<u64> {
    s.iter().zip(t).map(|(&a, &b)| f(a, b)).collect()
}

/// Tiled combine-and-count: combined words accumulate into a fixed stack
/// tile that is bulk-counted, remainder included. Bit-identical to the
/// word-at-a-time path.
#[cfg(feature = "simd")]
#[inline]
fn count_zipped<F: Fn(u64, u64) -> u64>(s: &[u64], t: &[u64], f: F) -> u64 {
    let mut tile = [0u64; TILE_WORDS];
    let mut total = 0u64;
    let mut offset = 0;
    while offset < s.len() {
        let len = TILE_WORDS.min(s.len() - offset);
        for k in 0..len {
            tile[k] = f(s[offset + k], t[offset + k]);
        }
        total += popcount_words(&tile[..len]);
        offset += len;
    }
    total
}

#[cfg(not(feature = "simd"))]
#[inline]
fn count_zipped<F: Fn(u64, u64) -> u64>(s: &[u64], t: &[u64], f: F) -> u64 {
    s.iter().zip(t).map(|(&a, &b)| u64::from(popcount_word(f(a, b)))).sum()
}
