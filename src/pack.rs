//! Packed container: a contiguous array of equal-capacity bitsets.
//!
//! A [`BitsetPack`] lays `nelem` bitset slots out back-to-back in one
//! allocation. Every slot has the same capacity and the same stride in words,
//! so slot `i` occupies words `[i * stride, (i + 1) * stride)`. The layout is
//! what the batched kernels want: sequential slots stream through the cache,
//! and the whole block ships to an accelerator in one transfer.
//!
//! Slots obey the same padding invariant as standalone bitsets: bits above
//! the element capacity in each slot's final word are zero.

use crate::bits::popcount::popcount_words;
use crate::bitset::{buffer_size, check_length, words_for, Bitset};
use crate::error::{fatal, PackError};

/// Contiguous array-of-bitsets with uniform element capacity.
///
/// # Examples
/// ```
/// use densebit::{Bitset, BitsetPack};
///
/// let mut pack = BitsetPack::new(256, 3);
/// let mut b = Bitset::new(256);
/// b.set_many(&[1, 200]);
/// pack.put(1, &b);
/// assert_eq!(pack.count_at(1), 2);
/// assert_eq!(pack.get(1), b);
/// ```
#[derive(Debug, Clone)]
pub struct BitsetPack {
    nbits: usize,
    nelem: usize,
    stride: usize,
    words: Vec<u64>,
}

impl BitsetPack {
    /// Create a container of `nelem` zeroed slots, each `nbits` bits.
    pub fn new(nbits: usize, nelem: usize) -> Self {
        if let Err(e) = check_length(nbits) {
            fatal(e);
        }
        if nelem == 0 {
            fatal(PackError::InvalidElementCount { nelem });
        }
        let stride = words_for(nbits);
        Self { nbits, nelem, stride, words: vec![0u64; nelem * stride] }
    }

    /// Element capacity in bits.
    #[inline]
    pub fn nbits(&self) -> usize {
        self.nbits
    }

    /// Number of slots.
    #[inline]
    pub fn nelem(&self) -> usize {
        self.nelem
    }

    /// Per-slot stride in 64-bit words.
    #[inline]
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Read-only view of slot `i`'s words.
    #[inline]
    pub fn slot_words(&self, i: usize) -> &[u64] {
        if let Err(e) = self.check_slot(i) {
            fatal(e);
        }
        &self.words[i * self.stride..(i + 1) * self.stride]
    }

    /// Copy slot `i` out into a fresh bitset.
    pub fn get(&self, i: usize) -> Bitset {
        Bitset::from_words(self.nbits, self.slot_words(i).to_vec())
    }

    /// Copy `bitset` into slot `i`. The capacities must match.
    pub fn put(&mut self, i: usize, bitset: &Bitset) {
        if let Err(e) = self.check_slot(i) {
            fatal(e);
        }
        if bitset.len() != self.nbits {
            fatal(PackError::LengthMismatch { pack: self.nbits, bitset: bitset.len() });
        }
        self.slot_words_mut(i).copy_from_slice(bitset.words());
    }

    /// Copy slot `i` into `buf` as little-endian bytes.
    ///
    /// `buf` must hold at least [`buffer_size(nbits())`](buffer_size) bytes.
    /// Returns the number of bytes written.
    pub fn extract(&self, i: usize, buf: &mut [u8]) -> usize {
        let needed = buffer_size(self.nbits);
        if buf.len() < needed {
            fatal(PackError::BufferTooSmall { needed, actual: buf.len() });
        }
        for (chunk, &w) in buf[..needed].chunks_exact_mut(8).zip(self.slot_words(i)) {
            chunk.copy_from_slice(&w.to_le_bytes());
        }
        needed
    }

    /// Overwrite slot `i` from little-endian bytes.
    ///
    /// `buf` must hold at least [`buffer_size(nbits())`](buffer_size) bytes;
    /// exactly that many are consumed. Padding bits above the element
    /// capacity are forced to zero.
    pub fn replace(&mut self, i: usize, buf: &[u8]) {
        let needed = buffer_size(self.nbits);
        if buf.len() < needed {
            fatal(PackError::BufferTooSmall { needed, actual: buf.len() });
        }
        if let Err(e) = self.check_slot(i) {
            fatal(e);
        }
        let loaded = Bitset::from_bytes(self.nbits, &buf[..needed]);
        self.slot_words_mut(i).copy_from_slice(loaded.words());
    }

    /// Zero slot `i`.
    pub fn clear_slot(&mut self, i: usize) {
        self.slot_words_mut(i).fill(0);
    }

    /// Zero every slot.
    pub fn clear_all(&mut self) {
        self.words.fill(0);
    }

    /// Population count of slot `i`.
    pub fn count_at(&self, i: usize) -> u64 {
        popcount_words(self.slot_words(i))
    }

    /// Population counts of all slots, in slot order.
    pub fn counts(&self) -> Vec<u64> {
        (0..self.nelem).map(|i| self.count_at(i)).collect()
    }

    /// Identity of the backing allocation, used as the device-residency key.
    #[inline]
    pub(crate) fn storage_key(&self) -> usize {
        self.words.as_ptr() as usize
    }

    /// Whole-container word view for device transfers.
    #[inline]
    pub(crate) fn all_words(&self) -> &[u64] {
        &self.words
    }

    fn slot_words_mut(&mut self, i: usize) -> &mut [u64] {
        if let Err(e) = self.check_slot(i) {
            fatal(e);
        }
        &mut self.words[i * self.stride..(i + 1) * self.stride]
    }

    #[inline]
    fn check_slot(&self, i: usize) -> Result<(), PackError> {
        if i < self.nelem {
            Ok(())
        } else {
            Err(PackError::SlotOutOfBounds { index: i, nelem: self.nelem })
        }
    }
}

impl Drop for BitsetPack {
    fn drop(&mut self) {
        // A pack dropped while still resident on a device would strand the
        // device copy; force-release it and leave a trace in the log.
        crate::batch::device::release_dropped(self.storage_key());
    }
}

/// Equality compares element capacity and slot contents.
impl PartialEq for BitsetPack {
    fn eq(&self, other: &Self) -> bool {
        self.nbits == other.nbits && self.nelem == other.nelem && self.words == other.words
    }
}

impl Eq for BitsetPack {}
