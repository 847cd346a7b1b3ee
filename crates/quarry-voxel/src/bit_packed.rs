//! Fixed-width index packing used by [`Section`](crate::Section) storage.
//!
//! Every element takes exactly `bits` bits (0, 2, 4, 8, or 16) inside a
//! `Vec<u64>`. None of the supported widths straddle a word boundary, since
//! each of them divides 64.

use serde::{Deserialize, Serialize};

/// Bit widths an index array may use.
pub const VALID_BIT_WIDTHS: [u8; 5] = [0, 2, 4, 8, 16];

/// Returns `true` if `bits` is one of [`VALID_BIT_WIDTHS`].
pub fn is_valid_bit_width(bits: u8) -> bool {
    VALID_BIT_WIDTHS.contains(&bits)
}

/// Number of `u64` words needed to hold `len` elements of `bits` bits.
pub fn word_count(bits: u8, len: usize) -> usize {
    if bits == 0 {
        return 0;
    }
    (len as u64 * u64::from(bits)).div_ceil(64) as usize
}

/// Packed array of small palette indices.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BitPackedArray {
    words: Vec<u64>,
    bits: u8,
    len: usize,
}

impl BitPackedArray {
    /// Creates a zeroed array of `len` elements.
    ///
    /// A width of 0 allocates nothing: every element reads back as 0.
    pub fn new(bits: u8, len: usize) -> Self {
        debug_assert!(is_valid_bit_width(bits), "unsupported bit width {bits}");
        Self {
            words: vec![0; word_count(bits, len)],
            bits,
            len,
        }
    }

    /// Rebuilds an array from words produced by [`raw_words`](Self::raw_words).
    ///
    /// Returns `None` if the width is unsupported or the word count does not
    /// match `bits * len`.
    pub fn from_raw(bits: u8, len: usize, words: Vec<u64>) -> Option<Self> {
        if !is_valid_bit_width(bits) || words.len() != word_count(bits, len) {
            return None;
        }
        Some(Self { words, bits, len })
    }

    /// Reads element `index`.
    pub fn get(&self, index: usize) -> u16 {
        debug_assert!(index < self.len, "index {index} out of bounds");
        if self.bits == 0 {
            return 0;
        }
        let (word, shift) = self.locate(index);
        ((self.words[word] >> shift) & self.mask()) as u16
    }

    /// Writes element `index`.
    ///
    /// `value` must fit in the current width; wider values are truncated in
    /// release builds.
    pub fn set(&mut self, index: usize, value: u16) {
        debug_assert!(index < self.len, "index {index} out of bounds");
        if self.bits == 0 {
            return;
        }
        debug_assert!(
            self.bits >= 16 || value < (1u16 << self.bits),
            "value {value} does not fit in {} bits",
            self.bits
        );
        let (word, shift) = self.locate(index);
        let mask = self.mask();
        self.words[word] = (self.words[word] & !(mask << shift)) | ((u64::from(value) & mask) << shift);
    }

    /// Copies every element into a new array of width `bits`.
    pub fn resized(&self, bits: u8) -> Self {
        let mut out = Self::new(bits, self.len);
        if self.bits > 0 && bits > 0 {
            for i in 0..self.len {
                out.set(i, self.get(i));
            }
        }
        out
    }

    /// Width of each element in bits.
    pub fn bits(&self) -> u8 {
        self.bits
    }

    /// Number of logical elements.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the array holds no elements.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Backing words, least significant element first.
    pub fn raw_words(&self) -> &[u64] {
        &self.words
    }

    fn locate(&self, index: usize) -> (usize, u32) {
        let bit = index as u64 * u64::from(self.bits);
        ((bit / 64) as usize, (bit % 64) as u32)
    }

    fn mask(&self) -> u64 {
        (1u64 << self.bits) - 1
    }
}
