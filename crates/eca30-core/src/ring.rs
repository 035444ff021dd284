//! Fixed-width circular bit vector backing the automaton pool.
//!
//! The ring holds [`POOL_BITS`] cells packed little-endian into `u64` words:
//! cell `j` lives in word `j / 64` at bit `j % 64`. The width is not a
//! multiple of the word size, so the last word only carries part of a word
//! of live cells. Every constructor and every rotation masks the last word
//! with [`TOP_MASK`]; bits above the ring are always zero.

use std::fmt;
use std::ops::{BitOr, BitXor};

/// Number of cells in the ring.
pub const POOL_BITS: usize = 257;

/// Bits per storage word.
pub const WORD_BITS: usize = u64::BITS as usize;

/// Storage words needed for [`POOL_BITS`] cells.
pub const POOL_WORDS: usize = (POOL_BITS - 1) / WORD_BITS + 1;

/// Bytes needed to cover [`POOL_BITS`] cells (the reseed request size).
pub const POOL_BYTES: usize = (POOL_BITS - 1) / 8 + 1;

const LAST: usize = POOL_WORDS - 1;

/// Position of cell `POOL_BITS - 1` inside the last word.
const TOP_SHIFT: u32 = ((POOL_BITS - 1) % WORD_BITS) as u32;

/// Live bits of the last word.
pub const TOP_MASK: u64 = if TOP_SHIFT as usize == WORD_BITS - 1 {
    u64::MAX
} else {
    (1u64 << (TOP_SHIFT + 1)) - 1
};

/// A ring of [`POOL_BITS`] binary cells.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct BitRing {
    words: [u64; POOL_WORDS],
}

impl BitRing {
    /// The all-zero ring.
    pub const fn zeroed() -> Self {
        Self {
            words: [0; POOL_WORDS],
        }
    }

    /// The all-ones ring.
    pub fn ones() -> Self {
        Self::from_words([u64::MAX; POOL_WORDS])
    }

    /// A ring with exactly one live cell.
    pub fn with_bit(index: usize) -> Self {
        let mut ring = Self::zeroed();
        ring.set_bit(index, true);
        ring
    }

    /// Build a ring from raw storage words. Bits above the ring are dropped.
    pub fn from_words(mut words: [u64; POOL_WORDS]) -> Self {
        words[LAST] &= TOP_MASK;
        Self { words }
    }

    /// Build a ring from little-endian bytes.
    ///
    /// At most [`POOL_BYTES`] bytes are read; a shorter slice leaves the
    /// remaining cells zero. Bits past cell `POOL_BITS - 1` are dropped.
    pub fn from_le_bytes(bytes: &[u8]) -> Self {
        let mut words = [0u64; POOL_WORDS];
        for (i, &b) in bytes.iter().take(POOL_BYTES).enumerate() {
            words[i / 8] |= u64::from(b) << (8 * (i % 8));
        }
        Self::from_words(words)
    }

    /// Little-endian byte image of the ring.
    pub fn to_le_bytes(&self) -> [u8; POOL_BYTES] {
        let mut out = [0u8; POOL_BYTES];
        for (i, byte) in out.iter_mut().enumerate() {
            *byte = (self.words[i / 8] >> (8 * (i % 8))) as u8;
        }
        out
    }

    /// Raw storage words.
    pub fn words(&self) -> &[u64; POOL_WORDS] {
        &self.words
    }

    /// Value of cell `index`.
    ///
    /// # Panics
    /// Panics if `index >= POOL_BITS`.
    pub fn bit(&self, index: usize) -> bool {
        assert!(index < POOL_BITS, "cell {index} outside a {POOL_BITS}-cell ring");
        (self.words[index / WORD_BITS] >> (index % WORD_BITS)) & 1 == 1
    }

    /// Set or clear cell `index`.
    ///
    /// # Panics
    /// Panics if `index >= POOL_BITS`.
    pub fn set_bit(&mut self, index: usize, value: bool) {
        assert!(index < POOL_BITS, "cell {index} outside a {POOL_BITS}-cell ring");
        let mask = 1u64 << (index % WORD_BITS);
        if value {
            self.words[index / WORD_BITS] |= mask;
        } else {
            self.words[index / WORD_BITS] &= !mask;
        }
    }

    /// Value of cell 0, the extraction tap.
    #[inline]
    pub fn lowest_bit(&self) -> bool {
        self.words[0] & 1 == 1
    }

    /// `true` iff at least one cell is set. Stops at the first nonzero word.
    #[inline]
    pub fn is_nonzero(&self) -> bool {
        self.words.iter().any(|&w| w != 0)
    }

    /// Number of live cells.
    pub fn count_ones(&self) -> u32 {
        self.words.iter().map(|w| w.count_ones()).sum()
    }

    /// Rotate right by one cell: cell `j` takes the old cell `j + 1`, and the
    /// top cell takes the old cell 0.
    pub fn rotate_right(&self) -> Self {
        let w = &self.words;
        let mut r = [0u64; POOL_WORDS];
        for (i, out) in r.iter_mut().enumerate() {
            *out = w[i] >> 1;
            if i < LAST {
                *out |= (w[i + 1] & 1) << (WORD_BITS - 1);
            }
        }
        r[LAST] |= (w[0] & 1) << TOP_SHIFT;
        Self::from_words(r)
    }

    /// Rotate left by one cell: cell `j` takes the old cell `j - 1`, and cell
    /// 0 takes the old top cell.
    pub fn rotate_left(&self) -> Self {
        let w = &self.words;
        let mut l = [0u64; POOL_WORDS];
        for (i, out) in l.iter_mut().enumerate() {
            *out = w[i] << 1;
            if i > 0 {
                *out |= w[i - 1] >> (WORD_BITS - 1);
            }
        }
        l[0] |= (w[LAST] >> TOP_SHIFT) & 1;
        Self::from_words(l)
    }
}

impl BitOr for BitRing {
    type Output = BitRing;

    fn bitor(mut self, rhs: BitRing) -> BitRing {
        for (a, b) in self.words.iter_mut().zip(rhs.words) {
            *a |= b;
        }
        self
    }
}

impl BitXor for BitRing {
    type Output = BitRing;

    fn bitxor(mut self, rhs: BitRing) -> BitRing {
        for (a, b) in self.words.iter_mut().zip(rhs.words) {
            *a ^= b;
        }
        self
    }
}

/// Hex with the most significant word first, so cell 0 is the last digit.
impl fmt::LowerHex for BitRing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:x}", self.words[LAST])?;
        for w in self.words[..LAST].iter().rev() {
            write!(f, "{w:016x}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for BitRing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BitRing(0x{self:x})")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_ring() -> BitRing {
        BitRing::from_words([
            0x0123_4567_89ab_cdef,
            0xfedc_ba98_7654_3210,
            0x8000_0000_0000_0001,
            0xdead_beef_cafe_f00d,
            0x1,
        ])
    }

    // -----------------------------------------------------------------------
    // Layout constants
    // -----------------------------------------------------------------------

    #[test]
    fn test_layout_constants() {
        assert_eq!(POOL_WORDS, 5);
        assert_eq!(POOL_BYTES, 33);
        assert_eq!(TOP_MASK, 1);
    }

    // -----------------------------------------------------------------------
    // Rotation
    // -----------------------------------------------------------------------

    #[test]
    fn test_rotation_round_trip() {
        let ring = sample_ring();
        assert_eq!(ring.rotate_right().rotate_left(), ring);
        assert_eq!(ring.rotate_left().rotate_right(), ring);
    }

    #[test]
    fn test_rotate_right_wraps_cell_zero_to_top() {
        let rotated = BitRing::with_bit(0).rotate_right();
        assert_eq!(rotated, BitRing::with_bit(POOL_BITS - 1));
        assert_eq!(rotated.words(), &[0, 0, 0, 0, 1]);
    }

    #[test]
    fn test_rotate_left_wraps_top_to_cell_zero() {
        let rotated = BitRing::with_bit(POOL_BITS - 1).rotate_left();
        assert_eq!(rotated, BitRing::with_bit(0));
    }

    #[test]
    fn test_rotation_crosses_word_boundaries() {
        for j in [63, 64, 127, 128, 191, 192, 255] {
            assert_eq!(BitRing::with_bit(j).rotate_left(), BitRing::with_bit(j + 1));
            assert_eq!(BitRing::with_bit(j + 1).rotate_right(), BitRing::with_bit(j));
        }
    }

    #[test]
    fn test_full_revolution_is_identity() {
        let ring = sample_ring();
        let mut r = ring;
        for _ in 0..POOL_BITS {
            r = r.rotate_left();
        }
        assert_eq!(r, ring);
    }

    #[test]
    fn test_rotation_never_sets_bits_above_ring() {
        let mut r = BitRing::ones();
        for _ in 0..70 {
            r = r.rotate_left();
            assert_eq!(r.words()[4] & !TOP_MASK, 0);
            assert_eq!(r.count_ones(), POOL_BITS as u32);
        }
    }

    // -----------------------------------------------------------------------
    // Construction and masking
    // -----------------------------------------------------------------------

    #[test]
    fn test_from_words_masks_top() {
        let r = BitRing::from_words([0, 0, 0, 0, u64::MAX]);
        assert_eq!(r.words()[4], 1);
        assert_eq!(r.count_ones(), 1);
    }

    #[test]
    fn test_from_le_bytes_masks_high_bits() {
        let r = BitRing::from_le_bytes(&[0xFF; 40]);
        assert_eq!(r, BitRing::ones());
        assert_eq!(r.count_ones(), POOL_BITS as u32);
    }

    #[test]
    fn test_from_le_bytes_short_input() {
        let r = BitRing::from_le_bytes(&[0x01, 0x80]);
        assert!(r.bit(0));
        assert!(r.bit(15));
        assert_eq!(r.count_ones(), 2);
    }

    #[test]
    fn test_le_bytes_round_trip() {
        let ring = sample_ring();
        assert_eq!(BitRing::from_le_bytes(&ring.to_le_bytes()), ring);
    }

    // -----------------------------------------------------------------------
    // Cell access
    // -----------------------------------------------------------------------

    #[test]
    fn test_set_and_clear_bit() {
        let mut r = BitRing::zeroed();
        r.set_bit(128, true);
        assert!(r.bit(128));
        assert_eq!(r.words()[2], 1);
        r.set_bit(128, false);
        assert!(!r.is_nonzero());
    }

    #[test]
    #[should_panic]
    fn test_bit_out_of_range_panics() {
        let _ = BitRing::zeroed().bit(POOL_BITS);
    }

    #[test]
    fn test_is_nonzero() {
        assert!(!BitRing::zeroed().is_nonzero());
        assert!(BitRing::with_bit(POOL_BITS - 1).is_nonzero());
        assert!(BitRing::with_bit(0).is_nonzero());
    }

    #[test]
    fn test_bit_ops() {
        let a = BitRing::with_bit(3);
        let b = BitRing::with_bit(200);
        let both = a | b;
        assert_eq!(both.count_ones(), 2);
        assert_eq!(both ^ a, b);
        assert!(!(a ^ a).is_nonzero());
    }

    #[test]
    fn test_hex_format() {
        assert_eq!(format!("{:x}", BitRing::with_bit(0)), format!("0{}1", "0".repeat(63)));
        assert!(format!("{:x}", BitRing::with_bit(256)).starts_with('1'));
    }
}
