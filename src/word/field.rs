//! Field specifications (L:R).
//!
//! A field selects bytes L..R of a word; L = 0 additionally selects the
//! sign. Instructions encode it in their F byte as `8 * L + R`.

use std::cmp::Ordering;
use std::fmt;
use serde::{Serialize, Deserialize};
use thiserror::Error;
use crate::word::word::{Word, BYTE_BITS, BYTES_PER_WORD};

/// A validated field specification.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FieldSpec {
    left: u8,
    right: u8,
}

impl FieldSpec {
    /// The whole word, sign included: (0:5).
    pub const FULL: FieldSpec = FieldSpec { left: 0, right: 5 };

    /// Create a field from its bounds.
    pub fn new(left: u8, right: u8) -> Result<Self, FieldError> {
        let last = BYTES_PER_WORD as u8;
        if left > last || right > last || left > right {
            return Err(FieldError::Invalid { left, right });
        }
        Ok(Self { left, right })
    }

    /// Decode an F byte (`8 * L + R`).
    pub fn from_f(f: u8) -> Result<Self, FieldError> {
        Self::new(f >> 3, f & 0x7)
    }

    /// Encode back into an F byte.
    #[inline]
    pub const fn encode(self) -> u8 {
        self.left * 8 + self.right
    }

    /// Left bound.
    #[inline]
    pub const fn left(self) -> u8 {
        self.left
    }

    /// Right bound.
    #[inline]
    pub const fn right(self) -> u8 {
        self.right
    }

    /// True if the field covers the sign.
    #[inline]
    pub const fn includes_sign(self) -> bool {
        self.left == 0
    }

    /// Number of magnitude bytes covered.
    pub const fn width(self) -> u32 {
        if self.right == 0 {
            return 0;
        }
        let first = if self.left == 0 { 1 } else { self.left };
        (self.right - first + 1) as u32
    }

    /// Distance from byte R to the least significant end of the word.
    const fn shift(self) -> u32 {
        BYTE_BITS * (BYTES_PER_WORD as u32 - self.right as u32)
    }

    /// Right-aligned mask of the covered magnitude bits.
    const fn value_mask(self) -> u32 {
        match self.width() {
            0 => 0,
            w => (1u32 << (BYTE_BITS * w)) - 1,
        }
    }

    /// The covered bytes, right-aligned, without the sign.
    #[inline]
    pub fn extract(self, word: Word) -> u32 {
        (word.magnitude() >> self.shift()) & self.value_mask()
    }

    /// Load the field as a right-aligned word.
    ///
    /// The result carries the source's sign only when L = 0; an empty
    /// magnitude range (R = 0) yields a zero magnitude.
    pub fn load(self, word: Word) -> Word {
        Word::new(self.includes_sign() && word.is_negative(), self.extract(word))
    }

    /// Store the low bytes of `value` into this field of `target`.
    ///
    /// Bytes outside the field are kept, and so is the target's sign unless
    /// L = 0.
    pub fn store(self, target: Word, value: Word) -> Word {
        let shift = self.shift();
        let mask = self.value_mask() << shift;
        let magnitude = (target.magnitude() & !mask) | ((value.magnitude() << shift) & mask);
        let negative = if self.includes_sign() {
            value.is_negative()
        } else {
            target.is_negative()
        };
        Word::new(negative, magnitude)
    }

    /// Compare the same field of two words.
    ///
    /// With L = 0 the fields compare as signed numbers (so +0 equals -0),
    /// otherwise as unsigned magnitudes. An empty field always compares
    /// equal.
    pub fn compare(self, lhs: Word, rhs: Word) -> Ordering {
        if self.right == 0 {
            return Ordering::Equal;
        }
        let value = |w: Word| {
            let v = i64::from(self.extract(w));
            if self.includes_sign() && w.is_negative() {
                -v
            } else {
                v
            }
        };
        value(lhs).cmp(&value(rhs))
    }
}

impl Default for FieldSpec {
    fn default() -> Self {
        Self::FULL
    }
}

impl fmt::Debug for FieldSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FieldSpec({}:{})", self.left, self.right)
    }
}

impl fmt::Display for FieldSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}:{})", self.left, self.right)
    }
}

/// Errors from decoding a field specification.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
    #[error("invalid field specification 8*L({left})+R({right})")]
    Invalid { left: u8, right: u8 },
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn field(l: u8, r: u8) -> FieldSpec {
        FieldSpec::new(l, r).unwrap()
    }

    // TAOCP 1.3.1: location 2000 holds - 80 | 3 | 5 | 4, with 80 spanning
    // bytes 1 and 2.
    fn knuth_2000() -> Word {
        Word::from_bytes(true, [1, 16, 3, 5, 4])
    }

    #[test]
    fn test_from_f() {
        assert_eq!(FieldSpec::from_f(5).unwrap(), FieldSpec::FULL);
        assert_eq!(FieldSpec::from_f(13).unwrap(), field(1, 5));
        assert_eq!(field(3, 5).encode(), 29);
        assert!(FieldSpec::from_f(8 * 6 + 6).is_err());
        assert!(FieldSpec::from_f(8 * 3 + 2).is_err());
        assert!(FieldSpec::from_f(7).is_err());
    }

    #[test]
    fn test_knuth_load_examples() {
        let w = knuth_2000();
        assert_eq!(field(0, 5).load(w), w);
        assert_eq!(field(1, 5).load(w), Word::from_bytes(false, [1, 16, 3, 5, 4]));
        assert_eq!(field(3, 5).load(w), Word::from_bytes(false, [0, 0, 3, 5, 4]));
        assert_eq!(field(0, 3).load(w), Word::from_bytes(true, [0, 0, 1, 16, 3]));
        assert_eq!(field(4, 4).load(w), Word::from_bytes(false, [0, 0, 0, 0, 5]));
        assert_eq!(field(0, 0).load(w), Word::new(true, 0));
        assert_eq!(field(1, 1).load(w), Word::from_bytes(false, [0, 0, 0, 0, 1]));
    }

    #[test]
    fn test_knuth_store_examples() {
        let a = Word::from_bytes(false, [6, 7, 8, 9, 0]);
        let m = Word::from_bytes(true, [1, 2, 3, 4, 5]);
        assert_eq!(field(0, 5).store(m, a), Word::from_bytes(false, [6, 7, 8, 9, 0]));
        assert_eq!(field(1, 5).store(m, a), Word::from_bytes(true, [6, 7, 8, 9, 0]));
        assert_eq!(field(5, 5).store(m, a), Word::from_bytes(true, [1, 2, 3, 4, 0]));
        assert_eq!(field(2, 2).store(m, a), Word::from_bytes(true, [1, 0, 3, 4, 5]));
        assert_eq!(field(2, 3).store(m, a), Word::from_bytes(true, [1, 9, 0, 4, 5]));
        assert_eq!(field(0, 1).store(m, a), Word::from_bytes(false, [0, 2, 3, 4, 5]));
    }

    #[test]
    fn test_store_sign_only() {
        let m = Word::from_bytes(false, [1, 2, 3, 4, 5]);
        let stored = field(0, 0).store(m, Word::new(true, 7));
        assert_eq!(stored, Word::from_bytes(true, [1, 2, 3, 4, 5]));
    }

    #[test]
    fn test_compare() {
        let small = Word::from_i64(-100);
        let big = Word::from_i64(5);
        assert_eq!(FieldSpec::FULL.compare(small, big), Ordering::Less);
        // Without the sign, only magnitudes count.
        assert_eq!(field(1, 5).compare(small, big), Ordering::Greater);
        assert_eq!(field(0, 0).compare(small, big), Ordering::Equal);
        assert_eq!(FieldSpec::FULL.compare(Word::new(true, 0), Word::ZERO), Ordering::Equal);
    }

    proptest! {
        #[test]
        fn prop_store_of_load_roundtrip(src in any::<u32>(), dst in any::<u32>(), l in 0u8..=5, r in 0u8..=5) {
            prop_assume!(l <= r);
            let f = field(l, r);
            let src = Word::from_raw(src);
            let dst = Word::from_raw(dst);
            let stored = f.store(dst, f.load(src));

            for byte in 1..=5usize {
                let inside = byte >= usize::from(l.max(1)) && byte <= usize::from(r);
                let expected = if inside { src.byte(byte) } else { dst.byte(byte) };
                prop_assert_eq!(stored.byte(byte), expected);
            }
            let expected_sign = if l == 0 { src.is_negative() } else { dst.is_negative() };
            prop_assert_eq!(stored.is_negative(), expected_sign);
        }

        #[test]
        fn prop_compare_is_antisymmetric(a in any::<u32>(), b in any::<u32>(), l in 0u8..=5, r in 0u8..=5) {
            prop_assume!(l <= r);
            let f = field(l, r);
            let (a, b) = (Word::from_raw(a), Word::from_raw(b));
            prop_assert_eq!(f.compare(a, b), f.compare(b, a).reverse());
        }
    }
}
