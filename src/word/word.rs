//! The MIX word.
//!
//! A word is a sign plus five 6-bit bytes, held in a 32-bit container:
//! - bit 31: sign (1 = negative)
//! - bit 30: unused, always zero
//! - bits 29..0: bytes 1..5, byte 5 in the least significant six bits

use std::fmt;
use serde::{Serialize, Deserialize};

/// Number of bits in a MIX byte.
pub const BYTE_BITS: u32 = 6;

/// Mask of a single byte.
pub const BYTE_MASK: u32 = 0x3F;

/// Number of bytes in a word.
pub const BYTES_PER_WORD: usize = 5;

/// The sign bit.
pub const SIGN_BIT: u32 = 0x8000_0000;

/// The 30 magnitude bits.
pub const MAGNITUDE_MASK: u32 = 0x3FFF_FFFF;

/// Every bit a word may legally carry.
pub const WORD_MASK: u32 = SIGN_BIT | MAGNITUDE_MASK;

/// Bits kept by index registers: sign plus two bytes.
pub const INDEX_MASK: u32 = SIGN_BIT | 0xFFF;

/// Largest magnitude a word can hold (2^30 - 1).
pub const MAX_MAGNITUDE: u32 = MAGNITUDE_MASK;

/// A sign-magnitude MIX word.
///
/// Every constructor masks its input, so bit 30 is never set. Serialization
/// goes through the raw `u32` wire format and is masked the same way.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "u32", into = "u32")]
pub struct Word(u32);

impl Word {
    /// Positive zero.
    pub const ZERO: Word = Word(0);

    /// Build a word from its wire format, dropping the unused bit.
    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw & WORD_MASK)
    }

    /// The wire format of this word.
    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Build a word from a sign and a magnitude (truncated to 30 bits).
    #[inline]
    pub const fn new(negative: bool, magnitude: u32) -> Self {
        let sign = if negative { SIGN_BIT } else { 0 };
        Self(sign | (magnitude & MAGNITUDE_MASK))
    }

    /// Build a word from a signed integer.
    ///
    /// Magnitudes wider than 30 bits keep only their low 30 bits; zero is
    /// always positive.
    pub fn from_i64(value: i64) -> Self {
        let magnitude = (value.unsigned_abs() & u64::from(MAGNITUDE_MASK)) as u32;
        Self::new(value < 0, magnitude)
    }

    /// The signed value of this word. Both zeros map to 0.
    #[inline]
    pub fn to_i64(self) -> i64 {
        let magnitude = i64::from(self.magnitude());
        if self.is_negative() {
            -magnitude
        } else {
            magnitude
        }
    }

    /// Build a word from a sign and five bytes (byte 1 first).
    ///
    /// Each byte keeps only its low six bits.
    pub fn from_bytes(negative: bool, bytes: [u8; BYTES_PER_WORD]) -> Self {
        let magnitude = bytes
            .iter()
            .fold(0u32, |acc, &b| (acc << BYTE_BITS) | (u32::from(b) & BYTE_MASK));
        Self::new(negative, magnitude)
    }

    /// The five bytes of this word, byte 1 first.
    pub fn bytes(self) -> [u8; BYTES_PER_WORD] {
        let mut bytes = [0u8; BYTES_PER_WORD];
        for (i, byte) in bytes.iter_mut().enumerate() {
            *byte = self.byte(i + 1);
        }
        bytes
    }

    /// A single byte, numbered 1 (most significant) to 5.
    ///
    /// # Panics
    /// Panics if `index` is not in `1..=5`.
    #[inline]
    pub fn byte(self, index: usize) -> u8 {
        assert!(
            (1..=BYTES_PER_WORD).contains(&index),
            "byte index {} out of range (1-5)",
            index
        );
        let shift = BYTE_BITS * (BYTES_PER_WORD - index) as u32;
        ((self.0 >> shift) & BYTE_MASK) as u8
    }

    /// True if the sign bit is set (including negative zero).
    #[inline]
    pub const fn is_negative(self) -> bool {
        self.0 & SIGN_BIT != 0
    }

    /// The unsigned 30-bit magnitude.
    #[inline]
    pub const fn magnitude(self) -> u32 {
        self.0 & MAGNITUDE_MASK
    }

    /// True for both +0 and -0.
    #[inline]
    pub const fn is_zero(self) -> bool {
        self.magnitude() == 0
    }

    /// This word with its sign replaced.
    #[inline]
    pub const fn with_sign(self, negative: bool) -> Self {
        Self::new(negative, self.magnitude())
    }

    /// This word with its sign flipped.
    #[inline]
    pub const fn negated(self) -> Self {
        Self(self.0 ^ SIGN_BIT)
    }

    /// This word with its magnitude replaced, sign kept.
    #[inline]
    pub const fn with_magnitude(self, magnitude: u32) -> Self {
        Self::new(self.is_negative(), magnitude)
    }

    /// Keep only the sign and the low two bytes, as index registers do.
    #[inline]
    pub const fn to_index(self) -> Self {
        Self(self.0 & INDEX_MASK)
    }
}

impl From<u32> for Word {
    fn from(raw: u32) -> Self {
        Word::from_raw(raw)
    }
}

impl From<Word> for u32 {
    fn from(word: Word) -> Self {
        word.raw()
    }
}

impl fmt::Debug for Word {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Word({} = {})", self, self.to_i64())
    }
}

impl fmt::Display for Word {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.is_negative() { '-' } else { '+' };
        write!(f, "{}", sign)?;
        for byte in self.bytes() {
            write!(f, " {:02}", byte)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_word_sign_and_magnitude() {
        let w = Word::new(true, 42);
        assert!(w.is_negative());
        assert_eq!(w.magnitude(), 42);
        assert_eq!(w.to_i64(), -42);
        assert_eq!(w.raw(), SIGN_BIT | 42);
    }

    #[test]
    fn test_unused_bit_is_dropped() {
        let w = Word::from_raw(0xFFFF_FFFF);
        assert_eq!(w.raw() & 0x4000_0000, 0);
        assert_eq!(w.magnitude(), MAX_MAGNITUDE);
        assert!(w.is_negative());
    }

    #[test]
    fn test_from_i64_truncates_to_30_bits() {
        let w = Word::from_i64((1 << 30) + 7);
        assert_eq!(w.to_i64(), 7);
        assert_eq!(Word::from_i64(-(1 << 30) - 7).to_i64(), -7);
        assert!(!Word::from_i64(0).is_negative());
    }

    #[test]
    fn test_bytes_roundtrip() {
        let w = Word::from_bytes(true, [1, 16, 3, 5, 4]);
        assert_eq!(w.bytes(), [1, 16, 3, 5, 4]);
        assert_eq!(w.byte(1), 1);
        assert_eq!(w.byte(5), 4);
        assert_eq!(w.magnitude(), (1 << 24) | (16 << 18) | (3 << 12) | (5 << 6) | 4);
    }

    #[test]
    fn test_negative_zero() {
        let minus_zero = Word::new(true, 0);
        assert!(minus_zero.is_zero());
        assert!(minus_zero.is_negative());
        assert_eq!(minus_zero.to_i64(), 0);
        assert_ne!(minus_zero, Word::ZERO);
    }

    #[test]
    fn test_index_truncation() {
        let w = Word::from_bytes(true, [9, 9, 9, 1, 2]);
        assert_eq!(w.to_index(), Word::from_bytes(true, [0, 0, 0, 1, 2]));
    }

    #[test]
    fn test_display() {
        let w = Word::from_bytes(false, [6, 7, 8, 9, 0]);
        assert_eq!(format!("{}", w), "+ 06 07 08 09 00");
    }

    #[test]
    fn test_serde_masks_wire_value() {
        let w: Word = serde_json::from_str("4294967295").unwrap();
        assert_eq!(w.raw(), WORD_MASK);
        assert_eq!(serde_json::to_string(&Word::new(true, 1)).unwrap(), "2147483649");
    }
}
