//! NUM and CHAR: conversion between binary values and character digits.

use crate::word::charset::DIGIT_ZERO;
use crate::word::word::{Word, BYTES_PER_WORD, MAGNITUDE_MASK};

/// Digits in the A:X pair.
const DIGITS: usize = 2 * BYTES_PER_WORD;

/// NUM: read the ten bytes of A:X as decimal digits (each byte mod 10).
///
/// The value keeps its low 30 bits and lands in A with A's sign. X is not
/// changed and overflow is never raised.
pub fn num(a: Word, x: Word) -> Word {
    let value = a
        .bytes()
        .iter()
        .chain(x.bytes().iter())
        .fold(0u64, |acc, &b| acc * 10 + u64::from(b % 10));
    a.with_magnitude((value & u64::from(MAGNITUDE_MASK)) as u32)
}

/// CHAR: spell |A| as ten digit characters across A:X.
///
/// The leading five digits go to A, the trailing five to X; both registers
/// keep their signs.
pub fn chars(a: Word, x: Word) -> (Word, Word) {
    let mut digits = [0u8; DIGITS];
    let mut value = a.magnitude();
    for slot in digits.iter_mut().rev() {
        *slot = DIGIT_ZERO + (value % 10) as u8;
        value /= 10;
    }

    let mut high = [0u8; BYTES_PER_WORD];
    let mut low = [0u8; BYTES_PER_WORD];
    high.copy_from_slice(&digits[..BYTES_PER_WORD]);
    low.copy_from_slice(&digits[BYTES_PER_WORD..]);

    (
        Word::from_bytes(a.is_negative(), high),
        Word::from_bytes(x.is_negative(), low),
    )
}
