//! Word arithmetic.
//!
//! Sign-magnitude add, multiply and divide on MIX words. Intermediates are
//! 64-bit, so none of these can trap on the host.

use crate::word::word::{Word, BYTE_BITS, BYTES_PER_WORD, MAGNITUDE_MASK};

/// Bits in a word magnitude.
const MAGNITUDE_BITS: u32 = BYTE_BITS * BYTES_PER_WORD as u32;

/// Add a signed value to a word, returning (result, overflow).
///
/// Overflow is raised when the true sum does not fit in 30 bits; the
/// result then keeps the low 30 bits of the magnitude. A zero result is +0.
pub fn add_value(word: Word, value: i64) -> (Word, bool) {
    let sum = word.to_i64() + value;
    let overflow = sum.unsigned_abs() > u64::from(MAGNITUDE_MASK);
    (Word::from_i64(sum), overflow)
}

/// Add two words, returning (result, overflow).
#[inline]
pub fn add(a: Word, b: Word) -> (Word, bool) {
    add_value(a, b.to_i64())
}

/// Subtract `b` from `a`, returning (result, overflow).
#[inline]
pub fn subtract(a: Word, b: Word) -> (Word, bool) {
    add_value(a, -b.to_i64())
}

/// Multiply two words into a double-width (high, low) pair.
///
/// Both halves carry the sign of the product, even when zero. The product
/// of two 30-bit magnitudes always fits in 60 bits, so this never overflows.
pub fn multiply(a: Word, b: Word) -> (Word, Word) {
    let product = u64::from(a.magnitude()) * u64::from(b.magnitude());
    let negative = a.is_negative() != b.is_negative();
    let high = (product >> MAGNITUDE_BITS) as u32;
    let low = (product & u64::from(MAGNITUDE_MASK)) as u32;
    (Word::new(negative, high), Word::new(negative, low))
}

/// Divide the double-width value `high:low` by `divisor`.
///
/// The dividend takes its sign from `high`. Returns (quotient, remainder),
/// or `None` when the divisor is zero or the quotient would not fit in a
/// word (|high| >= |divisor|).
pub fn divide(high: Word, low: Word, divisor: Word) -> Option<(Word, Word)> {
    let d = u64::from(divisor.magnitude());
    if d == 0 || u64::from(high.magnitude()) >= d {
        return None;
    }

    let dividend = (u64::from(high.magnitude()) << MAGNITUDE_BITS) | u64::from(low.magnitude());
    let quotient = (dividend / d) as u32;
    let remainder = (dividend % d) as u32;

    Some((
        Word::new(high.is_negative() != divisor.is_negative(), quotient),
        Word::new(high.is_negative(), remainder),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_add_simple() {
        let (sum, overflow) = add(Word::from_i64(1000), Word::from_i64(-1234));
        assert_eq!(sum.to_i64(), -234);
        assert!(!overflow);
    }

    #[test]
    fn test_add_to_zero_is_positive() {
        let (sum, overflow) = add(Word::from_i64(-5), Word::from_i64(5));
        assert_eq!(sum, Word::ZERO);
        assert!(!overflow);

        let (diff, _) = subtract(Word::new(true, 0), Word::new(true, 0));
        assert_eq!(diff, Word::ZERO);
    }

    #[test]
    fn test_add_overflow_keeps_low_bits() {
        let max = Word::new(false, MAGNITUDE_MASK);
        let (sum, overflow) = add(max, Word::from_i64(1));
        assert!(overflow);
        assert!(sum.is_zero());

        let (sum, overflow) = add(max, Word::from_i64(3));
        assert!(overflow);
        assert_eq!(sum.to_i64(), 2);

        let (sum, overflow) = subtract(max.negated(), Word::from_i64(2));
        assert!(overflow);
        assert_eq!(sum.to_i64(), -1);
    }

    #[test]
    fn test_knuth_multiply() {
        let ones = Word::from_bytes(false, [1, 1, 1, 1, 1]);
        let (a, x) = multiply(ones, ones);
        assert_eq!(a, Word::from_bytes(false, [0, 1, 2, 3, 4]));
        assert_eq!(x, Word::from_bytes(false, [5, 4, 3, 2, 1]));

        let (a, x) = multiply(Word::from_i64(-112), Word::from_i64(2));
        assert_eq!(a, Word::new(true, 0));
        assert_eq!(x, Word::from_bytes(true, [0, 0, 0, 3, 32]));

        let (a, x) = multiply(Word::from_i64(-112), Word::from_i64(-112));
        assert_eq!(a, Word::ZERO);
        assert_eq!(x, Word::from_bytes(false, [0, 0, 3, 4, 0]));
    }

    #[test]
    fn test_knuth_divide() {
        let (q, r) = divide(Word::ZERO, Word::from_i64(17), Word::from_i64(3)).unwrap();
        assert_eq!(q, Word::from_i64(5));
        assert_eq!(r, Word::from_i64(2));

        let (q, r) = divide(Word::new(true, 0), Word::from_i64(17), Word::from_i64(-3)).unwrap();
        assert_eq!(q, Word::from_i64(5));
        assert_eq!(r, Word::from_i64(-2));
    }

    #[test]
    fn test_divide_overflow() {
        assert_eq!(divide(Word::ZERO, Word::from_i64(17), Word::ZERO), None);
        assert_eq!(divide(Word::from_i64(3), Word::ZERO, Word::from_i64(3)), None);
        assert!(divide(Word::from_i64(2), Word::ZERO, Word::from_i64(3)).is_some());
    }

    proptest! {
        #[test]
        fn prop_add_inverse_is_positive_zero(v in -(MAGNITUDE_MASK as i64)..=MAGNITUDE_MASK as i64) {
            let w = Word::from_i64(v);
            let (sum, overflow) = add(w, w.negated());
            prop_assert_eq!(sum, Word::ZERO);
            prop_assert!(!overflow);
        }

        #[test]
        fn prop_add_overflow_iff_out_of_range(a in any::<u32>(), b in any::<u32>()) {
            let (a, b) = (Word::from_raw(a), Word::from_raw(b));
            let exact = a.to_i64() + b.to_i64();
            let (sum, overflow) = add(a, b);
            prop_assert_eq!(overflow, exact.abs() > MAGNITUDE_MASK as i64);
            prop_assert_eq!(sum.magnitude() as u64, exact.unsigned_abs() & MAGNITUDE_MASK as u64);
        }

        #[test]
        fn prop_divide_inverts_multiply(a in any::<u32>(), b in 1u32..=MAGNITUDE_MASK) {
            let a = Word::from_raw(a);
            let b = Word::new(false, b);
            let (high, low) = multiply(a, b);
            let (q, r) = divide(high, low, b).unwrap();
            prop_assert_eq!(q.magnitude(), a.magnitude());
            prop_assert_eq!(r.magnitude(), 0);
        }
    }
}
