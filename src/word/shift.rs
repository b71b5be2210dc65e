//! Byte shifts of A and A:X.
//!
//! Shifts move whole bytes and never touch signs. The double-register forms
//! treat A:X as one ten-byte register, A holding the high half.

use crate::word::word::{Word, BYTE_BITS, BYTES_PER_WORD, MAGNITUDE_MASK};
use serde::{Serialize, Deserialize};

/// Bits in a word magnitude.
const HALF_BITS: u32 = BYTE_BITS * BYTES_PER_WORD as u32;

/// Bits in the combined A:X register.
const PAIR_BITS: u32 = 2 * HALF_BITS;

/// Mask of the combined A:X register.
const PAIR_MASK: u64 = (1 << PAIR_BITS) - 1;

/// Bytes in the combined A:X register.
const PAIR_BYTES: u64 = 2 * BYTES_PER_WORD as u64;

/// The six shift instructions, selected by F.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShiftKind {
    /// SLA: A left.
    LeftA,
    /// SRA: A right.
    RightA,
    /// SLAX: A:X left.
    LeftAX,
    /// SRAX: A:X right.
    RightAX,
    /// SLC: A:X left, circular.
    LeftCircular,
    /// SRC: A:X right, circular.
    RightCircular,
}

impl ShiftKind {
    /// Decode the F byte of a shift instruction.
    pub const fn from_f(f: u8) -> Option<Self> {
        match f {
            0 => Some(ShiftKind::LeftA),
            1 => Some(ShiftKind::RightA),
            2 => Some(ShiftKind::LeftAX),
            3 => Some(ShiftKind::RightAX),
            4 => Some(ShiftKind::LeftCircular),
            5 => Some(ShiftKind::RightCircular),
            _ => None,
        }
    }

    /// The F byte for this shift.
    pub const fn f(self) -> u8 {
        self as u8
    }

    /// Assembler mnemonic.
    pub const fn mnemonic(self) -> &'static str {
        match self {
            ShiftKind::LeftA => "SLA",
            ShiftKind::RightA => "SRA",
            ShiftKind::LeftAX => "SLAX",
            ShiftKind::RightAX => "SRAX",
            ShiftKind::LeftCircular => "SLC",
            ShiftKind::RightCircular => "SRC",
        }
    }
}

/// Shift A (and X) by `count` bytes, returning the new (A, X).
///
/// Plain shifts saturate at ten bytes; circular shifts take the count
/// modulo ten.
pub fn shift(kind: ShiftKind, a: Word, x: Word, count: u64) -> (Word, Word) {
    let plain = (count.min(PAIR_BYTES) as u32) * BYTE_BITS;
    let circular = ((count % PAIR_BYTES) as u32) * BYTE_BITS;
    let pair = (u64::from(a.magnitude()) << HALF_BITS) | u64::from(x.magnitude());

    let single = |magnitude: u64| a.with_magnitude((magnitude & u64::from(MAGNITUDE_MASK)) as u32);
    let split = |pair: u64| {
        let pair = pair & PAIR_MASK;
        (
            a.with_magnitude((pair >> HALF_BITS) as u32),
            x.with_magnitude((pair & u64::from(MAGNITUDE_MASK)) as u32),
        )
    };

    match kind {
        ShiftKind::LeftA => (single(u64::from(a.magnitude()) << plain), x),
        ShiftKind::RightA => (single(u64::from(a.magnitude()) >> plain), x),
        ShiftKind::LeftAX => split(pair << plain),
        ShiftKind::RightAX => split(pair >> plain),
        ShiftKind::LeftCircular => split((pair << circular) | (pair >> (PAIR_BITS - circular))),
        ShiftKind::RightCircular => split((pair >> circular) | (pair << (PAIR_BITS - circular))),
    }
}
