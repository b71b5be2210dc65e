//! MIX data primitives.
//!
//! - [`Word`] - sign plus five 6-bit bytes in a 32-bit container
//! - [`FieldSpec`] - the (L:R) byte range used by loads, stores and compares
//! - [`MixChar`] - the 6-bit character code used by character devices
//! - [`arith`], [`shift`], [`decimal`] - pure word operations behind the ALU

mod word;
mod field;
mod charset;
pub mod arith;
pub mod shift;
pub mod decimal;

pub use word::{
    Word, BYTE_BITS, BYTE_MASK, BYTES_PER_WORD, INDEX_MASK, MAGNITUDE_MASK, MAX_MAGNITUDE,
    SIGN_BIT, WORD_MASK,
};
pub use field::{FieldError, FieldSpec};
pub use charset::{CharError, MixChar, DIGIT_ZERO};
pub use shift::ShiftKind;
