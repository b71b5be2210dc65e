//! The MIX character set.
//!
//! Character-mode devices exchange 6-bit codes. Codes 0..55 have printable
//! symbols; 56..63 exist on the wire but have no symbol.

use std::fmt;
use serde::{Serialize, Deserialize};
use thiserror::Error;
use crate::word::word::BYTE_MASK;

/// Symbols for codes 0..55.
const SYMBOLS: [char; 56] = [
    ' ', 'A', 'B', 'C', 'D', 'E', 'F', 'G', 'H', 'I',
    'Δ', 'J', 'K', 'L', 'M', 'N', 'O', 'P', 'Q', 'R',
    'Σ', 'Π', 'S', 'T', 'U', 'V', 'W', 'X', 'Y', 'Z',
    '0', '1', '2', '3', '4', '5', '6', '7', '8', '9',
    '.', ',', '(', ')', '+', '-', '*', '/', '=', '$',
    '<', '>', '@', ';', ':', '\'',
];

/// Code of the digit `0`; digits are contiguous from here.
pub const DIGIT_ZERO: u8 = 30;

/// A 6-bit character code.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub struct MixChar(u8);

impl MixChar {
    /// The blank character (code 0).
    pub const SPACE: MixChar = MixChar(0);

    /// Number of codes with a printable symbol.
    pub const PRINTABLE: usize = SYMBOLS.len();

    /// Wrap a raw code, keeping its low six bits.
    #[inline]
    pub const fn from_code(code: u8) -> Self {
        Self(code & BYTE_MASK as u8)
    }

    /// The 6-bit code.
    #[inline]
    pub const fn code(self) -> u8 {
        self.0
    }

    /// Look up the code of a host character.
    ///
    /// Lowercase letters map to their uppercase codes. `~`, `[` and `#` are
    /// accepted as ASCII stand-ins for Δ, Σ and Π.
    pub fn from_char(c: char) -> Result<Self, CharError> {
        let c = match c {
            '~' => 'Δ',
            '[' => 'Σ',
            '#' => 'Π',
            c => c.to_ascii_uppercase(),
        };
        SYMBOLS
            .iter()
            .position(|&s| s == c)
            .map(|code| Self(code as u8))
            .ok_or(CharError::Unmapped(c))
    }

    /// The symbol for this code, if it has one.
    pub fn to_char(self) -> Option<char> {
        SYMBOLS.get(usize::from(self.0)).copied()
    }

    /// The code for a decimal digit.
    ///
    /// # Panics
    /// Panics if `digit > 9`.
    pub fn digit(digit: u8) -> Self {
        assert!(digit < 10, "{} is not a decimal digit", digit);
        Self(DIGIT_ZERO + digit)
    }

    /// Encode a string, failing on the first unmapped character.
    pub fn encode_str(s: &str) -> Result<Vec<MixChar>, CharError> {
        s.chars().map(MixChar::from_char).collect()
    }

    /// Decode codes into a string; codes without a symbol become `?`.
    pub fn decode_str(chars: &[MixChar]) -> String {
        chars.iter().map(|c| c.to_char().unwrap_or('?')).collect()
    }
}

impl From<u8> for MixChar {
    fn from(code: u8) -> Self {
        MixChar::from_code(code)
    }
}

impl From<MixChar> for u8 {
    fn from(c: MixChar) -> Self {
        c.code()
    }
}

impl fmt::Debug for MixChar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_char() {
            Some(c) => write!(f, "MixChar({:02} {:?})", self.0, c),
            None => write!(f, "MixChar({:02})", self.0),
        }
    }
}

impl fmt::Display for MixChar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_char().unwrap_or('?'))
    }
}

/// Errors from converting host text to MIX codes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CharError {
    #[error("character {0:?} has no MIX code")]
    Unmapped(char),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classic_codes() {
        assert_eq!(MixChar::from_char(' ').unwrap().code(), 0);
        assert_eq!(MixChar::from_char('A').unwrap().code(), 1);
        assert_eq!(MixChar::from_char('Δ').unwrap().code(), 10);
        assert_eq!(MixChar::from_char('J').unwrap().code(), 11);
        assert_eq!(MixChar::from_char('Σ').unwrap().code(), 20);
        assert_eq!(MixChar::from_char('Π').unwrap().code(), 21);
        assert_eq!(MixChar::from_char('S').unwrap().code(), 22);
        assert_eq!(MixChar::from_char('Z').unwrap().code(), 29);
        assert_eq!(MixChar::from_char('0').unwrap().code(), 30);
        assert_eq!(MixChar::from_char('9').unwrap().code(), 39);
        assert_eq!(MixChar::from_char('.').unwrap().code(), 40);
        assert_eq!(MixChar::from_char('\'').unwrap().code(), 55);
    }

    #[test]
    fn test_table_is_a_bijection() {
        for code in 0..MixChar::PRINTABLE as u8 {
            let c = MixChar::from_code(code).to_char().unwrap();
            assert_eq!(MixChar::from_char(c).unwrap().code(), code);
        }
        assert_eq!(MixChar::from_code(56).to_char(), None);
    }

    #[test]
    fn test_lowercase_and_stand_ins() {
        assert_eq!(MixChar::from_char('q').unwrap(), MixChar::from_char('Q').unwrap());
        assert_eq!(MixChar::from_char('~').unwrap().code(), 10);
        assert_eq!(MixChar::from_char('#').unwrap().code(), 21);
    }

    #[test]
    fn test_unmapped() {
        assert_eq!(MixChar::from_char('!'), Err(CharError::Unmapped('!')));
        assert!(MixChar::encode_str("HELLO!").is_err());
    }

    #[test]
    fn test_string_roundtrip() {
        let codes = MixChar::encode_str("MIX 1009.").unwrap();
        assert_eq!(MixChar::decode_str(&codes), "MIX 1009.");
        assert_eq!(MixChar::digit(7).code(), 37);
    }
}
