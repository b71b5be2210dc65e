//! MIX registers and status flags.
//!
//! - A: accumulator, a full word
//! - X: extension, a full word
//! - I1..I6: index registers, sign plus two bytes
//! - J: jump register, two bytes, always positive
//! - PC, plus the address of the instruction being executed
//! - overflow toggle and comparison indicator

use std::cmp::Ordering;
use std::fmt;
use crate::cpu::memory::next_address;
use crate::word::Word;
use serde::{Serialize, Deserialize};

/// Number of index registers.
pub const INDEX_REGISTERS: usize = 6;

/// A register addressed by the per-register instruction groups.
///
/// Opcodes that exist once per register (LD*, ST*, J*, INC*, CMP*) are laid
/// out as `base + offset`, with A at offset 0, I1..I6 at 1..6 and X at 7.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Register {
    A,
    I1,
    I2,
    I3,
    I4,
    I5,
    I6,
    X,
}

impl Register {
    /// Map an opcode offset (0..=7) to its register.
    pub const fn from_offset(offset: u8) -> Self {
        match offset & 0x7 {
            0 => Register::A,
            1 => Register::I1,
            2 => Register::I2,
            3 => Register::I3,
            4 => Register::I4,
            5 => Register::I5,
            6 => Register::I6,
            _ => Register::X,
        }
    }

    /// Offset of this register inside an opcode group.
    pub const fn offset(self) -> u8 {
        self as u8
    }

    /// Index register number `n` (1..=6).
    pub const fn index(n: u8) -> Option<Self> {
        match n {
            1..=6 => Some(Self::from_offset(n)),
            _ => None,
        }
    }

    /// True for I1..I6.
    pub const fn is_index(self) -> bool {
        !matches!(self, Register::A | Register::X)
    }

    /// Suffix used in mnemonics (`LDA`, `LD3`, `LDX`).
    pub const fn suffix(self) -> &'static str {
        match self {
            Register::A => "A",
            Register::I1 => "1",
            Register::I2 => "2",
            Register::I3 => "3",
            Register::I4 => "4",
            Register::I5 => "5",
            Register::I6 => "6",
            Register::X => "X",
        }
    }
}

/// The comparison indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Comparison {
    Less,
    #[default]
    Equal,
    Greater,
}

impl From<Ordering> for Comparison {
    fn from(ordering: Ordering) -> Self {
        match ordering {
            Ordering::Less => Comparison::Less,
            Ordering::Equal => Comparison::Equal,
            Ordering::Greater => Comparison::Greater,
        }
    }
}

/// The MIX register file.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registers {
    /// Accumulator.
    pub a: Word,

    /// Extension register.
    pub x: Word,

    /// I1..I6. Only the sign and the low two bytes are ever set.
    pub i: [Word; INDEX_REGISTERS],

    /// Jump register. Always positive, two bytes.
    pub j: Word,

    /// Address of the next instruction (0..=3999).
    pub pc: usize,

    /// Address of the instruction being executed, restored when an I/O
    /// instruction finds its device busy.
    pub old_pc: usize,

    /// Overflow toggle.
    pub overflow: bool,

    /// Comparison indicator.
    pub comparison: Comparison,
}

impl Registers {
    /// Create a new register file with all values zeroed.
    pub fn new() -> Self {
        Self {
            a: Word::ZERO,
            x: Word::ZERO,
            i: [Word::ZERO; INDEX_REGISTERS],
            j: Word::ZERO,
            pc: 0,
            old_pc: 0,
            overflow: false,
            comparison: Comparison::Equal,
        }
    }

    /// Reset all registers and flags.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Read a register.
    pub fn get(&self, reg: Register) -> Word {
        match reg {
            Register::A => self.a,
            Register::X => self.x,
            index => self.i[usize::from(index.offset()) - 1],
        }
    }

    /// Write a register. Index registers keep only sign and two bytes.
    pub fn set(&mut self, reg: Register, value: Word) {
        match reg {
            Register::A => self.a = value,
            Register::X => self.x = value,
            index => self.i[usize::from(index.offset()) - 1] = value.to_index(),
        }
    }

    /// Signed value of index register `n` (1..=6); 0 for any other `n`.
    pub fn index_value(&self, n: u8) -> i64 {
        match Register::index(n) {
            Some(reg) => self.get(reg).to_i64(),
            None => 0,
        }
    }

    /// Load J with a return address.
    pub fn set_j(&mut self, addr: usize) {
        self.j = Word::new(false, addr as u32).to_index();
    }

    /// Remember the current PC and advance it, wrapping at 4000.
    /// Returns the address of the instruction to fetch.
    pub fn advance_pc(&mut self) -> usize {
        self.old_pc = self.pc;
        self.pc = next_address(self.pc);
        self.old_pc
    }

    /// Set the program counter to an absolute address.
    pub fn jump(&mut self, addr: usize) {
        self.pc = addr;
    }

    /// Point PC back at the instruction being executed.
    pub fn rollback(&mut self) {
        self.pc = self.old_pc;
    }
}

impl Default for Registers {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Registers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registers")
            .field("a", &format_args!("{}", self.a))
            .field("x", &format_args!("{}", self.x))
            .field("i", &self.i.map(|w| w.to_i64()))
            .field("j", &self.j.magnitude())
            .field("pc", &self.pc)
            .field("overflow", &self.overflow)
            .field("comparison", &self.comparison)
            .finish()
    }
}
