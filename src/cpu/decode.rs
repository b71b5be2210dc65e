//! Instruction decoder for MIX.
//!
//! An instruction is an ordinary word read as `± A A I F C`:
//! - bytes 1-2 and the sign: address, a signed 12-bit magnitude
//! - byte 3 (I): index register, 0 for none
//! - byte 4 (F): field, device number or sub-operation
//! - byte 5 (C): opcode

use crate::cpu::registers::Register;
use crate::word::{Word, BYTE_MASK};
use serde::{Serialize, Deserialize};

/// Largest address magnitude an instruction can carry.
pub const MAX_ADDRESS_FIELD: i32 = 0xFFF;

/// What an opcode does, before its F byte is interpreted.
///
/// Every one of the 64 opcodes maps to exactly one operation; see
/// [`Operation::from_opcode`] and [`Operation::opcode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operation {
    /// C=0.
    Nop,
    /// C=1.
    Add,
    /// C=2.
    Sub,
    /// C=3.
    Mul,
    /// C=4.
    Div,
    /// C=5: NUM, CHAR, HLT by F.
    Special,
    /// C=6: SLA, SRA, SLAX, SRAX, SLC, SRC by F.
    Shift,
    /// C=7.
    Move,
    /// C=8..15.
    Load(Register),
    /// C=16..23.
    LoadNegative(Register),
    /// C=24..31.
    Store(Register),
    /// C=32.
    StoreJ,
    /// C=33.
    StoreZero,
    /// C=34.
    JumpBusy,
    /// C=35.
    IoControl,
    /// C=36.
    Input,
    /// C=37.
    Output,
    /// C=38.
    JumpReady,
    /// C=39: JMP, JSJ, JOV, JNOV, JL, JE, JG, JGE, JNE, JLE by F.
    Jump,
    /// C=40..47: J*N, J*Z, J*P, J*NN, J*NZ, J*NP by F.
    JumpRegister(Register),
    /// C=48..55: INC*, DEC*, ENT*, ENN* by F.
    Modify(Register),
    /// C=56..63.
    Compare(Register),
}

impl Operation {
    /// Decode the C byte. Only the low six bits are looked at.
    pub const fn from_opcode(code: u8) -> Self {
        let code = code & BYTE_MASK as u8;
        let reg = Register::from_offset(code & 0x7);
        match code {
            0 => Operation::Nop,
            1 => Operation::Add,
            2 => Operation::Sub,
            3 => Operation::Mul,
            4 => Operation::Div,
            5 => Operation::Special,
            6 => Operation::Shift,
            7 => Operation::Move,
            8..=15 => Operation::Load(reg),
            16..=23 => Operation::LoadNegative(reg),
            24..=31 => Operation::Store(reg),
            32 => Operation::StoreJ,
            33 => Operation::StoreZero,
            34 => Operation::JumpBusy,
            35 => Operation::IoControl,
            36 => Operation::Input,
            37 => Operation::Output,
            38 => Operation::JumpReady,
            39 => Operation::Jump,
            40..=47 => Operation::JumpRegister(reg),
            48..=55 => Operation::Modify(reg),
            _ => Operation::Compare(reg),
        }
    }

    /// The C byte for this operation.
    pub const fn opcode(self) -> u8 {
        match self {
            Operation::Nop => 0,
            Operation::Add => 1,
            Operation::Sub => 2,
            Operation::Mul => 3,
            Operation::Div => 4,
            Operation::Special => 5,
            Operation::Shift => 6,
            Operation::Move => 7,
            Operation::Load(r) => 8 + r.offset(),
            Operation::LoadNegative(r) => 16 + r.offset(),
            Operation::Store(r) => 24 + r.offset(),
            Operation::StoreJ => 32,
            Operation::StoreZero => 33,
            Operation::JumpBusy => 34,
            Operation::IoControl => 35,
            Operation::Input => 36,
            Operation::Output => 37,
            Operation::JumpReady => 38,
            Operation::Jump => 39,
            Operation::JumpRegister(r) => 40 + r.offset(),
            Operation::Modify(r) => 48 + r.offset(),
            Operation::Compare(r) => 56 + r.offset(),
        }
    }
}

/// A decoded instruction word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Instruction {
    /// Operation selected by the C byte.
    pub operation: Operation,
    /// Signed address field, -4095..=4095.
    pub address: i32,
    /// Sign bit of the word. Distinguishes -0 from +0 for ENT/ENN.
    pub negative: bool,
    /// Raw I byte (0..=63; only 0..=6 are meaningful).
    pub index: u8,
    /// Raw F byte.
    pub field: u8,
}

impl Instruction {
    /// Build an instruction. The address sign comes from `address`.
    pub fn new(operation: Operation, address: i32, index: u8, field: u8) -> Self {
        Self {
            operation,
            address: address.clamp(-MAX_ADDRESS_FIELD, MAX_ADDRESS_FIELD),
            negative: address < 0,
            index: index & BYTE_MASK as u8,
            field: field & BYTE_MASK as u8,
        }
    }

    /// The same instruction with an explicit sign (for -0 addresses).
    pub fn with_sign(mut self, negative: bool) -> Self {
        self.negative = negative;
        self.address = if negative {
            -self.address.abs()
        } else {
            self.address.abs()
        };
        self
    }

    /// The raw C byte.
    pub const fn opcode(&self) -> u8 {
        self.operation.opcode()
    }
}

/// Decode a word into an instruction. Every word decodes.
pub fn decode(word: Word) -> Instruction {
    let raw = word.raw();
    let magnitude = ((raw >> 18) & 0xFFF) as i32;
    let negative = word.is_negative();

    Instruction {
        operation: Operation::from_opcode((raw & BYTE_MASK) as u8),
        address: if negative { -magnitude } else { magnitude },
        negative,
        index: ((raw >> 12) & BYTE_MASK) as u8,
        field: ((raw >> 6) & BYTE_MASK) as u8,
    }
}

/// Encode an instruction back into a word.
pub fn encode(instr: &Instruction) -> Word {
    let magnitude = (instr.address.unsigned_abs() & 0xFFF) << 18
        | (u32::from(instr.index) & BYTE_MASK) << 12
        | (u32::from(instr.field) & BYTE_MASK) << 6
        | u32::from(instr.opcode());
    Word::new(instr.negative, magnitude)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opcode_table_covers_all_64_codes() {
        for code in 0..64u8 {
            assert_eq!(Operation::from_opcode(code).opcode(), code);
        }
    }

    #[test]
    fn test_opcode_groups() {
        assert_eq!(Operation::from_opcode(8), Operation::Load(Register::A));
        assert_eq!(Operation::from_opcode(15), Operation::Load(Register::X));
        assert_eq!(Operation::from_opcode(19), Operation::LoadNegative(Register::I3));
        assert_eq!(Operation::from_opcode(31), Operation::Store(Register::X));
        assert_eq!(Operation::from_opcode(41), Operation::JumpRegister(Register::I1));
        assert_eq!(Operation::from_opcode(55), Operation::Modify(Register::X));
        assert_eq!(Operation::from_opcode(56), Operation::Compare(Register::A));
    }

    #[test]
    fn test_decode_fields() {
        // LDA 2000,2(0:3)
        let word = Word::from_bytes(false, [31, 16, 2, 3, 8]);
        let instr = decode(word);
        assert_eq!(instr.operation, Operation::Load(Register::A));
        assert_eq!(instr.address, 2000);
        assert_eq!(instr.index, 2);
        assert_eq!(instr.field, 3);
        assert!(!instr.negative);
    }

    #[test]
    fn test_decode_negative_address() {
        let word = Word::from_bytes(true, [0, 1, 0, 2, 48]);
        let instr = decode(word);
        assert_eq!(instr.address, -1);
        assert!(instr.negative);
        assert_eq!(instr.operation, Operation::Modify(Register::A));
    }

    #[test]
    fn test_encode_decode_roundtrip() {
        let cases = [
            Instruction::new(Operation::Load(Register::A), 2000, 2, 3),
            Instruction::new(Operation::Jump, -17, 6, 1),
            Instruction::new(Operation::Special, 0, 0, 2),
            Instruction::new(Operation::Modify(Register::I4), 0, 0, 2).with_sign(true),
        ];

        for instr in cases {
            assert_eq!(decode(encode(&instr)), instr);
        }
    }

    #[test]
    fn test_negative_zero_address_survives_encoding() {
        let instr = Instruction::new(Operation::Modify(Register::A), 0, 0, 2).with_sign(true);
        let word = encode(&instr);
        assert!(word.is_negative());
        assert!(decode(word).negative);
    }
}
