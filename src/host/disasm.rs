//! Disassembler for MIX words.
//!
//! Renders words in MIXAL notation: `OP ADDRESS,I(F)`. The field part is
//! omitted when it equals the instruction's default, and sub-operations
//! selected by F (jumps, shifts, INC/DEC/ENT/ENN, NUM/CHAR/HLT) are folded
//! into the mnemonic.

use std::fmt;
use crate::cpu::decode::{decode, Instruction, Operation};
use crate::word::{FieldSpec, ShiftKind, Word};

/// How an instruction's F byte is printed.
enum FieldStyle {
    /// A field spec with the given default F.
    Spec(u8),
    /// A plain number (device ids, MOVE counts).
    Number,
    /// F selected the mnemonic and is not printed.
    Hidden,
}

/// The mnemonic and F style of an instruction, or `None` if its F byte
/// names no operation.
fn describe(instr: &Instruction) -> Option<(String, FieldStyle)> {
    const JUMPS: [&str; 10] = ["JMP", "JSJ", "JOV", "JNOV", "JL", "JE", "JG", "JGE", "JNE", "JLE"];
    const REGISTER_JUMPS: [&str; 6] = ["N", "Z", "P", "NN", "NZ", "NP"];
    const MODIFIES: [&str; 4] = ["INC", "DEC", "ENT", "ENN"];
    const SPECIALS: [&str; 3] = ["NUM", "CHAR", "HLT"];

    let f = usize::from(instr.field);
    let full = FieldSpec::FULL.encode();

    let described = match instr.operation {
        Operation::Nop => ("NOP".to_string(), FieldStyle::Hidden),
        Operation::Add => ("ADD".to_string(), FieldStyle::Spec(full)),
        Operation::Sub => ("SUB".to_string(), FieldStyle::Spec(full)),
        Operation::Mul => ("MUL".to_string(), FieldStyle::Spec(full)),
        Operation::Div => ("DIV".to_string(), FieldStyle::Spec(full)),
        Operation::Special => (SPECIALS.get(f)?.to_string(), FieldStyle::Hidden),
        Operation::Shift => (ShiftKind::from_f(instr.field)?.mnemonic().to_string(), FieldStyle::Hidden),
        Operation::Move => ("MOVE".to_string(), FieldStyle::Number),
        Operation::Load(r) => (format!("LD{}", r.suffix()), FieldStyle::Spec(full)),
        Operation::LoadNegative(r) => (format!("LD{}N", r.suffix()), FieldStyle::Spec(full)),
        Operation::Store(r) => (format!("ST{}", r.suffix()), FieldStyle::Spec(full)),
        Operation::StoreJ => ("STJ".to_string(), FieldStyle::Spec(2)),
        Operation::StoreZero => ("STZ".to_string(), FieldStyle::Spec(full)),
        Operation::JumpBusy => ("JBUS".to_string(), FieldStyle::Number),
        Operation::IoControl => ("IOC".to_string(), FieldStyle::Number),
        Operation::Input => ("IN".to_string(), FieldStyle::Number),
        Operation::Output => ("OUT".to_string(), FieldStyle::Number),
        Operation::JumpReady => ("JRED".to_string(), FieldStyle::Number),
        Operation::Jump => (JUMPS.get(f)?.to_string(), FieldStyle::Hidden),
        Operation::JumpRegister(r) => (format!("J{}{}", r.suffix(), REGISTER_JUMPS.get(f)?), FieldStyle::Hidden),
        Operation::Modify(r) => (format!("{}{}", MODIFIES.get(f)?, r.suffix()), FieldStyle::Hidden),
        Operation::Compare(r) => (format!("CMP{}", r.suffix()), FieldStyle::Spec(full)),
    };
    Some(described)
}

/// The symbolic mnemonic of an instruction, if its F byte is meaningful.
pub fn mnemonic(instr: &Instruction) -> Option<String> {
    describe(instr).map(|(name, _)| name)
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some((name, style)) = describe(self) else {
            return write!(f, "??? C={} F={}", self.opcode(), self.field);
        };

        if self.negative && self.address == 0 {
            write!(f, "{} -0", name)?;
        } else {
            write!(f, "{} {}", name, self.address)?;
        }
        if self.index != 0 {
            write!(f, ",{}", self.index)?;
        }
        match style {
            FieldStyle::Spec(default) if self.field != default => match FieldSpec::from_f(self.field) {
                Ok(spec) => write!(f, "{}", spec),
                Err(_) => write!(f, "({})", self.field),
            },
            FieldStyle::Number => write!(f, "({})", self.field),
            _ => Ok(()),
        }
    }
}

/// Disassemble a single word.
pub fn disassemble_word(word: Word) -> String {
    decode(word).to_string()
}

/// Disassemble a block of words loaded at `start`.
pub fn disassemble(words: &[Word], start: usize) -> String {
    let mut output = String::new();
    for (offset, word) in words.iter().enumerate() {
        output.push_str(&format!(
            "{:04}: {:<20} ; {}\n",
            start + offset,
            disassemble_word(*word),
            word
        ));
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cpu::decode::encode;
    use crate::cpu::Register;

    fn show(operation: Operation, address: i32, index: u8, field: u8) -> String {
        disassemble_word(encode(&Instruction::new(operation, address, index, field)))
    }

    #[test]
    fn test_field_is_shown_only_when_not_default() {
        assert_eq!(show(Operation::Load(Register::A), 2000, 2, 3), "LDA 2000,2(0:3)");
        assert_eq!(show(Operation::Load(Register::A), 2000, 0, 5), "LDA 2000");
        assert_eq!(show(Operation::StoreJ, 100, 0, 2), "STJ 100");
        assert_eq!(show(Operation::StoreJ, 100, 0, 5), "STJ 100(0:5)");
        assert_eq!(show(Operation::Compare(Register::I3), 7, 0, 7), "CMP3 7(7)");
    }

    #[test]
    fn test_sub_operations() {
        assert_eq!(show(Operation::Special, 0, 0, 2), "HLT 0");
        assert_eq!(show(Operation::Jump, 10, 0, 9), "JLE 10");
        assert_eq!(show(Operation::JumpRegister(Register::A), 10, 0, 4), "JANZ 10");
        assert_eq!(show(Operation::JumpRegister(Register::I5), 10, 0, 0), "J5N 10");
        assert_eq!(show(Operation::Modify(Register::X), -1, 0, 1), "DECX -1");
        assert_eq!(show(Operation::Shift, 501, 0, 4), "SLC 501");
    }

    #[test]
    fn test_devices_and_counts() {
        assert_eq!(show(Operation::Input, 100, 0, 16), "IN 100(16)");
        assert_eq!(show(Operation::Move, 1000, 0, 3), "MOVE 1000(3)");
        assert_eq!(show(Operation::JumpBusy, 0, 0, 18), "JBUS 0(18)");
    }

    #[test]
    fn test_unknown_sub_operation() {
        assert_eq!(show(Operation::Jump, 0, 0, 12), "??? C=39 F=12");
        assert_eq!(mnemonic(&decode(encode(&Instruction::new(Operation::Special, 0, 0, 9)))), None);
    }

    #[test]
    fn test_negative_zero_address() {
        let enta = Instruction::new(Operation::Modify(Register::A), 0, 0, 2).with_sign(true);
        assert_eq!(enta.to_string(), "ENTA -0");
    }

    #[test]
    fn test_listing() {
        let words = [
            encode(&Instruction::new(Operation::Output, 8, 0, 18)),
            encode(&Instruction::new(Operation::Special, 0, 0, 2)),
        ];
        let listing = disassemble(&words, 0);
        let lines: Vec<&str> = listing.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("0000: OUT 8(18)"));
        assert!(lines[1].starts_with("0001: HLT 0"));
    }
}
