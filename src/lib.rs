//! # MIX Emulator
//!
//! An emulator of MIX, the hypothetical computer Donald Knuth uses in
//! *The Art of Computer Programming*.
//!
//! The machine runs cooperatively: [`Cpu::step`] executes instructions for
//! a cycle budget and returns, and all device I/O is asynchronous, carried
//! out by a host [`Frontend`] that moves data through the machine's stream
//! adapters at its own pace.

pub mod word;
pub mod cpu;
pub mod host;

// Re-export commonly used types
pub use word::{FieldSpec, MixChar, Word};
pub use cpu::{Cpu, Device, Frontend, Instruction, Memory, Registers, RunState, StepOutcome, Warning};
pub use host::{disassemble, load_deck, Deck, Peripherals};
