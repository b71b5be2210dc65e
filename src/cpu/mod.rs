//! CPU emulation for the MIX computer.
//!
//! This module implements the machine described in TAOCP volume 1:
//! - 4000 words of memory
//! - registers A, X, I1..I6, J, overflow toggle and comparison indicator
//! - all 64 opcodes, with Knuth's cycle costs
//! - 21 asynchronous I/O units driven through a host [`Frontend`]

pub mod memory;
pub mod registers;
pub mod decode;
pub mod io;
pub mod frontend;
pub mod execute;

pub use memory::{Memory, MemoryError, MEMORY_SIZE};
pub use registers::{Comparison, Register, Registers};
pub use decode::{Instruction, Operation};
pub use io::{CharTransfer, ControlOp, Device, Direction, Transfer, WordTransfer};
pub use frontend::{Frontend, Warning};
pub use execute::{BootStep, Cpu, RunState, StepOutcome};
