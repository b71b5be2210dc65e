//! Host-side tooling around the machine.
//!
//! This module provides:
//! - A disassembler (words → MIXAL text)
//! - Card deck files
//! - In-memory reference peripherals and a driver loop that services them

pub mod disasm;
pub mod deck;
pub mod devices;

pub use disasm::{disassemble, disassemble_word, mnemonic};
pub use deck::{load_deck, save_deck, Deck, DeckError, CARD_WIDTH};
pub use devices::{Peripherals, WordStore};

use serde::{Serialize, Deserialize};
use crate::cpu::{Cpu, Device, RunState};

/// How a [`run`] ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Stop {
    /// The machine halted.
    Halted,
    /// The machine waits for input that will never arrive.
    Starved(Device),
    /// The cycle limit was reached.
    CycleLimit,
}

/// Summary of a [`run`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    /// Cycles consumed by this run.
    pub cycles: u64,
    /// Why the run ended.
    pub stop: Stop,
}

/// Drive the machine in slices of `budget` cycles, servicing peripherals
/// between slices, until it halts, starves or uses `max_cycles`.
pub fn run(cpu: &mut Cpu<Peripherals>, budget: u64, max_cycles: u64) -> RunReport {
    let budget = budget.max(1);
    let mut cycles = 0u64;

    loop {
        let outcome = cpu.step(budget);
        cycles += outcome.cycles;
        let serviced = Peripherals::service(cpu);

        if outcome.halted {
            return RunReport { cycles, stop: Stop::Halted };
        }
        if serviced == 0 {
            let waiting = match cpu.state() {
                RunState::WaitDevice(device) => Some(device),
                RunState::Boot(_) => Some(Device::CardReader),
                _ => None,
            };
            if let Some(device) = waiting.filter(|&d| cpu.frontend().is_starved(d)) {
                log::debug!("{} has no more input", device);
                return RunReport { cycles, stop: Stop::Starved(device) };
            }
        }
        if cycles >= max_cycles {
            return RunReport { cycles, stop: Stop::CycleLimit };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cpu::decode::{encode, Instruction, Operation};

    #[test]
    fn test_run_halts() {
        let mut cpu = Cpu::new(Peripherals::new());
        cpu.load_program(0, &[encode(&Instruction::new(Operation::Special, 0, 0, 2))]).unwrap();
        cpu.start(0);

        let report = run(&mut cpu, 100, 10_000);
        assert_eq!(report, RunReport { cycles: 100, stop: Stop::Halted });
    }

    #[test]
    fn test_run_reports_starvation() {
        let mut cpu = Cpu::new(Peripherals::new());
        cpu.boot();
        let report = run(&mut cpu, 100, 10_000);
        assert_eq!(report.stop, Stop::Starved(Device::CardReader));
    }

    #[test]
    fn test_run_cycle_limit() {
        // JMP 0: spin forever.
        let mut cpu = Cpu::new(Peripherals::new());
        cpu.load_program(0, &[encode(&Instruction::new(Operation::Jump, 0, 0, 0))]).unwrap();
        cpu.start(0);

        let report = run(&mut cpu, 100, 1000);
        assert_eq!(report, RunReport { cycles: 1000, stop: Stop::CycleLimit });
    }
}
