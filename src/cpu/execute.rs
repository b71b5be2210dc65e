//! Execution engine for MIX.
//!
//! Implements the fetch-decode-execute cycle, the run-state machine that
//! drives booting and device waits, and every instruction behavior.

use crate::cpu::decode::{decode, Instruction, Operation};
use crate::cpu::frontend::{Frontend, Warning};
use crate::cpu::io::{
    CharTransfer, ControlOp, Device, Direction, Transfer, WordTransfer, DEVICE_COUNT, WORD_BLOCK,
};
use crate::cpu::memory::{next_address, Memory, MemoryError, MAX_ADDRESS, MEMORY_SIZE};
use crate::cpu::registers::{Comparison, Register, Registers};
use crate::word::{arith, decimal, shift, FieldSpec, MixChar, ShiftKind, Word};
use serde::{Serialize, Deserialize};

/// Progress of the boot sequence started by [`Cpu::boot`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BootStep {
    /// Waiting for the card reader before asking for the first card.
    AwaitReader,
    /// Waiting for the first card to land at address 0.
    AwaitCard,
}

/// What the driver does on its next iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunState {
    /// Executing instructions.
    Running,
    /// Stopped by HLT, a stop request, or never started.
    Halted,
    /// An I/O instruction found its device busy and will be retried.
    WaitDevice(Device),
    /// Loading the first card.
    Boot(BootStep),
}

/// Result of one [`Cpu::step`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepOutcome {
    /// Cycles consumed. At least the requested budget.
    pub cycles: u64,
    /// True if the machine is halted.
    pub halted: bool,
}

/// The MIX machine.
///
/// Owns memory, registers, flags and the per-device transfer descriptors.
/// Everything outside the machine goes through the frontend `F`.
pub struct Cpu<F: Frontend> {
    /// CPU registers.
    pub regs: Registers,
    /// Main memory.
    pub mem: Memory,
    /// Total cycles consumed since creation or the last reset.
    pub cycles: u64,
    state: RunState,
    /// A "waiting" notification for the card reader is outstanding.
    reader_notified: bool,
    transfers: [Transfer; DEVICE_COUNT],
    last_instr: Option<Instruction>,
    frontend: F,
}

fn idle_transfers() -> [Transfer; DEVICE_COUNT] {
    std::array::from_fn(|slot| match Device::from_id(slot as u8) {
        Some(device) => Transfer::idle(device),
        None => Transfer::Char(CharTransfer::default()),
    })
}

impl<F: Frontend> Cpu<F> {
    /// Create a halted machine with zeroed memory and registers.
    pub fn new(frontend: F) -> Self {
        Self {
            regs: Registers::new(),
            mem: Memory::new(),
            cycles: 0,
            state: RunState::Halted,
            reader_notified: false,
            transfers: idle_transfers(),
            last_instr: None,
            frontend,
        }
    }

    /// Return to the freshly created state. The frontend is kept.
    pub fn reset(&mut self) {
        self.regs.reset();
        self.mem.clear();
        self.cycles = 0;
        self.state = RunState::Halted;
        self.reader_notified = false;
        self.transfers = idle_transfers();
        self.last_instr = None;
    }

    /// Press GO: read the first card into 0..15 and jump to 0.
    pub fn boot(&mut self) {
        self.set_state(RunState::Boot(BootStep::AwaitReader));
    }

    /// Copy a program into memory.
    pub fn load_program(&mut self, start: usize, program: &[Word]) -> Result<(), MemoryError> {
        self.mem.load_program(start, program)
    }

    /// Start executing at `pc` without booting.
    pub fn start(&mut self, pc: usize) {
        self.regs.jump(pc.min(MAX_ADDRESS));
        self.set_state(RunState::Running);
    }

    /// Run for at least `budget` cycles, or until the machine halts.
    ///
    /// A halted machine or one waiting on a busy device consumes the rest
    /// of the budget, so the returned count never falls short of it. Stop
    /// requests from the frontend are checked once, after the budget.
    pub fn step(&mut self, budget: u64) -> StepOutcome {
        let mut remaining = budget;
        let mut spent = 0u64;

        while remaining > 0 {
            let cost = match self.state {
                RunState::Running => self.execute_next(),
                RunState::Halted => remaining,
                RunState::WaitDevice(device) => {
                    if self.frontend.device_busy(device) {
                        remaining
                    } else {
                        self.set_state(RunState::Running);
                        self.frontend.notify_waiting(device, false);
                        0
                    }
                }
                RunState::Boot(step) => self.boot_step(step, remaining),
            };
            spent += cost;
            remaining = remaining.saturating_sub(cost);
        }

        if self.frontend.check_signals() {
            match self.state {
                RunState::WaitDevice(device) => self.frontend.notify_waiting(device, false),
                _ if self.reader_notified => {
                    self.reader_notified = false;
                    self.frontend.notify_waiting(Device::CardReader, false);
                }
                _ => {}
            }
            log::debug!("stop requested");
            self.set_state(RunState::Halted);
        }

        self.cycles += spent;
        StepOutcome {
            cycles: spent,
            halted: self.state == RunState::Halted,
        }
    }

    /// Current run state.
    pub fn state(&self) -> RunState {
        self.state
    }

    /// True if the machine is halted.
    pub fn is_halted(&self) -> bool {
        self.state == RunState::Halted
    }

    /// The most recently fetched instruction.
    pub fn last_instruction(&self) -> Option<Instruction> {
        self.last_instr
    }

    /// The descriptor of `device`'s latest transfer.
    pub fn transfer(&self, device: Device) -> &Transfer {
        &self.transfers[device.slot()]
    }

    /// Borrow the frontend.
    pub fn frontend(&self) -> &F {
        &self.frontend
    }

    /// Mutably borrow the frontend.
    pub fn frontend_mut(&mut self) -> &mut F {
        &mut self.frontend
    }

    // ==================== Stream adapters ====================

    /// Drain characters of an OUT transfer on `device`.
    /// Returns the characters still to go.
    pub fn read_chars(&mut self, device: Device, out: &mut [MixChar]) -> usize {
        match &mut self.transfers[device.slot()] {
            Transfer::Char(t) => t.read_chars(&self.mem, out),
            Transfer::Word(_) => {
                log::warn!("{} is not a character device", device);
                0
            }
        }
    }

    /// Fill characters of an IN transfer on `device`.
    /// Returns the characters still to go.
    pub fn write_chars(&mut self, device: Device, input: &[MixChar]) -> usize {
        match &mut self.transfers[device.slot()] {
            Transfer::Char(t) => t.write_chars(&mut self.mem, input),
            Transfer::Word(_) => {
                log::warn!("{} is not a character device", device);
                0
            }
        }
    }

    /// Drain words of an OUT transfer on `device`.
    /// Returns the words still to go.
    pub fn read_words(&mut self, device: Device, out: &mut [Word]) -> usize {
        match &mut self.transfers[device.slot()] {
            Transfer::Word(t) => t.read_words(&self.mem, out),
            Transfer::Char(_) => {
                log::warn!("{} is not a word device", device);
                0
            }
        }
    }

    /// Fill words of an IN transfer on `device`.
    /// Returns the words still to go.
    pub fn write_words(&mut self, device: Device, input: &[Word]) -> usize {
        match &mut self.transfers[device.slot()] {
            Transfer::Word(t) => t.write_words(&mut self.mem, input),
            Transfer::Char(_) => {
                log::warn!("{} is not a word device", device);
                0
            }
        }
    }

    // ==================== Driver ====================

    fn set_state(&mut self, state: RunState) {
        if self.state != state {
            log::debug!("run state {:?} -> {:?}", self.state, state);
        }
        self.state = state;
    }

    fn boot_step(&mut self, step: BootStep, remaining: u64) -> u64 {
        if self.frontend.device_busy(Device::CardReader) {
            if !self.reader_notified {
                self.reader_notified = true;
                self.frontend.notify_waiting(Device::CardReader, true);
            }
            return remaining;
        }
        if self.reader_notified {
            self.reader_notified = false;
            self.frontend.notify_waiting(Device::CardReader, false);
        }

        match step {
            BootStep::AwaitReader => {
                let device = Device::CardReader;
                let transfer = CharTransfer::start(&self.mem, 0, device.block_size(), Direction::In);
                self.transfers[device.slot()] = Transfer::Char(transfer);
                self.frontend.begin_char_io(device, &transfer, Direction::In);
                self.set_state(RunState::Boot(BootStep::AwaitCard));
            }
            BootStep::AwaitCard => {
                self.regs.jump(0);
                self.regs.j = Word::ZERO;
                self.set_state(RunState::Running);
            }
        }
        0
    }

    /// Fetch, decode and execute one instruction. Returns its cost.
    fn execute_next(&mut self) -> u64 {
        if self.regs.pc > MAX_ADDRESS {
            self.warn(Warning::AddressOutOfRange {
                value: self.regs.pc as i64,
                address: self.regs.pc,
            });
            self.regs.jump(MAX_ADDRESS);
        }
        let address = self.regs.advance_pc();
        let instr = decode(self.mem.read(address));
        log::trace!("{:04}  {}", address, instr);
        self.last_instr = Some(instr);
        self.execute(instr)
    }

    fn execute(&mut self, instr: Instruction) -> u64 {
        match instr.operation {
            Operation::Nop => 1,

            // ==================== Arithmetic ====================

            Operation::Add | Operation::Sub => {
                let value = self.operand(&instr);
                let (result, overflow) = if instr.operation == Operation::Add {
                    arith::add(self.regs.a, value)
                } else {
                    arith::subtract(self.regs.a, value)
                };
                self.regs.a = result;
                self.raise_overflow(overflow);
                2
            }

            Operation::Mul => {
                let value = self.operand(&instr);
                let (a, x) = arith::multiply(self.regs.a, value);
                self.regs.a = a;
                self.regs.x = x;
                10
            }

            Operation::Div => {
                let value = self.operand(&instr);
                match arith::divide(self.regs.a, self.regs.x, value) {
                    Some((quotient, remainder)) => {
                        self.regs.a = quotient;
                        self.regs.x = remainder;
                    }
                    None => self.regs.overflow = true,
                }
                12
            }

            Operation::Special => self.special(&instr),
            Operation::Shift => self.shift(&instr),
            Operation::Move => self.move_words(&instr),

            // ==================== Data Transfer ====================

            Operation::Load(reg) => {
                let value = self.operand(&instr);
                self.regs.set(reg, value);
                2
            }

            Operation::LoadNegative(reg) => {
                let value = self.operand(&instr);
                self.regs.set(reg, value.negated());
                2
            }

            Operation::Store(reg) => {
                self.store(&instr, self.regs.get(reg));
                2
            }

            Operation::StoreJ => {
                self.store(&instr, self.regs.j);
                2
            }

            Operation::StoreZero => {
                self.store(&instr, Word::ZERO);
                2
            }

            // ==================== Input/Output ====================

            Operation::JumpBusy => {
                self.jump_on_device(&instr, true);
                1
            }

            Operation::JumpReady => {
                self.jump_on_device(&instr, false);
                1
            }

            Operation::IoControl => self.io_control(&instr),

            Operation::Input => {
                self.start_io(&instr, Direction::In);
                1
            }

            Operation::Output => {
                self.start_io(&instr, Direction::Out);
                1
            }

            // ==================== Control Flow ====================

            Operation::Jump => {
                self.jump_group(&instr);
                1
            }

            Operation::JumpRegister(reg) => {
                self.jump_register(&instr, reg);
                1
            }

            Operation::Modify(reg) => {
                self.modify(&instr, reg);
                1
            }

            Operation::Compare(reg) => {
                let field = self.field(&instr);
                let address = self.address(&instr);
                let ordering = field.compare(self.regs.get(reg), self.mem.read(address));
                self.regs.comparison = Comparison::from(ordering);
                2
            }
        }
    }

    // ==================== Operand helpers ====================

    fn warn(&mut self, warning: Warning) {
        self.frontend.warning(&warning);
    }

    fn unsupported(&mut self, instr: &Instruction) {
        self.warn(Warning::UnsupportedOperation {
            opcode: instr.opcode(),
            field: instr.field,
            address: self.regs.old_pc,
        });
    }

    fn raise_overflow(&mut self, overflow: bool) {
        if overflow {
            self.regs.overflow = true;
        }
    }

    /// The field named by F, or (0:5) after a warning.
    fn field(&mut self, instr: &Instruction) -> FieldSpec {
        match FieldSpec::from_f(instr.field) {
            Ok(field) => field,
            Err(_) => {
                self.warn(Warning::InvalidField {
                    field: instr.field,
                    address: self.regs.old_pc,
                });
                FieldSpec::FULL
            }
        }
    }

    /// Indexed address, unclamped.
    fn value_m(&mut self, instr: &Instruction) -> i64 {
        let mut index = instr.index;
        if index > 6 {
            self.warn(Warning::InvalidIndex {
                index,
                address: self.regs.old_pc,
            });
            index = 6;
        }
        i64::from(instr.address) + self.regs.index_value(index)
    }

    /// Indexed address, clamped into memory.
    fn address(&mut self, instr: &Instruction) -> usize {
        let m = self.value_m(instr);
        if (0..MEMORY_SIZE as i64).contains(&m) {
            m as usize
        } else {
            self.warn(Warning::AddressOutOfRange {
                value: m,
                address: self.regs.old_pc,
            });
            MAX_ADDRESS
        }
    }

    fn operand(&mut self, instr: &Instruction) -> Word {
        let field = self.field(instr);
        let address = self.address(instr);
        field.load(self.mem.read(address))
    }

    fn store(&mut self, instr: &Instruction, value: Word) {
        let field = self.field(instr);
        let address = self.address(instr);
        let stored = field.store(self.mem.read(address), value);
        self.mem.write(address, stored);
    }

    // ==================== Instruction groups ====================

    fn special(&mut self, instr: &Instruction) -> u64 {
        match instr.field {
            0 => self.regs.a = decimal::num(self.regs.a, self.regs.x),
            1 => {
                let (a, x) = decimal::chars(self.regs.a, self.regs.x);
                self.regs.a = a;
                self.regs.x = x;
            }
            2 => self.set_state(RunState::Halted),
            _ => self.unsupported(instr),
        }
        10
    }

    fn shift(&mut self, instr: &Instruction) -> u64 {
        let count = self.value_m(instr);
        if count < 0 {
            self.warn(Warning::NegativeShift {
                count,
                address: self.regs.old_pc,
            });
            return 2;
        }
        let Some(kind) = ShiftKind::from_f(instr.field) else {
            self.unsupported(instr);
            return 2;
        };

        let (a, x) = shift::shift(kind, self.regs.a, self.regs.x, count as u64);
        self.regs.a = a;
        self.regs.x = x;
        2
    }

    fn move_words(&mut self, instr: &Instruction) -> u64 {
        let count = u64::from(instr.field);
        if count == 0 {
            return 1;
        }

        let mut from = self.address(instr);
        let i1 = self.regs.get(Register::I1);
        if i1.is_negative() {
            self.warn(Warning::NegativeMoveTarget {
                target: i1.to_i64(),
                address: self.regs.old_pc,
            });
        }
        let mut to = i1.magnitude() as usize;
        if to > MAX_ADDRESS {
            self.warn(Warning::MoveTargetOutOfRange {
                target: to as i64,
                address: self.regs.old_pc,
            });
            to = MAX_ADDRESS;
        }

        for _ in 0..count {
            let word = self.mem.read(from);
            self.mem.write(to, word);
            from = next_address(from);
            to = next_address(to);
        }
        self.regs.set(Register::I1, Word::new(false, to as u32));

        2 * count + 1
    }

    /// The device named by F, or `None` after a warning.
    fn device(&mut self, instr: &Instruction) -> Option<Device> {
        let device = Device::from_id(instr.field);
        if device.is_none() {
            self.warn(Warning::InvalidDevice {
                device: instr.field,
                address: self.regs.old_pc,
            });
        }
        device
    }

    /// If `device` is busy, arrange to retry the current instruction once
    /// it is free. Returns true if the instruction must not proceed.
    fn wait_if_busy(&mut self, device: Device) -> bool {
        if !self.frontend.device_busy(device) {
            return false;
        }
        self.regs.rollback();
        self.set_state(RunState::WaitDevice(device));
        self.frontend.notify_waiting(device, true);
        true
    }

    fn start_io(&mut self, instr: &Instruction, direction: Direction) {
        let Some(device) = self.device(instr) else {
            return;
        };
        if self.wait_if_busy(device) {
            return;
        }

        let address = self.address(instr);
        if device.is_word_device() {
            let block = match device {
                Device::Disk(_) => self.regs.x.magnitude() as usize,
                _ => 0,
            };
            let transfer = WordTransfer::start(address, WORD_BLOCK, block);
            self.transfers[device.slot()] = Transfer::Word(transfer);
            self.frontend.begin_word_io(device, &transfer, direction);
        } else {
            let transfer = CharTransfer::start(&self.mem, address, device.block_size(), direction);
            self.transfers[device.slot()] = Transfer::Char(transfer);
            self.frontend.begin_char_io(device, &transfer, direction);
        }
    }

    fn io_control(&mut self, instr: &Instruction) -> u64 {
        let Some(device) = self.device(instr) else {
            return 0;
        };
        if self.wait_if_busy(device) {
            return 0;
        }

        let m = self.value_m(instr);
        let words = (m.unsigned_abs() as usize) * WORD_BLOCK;
        match device {
            Device::Tape(_) => {
                let op = match m {
                    0 => ControlOp::Rewind(device),
                    m if m < 0 => ControlOp::SkipBackward { tape: device, words },
                    _ => ControlOp::SkipForward { tape: device, words },
                };
                self.frontend.device_control(op);
            }
            Device::LinePrinter if m == 0 => self.frontend.device_control(ControlOp::SkipToNextPage),
            Device::LinePrinter => self.warn(Warning::UnsupportedPrinterControl {
                count: m,
                address: self.regs.old_pc,
            }),
            _ => self.warn(Warning::NoControl {
                device,
                address: self.regs.old_pc,
            }),
        }
        1
    }

    /// Jump to M, saving the return address in J unless `save_j` is false.
    fn jump_to(&mut self, instr: &Instruction, save_j: bool) {
        if save_j {
            self.regs.set_j(self.regs.pc);
        }
        let target = self.address(instr);
        self.regs.jump(target);
    }

    fn jump_on_device(&mut self, instr: &Instruction, when_busy: bool) {
        let Some(device) = self.device(instr) else {
            return;
        };
        if self.frontend.device_busy(device) == when_busy {
            self.jump_to(instr, true);
        }
    }

    fn jump_group(&mut self, instr: &Instruction) {
        let cmp = self.regs.comparison;
        let (taken, save_j) = match instr.field {
            0 => (true, true),
            1 => (true, false),
            2 => (std::mem::take(&mut self.regs.overflow), true),
            3 => (!std::mem::take(&mut self.regs.overflow), true),
            4 => (cmp == Comparison::Less, true),
            5 => (cmp == Comparison::Equal, true),
            6 => (cmp == Comparison::Greater, true),
            7 => (cmp != Comparison::Less, true),
            8 => (cmp != Comparison::Equal, true),
            9 => (cmp != Comparison::Greater, true),
            _ => {
                self.unsupported(instr);
                (false, false)
            }
        };
        if taken {
            self.jump_to(instr, save_j);
        }
    }

    fn jump_register(&mut self, instr: &Instruction, reg: Register) {
        let value = self.regs.get(reg).to_i64();
        let taken = match instr.field {
            0 => value < 0,
            1 => value == 0,
            2 => value > 0,
            3 => value >= 0,
            4 => value != 0,
            5 => value <= 0,
            _ => {
                self.unsupported(instr);
                false
            }
        };
        if taken {
            self.jump_to(instr, true);
        }
    }

    fn modify(&mut self, instr: &Instruction, reg: Register) {
        let m = self.value_m(instr);
        let current = self.regs.get(reg);
        let value = match instr.field {
            0 | 1 => {
                let delta = if instr.field == 0 { m } else { -m };
                let (result, overflow) = arith::add_value(current, delta);
                self.raise_overflow(overflow);
                result
            }
            2 | 3 => {
                let negate = instr.field == 3;
                if m == 0 {
                    Word::new(instr.negative != negate, 0)
                } else {
                    Word::from_i64(if negate { -m } else { m })
                }
            }
            _ => {
                self.unsupported(instr);
                return;
            }
        };
        self.regs.set(reg, value);
    }
}

impl<F: Frontend + Default> Default for Cpu<F> {
    fn default() -> Self {
        Self::new(F::default())
    }
}

impl<F: Frontend> std::fmt::Debug for Cpu<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cpu")
            .field("state", &self.state)
            .field("cycles", &self.cycles)
            .field("regs", &self.regs)
            .finish()
    }
}
