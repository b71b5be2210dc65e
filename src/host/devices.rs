//! In-memory peripherals.
//!
//! [`Peripherals`] is a complete [`Frontend`] backed by plain buffers:
//! - card reader fed from a [`Deck`], card punch collecting a [`Deck`]
//! - line printer collecting pages of text
//! - typewriter and paper tape, each with an input queue and an output log
//! - eight tape units and eight disk units holding words
//!
//! A transfer started by IN or OUT keeps its device busy until the host
//! calls [`Peripherals::service`], which moves the data through the
//! machine's stream adapters.

use std::collections::VecDeque;
use crate::cpu::{CharTransfer, ControlOp, Cpu, Device, Direction, Frontend, Transfer, Warning, WordTransfer};
use crate::cpu::io::{DEVICE_COUNT, WORD_BLOCK};
use crate::host::deck::Deck;
use crate::word::{CharError, MixChar, Word};

/// Number of tape units, and of disk units.
pub const UNITS: usize = 8;

/// Blocks per disk unit. Transfers naming a block past the end are dropped.
pub const DISK_BLOCKS: usize = 4096;

/// A word-addressed storage medium.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WordStore {
    words: Vec<Word>,
    position: usize,
}

impl WordStore {
    /// A medium holding `words`, positioned at the start.
    pub fn from_words(words: Vec<Word>) -> Self {
        Self { words, position: 0 }
    }

    /// The recorded words.
    pub fn words(&self) -> &[Word] {
        &self.words
    }

    /// Current position, in words.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Read one block at `offset`. Unrecorded words read as +0.
    fn read_block(&self, offset: usize) -> [Word; WORD_BLOCK] {
        let mut block = [Word::ZERO; WORD_BLOCK];
        if offset < self.words.len() {
            let available = &self.words[offset..];
            let n = available.len().min(WORD_BLOCK);
            block[..n].copy_from_slice(&available[..n]);
        }
        block
    }

    /// Write one block at `offset`, growing the medium as needed.
    fn write_block(&mut self, offset: usize, block: &[Word]) {
        let end = offset + block.len();
        if self.words.len() < end {
            self.words.resize(end, Word::ZERO);
        }
        self.words[offset..end].copy_from_slice(block);
    }
}

/// Reference peripherals for the MIX machine.
#[derive(Debug, Clone, Default)]
pub struct Peripherals {
    pending: [Option<Direction>; DEVICE_COUNT],
    cards: VecDeque<Vec<MixChar>>,
    punched: Deck,
    pages: Vec<Vec<String>>,
    typewriter_input: VecDeque<Vec<MixChar>>,
    typewriter_output: Vec<String>,
    paper_tape_input: VecDeque<Vec<MixChar>>,
    paper_tape_output: Vec<String>,
    tapes: [WordStore; UNITS],
    disks: [WordStore; UNITS],
    warnings: Vec<Warning>,
}

impl Peripherals {
    /// Idle peripherals with empty media.
    pub fn new() -> Self {
        Self::default()
    }

    /// Put a deck in the card reader hopper, behind any cards already there.
    pub fn load_deck(&mut self, deck: &Deck) {
        self.cards.extend(deck.cards().map(|card| card.to_vec()));
    }

    /// Queue a line of typewriter input.
    pub fn type_line(&mut self, line: &str) -> Result<(), CharError> {
        self.typewriter_input.push_back(MixChar::encode_str(line)?);
        Ok(())
    }

    /// Queue typewriter input, one line per IN.
    pub fn type_lines(&mut self, text: &str) -> Result<(), CharError> {
        text.lines().try_for_each(|line| self.type_line(line))
    }

    /// Queue paper tape input, one block per line.
    pub fn feed_paper_tape(&mut self, text: &str) -> Result<(), CharError> {
        for line in text.lines() {
            self.paper_tape_input.push_back(MixChar::encode_str(line)?);
        }
        Ok(())
    }

    /// Mount a tape on unit `n` (0..=7).
    pub fn mount_tape(&mut self, n: usize, words: Vec<Word>) {
        self.tapes[n] = WordStore::from_words(words);
    }

    /// Tape unit `n`.
    pub fn tape(&self, n: usize) -> &WordStore {
        &self.tapes[n]
    }

    /// Disk unit `n` (device 8 + n).
    pub fn disk(&self, n: usize) -> &WordStore {
        &self.disks[n]
    }

    /// Replace the contents of disk unit `n`.
    pub fn mount_disk(&mut self, n: usize, words: Vec<Word>) {
        self.disks[n] = WordStore::from_words(words);
    }

    /// Cards produced by the punch.
    pub fn punched(&self) -> &Deck {
        &self.punched
    }

    /// Printed pages, one line per entry, trailing blanks trimmed.
    pub fn pages(&self) -> &[Vec<String>] {
        &self.pages
    }

    /// Every printed line, ignoring page breaks.
    pub fn printed_lines(&self) -> impl Iterator<Item = &str> {
        self.pages.iter().flatten().map(String::as_str)
    }

    /// Lines typed by the machine.
    pub fn typewriter_output(&self) -> &[String] {
        &self.typewriter_output
    }

    /// Blocks punched on paper tape.
    pub fn paper_tape_output(&self) -> &[String] {
        &self.paper_tape_output
    }

    /// Warnings reported by the machine so far.
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    /// True if `device` has a transfer in progress.
    pub fn is_pending(&self, device: Device) -> bool {
        self.pending[device.slot()].is_some()
    }

    /// True if `device` waits for input that will never arrive.
    pub fn is_starved(&self, device: Device) -> bool {
        self.pending[device.slot()] == Some(Direction::In) && self.input_queue(device).map_or(false, VecDeque::is_empty)
    }

    fn input_queue(&self, device: Device) -> Option<&VecDeque<Vec<MixChar>>> {
        match device {
            Device::CardReader => Some(&self.cards),
            Device::Typewriter => Some(&self.typewriter_input),
            Device::PaperTape => Some(&self.paper_tape_input),
            _ => None,
        }
    }

    fn next_input(&mut self, device: Device) -> Option<Vec<MixChar>> {
        let queue = match device {
            Device::CardReader => &mut self.cards,
            Device::Typewriter => &mut self.typewriter_input,
            Device::PaperTape => &mut self.paper_tape_input,
            _ => return None,
        };
        let mut chars = queue.pop_front()?;
        chars.resize(device.block_size(), MixChar::SPACE);
        Some(chars)
    }

    fn emit(&mut self, device: Device, chars: &[MixChar]) {
        let line = MixChar::decode_str(chars).trim_end_matches(' ').to_string();
        match device {
            Device::CardPunch => self.punched.push_card(chars),
            Device::LinePrinter => {
                if self.pages.is_empty() {
                    self.pages.push(Vec::new());
                }
                if let Some(page) = self.pages.last_mut() {
                    page.push(line);
                }
            }
            Device::Typewriter => self.typewriter_output.push(line),
            Device::PaperTape => self.paper_tape_output.push(line),
            _ => {}
        }
    }

    /// The medium and offset a word transfer on `device` uses, or `None`
    /// when a disk block lies past the end of the unit.
    fn word_store(&mut self, device: Device, block: usize) -> Option<(&mut WordStore, usize)> {
        match device {
            Device::Tape(n) => {
                let tape = &mut self.tapes[usize::from(n)];
                let offset = tape.position;
                tape.position += WORD_BLOCK;
                Some((tape, offset))
            }
            Device::Disk(_) if block >= DISK_BLOCKS => {
                log::warn!("{} has no block {}, dropping transfer", device, block);
                None
            }
            Device::Disk(n) => Some((&mut self.disks[usize::from(n)], block * WORD_BLOCK)),
            _ => unreachable!("{} is not a word device", device),
        }
    }

    /// Complete every pending transfer the media can satisfy.
    ///
    /// Disk transfers address the block X named when IN or OUT ran. Input
    /// devices with nothing left to read stay busy.
    /// Returns the number of transfers completed.
    pub fn service(cpu: &mut Cpu<Peripherals>) -> usize {
        let mut completed = 0;
        for device in Device::all() {
            let Some(direction) = cpu.frontend().pending[device.slot()] else {
                continue;
            };

            let block = match cpu.transfer(device) {
                Transfer::Word(transfer) => transfer.block,
                Transfer::Char(_) => 0,
            };
            match (device.is_word_device(), direction) {
                (true, Direction::In) => {
                    if let Some((store, offset)) = cpu.frontend_mut().word_store(device, block) {
                        let words = store.read_block(offset);
                        cpu.write_words(device, &words);
                    }
                }
                (true, Direction::Out) => {
                    let mut words = [Word::ZERO; WORD_BLOCK];
                    cpu.read_words(device, &mut words);
                    if let Some((store, offset)) = cpu.frontend_mut().word_store(device, block) {
                        store.write_block(offset, &words);
                    }
                }
                (false, Direction::In) => {
                    if matches!(device, Device::CardPunch | Device::LinePrinter) {
                        log::warn!("{} cannot read, dropping transfer", device);
                    } else {
                        let Some(chars) = cpu.frontend_mut().next_input(device) else {
                            continue;
                        };
                        cpu.write_chars(device, &chars);
                    }
                }
                (false, Direction::Out) => {
                    let mut chars = vec![MixChar::SPACE; device.block_size()];
                    cpu.read_chars(device, &mut chars);
                    cpu.frontend_mut().emit(device, &chars);
                }
            }

            log::debug!("{} transfer complete", device);
            cpu.frontend_mut().pending[device.slot()] = None;
            completed += 1;
        }
        completed
    }
}

impl Frontend for Peripherals {
    fn warning(&mut self, warning: &Warning) {
        log::warn!("{}", warning);
        self.warnings.push(warning.clone());
    }

    fn begin_char_io(&mut self, device: Device, transfer: &CharTransfer, direction: Direction) {
        log::debug!("{} {:?} {} chars at {}", device, direction, transfer.remain, transfer.address);
        self.pending[device.slot()] = Some(direction);
    }

    fn begin_word_io(&mut self, device: Device, transfer: &WordTransfer, direction: Direction) {
        log::debug!("{} {:?} {} words at {}", device, direction, transfer.remain, transfer.address);
        self.pending[device.slot()] = Some(direction);
    }

    fn device_busy(&mut self, device: Device) -> bool {
        self.is_pending(device)
    }

    fn device_control(&mut self, op: ControlOp) {
        log::debug!("control {:?}", op);
        match op {
            ControlOp::SkipToNextPage => self.pages.push(Vec::new()),
            ControlOp::Rewind(Device::Tape(n)) => self.tapes[usize::from(n)].position = 0,
            ControlOp::SkipBackward { tape: Device::Tape(n), words } => {
                let tape = &mut self.tapes[usize::from(n)];
                tape.position = tape.position.saturating_sub(words);
            }
            ControlOp::SkipForward { tape: Device::Tape(n), words } => {
                self.tapes[usize::from(n)].position += words;
            }
            other => log::warn!("ignoring control request {:?}", other),
        }
    }
}
