//! I/O devices and transfer descriptors.
//!
//! An IN or OUT instruction does not move any data by itself. It fills in
//! the descriptor for its device and tells the frontend that a transfer has
//! begun; the device backend then drains or fills memory at its own pace
//! through the stream adapters on [`CharTransfer`] and [`WordTransfer`].

use std::fmt;
use crate::cpu::memory::{next_address, Memory};
use crate::word::{MixChar, Word, BYTES_PER_WORD, BYTE_BITS, BYTE_MASK, MAGNITUDE_MASK};
use serde::{Serialize, Deserialize};

/// Number of device units (ids 0..=20).
pub const DEVICE_COUNT: usize = 21;

/// Words per block on tapes, disks and drums.
pub const WORD_BLOCK: usize = 100;

/// Bits held by the character shift buffer.
const BUFFER_MASK: u32 = MAGNITUDE_MASK;

/// Shift that brings byte 1 of the buffer down to bits 0..5.
const LEAD_SHIFT: u32 = BYTE_BITS * (BYTES_PER_WORD as u32 - 1);

/// A MIX I/O unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Device {
    /// Magnetic tape units 0..=7.
    Tape(u8),
    /// Disk or drum units 8..=15, numbered 0..=7 here.
    Disk(u8),
    /// Unit 16.
    CardReader,
    /// Unit 17.
    CardPunch,
    /// Unit 18.
    LinePrinter,
    /// Unit 19, typewriter or terminal.
    Typewriter,
    /// Unit 20.
    PaperTape,
}

impl Device {
    /// Look up a unit by its id (the F byte of an I/O instruction).
    pub const fn from_id(id: u8) -> Option<Self> {
        match id {
            0..=7 => Some(Device::Tape(id)),
            8..=15 => Some(Device::Disk(id - 8)),
            16 => Some(Device::CardReader),
            17 => Some(Device::CardPunch),
            18 => Some(Device::LinePrinter),
            19 => Some(Device::Typewriter),
            20 => Some(Device::PaperTape),
            _ => None,
        }
    }

    /// The unit id.
    pub const fn id(self) -> u8 {
        match self {
            Device::Tape(n) => n & 0x7,
            Device::Disk(n) => 8 + (n & 0x7),
            Device::CardReader => 16,
            Device::CardPunch => 17,
            Device::LinePrinter => 18,
            Device::Typewriter => 19,
            Device::PaperTape => 20,
        }
    }

    /// Index of this unit in per-device tables.
    #[inline]
    pub const fn slot(self) -> usize {
        self.id() as usize
    }

    /// Every unit, in id order.
    pub fn all() -> impl Iterator<Item = Device> {
        (0..DEVICE_COUNT as u8).filter_map(Device::from_id)
    }

    /// True for units that transfer whole words (tapes, disks, drums).
    pub const fn is_word_device(self) -> bool {
        matches!(self, Device::Tape(_) | Device::Disk(_))
    }

    /// True for tape units.
    pub const fn is_tape(self) -> bool {
        matches!(self, Device::Tape(_))
    }

    /// Items moved by one IN or OUT: words for word devices, characters
    /// for the others.
    pub const fn block_size(self) -> usize {
        match self {
            Device::Tape(_) | Device::Disk(_) => WORD_BLOCK,
            Device::CardReader | Device::CardPunch => 80,
            Device::LinePrinter => 120,
            Device::Typewriter | Device::PaperTape => 70,
        }
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Device::Tape(n) => write!(f, "tape {}", n),
            Device::Disk(n) => write!(f, "disk {}", n),
            Device::CardReader => write!(f, "card reader"),
            Device::CardPunch => write!(f, "card punch"),
            Device::LinePrinter => write!(f, "line printer"),
            Device::Typewriter => write!(f, "typewriter"),
            Device::PaperTape => write!(f, "paper tape"),
        }
    }
}

/// Direction of a transfer, seen from memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Device to memory (IN).
    In,
    /// Memory to device (OUT).
    Out,
}

/// Positioning requests issued by IOC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ControlOp {
    /// Line printer: advance to the top of the next page.
    SkipToNextPage,
    /// Tape: back to the beginning.
    Rewind(Device),
    /// Tape: move back by `words` words.
    SkipBackward { tape: Device, words: usize },
    /// Tape: move forward by `words` words.
    SkipForward { tape: Device, words: usize },
}

/// Progress of a character-mode transfer.
///
/// Characters travel through a 30-bit shift buffer holding one word; the
/// cursor steps to the next address every five characters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharTransfer {
    /// Characters still to move.
    pub remain: usize,
    /// Next memory address to load or store.
    pub address: usize,
    /// Characters already shifted through the buffer (0..=4).
    pub position: usize,
    /// Shift buffer.
    pub buffer: u32,
}

impl CharTransfer {
    /// A fresh descriptor.
    ///
    /// Output transfers preload the first word and advance the cursor;
    /// input transfers start with an empty buffer.
    pub fn start(mem: &Memory, address: usize, count: usize, direction: Direction) -> Self {
        let mut transfer = Self {
            remain: count,
            address,
            position: 0,
            buffer: 0,
        };
        if direction == Direction::Out {
            transfer.buffer = mem.read(address).magnitude();
            transfer.address = next_address(address);
        }
        transfer
    }

    /// True once every character has moved.
    #[inline]
    pub fn is_done(&self) -> bool {
        self.remain == 0
    }

    /// Take characters from memory (OUT). Returns the new remaining count.
    pub fn read_chars(&mut self, mem: &Memory, out: &mut [MixChar]) -> usize {
        let count = out.len().min(self.remain);
        for slot in &mut out[..count] {
            *slot = MixChar::from_code((self.buffer >> LEAD_SHIFT) as u8);
            self.buffer = (self.buffer << BYTE_BITS) & BUFFER_MASK;
            self.position += 1;
            if self.position == BYTES_PER_WORD {
                self.buffer = mem.read(self.address).magnitude();
                self.address = next_address(self.address);
                self.position = 0;
            }
        }
        self.remain -= count;
        self.remain
    }

    /// Put characters into memory (IN). Returns the new remaining count.
    ///
    /// Each completed word is stored with a positive sign.
    pub fn write_chars(&mut self, mem: &mut Memory, input: &[MixChar]) -> usize {
        let count = input.len().min(self.remain);
        for c in &input[..count] {
            self.buffer = ((self.buffer << BYTE_BITS) | (u32::from(c.code()) & BYTE_MASK)) & BUFFER_MASK;
            self.position += 1;
            if self.position == BYTES_PER_WORD {
                mem.write(self.address, Word::new(false, self.buffer));
                self.address = next_address(self.address);
                self.position = 0;
                self.buffer = 0;
            }
        }
        self.remain -= count;
        self.remain
    }
}

/// Progress of a word-mode transfer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordTransfer {
    /// Words still to move.
    pub remain: usize,
    /// Next memory address.
    pub address: usize,
    /// Disk block named by X when the instruction ran; 0 for tapes.
    pub block: usize,
}

impl WordTransfer {
    /// A fresh descriptor.
    pub fn start(address: usize, count: usize, block: usize) -> Self {
        Self { remain: count, address, block }
    }

    /// True once every word has moved.
    #[inline]
    pub fn is_done(&self) -> bool {
        self.remain == 0
    }

    /// Take words from memory (OUT). Returns the new remaining count.
    pub fn read_words(&mut self, mem: &Memory, out: &mut [Word]) -> usize {
        let count = out.len().min(self.remain);
        for slot in &mut out[..count] {
            *slot = mem.read(self.address);
            self.address = next_address(self.address);
        }
        self.remain -= count;
        self.remain
    }

    /// Put words into memory (IN). Returns the new remaining count.
    pub fn write_words(&mut self, mem: &mut Memory, input: &[Word]) -> usize {
        let count = input.len().min(self.remain);
        for &word in &input[..count] {
            mem.write(self.address, word);
            self.address = next_address(self.address);
        }
        self.remain -= count;
        self.remain
    }
}

/// The descriptor slot of one device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Transfer {
    Char(CharTransfer),
    Word(WordTransfer),
}

impl Transfer {
    /// An idle descriptor of the right mode for `device`.
    pub fn idle(device: Device) -> Self {
        if device.is_word_device() {
            Transfer::Word(WordTransfer::default())
        } else {
            Transfer::Char(CharTransfer::default())
        }
    }

    /// Items still to move.
    pub fn remain(&self) -> usize {
        match self {
            Transfer::Char(t) => t.remain,
            Transfer::Word(t) => t.remain,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codes(s: &str) -> Vec<MixChar> {
        MixChar::encode_str(s).unwrap()
    }

    #[test]
    fn test_device_ids() {
        for id in 0..DEVICE_COUNT as u8 {
            assert_eq!(Device::from_id(id).unwrap().id(), id);
        }
        assert_eq!(Device::from_id(21), None);
        assert_eq!(Device::all().count(), DEVICE_COUNT);
        assert_eq!(Device::from_id(9), Some(Device::Disk(1)));
    }

    #[test]
    fn test_block_sizes() {
        assert_eq!(Device::Tape(3).block_size(), 100);
        assert_eq!(Device::Disk(7).block_size(), 100);
        assert_eq!(Device::CardReader.block_size(), 80);
        assert_eq!(Device::CardPunch.block_size(), 80);
        assert_eq!(Device::LinePrinter.block_size(), 120);
        assert_eq!(Device::Typewriter.block_size(), 70);
        assert_eq!(Device::PaperTape.block_size(), 70);
        assert!(Device::Tape(0).is_tape());
        assert!(!Device::Disk(0).is_tape());
        assert!(Device::Disk(0).is_word_device());
        assert!(!Device::LinePrinter.is_word_device());
    }

    #[test]
    fn test_write_chars_packs_words() {
        let mut mem = Memory::new();
        let mut t = CharTransfer::start(&mem, 100, 10, Direction::In);

        assert_eq!(t.write_chars(&mut mem, &codes("HEL")), 7);
        assert!(mem.read(100).is_zero());
        assert_eq!(t.write_chars(&mut mem, &codes("LO MIX....")), 0);

        assert_eq!(mem.read(100), Word::from_bytes(false, [8, 5, 13, 13, 16]));
        assert_eq!(mem.read(101), Word::from_bytes(false, [0, 14, 9, 27, 40]));
        assert_eq!(t.address, 102);
        assert_eq!(t.position, 0);
    }

    #[test]
    fn test_read_chars_unpacks_words() {
        let mut mem = Memory::new();
        mem.write(3999, Word::from_bytes(true, [8, 5, 13, 13, 16]));
        mem.write(0, Word::from_bytes(false, [0, 14, 9, 27, 0]));

        let mut t = CharTransfer::start(&mem, 3999, 8, Direction::Out);
        assert_eq!(t.address, 0);

        let mut out = [MixChar::SPACE; 6];
        assert_eq!(t.read_chars(&mem, &mut out), 2);
        assert_eq!(MixChar::decode_str(&out), "HELLO ");

        let mut rest = [MixChar::SPACE; 6];
        assert_eq!(t.read_chars(&mem, &mut rest), 0);
        assert_eq!(MixChar::decode_str(&rest[..2]), "MI");
    }

    #[test]
    fn test_word_transfers_wrap() {
        let mut mem = Memory::new();
        let mut t = WordTransfer::start(3999, 3, 0);
        let input = [Word::from_i64(1), Word::from_i64(-2), Word::from_i64(3), Word::from_i64(4)];

        assert_eq!(t.write_words(&mut mem, &input), 0);
        assert_eq!(mem.read(3999).to_i64(), 1);
        assert_eq!(mem.read(0).to_i64(), -2);
        assert_eq!(mem.read(1).to_i64(), 3);
        assert!(mem.read(2).is_zero());

        let mut t = WordTransfer::start(3999, 2, 0);
        let mut out = [Word::ZERO; 1];
        assert_eq!(t.read_words(&mem, &mut out), 1);
        assert_eq!(out[0].to_i64(), 1);
        assert_eq!(t.read_words(&mem, &mut out), 0);
        assert_eq!(out[0].to_i64(), -2);
        assert!(t.is_done());
    }

    #[test]
    fn test_idle_descriptor_mode() {
        assert!(matches!(Transfer::idle(Device::Tape(0)), Transfer::Word(_)));
        assert!(matches!(Transfer::idle(Device::PaperTape), Transfer::Char(_)));
        assert_eq!(Transfer::idle(Device::CardReader).remain(), 0);
    }
}
