//! MIX main memory.
//!
//! 4000 words, addresses 0 through 3999. Stream cursors and MOVE wrap from
//! 3999 back to 0.

use crate::word::Word;
use serde::{Serialize, Deserialize};
use thiserror::Error;

/// The number of words of memory.
pub const MEMORY_SIZE: usize = 4000;

/// Highest valid address.
pub const MAX_ADDRESS: usize = MEMORY_SIZE - 1;

/// The address after `addr`, wrapping at the end of memory.
#[inline]
pub const fn next_address(addr: usize) -> usize {
    if addr + 1 >= MEMORY_SIZE {
        0
    } else {
        addr + 1
    }
}

/// MIX memory: 4000 sign-magnitude words.
///
/// Serialized as a plain sequence of words; deserialization rejects any
/// other length.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Word>", into = "Vec<Word>")]
pub struct Memory {
    cells: Vec<Word>,
}

impl TryFrom<Vec<Word>> for Memory {
    type Error = MemoryError;

    fn try_from(cells: Vec<Word>) -> Result<Self, Self::Error> {
        if cells.len() != MEMORY_SIZE {
            return Err(MemoryError::WrongSize { size: cells.len() });
        }
        Ok(Self { cells })
    }
}

impl From<Memory> for Vec<Word> {
    fn from(mem: Memory) -> Self {
        mem.cells
    }
}

impl Memory {
    /// Create a new memory with all cells zeroed.
    pub fn new() -> Self {
        Self {
            cells: vec![Word::ZERO; MEMORY_SIZE],
        }
    }

    /// Read a cell.
    ///
    /// # Panics
    /// Panics if address is out of range.
    #[inline]
    pub fn read(&self, addr: usize) -> Word {
        assert!(addr < MEMORY_SIZE, "memory address {} out of range (0-{})", addr, MAX_ADDRESS);
        self.cells[addr]
    }

    /// Write a cell.
    ///
    /// # Panics
    /// Panics if address is out of range.
    #[inline]
    pub fn write(&mut self, addr: usize, value: Word) {
        assert!(addr < MEMORY_SIZE, "memory address {} out of range (0-{})", addr, MAX_ADDRESS);
        self.cells[addr] = value;
    }

    /// Clear all memory to +0.
    pub fn clear(&mut self) {
        self.cells.fill(Word::ZERO);
    }

    /// Copy a block of words into memory starting at `start`.
    pub fn load_program(&mut self, start: usize, program: &[Word]) -> Result<(), MemoryError> {
        if start > MEMORY_SIZE || program.len() > MEMORY_SIZE - start {
            return Err(MemoryError::ProgramTooLarge {
                size: program.len(),
                available: MEMORY_SIZE.saturating_sub(start),
            });
        }
        self.cells[start..start + program.len()].copy_from_slice(program);
        Ok(())
    }

    /// Dump memory contents (for debugging).
    pub fn dump(&self, start: usize, count: usize) -> Vec<(usize, Word)> {
        let end = start.saturating_add(count).min(MEMORY_SIZE);
        (start.min(end)..end).map(|i| (i, self.cells[i])).collect()
    }
}

impl Default for Memory {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Memory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let non_zero = self.cells.iter().filter(|cell| !cell.is_zero()).count();

        f.debug_struct("Memory")
            .field("non_zero_cells", &non_zero)
            .field("total_cells", &MEMORY_SIZE)
            .finish()
    }
}

/// Errors that can occur during memory operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MemoryError {
    #[error("program size {size} exceeds available space {available}")]
    ProgramTooLarge { size: usize, available: usize },

    #[error("memory image has {size} words, expected 4000")]
    WrongSize { size: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_read_write() {
        let mut mem = Memory::new();
        mem.write(3999, Word::from_i64(-42));
        assert_eq!(mem.read(3999).to_i64(), -42);
    }

    #[test]
    #[should_panic]
    fn test_memory_bounds() {
        Memory::new().read(MEMORY_SIZE);
    }

    #[test]
    fn test_next_address_wraps() {
        assert_eq!(next_address(0), 1);
        assert_eq!(next_address(3998), 3999);
        assert_eq!(next_address(3999), 0);
    }

    #[test]
    fn test_load_program() {
        let mut mem = Memory::new();
        let program = [Word::from_i64(1), Word::from_i64(2), Word::from_i64(3)];

        mem.load_program(3997, &program).unwrap();
        assert_eq!(mem.read(3997).to_i64(), 1);
        assert_eq!(mem.read(3999).to_i64(), 3);

        assert_eq!(
            mem.load_program(3998, &program),
            Err(MemoryError::ProgramTooLarge { size: 3, available: 2 })
        );
    }

    #[test]
    fn test_snapshot_requires_full_memory() {
        let mut mem = Memory::new();
        mem.write(3999, Word::from_i64(-9));
        let json = serde_json::to_string(&mem).unwrap();
        let restored: Memory = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, mem);

        let short = serde_json::from_str::<Memory>("[0, 1, 2]");
        assert!(short.unwrap_err().to_string().contains("memory image has 3 words"));
    }

    #[test]
    fn test_dump_and_clear() {
        let mut mem = Memory::new();
        mem.write(10, Word::from_i64(7));
        assert_eq!(mem.dump(9, 2), vec![(9, Word::ZERO), (10, Word::from_i64(7))]);
        assert_eq!(mem.dump(3999, 10).len(), 1);

        mem.clear();
        assert!(mem.read(10).is_zero());
    }
}
