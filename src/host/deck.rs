//! Card decks.
//!
//! A deck file is plain text, one card per line:
//! - each line holds up to 80 characters of the MIX character set
//! - short lines are padded with blanks
//! - lowercase letters are read as uppercase; `~ [ #` stand for `Δ Σ Π`

use std::path::Path;
use std::io::Write;
use crate::word::{CharError, MixChar, Word, BYTES_PER_WORD};
use thiserror::Error;

/// Characters per punched card.
pub const CARD_WIDTH: usize = 80;

/// Words per card when read into memory.
pub const WORDS_PER_CARD: usize = CARD_WIDTH / BYTES_PER_WORD;

/// A deck of 80-column cards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Deck {
    cards: Vec<[MixChar; CARD_WIDTH]>,
}

impl Deck {
    /// Create an empty deck.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse deck text.
    pub fn parse(text: &str) -> Result<Self, DeckError> {
        let mut deck = Self::new();
        for (index, line) in text.lines().enumerate() {
            let line_no = index + 1;
            let length = line.chars().count();
            if length > CARD_WIDTH {
                return Err(DeckError::CardTooLong { line: line_no, length });
            }

            let mut card = [MixChar::SPACE; CARD_WIDTH];
            for (column, (slot, c)) in card.iter_mut().zip(line.chars()).enumerate() {
                *slot = MixChar::from_char(c).map_err(|source| DeckError::Unmapped {
                    line: line_no,
                    column: column + 1,
                    source,
                })?;
            }
            deck.cards.push(card);
        }
        Ok(deck)
    }

    /// Add a card, padding or truncating it to 80 columns.
    pub fn push_card(&mut self, chars: &[MixChar]) {
        let mut card = [MixChar::SPACE; CARD_WIDTH];
        let n = chars.len().min(CARD_WIDTH);
        card[..n].copy_from_slice(&chars[..n]);
        self.cards.push(card);
    }

    /// The cards, in reading order.
    pub fn cards(&self) -> impl Iterator<Item = &[MixChar]> {
        self.cards.iter().map(|card| &card[..])
    }

    /// Number of cards.
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// The words card `index` occupies once read into memory.
    pub fn card_words(&self, index: usize) -> Option<[Word; WORDS_PER_CARD]> {
        let card = self.cards.get(index)?;
        let mut words = [Word::ZERO; WORDS_PER_CARD];
        for (word, chunk) in words.iter_mut().zip(card.chunks(BYTES_PER_WORD)) {
            let mut bytes = [0u8; BYTES_PER_WORD];
            for (byte, c) in bytes.iter_mut().zip(chunk) {
                *byte = c.code();
            }
            *word = Word::from_bytes(false, bytes);
        }
        Some(words)
    }

    /// Render the deck as text, trailing blanks trimmed.
    pub fn to_text(&self) -> String {
        let mut text = String::new();
        for card in &self.cards {
            text.push_str(MixChar::decode_str(card).trim_end_matches(' '));
            text.push('\n');
        }
        text
    }
}

/// Load a deck from disk.
pub fn load_deck<P: AsRef<Path>>(path: P) -> Result<Deck, DeckError> {
    let text = std::fs::read_to_string(path.as_ref())?;
    Deck::parse(&text)
}

/// Save a deck to disk.
pub fn save_deck<P: AsRef<Path>>(path: P, deck: &Deck) -> Result<(), DeckError> {
    let mut file = std::fs::File::create(path.as_ref())?;
    file.write_all(deck.to_text().as_bytes())?;
    Ok(())
}

/// Errors that can occur while reading or writing decks.
#[derive(Debug, Error)]
pub enum DeckError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("line {line}: card has {length} columns (at most 80)")]
    CardTooLong { line: usize, length: usize },

    #[error("line {line}, column {column}: {source}")]
    Unmapped {
        line: usize,
        column: usize,
        source: CharError,
    },
}
