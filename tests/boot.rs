//! Boot a one-card program through the reference peripherals.

use mix::host::{run, Stop};
use mix::{Cpu, Deck, Peripherals, Word};

// Word 0: OUT 8(18); word 1: HLT; words 8 and 9 hold the text.
const CARD: &str = " H Q7   BE                              HELLO MIX ";

#[test]
fn test_boot_prints_and_halts() {
    let deck = Deck::parse(CARD).unwrap();
    let words = deck.card_words(0).unwrap();
    assert_eq!(words[0], Word::from_bytes(false, [0, 8, 0, 18, 37]));
    assert_eq!(words[1], Word::from_bytes(false, [0, 0, 0, 2, 5]));

    let mut peripherals = Peripherals::new();
    peripherals.load_deck(&deck);
    let mut cpu = Cpu::new(peripherals);
    cpu.boot();

    let report = run(&mut cpu, 50, 100_000);

    assert_eq!(report.stop, Stop::Halted);
    assert!(cpu.is_halted());
    assert!(cpu.regs.j.is_zero());
    assert_eq!(cpu.regs.pc, 2);
    assert_eq!(cpu.frontend().printed_lines().collect::<Vec<_>>(), vec!["HELLO MIX"]);
    assert!(cpu.frontend().warnings().is_empty());
}

#[test]
fn test_boot_without_cards_starves() {
    let mut cpu = Cpu::new(Peripherals::new());
    cpu.boot();
    let report = run(&mut cpu, 50, 100_000);
    assert_eq!(report.stop, Stop::Starved(mix::Device::CardReader));
    assert_eq!(report.cycles, 50);
}
