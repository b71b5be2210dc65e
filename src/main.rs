//! MIX Emulator - CLI Entry Point
//!
//! Commands:
//! - `mix-emu run <deck>` - Boot a card deck and run it to completion
//! - `mix-emu disasm <deck>` - Disassemble the words on each card
//! - `mix-emu charset` - Print the MIX character table
//! - `mix-emu test` - Run the built-in self-test

use clap::{Parser, Subcommand};
use serde::Serialize;

#[derive(Parser)]
#[command(name = "mix-emu")]
#[command(version = "0.1.0")]
#[command(about = "An emulator of Knuth's MIX computer")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Boot a card deck and run until the machine halts
    Run {
        /// Path to the card deck (one card per line)
        deck: String,
        /// Maximum number of cycles to run
        #[arg(short, long, default_value = "10000000")]
        max_cycles: u64,
        /// Cycles executed between device services
        #[arg(short, long, default_value = "1000")]
        budget: u64,
        /// Log every executed instruction
        #[arg(short, long)]
        trace: bool,
        /// Print the final machine state as JSON
        #[arg(long)]
        json: bool,
        /// Text file fed to the typewriter, one line per IN
        #[arg(long)]
        typewriter: Option<String>,
        /// Text file fed to the paper tape reader, one block per line
        #[arg(long)]
        paper_tape: Option<String>,
    },
    /// Disassemble the words of a card deck
    Disasm {
        /// Path to the card deck
        deck: String,
    },
    /// Print the MIX character table
    Charset,
    /// Run the built-in self-test
    Test,
}

fn main() {
    let cli = Cli::parse();

    let trace = matches!(cli.command, Some(Commands::Run { trace: true, .. }));
    init_logging(trace);

    match cli.command {
        Some(Commands::Run { deck, max_cycles, budget, json, typewriter, paper_tape, .. }) => {
            run_deck(&deck, max_cycles, budget, json, typewriter, paper_tape);
        }
        Some(Commands::Disasm { deck }) => {
            disassemble_deck(&deck);
        }
        Some(Commands::Charset) => {
            print_charset();
        }
        Some(Commands::Test) => {
            run_self_test();
        }
        None => {
            println!("MIX Emulator v0.1.0");
            println!("An emulator of Knuth's MIX computer");
            println!();
            println!("Use --help for available commands");
        }
    }
}

fn init_logging(trace: bool) {
    let mut builder = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    if trace {
        builder.filter_level(log::LevelFilter::Trace);
    }
    builder.init();
}

fn read_text(path: &str) -> String {
    match std::fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Failed to read {}: {}", path, e);
            std::process::exit(1);
        }
    }
}

fn load_deck_or_exit(path: &str) -> mix::Deck {
    match mix::load_deck(path) {
        Ok(deck) => deck,
        Err(e) => {
            eprintln!("Failed to load deck {}: {}", path, e);
            std::process::exit(1);
        }
    }
}

/// Final state printed by `run --json`.
#[derive(Serialize)]
struct Snapshot<'a> {
    report: mix::host::RunReport,
    state: mix::RunState,
    registers: &'a mix::Registers,
    printed: Vec<&'a str>,
    punched: String,
    typewriter: &'a [String],
    paper_tape: &'a [String],
    warnings: Vec<String>,
}

fn run_deck(
    path: &str,
    max_cycles: u64,
    budget: u64,
    json: bool,
    typewriter: Option<String>,
    paper_tape: Option<String>,
) {
    use mix::{Cpu, Peripherals};
    use mix::host::{run, Stop};

    let deck = load_deck_or_exit(path);
    if deck.is_empty() {
        eprintln!("Deck {} has no cards", path);
        std::process::exit(1);
    }

    let mut peripherals = Peripherals::new();
    peripherals.load_deck(&deck);
    if let Some(file) = typewriter {
        if let Err(e) = peripherals.type_lines(&read_text(&file)) {
            eprintln!("Typewriter input {}: {}", file, e);
            std::process::exit(1);
        }
    }
    if let Some(file) = paper_tape {
        if let Err(e) = peripherals.feed_paper_tape(&read_text(&file)) {
            eprintln!("Paper tape input {}: {}", file, e);
            std::process::exit(1);
        }
    }

    let mut cpu = Cpu::new(peripherals);
    cpu.boot();
    let report = run(&mut cpu, budget, max_cycles);
    let devices = cpu.frontend();

    if json {
        let snapshot = Snapshot {
            report,
            state: cpu.state(),
            registers: &cpu.regs,
            printed: devices.printed_lines().collect(),
            punched: devices.punched().to_text(),
            typewriter: devices.typewriter_output(),
            paper_tape: devices.paper_tape_output(),
            warnings: devices.warnings().iter().map(|w| w.to_string()).collect(),
        };
        match serde_json::to_string_pretty(&snapshot) {
            Ok(text) => println!("{}", text),
            Err(e) => {
                eprintln!("Failed to serialize state: {}", e);
                std::process::exit(1);
            }
        }
        return;
    }

    for (n, page) in devices.pages().iter().enumerate() {
        if n > 0 {
            println!("\x0c");
        }
        for line in page {
            println!("{}", line);
        }
    }
    for line in devices.typewriter_output() {
        println!("{}", line);
    }
    if !devices.punched().is_empty() {
        print!("{}", devices.punched().to_text());
    }
    for line in devices.paper_tape_output() {
        println!("{}", line);
    }

    eprintln!();
    eprintln!("Cycles: {}", report.cycles);
    eprintln!("A: {}  X: {}", cpu.regs.a, cpu.regs.x);
    eprintln!("Overflow: {}  Comparison: {:?}", cpu.regs.overflow, cpu.regs.comparison);
    match report.stop {
        Stop::Halted => eprintln!("Halted at {:04}", cpu.regs.pc),
        Stop::Starved(device) => {
            eprintln!("Stopped: {} has no more input", device);
            std::process::exit(2);
        }
        Stop::CycleLimit => {
            eprintln!("Reached max cycles limit ({}). Use --max-cycles to increase.", max_cycles);
            std::process::exit(2);
        }
    }
}

fn disassemble_deck(path: &str) {
    use mix::host::disassemble;

    let deck = load_deck_or_exit(path);
    for index in 0..deck.len() {
        if let Some(words) = deck.card_words(index) {
            println!("; card {}", index + 1);
            print!("{}", disassemble(&words, 0));
        }
    }
}

fn print_charset() {
    use mix::MixChar;

    for row in 0..14u8 {
        let cells: Vec<String> = (0..4u8)
            .map(|col| row + col * 14)
            .map(|code| format!("{:02} {}", code, MixChar::from_code(code)))
            .collect();
        println!("{}", cells.join("    "));
    }
}

fn run_self_test() {
    use mix::{Cpu, Deck, MixChar, Peripherals, Word};
    use mix::cpu::{Operation, Register};
    use mix::cpu::decode::{encode, Instruction};
    use mix::word::{arith, decimal, shift, ShiftKind};
    use mix::host::{run, Stop};

    println!("MIX Emulator Self-Test");
    println!();

    let mut passed = 0;
    let mut failed = 0;
    let mut check = |name: &str, ok: bool| {
        if ok {
            println!("{:<40} ok", name);
            passed += 1;
        } else {
            println!("{:<40} FAILED", name);
            failed += 1;
        }
    };

    let (a, x) = arith::multiply(Word::from_i64(-112), Word::from_i64(2));
    check("multiply signs", a == Word::new(true, 0) && x.to_i64() == -224);

    let quotient = arith::divide(Word::ZERO, Word::from_i64(17), Word::from_i64(3));
    check("divide", quotient == Some((Word::from_i64(5), Word::from_i64(2))));

    let (a, x) = shift::shift(
        ShiftKind::RightCircular,
        Word::from_bytes(false, [2, 3, 4, 0, 0]),
        Word::from_bytes(true, [5, 6, 7, 8, 9]),
        4,
    );
    check(
        "circular shift",
        a == Word::from_bytes(false, [6, 7, 8, 9, 2]) && x == Word::from_bytes(true, [3, 4, 0, 0, 5]),
    );

    let (a, x) = decimal::chars(Word::from_i64(-12977699), Word::ZERO);
    check("NUM of CHAR", decimal::num(a, x).to_i64() == -12977699);

    check(
        "character table",
        MixChar::encode_str("MIX").map(|c| MixChar::decode_str(&c)).ok().as_deref() == Some("MIX"),
    );

    // Boot a card that prints its own tail and halts.
    let mut card = vec![
        encode(&Instruction::new(Operation::Output, 2, 0, 18)),
        encode(&Instruction::new(Operation::Special, 0, 0, 2)),
    ]
    .into_iter()
    .flat_map(|w| w.bytes())
    .map(MixChar::from_code)
    .collect::<Vec<_>>();
    card.extend(MixChar::encode_str("SELF TEST").unwrap_or_default());

    let mut deck = Deck::new();
    deck.push_card(&card);
    let mut peripherals = Peripherals::new();
    peripherals.load_deck(&deck);
    let mut cpu = Cpu::new(peripherals);
    cpu.boot();
    let report = run(&mut cpu, 100, 100_000);
    check(
        "boot and print",
        report.stop == Stop::Halted && cpu.frontend().printed_lines().next() == Some("SELF TEST"),
    );
    check("J after boot", cpu.regs.j.is_zero() && cpu.regs.get(Register::A).is_zero());

    println!();
    println!("Results: {} passed, {} failed", passed, failed);

    if failed > 0 {
        std::process::exit(1);
    }
}
