//! LS-8 Emulator - CLI Entry Point
//!
//! Commands:
//! - `ls8-emu run <program>` - Load and run a program image
//! - `ls8-emu disasm <program>` - Disassemble a program image

use clap::{Parser, Subcommand};
use log::LevelFilter;
use simple_logger::SimpleLogger;

#[derive(Parser)]
#[command(name = "ls8-emu")]
#[command(version = "0.1.0")]
#[command(about = "An emulator for the LS-8 8-bit register machine")]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a program until it halts or faults
    Run {
        /// Path to the program image (.ls8)
        program: String,
        /// Stop after this many instructions
        #[arg(short, long)]
        max_steps: Option<u64>,
        /// Print a state dump before every instruction
        #[arg(short, long)]
        trace: bool,
        /// Print the final machine state as JSON
        #[arg(long)]
        dump_state: bool,
    },
    /// Disassemble a program image
    Disasm {
        /// Path to the program image (.ls8)
        program: String,
    },
}

fn main() {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    if let Err(e) = SimpleLogger::new().with_level(level).init() {
        eprintln!("failed to initialize logger: {}", e);
    }

    match cli.command {
        Commands::Run { program, max_steps, trace, dump_state } => {
            run_program(&program, max_steps, trace, dump_state);
        }
        Commands::Disasm { program } => {
            disassemble_file(&program);
        }
    }
}

fn read_image(path: &str) -> Vec<u8> {
    match ls8::load_program(path) {
        Ok(image) => image,
        Err(e) => {
            eprintln!("❌ Failed to load {}: {}", path, e);
            std::process::exit(1);
        }
    }
}

fn run_program(path: &str, max_steps: Option<u64>, trace: bool, dump_state: bool) {
    let opts = ls8::RunOptions { max_steps, trace, dump_state };

    let stdout = std::io::stdout();
    let report = ls8::run_file(path, &opts, &mut stdout.lock());

    if let Some(message) = report.diagnostic {
        eprintln!("{}", message);
    }
    std::process::exit(report.status);
}

fn disassemble_file(path: &str) {
    let image = read_image(path);
    print!("{}", ls8::disassemble(&image));
}
