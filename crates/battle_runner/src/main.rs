//! Scripted battle replayer.
//!
//! Loads a JSON battle script (descriptor tables, two parties, a seed and
//! per-turn actions), drives the engine through it and prints the
//! narration.
//!
//! Usage:
//!   cargo run -p battle_runner -- run scripts/wild.json
//!   cargo run -p battle_runner -- run scripts/pvp.json --flat

use clap::{Parser, Subcommand};

mod cmd;
mod models;

#[derive(Parser)]
#[command(name = "battle_runner", about = "Replay scripted battles")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Replay a battle script and print the narration
    Run(cmd::run::RunArgs),
}

fn main() {
    let cli = Cli::parse();
    let result = match cli.command {
        Command::Run(args) => cmd::run::execute(args),
    };
    if let Err(err) = result {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
