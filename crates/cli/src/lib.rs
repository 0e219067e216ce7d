pub mod commands;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "offersense",
    about = "Offersense operator CLI",
    long_about = "Operate the offersense pipeline: migrations, demo data, offer ingestion, \
                  offline evaluation, config inspection, and readiness checks.",
    after_help = "Examples:\n  offersense doctor --json\n  offersense seed\n  offersense evaluate \"critical 2000 unit order of 10mm bolts\""
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Apply pending database migrations and return structured status output")]
    Migrate,
    #[command(about = "Load the deterministic demo quotation dataset into the store")]
    Seed,
    #[command(about = "Extract offers from a quotation text file and index them")]
    Ingest {
        #[arg(long, help = "Path to a plain-text quotation file")]
        file: String,
    },
    #[command(
        about = "Evaluate stored offers for a query using the deterministic offline path (no network)"
    )]
    Evaluate {
        #[arg(help = "Natural-language procurement query")]
        query: String,
        #[arg(long, help = "Number of candidates to retrieve before ranking")]
        top_k: Option<usize>,
    },
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
    #[command(about = "Validate config, collaborator readiness, and DB connectivity checks")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Migrate => commands::migrate::run(),
        Command::Seed => commands::seed::run(),
        Command::Ingest { file } => commands::ingest::run(&file),
        Command::Evaluate { query, top_k } => commands::evaluate::run(&query, top_k),
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
        Command::Doctor { json } => {
            commands::CommandResult { exit_code: 0, output: commands::doctor::run(json) }
        }
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
