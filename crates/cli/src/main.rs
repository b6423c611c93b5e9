use clap::{Parser, Subcommand};
use relog_cli::commands::{inspect, tail};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "relog")]
#[command(about = "Relog forensic CLI - inspect the durable event journal", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show coverage and the status breakdown for a journal file.
    Inspect {
        /// Path to the journal file.
        log_path: PathBuf,
    },
    /// Print the last records of a journal file.
    Tail {
        /// Path to the journal file.
        log_path: PathBuf,

        /// Number of records to show.
        #[arg(long, short, default_value_t = 10)]
        count: usize,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Inspect { log_path } => inspect::run(&log_path),
        Commands::Tail { log_path, count } => tail::run(&log_path, count),
    }
}
