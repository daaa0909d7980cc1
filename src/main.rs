//! Card Ledger Engine CLI
//!
//! Command-line interface for replaying card ledger operations from CSV
//! files.
//!
//! # Usage
//!
//! ```bash
//! cargo run -- operations.csv > cards.csv
//! cargo run -- --invoices operations.csv > state.csv
//! cargo run -- --today 2025-01-15 operations.csv > cards.csv
//! ```
//!
//! The program reads ledger operations from the input CSV file, replays
//! them through the engine, and outputs the final card states (and, with
//! `--invoices`, the invoice table) to stdout. Diagnostics go to stderr;
//! set `RUST_LOG` to control verbosity.
//!
//! # Exit Codes
//!
//! - 0: Success
//! - 1: Error (missing arguments, file not found, file not readable, etc.)

use card_ledger_engine::{cli, replay, LedgerEngine, MemoryStore, ReplayConfig};
use chrono::Utc;
use std::process;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    // Parse command-line arguments using clap
    let args = cli::parse_args();

    let config = ReplayConfig {
        today: args.today.unwrap_or_else(|| Utc::now().date_naive()),
        include_invoices: args.invoices,
    };

    let engine = LedgerEngine::new(Arc::new(MemoryStore::new()));

    // Replay operations from the input file; output goes to stdout
    let mut output = std::io::stdout();
    if let Err(e) = replay(&engine, &args.input_file, config, &mut output).await {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
