use chrono::NaiveDate;
use clap::Parser;
use std::path::PathBuf;

/// Replay card ledger operations and report final card state
#[derive(Parser, Debug)]
#[command(name = "card-ledger")]
#[command(about = "Replay card ledger operations and report final card state", long_about = None)]
pub struct CliArgs {
    /// Input CSV file path containing ledger operations
    #[arg(value_name = "INPUT", help = "Path to the input CSV file")]
    pub input_file: PathBuf,

    /// Date used for period resolution in limit recalculations
    #[arg(
        long = "today",
        value_name = "DATE",
        help = "Date (YYYY-MM-DD) used for limit recalculation; defaults to the current UTC date"
    )]
    pub today: Option<NaiveDate>,

    /// Append the invoice table after the card table
    #[arg(long = "invoices", help = "Also output the invoice table")]
    pub invoices: bool,
}
