//! CSV replay pipeline
//!
//! Reads an operations CSV, dispatches each operation through the ledger
//! engine, and writes the resulting card states (and optionally the
//! invoice table) as CSV.
//!
//! Individual operation failures are recoverable: they are logged and
//! replay continues with the next row. Fatal errors (file not found, I/O
//! failure, output not writable) abort the replay.

use crate::core::{LedgerEngine, Storage};
use crate::io::csv_format::{write_cards_csv, write_invoices_csv, Operation};
use crate::io::OperationReader;
use crate::types::LedgerError;
use chrono::NaiveDate;
use std::io::Write;
use std::path::Path;
use tokio_util::compat::TokioAsyncReadCompatExt;
use tracing::warn;

/// Rows read per batch during replay
const BATCH_SIZE: usize = 1000;

/// Replay configuration
#[derive(Debug, Clone, Copy)]
pub struct ReplayConfig {
    /// The date limit recalculation anchors on
    pub today: NaiveDate,

    /// Whether to append the invoice table after the card table
    pub include_invoices: bool,
}

/// Replay an operations CSV through the engine and write final state
///
/// # Arguments
///
/// * `engine` - The ledger engine to dispatch operations through
/// * `input_path` - Path to the operations CSV
/// * `config` - Replay configuration (injected today, output selection)
/// * `output` - Writer the final state CSV goes to
///
/// # Errors
///
/// Returns an error if the input file cannot be opened or output cannot
/// be written. Per-operation failures (unknown card, invalid amount, ...)
/// are logged and skipped.
pub async fn replay<S: Storage>(
    engine: &LedgerEngine<S>,
    input_path: &Path,
    config: ReplayConfig,
    output: &mut dyn Write,
) -> Result<(), LedgerError> {
    let file = tokio::fs::File::open(input_path).await?;
    let mut reader = OperationReader::new(file.compat());

    loop {
        let batch = reader.read_batch(BATCH_SIZE).await;
        if batch.is_empty() {
            break;
        }
        for operation in batch {
            if let Err(e) = dispatch(engine, operation, config.today).await {
                warn!(error = %e, "operation failed, continuing");
            }
        }
    }

    let cards = engine.storage().list_cards().await?;
    write_cards_csv(&cards, output)?;

    if config.include_invoices {
        let invoices = engine.storage().list_invoices().await?;
        write_invoices_csv(&invoices, output)?;
    }

    Ok(())
}

async fn dispatch<S: Storage>(
    engine: &LedgerEngine<S>,
    operation: Operation,
    today: NaiveDate,
) -> Result<(), LedgerError> {
    match operation {
        Operation::AddCard(card) => {
            engine.create_card(card).await?;
        }
        Operation::Charge(request) => {
            engine.create_charge(request).await?;
        }
        Operation::UpdateCharge { charge_id, request } => {
            engine.update_charge(charge_id, request).await?;
        }
        Operation::DeleteCharge { charge_id } => {
            engine.delete_charge(charge_id).await?;
        }
        Operation::SetLimit { card_id, limit } => {
            engine.set_card_limit(card_id, limit, today).await?;
        }
        Operation::PayInvoice { invoice_id, paid } => {
            engine.set_invoice_paid(invoice_id, paid).await?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use std::io::Write as _;
    use std::sync::Arc;
    use tempfile::NamedTempFile;

    const HEADER: &str = "op,card,charge,invoice,name,bank,closing_day,due_day,limit,description,amount,date,type,installments,installment,year,month,paid\n";

    fn write_input(rows: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}{}", HEADER, rows).unwrap();
        file.flush().unwrap();
        file
    }

    fn config() -> ReplayConfig {
        ReplayConfig {
            today: NaiveDate::from_ymd_opt(2025, 1, 15).unwrap(),
            include_invoices: false,
        }
    }

    #[tokio::test]
    async fn test_replay_applies_operations_in_order() {
        let input = write_input(
            "card,,,,Gold,Acme Bank,10,15,1000.00,,,,,,,,,\n\
             charge,1,,,,,,,,Groceries,250.00,2025-01-05,expense,1,,,,\n\
             delete,,1,,,,,,,,,,,,,,,\n",
        );

        let engine = LedgerEngine::new(Arc::new(MemoryStore::new()));
        let mut output = Vec::new();
        replay(&engine, input.path(), config(), &mut output)
            .await
            .unwrap();

        let text = String::from_utf8(output).unwrap();
        // Charge was applied then fully reverted by the delete.
        assert_eq!(
            text,
            "card,name,bank,closing_day,due_day,limit,current_limit\n\
             1,Gold,Acme Bank,10,15,1000.00,1000.00\n"
        );
    }

    #[tokio::test]
    async fn test_replay_skips_failing_operations() {
        // The second charge references a card that does not exist.
        let input = write_input(
            "card,,,,Gold,Acme Bank,10,15,1000.00,,,,,,,,,\n\
             charge,1,,,,,,,,Groceries,100.00,2025-01-05,expense,1,,,,\n\
             charge,9,,,,,,,,Phantom,500.00,2025-01-05,expense,1,,,,\n",
        );

        let engine = LedgerEngine::new(Arc::new(MemoryStore::new()));
        let mut output = Vec::new();
        replay(&engine, input.path(), config(), &mut output)
            .await
            .unwrap();

        let text = String::from_utf8(output).unwrap();
        assert!(text.contains("1,Gold,Acme Bank,10,15,1000.00,900.00"));
    }

    #[tokio::test]
    async fn test_replay_missing_file_is_fatal() {
        let engine = LedgerEngine::new(Arc::new(MemoryStore::new()));
        let mut output = Vec::new();

        let result = replay(
            &engine,
            Path::new("does-not-exist.csv"),
            config(),
            &mut output,
        )
        .await;

        assert!(matches!(result.unwrap_err(), LedgerError::IoError { .. }));
    }
}
