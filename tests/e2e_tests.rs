//! End-to-end integration tests
//!
//! These tests validate the complete replay pipeline using predefined CSV
//! test fixtures. Each test:
//! 1. Reads input.csv from a fixture directory
//! 2. Replays all operations through the engine
//! 3. Generates output CSV (card table plus invoice table)
//! 4. Compares actual output with expected.csv
//!
//! Test fixtures are located in tests/fixtures/ and cover:
//! - Happy path scenarios
//! - Installment purchases
//! - Update reversal and delete zeroing flows
//! - Invoice payment and limit recalculation
//! - Error conditions (malformed rows, missing references)
//!
//! Replay runs with a fixed injected "today" (2025-06-05) so limit
//! recalculations are deterministic.

#[cfg(test)]
mod tests {
    use card_ledger_engine::{replay, LedgerEngine, MemoryStore, ReplayConfig};
    use chrono::NaiveDate;
    use rstest::rstest;
    use std::fs;
    use std::io::Write;
    use std::path::Path;
    use std::sync::Arc;
    use tempfile::NamedTempFile;

    /// Run a test fixture by replaying input.csv and comparing with
    /// expected.csv
    ///
    /// # Arguments
    ///
    /// * `fixture_name` - Name of the fixture directory (e.g. "happy_path")
    ///
    /// # Panics
    ///
    /// Panics if:
    /// - Input or expected files cannot be read
    /// - Output doesn't match expected
    async fn run_test_fixture(fixture_name: &str) {
        let fixture_dir = format!("tests/fixtures/{}", fixture_name);
        let input_path = format!("{}/input.csv", fixture_dir);
        let expected_path = format!("{}/expected.csv", fixture_dir);

        assert!(
            Path::new(&input_path).exists(),
            "Input file not found: {}",
            input_path
        );
        assert!(
            Path::new(&expected_path).exists(),
            "Expected file not found: {}",
            expected_path
        );

        let engine = LedgerEngine::new(Arc::new(MemoryStore::new()));
        let config = ReplayConfig {
            today: NaiveDate::from_ymd_opt(2025, 6, 5).unwrap(),
            include_invoices: true,
        };

        let mut temp_output = NamedTempFile::new().expect("Failed to create temp file");
        replay(&engine, Path::new(&input_path), config, &mut temp_output)
            .await
            .unwrap_or_else(|e| panic!("Failed to replay operations: {}", e));
        temp_output.flush().expect("Failed to flush temp file");

        let actual_output = fs::read_to_string(temp_output.path())
            .unwrap_or_else(|e| panic!("Failed to read temp output file: {}", e));
        let expected_output = fs::read_to_string(&expected_path)
            .unwrap_or_else(|e| panic!("Failed to read expected file {}: {}", expected_path, e));

        assert_eq!(
            actual_output, expected_output,
            "\n\nOutput mismatch for fixture: {}\n\nActual output:\n{}\n\nExpected output:\n{}\n",
            fixture_name, actual_output, expected_output
        );
    }

    /// End-to-end test for all fixtures
    #[rstest]
    #[case("happy_path")]
    #[case("installment_purchase")]
    #[case("update_reversal")]
    #[case("delete_zeroing")]
    #[case("pay_invoice")]
    #[case("limit_recalculation")]
    #[case("malformed_rows")]
    #[case("multiple_cards")]
    #[tokio::test]
    async fn test_fixtures(#[case] fixture: &str) {
        run_test_fixture(fixture).await;
    }
}
