//! Error types for the card ledger engine
//!
//! This module defines all error types that can occur while maintaining the
//! card credit ledger and its invoice aggregates. Errors are designed to be
//! descriptive and user-friendly for CLI output.
//!
//! # Error Categories
//!
//! - **Lookup Errors**: Referenced card, charge, or invoice does not exist
//! - **Validation Errors**: Invalid amounts, cycle days, missing fields -
//!   raised before any side effect
//! - **Arithmetic Errors**: Overflow in balance calculations
//! - **Replay Errors**: Malformed CSV rows, unknown operations, I/O failures

use crate::types::{CardId, ChargeId, InvoiceId};
use rust_decimal::Decimal;
use thiserror::Error;

/// Main error type for the card ledger engine
///
/// This enum represents all possible errors that can occur during charge
/// lifecycle processing. Each variant includes relevant context to help
/// diagnose and resolve the issue.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LedgerError {
    /// The referenced card does not exist
    ///
    /// Raised before any mutation; nothing is written.
    #[error("Card {card_id} not found")]
    CardNotFound {
        /// Card ID that was not found
        card_id: CardId,
    },

    /// The referenced charge does not exist
    ///
    /// Update surfaces this to the caller; Delete maps it to a `false`
    /// no-op result.
    #[error("Charge {charge_id} not found")]
    ChargeNotFound {
        /// Charge ID that was not found
        charge_id: ChargeId,
    },

    /// The referenced invoice does not exist
    #[error("Invoice {invoice_id} not found")]
    InvoiceNotFound {
        /// Invoice ID that was not found
        invoice_id: InvoiceId,
    },

    /// Amount must be strictly positive
    ///
    /// Applies to charge amounts and card limits. Rejected before any
    /// side effect.
    #[error("Invalid amount {amount}: must be greater than zero")]
    InvalidAmount {
        /// The rejected amount
        amount: Decimal,
    },

    /// Closing or due day outside the 1-31 range
    #[error("Invalid {field} {day}: must be between 1 and 31")]
    InvalidCycleDay {
        /// Which cycle field was invalid ("closing day" or "due day")
        field: String,
        /// The rejected day value
        day: u8,
    },

    /// A required card field was empty
    #[error("Missing required field: {field}")]
    MissingField {
        /// Name of the missing field
        field: String,
    },

    /// Installment count must be at least 1
    #[error("Invalid installment count {count}: must be at least 1")]
    InvalidInstallmentCount {
        /// The rejected count
        count: u32,
    },

    /// Arithmetic overflow would occur
    ///
    /// The operation is rejected and the card is left unchanged.
    #[error("Arithmetic overflow in {operation} for card {card_id}")]
    ArithmeticOverflow {
        /// Operation that would overflow
        operation: String,
        /// Card ID
        card_id: CardId,
    },

    /// CSV parsing error occurred
    ///
    /// Recoverable during replay - the malformed row is skipped and
    /// processing continues with the next row.
    #[error("CSV parse error{}: {message}", line.map(|l| format!(" at line {}", l)).unwrap_or_default())]
    ParseError {
        /// Line number where the error occurred (if available)
        line: Option<u64>,
        /// Description of the parsing error
        message: String,
    },

    /// Unknown operation name in a replay row
    ///
    /// Recoverable - the row is skipped.
    #[error("Invalid operation '{op}'{}", line.map(|l| format!(" at line {}", l)).unwrap_or_default())]
    InvalidOperation {
        /// The unrecognized operation string
        op: String,
        /// Line number (if available)
        line: Option<u64>,
    },

    /// I/O error occurred while reading or writing files
    ///
    /// Typically fatal (file permissions, disk full, etc.).
    #[error("I/O error: {message}")]
    IoError {
        /// Description of the I/O error
        message: String,
    },
}

impl From<std::io::Error> for LedgerError {
    fn from(error: std::io::Error) -> Self {
        LedgerError::IoError {
            message: error.to_string(),
        }
    }
}

impl From<csv::Error> for LedgerError {
    fn from(error: csv::Error) -> Self {
        let line = error.position().map(|pos| pos.line());

        LedgerError::ParseError {
            line,
            message: error.to_string(),
        }
    }
}

// Helper functions for creating common errors

impl LedgerError {
    /// Create a CardNotFound error
    pub fn card_not_found(card_id: CardId) -> Self {
        LedgerError::CardNotFound { card_id }
    }

    /// Create a ChargeNotFound error
    pub fn charge_not_found(charge_id: ChargeId) -> Self {
        LedgerError::ChargeNotFound { charge_id }
    }

    /// Create an InvoiceNotFound error
    pub fn invoice_not_found(invoice_id: InvoiceId) -> Self {
        LedgerError::InvoiceNotFound { invoice_id }
    }

    /// Create an InvalidAmount error
    pub fn invalid_amount(amount: Decimal) -> Self {
        LedgerError::InvalidAmount { amount }
    }

    /// Create an InvalidCycleDay error
    pub fn invalid_cycle_day(field: &str, day: u8) -> Self {
        LedgerError::InvalidCycleDay {
            field: field.to_string(),
            day,
        }
    }

    /// Create a MissingField error
    pub fn missing_field(field: &str) -> Self {
        LedgerError::MissingField {
            field: field.to_string(),
        }
    }

    /// Create an InvalidInstallmentCount error
    pub fn invalid_installment_count(count: u32) -> Self {
        LedgerError::InvalidInstallmentCount { count }
    }

    /// Create an ArithmeticOverflow error
    pub fn arithmetic_overflow(operation: &str, card_id: CardId) -> Self {
        LedgerError::ArithmeticOverflow {
            operation: operation.to_string(),
            card_id,
        }
    }

    /// Create a ParseError
    pub fn parse_error(line: Option<u64>, message: &str) -> Self {
        LedgerError::ParseError {
            line,
            message: message.to_string(),
        }
    }

    /// Create an InvalidOperation error
    pub fn invalid_operation(op: &str, line: Option<u64>) -> Self {
        LedgerError::InvalidOperation {
            op: op.to_string(),
            line,
        }
    }
}
