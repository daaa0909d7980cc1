//! I/O module
//!
//! Handles CSV parsing and output.
//!
//! # Components
//!
//! - `csv_format` - CSV format handling (operation conversion, state
//!   serialization)
//! - `reader` - Asynchronous CSV operation reader with batch interface

pub mod csv_format;
pub mod reader;

pub use csv_format::{
    convert_operation, write_cards_csv, write_invoices_csv, CsvOperation, Operation,
};
pub use reader::OperationReader;
