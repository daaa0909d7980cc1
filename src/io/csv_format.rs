//! CSV format handling for replay operations and state output
//!
//! This module centralizes all CSV format concerns, providing:
//! - CsvOperation structure for deserialization
//! - Conversion from CSV rows to engine operations
//! - Card and invoice state serialization
//!
//! All functions are pure (no I/O) for easy testing.
//!
//! # Input format
//!
//! One row per operation. Columns irrelevant to an operation stay empty:
//!
//! ```text
//! op,card,charge,invoice,name,bank,closing_day,due_day,limit,description,amount,date,type,installments,installment,year,month,paid
//! card,,,,Gold,Acme Bank,10,15,1000.00,,,,,,,,,
//! charge,1,,,,,,,,Groceries,120.50,2025-01-05,expense,1,,,,
//! delete,,1,,,,,,,,,,,,,,,
//! ```

use crate::types::{
    Card, CardId, ChargeId, ChargeType, CreateChargeRequest, Invoice, InvoiceId, InvoicePeriod,
    LedgerError, NewCard, UpdateChargeRequest,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::io::Write;
use std::str::FromStr;

/// CSV row structure for deserialization
///
/// Every column is optional at the CSV level; which ones are required
/// depends on the operation and is enforced by [`convert_operation`].
#[derive(Debug, Deserialize, Clone, PartialEq, Default)]
pub struct CsvOperation {
    pub op: String,
    pub card: Option<CardId>,
    pub charge: Option<ChargeId>,
    pub invoice: Option<InvoiceId>,
    pub name: Option<String>,
    pub bank: Option<String>,
    pub closing_day: Option<u8>,
    pub due_day: Option<u8>,
    pub limit: Option<String>,
    pub description: Option<String>,
    pub amount: Option<String>,
    pub date: Option<String>,
    #[serde(rename = "type")]
    pub charge_type: Option<String>,
    pub installments: Option<u32>,
    pub installment: Option<String>,
    pub year: Option<i32>,
    pub month: Option<u32>,
    pub paid: Option<bool>,
}

/// A parsed engine operation, ready for dispatch
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    /// Register a card
    AddCard(NewCard),
    /// Create a charge or installment purchase
    Charge(CreateChargeRequest),
    /// Overwrite an existing charge
    UpdateCharge {
        charge_id: ChargeId,
        request: UpdateChargeRequest,
    },
    /// Delete a charge
    DeleteCharge { charge_id: ChargeId },
    /// Change a card's credit ceiling
    SetLimit { card_id: CardId, limit: Decimal },
    /// Toggle an invoice's paid flag
    PayInvoice { invoice_id: InvoiceId, paid: bool },
}

fn require<T>(value: Option<T>, field: &str) -> Result<T, LedgerError> {
    value.ok_or_else(|| LedgerError::parse_error(None, &format!("missing column '{}'", field)))
}

fn parse_decimal(value: &str, field: &str) -> Result<Decimal, LedgerError> {
    Decimal::from_str(value.trim()).map_err(|_| {
        LedgerError::parse_error(None, &format!("invalid {} '{}'", field, value))
    })
}

fn parse_date(value: &str) -> Result<NaiveDate, LedgerError> {
    value
        .trim()
        .parse::<NaiveDate>()
        .map_err(|_| LedgerError::parse_error(None, &format!("invalid date '{}'", value)))
}

fn parse_charge_type(value: &str) -> Result<ChargeType, LedgerError> {
    match value.trim().to_lowercase().as_str() {
        "expense" => Ok(ChargeType::Expense),
        "income" => Ok(ChargeType::Income),
        other => Err(LedgerError::parse_error(
            None,
            &format!("invalid charge type '{}'", other),
        )),
    }
}

fn parse_period(year: Option<i32>, month: Option<u32>) -> Result<Option<InvoicePeriod>, LedgerError> {
    match (year, month) {
        (Some(year), Some(month)) => InvoicePeriod::new(year, month)
            .map(Some)
            .ok_or_else(|| LedgerError::parse_error(None, &format!("invalid month {}", month))),
        (None, None) => Ok(None),
        _ => Err(LedgerError::parse_error(
            None,
            "year and month must be given together",
        )),
    }
}

/// Convert a CsvOperation row to an engine Operation
///
/// This function:
/// - Dispatches on the `op` column
/// - Enforces the required columns for each operation
/// - Parses amounts into Decimals, dates into NaiveDates, and (year,
///   month) pairs into invoice periods
///
/// # Returns
///
/// * `Ok(Operation)` - Successfully converted row
/// * `Err(LedgerError)` - Describing the conversion failure
pub fn convert_operation(row: CsvOperation) -> Result<Operation, LedgerError> {
    match row.op.to_lowercase().as_str() {
        "card" => {
            let limit = require(row.limit, "limit")?;
            Ok(Operation::AddCard(NewCard {
                name: require(row.name, "name")?,
                bank: require(row.bank, "bank")?,
                closing_day: require(row.closing_day, "closing_day")?,
                due_day: require(row.due_day, "due_day")?,
                limit: parse_decimal(&limit, "limit")?,
            }))
        }
        "charge" => {
            let amount = require(row.amount, "amount")?;
            let date = require(row.date, "date")?;
            let charge_type = require(row.charge_type, "type")?;
            Ok(Operation::Charge(CreateChargeRequest {
                card_id: require(row.card, "card")?,
                description: require(row.description, "description")?,
                amount: parse_decimal(&amount, "amount")?,
                date: parse_date(&date)?,
                charge_type: parse_charge_type(&charge_type)?,
                installments: row.installments.unwrap_or(1),
                period: parse_period(row.year, row.month)?,
            }))
        }
        "update" => {
            let amount = require(row.amount, "amount")?;
            let date = require(row.date, "date")?;
            let charge_type = require(row.charge_type, "type")?;
            let period = parse_period(row.year, row.month)?.ok_or_else(|| {
                LedgerError::parse_error(None, "update requires year and month")
            })?;
            Ok(Operation::UpdateCharge {
                charge_id: require(row.charge, "charge")?,
                request: UpdateChargeRequest {
                    description: require(row.description, "description")?,
                    amount: parse_decimal(&amount, "amount")?,
                    date: parse_date(&date)?,
                    installment: row.installment,
                    period,
                    charge_type: parse_charge_type(&charge_type)?,
                },
            })
        }
        "delete" => Ok(Operation::DeleteCharge {
            charge_id: require(row.charge, "charge")?,
        }),
        "set_limit" => {
            let limit = require(row.limit, "limit")?;
            Ok(Operation::SetLimit {
                card_id: require(row.card, "card")?,
                limit: parse_decimal(&limit, "limit")?,
            })
        }
        "pay" => Ok(Operation::PayInvoice {
            invoice_id: require(row.invoice, "invoice")?,
            paid: row.paid.unwrap_or(true),
        }),
        other => Err(LedgerError::invalid_operation(other, None)),
    }
}

/// Write card states to CSV format
///
/// Writes cards with columns: card, name, bank, closing_day, due_day,
/// limit, current_limit. Cards are expected pre-sorted by id for
/// deterministic output.
pub fn write_cards_csv(cards: &[Card], output: &mut dyn Write) -> Result<(), LedgerError> {
    let mut writer = csv::Writer::from_writer(output);

    writer.write_record([
        "card",
        "name",
        "bank",
        "closing_day",
        "due_day",
        "limit",
        "current_limit",
    ])?;

    for card in cards {
        writer.write_record(&[
            card.id.to_string(),
            card.name.clone(),
            card.bank.clone(),
            card.closing_day.to_string(),
            card.due_day.to_string(),
            format!("{:.2}", card.limit),
            format!("{:.2}", card.current_limit),
        ])?;
    }

    writer.flush()?;
    Ok(())
}

/// Write invoice states to CSV format
///
/// Writes invoices with columns: invoice, card, period, description,
/// amount, due_date, is_paid.
pub fn write_invoices_csv(invoices: &[Invoice], output: &mut dyn Write) -> Result<(), LedgerError> {
    let mut writer = csv::Writer::from_writer(output);

    writer.write_record([
        "invoice",
        "card",
        "period",
        "description",
        "amount",
        "due_date",
        "is_paid",
    ])?;

    for invoice in invoices {
        writer.write_record(&[
            invoice.id.to_string(),
            invoice.card_id.to_string(),
            invoice.period.to_string(),
            invoice.description.clone(),
            format!("{:.2}", invoice.amount),
            invoice.due_date.to_string(),
            invoice.is_paid.to_string(),
        ])?;
    }

    writer.flush()?;
    Ok(())
}
