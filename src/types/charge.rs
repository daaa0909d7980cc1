//! Charge-related types for the card ledger engine
//!
//! This module defines card charges (individual dated expenses or refunds
//! belonging to exactly one invoice period) and the request types the
//! lifecycle orchestrator accepts.

use crate::types::{CardId, InvoicePeriod};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Charge identifier
///
/// Supports charge IDs from 0 to 4,294,967,295
pub type ChargeId = u32;

/// The direction of a card charge
///
/// An expense consumes credit and adds to the invoice total; an income
/// (refund or credit) frees credit and reduces what is owed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChargeType {
    /// A purchase - reduces the card's available credit
    Expense,

    /// A refund or credit - increases the card's available credit
    Income,
}

impl ChargeType {
    /// The signed ledger contribution of an amount under this type
    ///
    /// Expenses contribute `+amount`, incomes `-amount`. This single sign
    /// convention drives both the credit ledger (`current_limit = limit -
    /// sum of signed amounts`) and the invoice aggregate (the invoice
    /// total is the sum of signed amounts for its period).
    pub fn signed(self, amount: Decimal) -> Decimal {
        match self {
            ChargeType::Expense => amount,
            ChargeType::Income => -amount,
        }
    }
}

/// One dated charge or refund on a card
///
/// Belongs to exactly one invoice period. Installment purchases produce
/// several of these, one per month, labelled `"1/3"`, `"2/3"`, `"3/3"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardCharge {
    /// The charge ID
    pub id: ChargeId,

    /// The card this charge belongs to
    pub card_id: CardId,

    /// Human-readable description
    pub description: String,

    /// Charge amount (always > 0; direction comes from `charge_type`)
    pub amount: Decimal,

    /// Purchase date
    pub date: NaiveDate,

    /// Installment label in `"i/n"` form (`"1/1"` for single charges)
    pub installment: String,

    /// The invoice period this charge is billed under
    pub period: InvoicePeriod,

    /// Whether this charge is an expense or an income
    pub charge_type: ChargeType,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

/// An unsaved charge, produced by the orchestrator for the store to persist
#[derive(Debug, Clone, PartialEq)]
pub struct NewCharge {
    /// The card this charge belongs to
    pub card_id: CardId,

    /// Human-readable description
    pub description: String,

    /// Charge amount (> 0)
    pub amount: Decimal,

    /// Purchase date
    pub date: NaiveDate,

    /// Installment label in `"i/n"` form
    pub installment: String,

    /// The invoice period this charge is billed under
    pub period: InvoicePeriod,

    /// Whether this charge is an expense or an income
    pub charge_type: ChargeType,
}

impl NewCharge {
    /// Materialize the charge with the given id and creation timestamp
    pub fn into_charge(self, id: ChargeId, created_at: DateTime<Utc>) -> CardCharge {
        CardCharge {
            id,
            card_id: self.card_id,
            description: self.description,
            amount: self.amount,
            date: self.date,
            installment: self.installment,
            period: self.period,
            charge_type: self.charge_type,
            created_at,
        }
    }
}

/// Request to create one charge or an installment purchase
#[derive(Debug, Clone, PartialEq)]
pub struct CreateChargeRequest {
    /// The card to charge
    pub card_id: CardId,

    /// Human-readable description, shared by all installments
    pub description: String,

    /// Total purchase amount (> 0)
    pub amount: Decimal,

    /// Purchase date
    pub date: NaiveDate,

    /// Whether this is an expense or an income
    pub charge_type: ChargeType,

    /// Number of installments (1 for a plain charge)
    pub installments: u32,

    /// Pre-resolved initial invoice period
    ///
    /// Callers that already resolved the period (e.g. to show it in a
    /// confirmation step) pass it here; when `None` the orchestrator
    /// resolves it from the purchase date and the card's cycle.
    pub period: Option<InvoicePeriod>,
}

/// Request to overwrite an existing charge's fields
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateChargeRequest {
    /// New description
    pub description: String,

    /// New amount (> 0)
    pub amount: Decimal,

    /// New purchase date
    pub date: NaiveDate,

    /// New installment label; `None` keeps the existing label
    pub installment: Option<String>,

    /// New invoice period
    pub period: InvoicePeriod,

    /// New charge direction
    pub charge_type: ChargeType,
}
