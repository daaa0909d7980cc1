//! Invoice-related types for the card ledger engine
//!
//! An invoice is the single payable-bill record summarizing all charges for
//! one (card, period) pair. It is derived state: created lazily on the
//! first charge in a period, kept in sync by the invoice synchronizer, and
//! deleted when reversal drains it to zero or below.

use crate::types::{CardCharge, CardId, CategoryId, InvoicePeriod};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Invoice identifier
///
/// Supports invoice IDs from 0 to 4,294,967,295
pub type InvoiceId = u32;

/// The payable bill for one card and one invoice period
///
/// At most one invoice exists per (card, period). Its `amount` equals the
/// sum of signed charge amounts currently assigned to the period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invoice {
    /// The invoice ID
    pub id: InvoiceId,

    /// The card this invoice bills
    pub card_id: CardId,

    /// Display description (`"Invoice {cardName}"`)
    pub description: String,

    /// Signed total owed
    ///
    /// Expenses contribute positively, incomes negatively. May be zero or
    /// negative transiently (e.g. a refund larger than the month's
    /// purchases); full reversal deletes the record instead.
    pub amount: Decimal,

    /// Due date: the card's due day within the invoice period, clamped to
    /// the month's length
    pub due_date: NaiveDate,

    /// The shared "Card Invoice" system category
    pub category_id: CategoryId,

    /// Whether this invoice has been paid
    ///
    /// Reset to false by every ledger-affecting write so a re-touched
    /// invoice always demands payment again.
    pub is_paid: bool,

    /// The invoice period this bill covers
    pub period: InvoicePeriod,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

/// An unsaved invoice, produced by the synchronizer for the store to persist
#[derive(Debug, Clone, PartialEq)]
pub struct NewInvoice {
    /// The card this invoice bills
    pub card_id: CardId,

    /// Display description
    pub description: String,

    /// Initial signed total
    pub amount: Decimal,

    /// Due date
    pub due_date: NaiveDate,

    /// Category ID
    pub category_id: CategoryId,

    /// The invoice period
    pub period: InvoicePeriod,
}

impl NewInvoice {
    /// Materialize the invoice with the given id and creation timestamp
    ///
    /// Freshly created invoices are always unpaid.
    pub fn into_invoice(self, id: InvoiceId, created_at: DateTime<Utc>) -> Invoice {
        Invoice {
            id,
            card_id: self.card_id,
            description: self.description,
            amount: self.amount,
            due_date: self.due_date,
            category_id: self.category_id,
            is_paid: false,
            period: self.period,
            created_at,
        }
    }
}

/// Read-only invoice view for one (card, period) pair
///
/// The total is recomputed from the period's charges, independently of the
/// stored invoice aggregate, alongside the card's current credit snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvoiceSummary {
    /// Name of the card
    pub card_name: String,

    /// The card's available credit at query time
    pub current_limit: Decimal,

    /// Signed sum of the period's charges
    pub invoice_total: Decimal,

    /// The charges assigned to the period
    pub charges: Vec<CardCharge>,
}
