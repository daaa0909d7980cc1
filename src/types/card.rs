//! Card-related types for the card ledger engine
//!
//! This module defines the Card aggregate and the validated request used to
//! register one. The card carries both its credit ceiling (`limit`) and the
//! derived available credit (`current_limit`) the ledger maintains.

use crate::types::LedgerError;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Card identifier
///
/// Supports card IDs from 0 to 4,294,967,295
pub type CardId = u32;

/// A registered credit card
///
/// Represents the current state of a card, including its billing cycle
/// configuration and available credit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Card {
    /// The card ID
    pub id: CardId,

    /// Display name of the card
    pub name: String,

    /// Issuing bank
    pub bank: String,

    /// Day of month after which new charges roll into the next billing
    /// cycle (1-31)
    pub closing_day: u8,

    /// Day of month the invoice for a cycle must be paid (1-31)
    pub due_day: u8,

    /// Credit ceiling (always > 0)
    pub limit: Decimal,

    /// Available credit
    ///
    /// Equals `limit` minus the net signed sum of every applied charge.
    /// May be negative if the card is overdrawn. Only the ledger
    /// operations mutate this field.
    pub current_limit: Decimal,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

/// A validated card registration request
///
/// Construction-time validation happens in [`NewCard::validate`], before
/// any side effect: name and bank must be non-empty, cycle days must be
/// in 1-31, the limit must be strictly positive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewCard {
    /// Display name of the card
    pub name: String,

    /// Issuing bank
    pub bank: String,

    /// Closing day of the billing cycle (1-31)
    pub closing_day: u8,

    /// Due day of the billing cycle (1-31)
    pub due_day: u8,

    /// Credit ceiling (must be > 0)
    pub limit: Decimal,
}

impl NewCard {
    /// Validate the registration request
    ///
    /// # Returns
    ///
    /// * `Ok(())` - If all fields pass validation
    /// * `Err(LedgerError)` - Describing the first failing field
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `name` or `bank` is empty or whitespace-only
    /// - `closing_day` or `due_day` is outside 1-31
    /// - `limit` is zero or negative
    pub fn validate(&self) -> Result<(), LedgerError> {
        if self.name.trim().is_empty() {
            return Err(LedgerError::missing_field("name"));
        }
        if self.bank.trim().is_empty() {
            return Err(LedgerError::missing_field("bank"));
        }
        if !(1..=31).contains(&self.closing_day) {
            return Err(LedgerError::invalid_cycle_day("closing day", self.closing_day));
        }
        if !(1..=31).contains(&self.due_day) {
            return Err(LedgerError::invalid_cycle_day("due day", self.due_day));
        }
        if self.limit <= Decimal::ZERO {
            return Err(LedgerError::invalid_amount(self.limit));
        }
        Ok(())
    }

    /// Materialize the card with the given id and creation timestamp
    ///
    /// A freshly registered card has its full limit available.
    pub fn into_card(self, id: CardId, created_at: DateTime<Utc>) -> Card {
        Card {
            id,
            name: self.name,
            bank: self.bank,
            closing_day: self.closing_day,
            due_day: self.due_day,
            limit: self.limit,
            current_limit: self.limit,
            created_at,
        }
    }
}
