//! Storage collaborator traits
//!
//! This module defines the persistence abstraction the engine is written
//! against. The traits are async: production backends are relational
//! stores reached over I/O, and the in-memory reference implementation in
//! [`crate::store`] mirrors that shape.
//!
//! The engine only ever needs the operations listed here - id-keyed CRUD
//! plus a few period-filtered charge queries and a get-or-create for the
//! system category.

use crate::types::{
    Card, CardCharge, CardId, Category, ChargeId, InvoicePeriod, Invoice, InvoiceId, LedgerError,
    NewCard, NewCharge, NewInvoice,
};
use async_trait::async_trait;

/// Persistence operations for cards
#[async_trait]
pub trait CardStore: Send + Sync {
    /// Persist a new card, assigning its id
    async fn create_card(&self, card: NewCard) -> Result<Card, LedgerError>;

    /// Retrieve a card by id
    async fn get_card(&self, card_id: CardId) -> Result<Option<Card>, LedgerError>;

    /// Overwrite an existing card
    async fn update_card(&self, card: &Card) -> Result<(), LedgerError>;

    /// Delete a card, cascading deletion of its charges and invoices
    ///
    /// Returns false if the card did not exist.
    async fn delete_card(&self, card_id: CardId) -> Result<bool, LedgerError>;

    /// All cards, ordered by id
    ///
    /// Used for final state output.
    async fn list_cards(&self) -> Result<Vec<Card>, LedgerError>;
}

/// Persistence operations for card charges
#[async_trait]
pub trait ChargeStore: Send + Sync {
    /// Persist a new charge, assigning its id
    async fn create_charge(&self, charge: NewCharge) -> Result<CardCharge, LedgerError>;

    /// Retrieve a charge by id
    async fn get_charge(&self, charge_id: ChargeId) -> Result<Option<CardCharge>, LedgerError>;

    /// Overwrite an existing charge
    async fn update_charge(&self, charge: &CardCharge) -> Result<(), LedgerError>;

    /// Delete a charge by id
    ///
    /// Returns false if the charge did not exist.
    async fn delete_charge(&self, charge_id: ChargeId) -> Result<bool, LedgerError>;

    /// All charges for a card, ordered by date then id
    async fn charges_by_card(&self, card_id: CardId) -> Result<Vec<CardCharge>, LedgerError>;

    /// A card's charges assigned to one invoice period
    async fn charges_by_period(
        &self,
        card_id: CardId,
        period: InvoicePeriod,
    ) -> Result<Vec<CardCharge>, LedgerError>;

    /// A card's charges assigned to `period` or any later period
    ///
    /// This is the query limit recalculation runs on.
    async fn charges_from_period(
        &self,
        card_id: CardId,
        period: InvoicePeriod,
    ) -> Result<Vec<CardCharge>, LedgerError>;
}

/// Persistence operations for invoices
#[async_trait]
pub trait InvoiceStore: Send + Sync {
    /// Persist a new invoice, assigning its id
    async fn create_invoice(&self, invoice: NewInvoice) -> Result<Invoice, LedgerError>;

    /// Retrieve an invoice by id
    async fn get_invoice(&self, invoice_id: InvoiceId) -> Result<Option<Invoice>, LedgerError>;

    /// The unique invoice for a (card, period) pair, if one exists
    async fn invoice_for_period(
        &self,
        card_id: CardId,
        period: InvoicePeriod,
    ) -> Result<Option<Invoice>, LedgerError>;

    /// Overwrite an existing invoice
    async fn update_invoice(&self, invoice: &Invoice) -> Result<(), LedgerError>;

    /// Delete an invoice by id
    ///
    /// Returns false if the invoice did not exist.
    async fn delete_invoice(&self, invoice_id: InvoiceId) -> Result<bool, LedgerError>;

    /// All invoices for a card, ordered by period
    async fn invoices_by_card(&self, card_id: CardId) -> Result<Vec<Invoice>, LedgerError>;

    /// All invoices, ordered by id
    ///
    /// Used for final state output.
    async fn list_invoices(&self) -> Result<Vec<Invoice>, LedgerError>;
}

/// Persistence operations for categories
#[async_trait]
pub trait CategoryStore: Send + Sync {
    /// Look up a category by name, creating it if absent
    async fn get_or_create_category(&self, name: &str) -> Result<Category, LedgerError>;
}

/// The full storage collaborator the engine composes over
///
/// Blanket-implemented for anything providing all four stores.
pub trait Storage: CardStore + ChargeStore + InvoiceStore + CategoryStore {}

impl<T: CardStore + ChargeStore + InvoiceStore + CategoryStore> Storage for T {}
