//! In-memory reference storage
//!
//! This module provides `MemoryStore`, a concurrent in-memory
//! implementation of the storage collaborator traits. It backs the CLI
//! replay surface and the test suite; production deployments substitute a
//! relational store behind the same traits.
//!
//! # Thread Safety
//!
//! All collections are DashMaps with fine-grained per-entry locking, and
//! id allocation is atomic, so the store can be shared across async tasks
//! behind a plain `Arc`.

use crate::core::traits::{CardStore, CategoryStore, ChargeStore, InvoiceStore};
use crate::types::{
    Card, CardCharge, CardId, Category, CategoryId, ChargeId, InvoicePeriod, Invoice, InvoiceId,
    LedgerError, NewCard, NewCharge, NewInvoice,
};
use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU32, Ordering};

/// Concurrent in-memory storage for cards, charges, invoices, categories
///
/// Ids are assigned sequentially starting at 1, per entity type.
pub struct MemoryStore {
    cards: DashMap<CardId, Card>,
    charges: DashMap<ChargeId, CardCharge>,
    invoices: DashMap<InvoiceId, Invoice>,
    /// Categories are keyed by name so get-or-create is a single entry op
    categories: DashMap<String, Category>,
    next_card_id: AtomicU32,
    next_charge_id: AtomicU32,
    next_invoice_id: AtomicU32,
    next_category_id: AtomicU32,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        MemoryStore {
            cards: DashMap::new(),
            charges: DashMap::new(),
            invoices: DashMap::new(),
            categories: DashMap::new(),
            next_card_id: AtomicU32::new(1),
            next_charge_id: AtomicU32::new(1),
            next_invoice_id: AtomicU32::new(1),
            next_category_id: AtomicU32::new(1),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CardStore for MemoryStore {
    async fn create_card(&self, card: NewCard) -> Result<Card, LedgerError> {
        let id = self.next_card_id.fetch_add(1, Ordering::Relaxed);
        let card = card.into_card(id, Utc::now());
        self.cards.insert(id, card.clone());
        Ok(card)
    }

    async fn get_card(&self, card_id: CardId) -> Result<Option<Card>, LedgerError> {
        Ok(self.cards.get(&card_id).map(|e| e.value().clone()))
    }

    async fn update_card(&self, card: &Card) -> Result<(), LedgerError> {
        self.cards.insert(card.id, card.clone());
        Ok(())
    }

    async fn delete_card(&self, card_id: CardId) -> Result<bool, LedgerError> {
        let existed = self.cards.remove(&card_id).is_some();
        if existed {
            self.charges.retain(|_, charge| charge.card_id != card_id);
            self.invoices
                .retain(|_, invoice| invoice.card_id != card_id);
        }
        Ok(existed)
    }

    async fn list_cards(&self) -> Result<Vec<Card>, LedgerError> {
        let mut cards: Vec<Card> = self.cards.iter().map(|e| e.value().clone()).collect();
        cards.sort_by_key(|card| card.id);
        Ok(cards)
    }
}

#[async_trait]
impl ChargeStore for MemoryStore {
    async fn create_charge(&self, charge: NewCharge) -> Result<CardCharge, LedgerError> {
        let id = self.next_charge_id.fetch_add(1, Ordering::Relaxed);
        let charge = charge.into_charge(id, Utc::now());
        self.charges.insert(id, charge.clone());
        Ok(charge)
    }

    async fn get_charge(&self, charge_id: ChargeId) -> Result<Option<CardCharge>, LedgerError> {
        Ok(self.charges.get(&charge_id).map(|e| e.value().clone()))
    }

    async fn update_charge(&self, charge: &CardCharge) -> Result<(), LedgerError> {
        self.charges.insert(charge.id, charge.clone());
        Ok(())
    }

    async fn delete_charge(&self, charge_id: ChargeId) -> Result<bool, LedgerError> {
        Ok(self.charges.remove(&charge_id).is_some())
    }

    async fn charges_by_card(&self, card_id: CardId) -> Result<Vec<CardCharge>, LedgerError> {
        Ok(self.collect_charges(|charge| charge.card_id == card_id))
    }

    async fn charges_by_period(
        &self,
        card_id: CardId,
        period: InvoicePeriod,
    ) -> Result<Vec<CardCharge>, LedgerError> {
        Ok(self.collect_charges(|charge| charge.card_id == card_id && charge.period == period))
    }

    async fn charges_from_period(
        &self,
        card_id: CardId,
        period: InvoicePeriod,
    ) -> Result<Vec<CardCharge>, LedgerError> {
        Ok(self.collect_charges(|charge| charge.card_id == card_id && charge.period >= period))
    }
}

impl MemoryStore {
    fn collect_charges(&self, keep: impl Fn(&CardCharge) -> bool) -> Vec<CardCharge> {
        let mut charges: Vec<CardCharge> = self
            .charges
            .iter()
            .filter(|e| keep(e.value()))
            .map(|e| e.value().clone())
            .collect();
        charges.sort_by(|a, b| a.date.cmp(&b.date).then(a.id.cmp(&b.id)));
        charges
    }
}

#[async_trait]
impl InvoiceStore for MemoryStore {
    async fn create_invoice(&self, invoice: NewInvoice) -> Result<Invoice, LedgerError> {
        let id = self.next_invoice_id.fetch_add(1, Ordering::Relaxed);
        let invoice = invoice.into_invoice(id, Utc::now());
        self.invoices.insert(id, invoice.clone());
        Ok(invoice)
    }

    async fn get_invoice(&self, invoice_id: InvoiceId) -> Result<Option<Invoice>, LedgerError> {
        Ok(self.invoices.get(&invoice_id).map(|e| e.value().clone()))
    }

    async fn invoice_for_period(
        &self,
        card_id: CardId,
        period: InvoicePeriod,
    ) -> Result<Option<Invoice>, LedgerError> {
        Ok(self
            .invoices
            .iter()
            .find(|e| e.value().card_id == card_id && e.value().period == period)
            .map(|e| e.value().clone()))
    }

    async fn update_invoice(&self, invoice: &Invoice) -> Result<(), LedgerError> {
        self.invoices.insert(invoice.id, invoice.clone());
        Ok(())
    }

    async fn delete_invoice(&self, invoice_id: InvoiceId) -> Result<bool, LedgerError> {
        Ok(self.invoices.remove(&invoice_id).is_some())
    }

    async fn invoices_by_card(&self, card_id: CardId) -> Result<Vec<Invoice>, LedgerError> {
        let mut invoices: Vec<Invoice> = self
            .invoices
            .iter()
            .filter(|e| e.value().card_id == card_id)
            .map(|e| e.value().clone())
            .collect();
        invoices.sort_by_key(|invoice| invoice.period);
        Ok(invoices)
    }

    async fn list_invoices(&self) -> Result<Vec<Invoice>, LedgerError> {
        let mut invoices: Vec<Invoice> = self.invoices.iter().map(|e| e.value().clone()).collect();
        invoices.sort_by_key(|invoice| invoice.id);
        Ok(invoices)
    }
}

#[async_trait]
impl CategoryStore for MemoryStore {
    async fn get_or_create_category(&self, name: &str) -> Result<Category, LedgerError> {
        let category = self
            .categories
            .entry(name.to_string())
            .or_insert_with(|| {
                let id: CategoryId = self.next_category_id.fetch_add(1, Ordering::Relaxed);
                Category {
                    id,
                    name: name.to_string(),
                    created_at: Utc::now(),
                }
            })
            .value()
            .clone();
        Ok(category)
    }
}
