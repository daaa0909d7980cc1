//! Invoice aggregate synchronization
//!
//! This module keeps the derived invoice record for each (card, period)
//! pair equal to the sum of signed charge amounts assigned to the period.
//! The orchestrator calls [`InvoiceSynchronizer::upsert`] when a charge's
//! contribution enters a period and [`InvoiceSynchronizer::reverse`] when
//! it leaves one.
//!
//! Invoices are created lazily on the first charge in a period, filed
//! under the shared "Card Invoice" system category, and deleted outright
//! when reversal drains them to zero or below - a fully reversed invoice
//! has nothing left to bill. Every touch resets `is_paid` to false.

use crate::core::traits::Storage;
use crate::types::{
    Card, Invoice, InvoicePeriod, LedgerError, NewInvoice, INVOICE_CATEGORY,
};
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::debug;

/// Maintains the one-invoice-per-(card, period) aggregate
pub struct InvoiceSynchronizer<S> {
    storage: Arc<S>,
}

impl<S: Storage> InvoiceSynchronizer<S> {
    /// Create a synchronizer over the given storage collaborator
    pub fn new(storage: Arc<S>) -> Self {
        Self { storage }
    }

    /// Add a charge's signed contribution to a period's invoice
    ///
    /// If no invoice exists for the (card, period) pair yet, one is
    /// created with `amount = delta`, due on the card's due day within
    /// the period (clamped to the month's length), filed under the system
    /// category. If one exists, its amount grows by `delta` and its paid
    /// flag resets.
    ///
    /// # Arguments
    ///
    /// * `card` - The owning card (provides name and due day)
    /// * `period` - The invoice period touched
    /// * `delta` - Signed contribution (`+amount` for expenses, `-amount`
    ///   for incomes)
    ///
    /// # Returns
    ///
    /// The invoice after the write
    pub async fn upsert(
        &self,
        card: &Card,
        period: InvoicePeriod,
        delta: Decimal,
    ) -> Result<Invoice, LedgerError> {
        match self.storage.invoice_for_period(card.id, period).await? {
            Some(mut invoice) => {
                invoice.amount = invoice
                    .amount
                    .checked_add(delta)
                    .ok_or_else(|| LedgerError::arithmetic_overflow("invoice upsert", card.id))?;
                invoice.is_paid = false;
                self.storage.update_invoice(&invoice).await?;
                debug!(
                    invoice_id = invoice.id,
                    card_id = card.id,
                    %period,
                    amount = %invoice.amount,
                    "invoice incremented"
                );
                Ok(invoice)
            }
            None => {
                let category = self
                    .storage
                    .get_or_create_category(INVOICE_CATEGORY)
                    .await?;
                let invoice = self
                    .storage
                    .create_invoice(NewInvoice {
                        card_id: card.id,
                        description: format!("Invoice {}", card.name),
                        amount: delta,
                        due_date: period.day(card.due_day),
                        category_id: category.id,
                        period,
                    })
                    .await?;
                debug!(
                    invoice_id = invoice.id,
                    card_id = card.id,
                    %period,
                    amount = %invoice.amount,
                    "invoice created"
                );
                Ok(invoice)
            }
        }
    }

    /// Withdraw a previously added contribution from a period's invoice
    ///
    /// A missing invoice is a no-op (nothing to reverse). Otherwise the
    /// contribution is subtracted; if the remaining amount is zero or
    /// below the invoice is deleted, else it is persisted unpaid.
    ///
    /// # Arguments
    ///
    /// * `card` - The owning card
    /// * `period` - The invoice period touched
    /// * `delta` - The signed contribution being withdrawn, exactly as it
    ///   was passed to [`InvoiceSynchronizer::upsert`]
    ///
    /// # Returns
    ///
    /// * `Ok(Some(Invoice))` - The reduced invoice, still billable
    /// * `Ok(None)` - No invoice existed, or it drained and was deleted
    pub async fn reverse(
        &self,
        card: &Card,
        period: InvoicePeriod,
        delta: Decimal,
    ) -> Result<Option<Invoice>, LedgerError> {
        let Some(mut invoice) = self.storage.invoice_for_period(card.id, period).await? else {
            return Ok(None);
        };

        invoice.amount = invoice
            .amount
            .checked_sub(delta)
            .ok_or_else(|| LedgerError::arithmetic_overflow("invoice reverse", card.id))?;

        if invoice.amount <= Decimal::ZERO {
            self.storage.delete_invoice(invoice.id).await?;
            debug!(
                invoice_id = invoice.id,
                card_id = card.id,
                %period,
                "invoice drained and deleted"
            );
            Ok(None)
        } else {
            invoice.is_paid = false;
            self.storage.update_invoice(&invoice).await?;
            debug!(
                invoice_id = invoice.id,
                card_id = card.id,
                %period,
                amount = %invoice.amount,
                "invoice reduced"
            );
            Ok(Some(invoice))
        }
    }
}
