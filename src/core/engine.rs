//! Charge lifecycle orchestration
//!
//! This module provides the `LedgerEngine` that composes the period
//! resolver, the installment planner, the credit ledger, and the invoice
//! synchronizer into Create/Update/Delete operations over individual card
//! charges, plus the period and summary queries.
//!
//! The engine enforces the cross-record invariants:
//! - Referenced cards must exist before anything is written
//! - Validation (amount > 0, installment count >= 1) precedes the first
//!   write
//! - A charge's contribution to the card ledger and to its period's
//!   invoice is withdrawn and re-applied as one unit on update, and
//!   withdrawn before removal on delete
//!
//! # Concurrency
//!
//! Two concurrent operations against the same card are a lost-update
//! hazard on `current_limit`, so every lifecycle operation runs under a
//! per-card async lock spanning its whole read-modify-write sequence.
//! Operations on different cards proceed in parallel.

use crate::core::installments::{self, RoundingPolicy};
use crate::core::invoice_sync::InvoiceSynchronizer;
use crate::core::resolver;
use crate::core::traits::Storage;
use crate::core::{ledger, CardLockMap};
use crate::types::{
    Card, CardCharge, CardId, ChargeId, ChargeType, CreateChargeRequest, Invoice, InvoicePeriod,
    InvoiceId, InvoiceSummary, LedgerError, NewCard, NewCharge, UpdateChargeRequest,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::sync::Arc;
use tokio::sync::OwnedMutexGuard;
use tracing::{debug, info};

/// Charge lifecycle orchestrator
///
/// Coordinates storage, the credit ledger, and the invoice synchronizer.
/// Cheap to share: hold it in an `Arc` and call from any task.
pub struct LedgerEngine<S> {
    storage: Arc<S>,
    invoices: InvoiceSynchronizer<S>,
    card_locks: CardLockMap,
}

impl<S: Storage> LedgerEngine<S> {
    /// Create an engine over the given storage collaborator
    pub fn new(storage: Arc<S>) -> Self {
        LedgerEngine {
            invoices: InvoiceSynchronizer::new(storage.clone()),
            storage,
            card_locks: CardLockMap::new(),
        }
    }

    /// The underlying storage collaborator
    pub fn storage(&self) -> &Arc<S> {
        &self.storage
    }

    /// Serialize operations against one card
    async fn lock_card(&self, card_id: CardId) -> OwnedMutexGuard<()> {
        self.card_locks.acquire(card_id).await
    }

    /// Register a new card
    ///
    /// # Errors
    ///
    /// Returns a validation error (missing field, invalid cycle day,
    /// invalid limit) before anything is written.
    pub async fn create_card(&self, card: NewCard) -> Result<Card, LedgerError> {
        card.validate()?;
        let card = self.storage.create_card(card).await?;
        info!(card_id = card.id, name = %card.name, "card registered");
        Ok(card)
    }

    /// Retrieve a card by id
    pub async fn get_card(&self, card_id: CardId) -> Result<Card, LedgerError> {
        self.storage
            .get_card(card_id)
            .await?
            .ok_or_else(|| LedgerError::card_not_found(card_id))
    }

    /// Delete a card, cascading deletion of its charges and invoices
    ///
    /// Returns false if the card did not exist.
    pub async fn delete_card(&self, card_id: CardId) -> Result<bool, LedgerError> {
        let _guard = self.lock_card(card_id).await;
        let deleted = self.storage.delete_card(card_id).await?;
        if deleted {
            info!(card_id, "card deleted with its charges and invoices");
        }
        Ok(deleted)
    }

    /// Create a charge or an installment purchase
    ///
    /// Expands the request into its installment plan (a single element for
    /// a plain charge), then for each installment in order: persists the
    /// charge, applies it to the card's credit ledger, folds it into its
    /// period's invoice, and persists the card.
    ///
    /// When the request carries no pre-resolved period, the initial period
    /// comes from the resolver using the purchase date and the card's
    /// cycle.
    ///
    /// # Returns
    ///
    /// The created charges, in installment order
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The amount is not strictly positive (nothing written)
    /// - The installment count is zero (nothing written)
    /// - The card does not exist (nothing written)
    pub async fn create_charge(
        &self,
        request: CreateChargeRequest,
    ) -> Result<Vec<CardCharge>, LedgerError> {
        if request.amount <= Decimal::ZERO {
            return Err(LedgerError::invalid_amount(request.amount));
        }

        let _guard = self.lock_card(request.card_id).await;

        let mut card = self.get_card(request.card_id).await?;

        let initial_period = request.period.unwrap_or_else(|| {
            resolver::resolve_period(request.date, card.closing_day, card.due_day)
        });

        let plan = installments::plan(
            request.amount,
            request.installments,
            request.date,
            initial_period,
            request.charge_type,
            RoundingPolicy::Uniform,
        )?;

        let mut created = Vec::with_capacity(plan.len());
        for planned in plan {
            let charge = self
                .storage
                .create_charge(NewCharge {
                    card_id: card.id,
                    description: request.description.clone(),
                    amount: planned.amount,
                    date: planned.date,
                    installment: planned.installment,
                    period: planned.period,
                    charge_type: planned.charge_type,
                })
                .await?;

            ledger::apply(&mut card, charge.amount, charge.charge_type)?;
            self.invoices
                .upsert(&card, charge.period, charge.charge_type.signed(charge.amount))
                .await?;
            self.storage.update_card(&card).await?;

            debug!(
                charge_id = charge.id,
                card_id = card.id,
                installment = %charge.installment,
                %charge.period,
                "charge created"
            );
            created.push(charge);
        }

        info!(
            card_id = card.id,
            charges = created.len(),
            current_limit = %card.current_limit,
            "charge creation complete"
        );
        Ok(created)
    }

    /// Overwrite an existing charge
    ///
    /// Snapshots the old amount, type, and period, writes the new fields,
    /// then withdraws the old contribution and applies the new one on both
    /// the card ledger and the invoice aggregates. Old and new period are
    /// handled independently, so an update within one period nets out to
    /// "remove old contribution, add new contribution".
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The new amount is not strictly positive (nothing written)
    /// - The charge or its card does not exist
    pub async fn update_charge(
        &self,
        charge_id: ChargeId,
        request: UpdateChargeRequest,
    ) -> Result<CardCharge, LedgerError> {
        if request.amount <= Decimal::ZERO {
            return Err(LedgerError::invalid_amount(request.amount));
        }

        // Locate the owning card before taking its lock, then re-read the
        // charge under the lock so a concurrent update cannot interleave.
        let probe = self
            .storage
            .get_charge(charge_id)
            .await?
            .ok_or_else(|| LedgerError::charge_not_found(charge_id))?;
        let _guard = self.lock_card(probe.card_id).await;

        let mut charge = self
            .storage
            .get_charge(charge_id)
            .await?
            .ok_or_else(|| LedgerError::charge_not_found(charge_id))?;
        let mut card = self.get_card(charge.card_id).await?;

        let old_amount = charge.amount;
        let old_type = charge.charge_type;
        let old_period = charge.period;

        charge.description = request.description;
        charge.amount = request.amount;
        charge.date = request.date;
        if let Some(installment) = request.installment {
            charge.installment = installment;
        }
        charge.period = request.period;
        charge.charge_type = request.charge_type;
        self.storage.update_charge(&charge).await?;

        ledger::revert(&mut card, old_amount, old_type)?;
        ledger::apply(&mut card, charge.amount, charge.charge_type)?;

        self.invoices
            .reverse(&card, old_period, old_type.signed(old_amount))
            .await?;
        self.invoices
            .upsert(&card, charge.period, charge.charge_type.signed(charge.amount))
            .await?;

        self.storage.update_card(&card).await?;

        info!(
            charge_id,
            card_id = card.id,
            current_limit = %card.current_limit,
            "charge updated"
        );
        Ok(charge)
    }

    /// Delete a charge
    ///
    /// Withdraws the charge's contribution from the card ledger and from
    /// its period's invoice, then removes the row. Deleting a missing
    /// charge is an idempotent no-op.
    ///
    /// # Returns
    ///
    /// * `Ok(true)` - The charge existed and was deleted
    /// * `Ok(false)` - No such charge; nothing was written
    pub async fn delete_charge(&self, charge_id: ChargeId) -> Result<bool, LedgerError> {
        let Some(probe) = self.storage.get_charge(charge_id).await? else {
            return Ok(false);
        };
        let _guard = self.lock_card(probe.card_id).await;

        let Some(charge) = self.storage.get_charge(charge_id).await? else {
            return Ok(false);
        };
        let mut card = self.get_card(charge.card_id).await?;

        ledger::revert(&mut card, charge.amount, charge.charge_type)?;
        self.invoices
            .reverse(&card, charge.period, charge.charge_type.signed(charge.amount))
            .await?;
        self.storage.update_card(&card).await?;
        self.storage.delete_charge(charge_id).await?;

        info!(
            charge_id,
            card_id = card.id,
            current_limit = %card.current_limit,
            "charge deleted"
        );
        Ok(true)
    }

    /// All charges for a card
    pub async fn charges_for_card(&self, card_id: CardId) -> Result<Vec<CardCharge>, LedgerError> {
        self.get_card(card_id).await?;
        self.storage.charges_by_card(card_id).await
    }

    /// A card's charges assigned to one invoice period
    pub async fn charges_for_period(
        &self,
        card_id: CardId,
        period: InvoicePeriod,
    ) -> Result<Vec<CardCharge>, LedgerError> {
        self.get_card(card_id).await?;
        self.storage.charges_by_period(card_id, period).await
    }

    /// A card's charges assigned to `period` or later
    pub async fn charges_from_period(
        &self,
        card_id: CardId,
        period: InvoicePeriod,
    ) -> Result<Vec<CardCharge>, LedgerError> {
        self.get_card(card_id).await?;
        self.storage.charges_from_period(card_id, period).await
    }

    /// Invoice view for one (card, period) pair
    ///
    /// Recomputes the total by summing the period's charges instead of
    /// reading the stored invoice aggregate, and reports the card's
    /// current credit snapshot alongside.
    pub async fn invoice_summary(
        &self,
        card_id: CardId,
        period: InvoicePeriod,
    ) -> Result<InvoiceSummary, LedgerError> {
        let card = self.get_card(card_id).await?;
        let charges = self.storage.charges_by_period(card_id, period).await?;

        let mut total = Decimal::ZERO;
        for charge in &charges {
            total = total
                .checked_add(charge.charge_type.signed(charge.amount))
                .ok_or_else(|| LedgerError::arithmetic_overflow("invoice summary", card_id))?;
        }

        Ok(InvoiceSummary {
            card_name: card.name,
            current_limit: card.current_limit,
            invoice_total: total,
            charges,
        })
    }

    /// Change a card's credit ceiling
    ///
    /// An arbitrary limit edit has no incremental delta to apply, so the
    /// available credit is recomputed from scratch: charges from the
    /// current period (resolved from `today`) onward count against the new
    /// limit, earlier ones do not.
    ///
    /// # Arguments
    ///
    /// * `card_id` - The card to edit
    /// * `new_limit` - The new ceiling (must be > 0)
    /// * `today` - The date recalculation anchors on, injected by the
    ///   caller
    pub async fn set_card_limit(
        &self,
        card_id: CardId,
        new_limit: Decimal,
        today: NaiveDate,
    ) -> Result<Card, LedgerError> {
        if new_limit <= Decimal::ZERO {
            return Err(LedgerError::invalid_amount(new_limit));
        }

        let _guard = self.lock_card(card_id).await;

        let mut card = self.get_card(card_id).await?;
        card.limit = new_limit;

        let current = resolver::current_period(today, &card);
        let charges = self.storage.charges_from_period(card_id, current).await?;
        ledger::recalculate(&mut card, &charges, current)?;

        self.storage.update_card(&card).await?;

        info!(
            card_id,
            limit = %card.limit,
            current_limit = %card.current_limit,
            "limit changed and credit recalculated"
        );
        Ok(card)
    }

    /// Mark an invoice as paid or unpaid
    ///
    /// Paying a card invoice frees the credit it was holding, so the
    /// toggle goes through the ledger: paid withdraws the invoice amount's
    /// expense effect, un-paying applies it again. Toggling to the current
    /// state is a no-op.
    pub async fn set_invoice_paid(
        &self,
        invoice_id: InvoiceId,
        paid: bool,
    ) -> Result<Invoice, LedgerError> {
        let probe = self
            .storage
            .get_invoice(invoice_id)
            .await?
            .ok_or_else(|| LedgerError::invoice_not_found(invoice_id))?;
        let _guard = self.lock_card(probe.card_id).await;

        let mut invoice = self
            .storage
            .get_invoice(invoice_id)
            .await?
            .ok_or_else(|| LedgerError::invoice_not_found(invoice_id))?;

        if invoice.is_paid == paid {
            return Ok(invoice);
        }

        let mut card = self.get_card(invoice.card_id).await?;

        if paid {
            ledger::revert(&mut card, invoice.amount, ChargeType::Expense)?;
        } else {
            ledger::apply(&mut card, invoice.amount, ChargeType::Expense)?;
        }
        invoice.is_paid = paid;

        self.storage.update_card(&card).await?;
        self.storage.update_invoice(&invoice).await?;

        info!(
            invoice_id,
            card_id = card.id,
            paid,
            current_limit = %card.current_limit,
            "invoice payment toggled"
        );
        Ok(invoice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::traits::InvoiceStore;
    use crate::store::MemoryStore;

    fn engine() -> LedgerEngine<MemoryStore> {
        LedgerEngine::new(Arc::new(MemoryStore::new()))
    }

    async fn register_card(engine: &LedgerEngine<MemoryStore>, limit: Decimal) -> Card {
        engine
            .create_card(NewCard {
                name: "Gold".to_string(),
                bank: "Acme Bank".to_string(),
                closing_day: 10,
                due_day: 15,
                limit,
            })
            .await
            .unwrap()
    }

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn period(year: i32, month: u32) -> InvoicePeriod {
        InvoicePeriod::new(year, month).unwrap()
    }

    fn charge_request(card_id: CardId, amount: Decimal) -> CreateChargeRequest {
        CreateChargeRequest {
            card_id,
            description: "Groceries".to_string(),
            amount,
            date: date(2025, 1, 5),
            charge_type: ChargeType::Expense,
            installments: 1,
            period: None,
        }
    }

    #[tokio::test]
    async fn test_create_charge_updates_ledger_and_invoice() {
        let engine = engine();
        let card = register_card(&engine, Decimal::new(100000, 2)).await;

        let charges = engine
            .create_charge(charge_request(card.id, Decimal::new(50000, 2)))
            .await
            .unwrap();

        assert_eq!(charges.len(), 1);
        assert_eq!(charges[0].installment, "1/1");
        // closing 10, due 15, Jan 5th: invoice due January
        assert_eq!(charges[0].period, period(2025, 1));

        let card = engine.get_card(card.id).await.unwrap();
        assert_eq!(card.current_limit, Decimal::new(50000, 2));

        let invoice = engine
            .storage()
            .invoice_for_period(card.id, period(2025, 1))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(invoice.amount, Decimal::new(50000, 2));
        assert!(!invoice.is_paid);
    }

    #[tokio::test]
    async fn test_create_charge_missing_card_writes_nothing() {
        let engine = engine();

        let result = engine
            .create_charge(charge_request(99, Decimal::new(10000, 2)))
            .await;

        assert!(matches!(
            result.unwrap_err(),
            LedgerError::CardNotFound { card_id: 99 }
        ));
    }

    #[tokio::test]
    async fn test_create_charge_rejects_non_positive_amount() {
        let engine = engine();
        let card = register_card(&engine, Decimal::new(100000, 2)).await;

        let result = engine.create_charge(charge_request(card.id, Decimal::ZERO)).await;
        assert!(matches!(
            result.unwrap_err(),
            LedgerError::InvalidAmount { .. }
        ));

        // Nothing was written
        let card = engine.get_card(card.id).await.unwrap();
        assert_eq!(card.current_limit, card.limit);
        assert!(engine.charges_for_card(card.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_charge_respects_supplied_period() {
        let engine = engine();
        let card = register_card(&engine, Decimal::new(100000, 2)).await;

        let mut request = charge_request(card.id, Decimal::new(10000, 2));
        request.period = Some(period(2025, 6));

        let charges = engine.create_charge(request).await.unwrap();
        assert_eq!(charges[0].period, period(2025, 6));
    }

    #[tokio::test]
    async fn test_installment_purchase_spreads_over_periods() {
        let engine = engine();
        let card = register_card(&engine, Decimal::new(100000, 2)).await;

        let charges = engine
            .create_charge(CreateChargeRequest {
                card_id: card.id,
                description: "Laptop".to_string(),
                amount: Decimal::new(30000, 2), // 300.00
                date: date(2025, 11, 1),
                charge_type: ChargeType::Expense,
                installments: 3,
                period: Some(period(2025, 11)),
            })
            .await
            .unwrap();

        assert_eq!(charges.len(), 3);
        assert_eq!(charges[0].period, period(2025, 11));
        assert_eq!(charges[1].period, period(2025, 12));
        assert_eq!(charges[2].period, period(2026, 1));

        // Each installment holds its own invoice
        for charge in &charges {
            let invoice = engine
                .storage()
                .invoice_for_period(card.id, charge.period)
                .await
                .unwrap()
                .unwrap();
            assert_eq!(invoice.amount, Decimal::new(10000, 2));
        }

        // The full purchase is applied to the ledger
        let card = engine.get_card(card.id).await.unwrap();
        assert_eq!(card.current_limit, Decimal::new(70000, 2));
    }

    #[tokio::test]
    async fn test_income_charge_frees_credit_and_reduces_invoice() {
        let engine = engine();
        let card = register_card(&engine, Decimal::new(100000, 2)).await;

        engine
            .create_charge(charge_request(card.id, Decimal::new(50000, 2)))
            .await
            .unwrap();

        let mut refund = charge_request(card.id, Decimal::new(20000, 2));
        refund.charge_type = ChargeType::Income;
        engine.create_charge(refund).await.unwrap();

        let card = engine.get_card(card.id).await.unwrap();
        assert_eq!(card.current_limit, Decimal::new(70000, 2));

        let invoice = engine
            .storage()
            .invoice_for_period(card.id, period(2025, 1))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(invoice.amount, Decimal::new(30000, 2));
    }

    #[tokio::test]
    async fn test_update_reversal_correctness() {
        // Creating a 500 expense then updating it to a 300 income for the
        // same period moves the limit up by 800 and the invoice down by
        // 800 relative to the post-create state.
        let engine = engine();
        let card = register_card(&engine, Decimal::new(200000, 2)).await;

        let charges = engine
            .create_charge(charge_request(card.id, Decimal::new(50000, 2)))
            .await
            .unwrap();
        let charge = &charges[0];

        let before = engine.get_card(card.id).await.unwrap().current_limit;
        assert_eq!(before, Decimal::new(150000, 2));

        engine
            .update_charge(
                charge.id,
                UpdateChargeRequest {
                    description: "Refund".to_string(),
                    amount: Decimal::new(30000, 2),
                    date: charge.date,
                    installment: None,
                    period: charge.period,
                    charge_type: ChargeType::Income,
                },
            )
            .await
            .unwrap();

        let after = engine.get_card(card.id).await.unwrap().current_limit;
        assert_eq!(after - before, Decimal::new(80000, 2));

        // Invoice went from +500 to -300: it crossed zero on the reverse
        // step, was deleted, and recreated with the income contribution.
        let invoice = engine
            .storage()
            .invoice_for_period(card.id, period(2025, 1))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(invoice.amount, Decimal::new(-30000, 2));
    }

    #[tokio::test]
    async fn test_update_moves_contribution_between_periods() {
        let engine = engine();
        let card = register_card(&engine, Decimal::new(100000, 2)).await;

        let charges = engine
            .create_charge(charge_request(card.id, Decimal::new(40000, 2)))
            .await
            .unwrap();
        let charge = &charges[0];

        engine
            .update_charge(
                charge.id,
                UpdateChargeRequest {
                    description: charge.description.clone(),
                    amount: charge.amount,
                    date: charge.date,
                    installment: None,
                    period: period(2025, 2),
                    charge_type: ChargeType::Expense,
                },
            )
            .await
            .unwrap();

        // The January invoice drained and vanished; February holds it now.
        assert!(engine
            .storage()
            .invoice_for_period(card.id, period(2025, 1))
            .await
            .unwrap()
            .is_none());
        let invoice = engine
            .storage()
            .invoice_for_period(card.id, period(2025, 2))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(invoice.amount, Decimal::new(40000, 2));

        // The ledger is unchanged: same amount, same type.
        let card = engine.get_card(card.id).await.unwrap();
        assert_eq!(card.current_limit, Decimal::new(60000, 2));
    }

    #[tokio::test]
    async fn test_update_missing_charge_surfaces_error() {
        let engine = engine();
        register_card(&engine, Decimal::new(100000, 2)).await;

        let result = engine
            .update_charge(
                42,
                UpdateChargeRequest {
                    description: "x".to_string(),
                    amount: Decimal::new(100, 2),
                    date: date(2025, 1, 1),
                    installment: None,
                    period: period(2025, 1),
                    charge_type: ChargeType::Expense,
                },
            )
            .await;

        assert!(matches!(
            result.unwrap_err(),
            LedgerError::ChargeNotFound { charge_id: 42 }
        ));
    }

    #[tokio::test]
    async fn test_delete_zeroing_removes_invoice() {
        let engine = engine();
        let card = register_card(&engine, Decimal::new(100000, 2)).await;

        let charges = engine
            .create_charge(charge_request(card.id, Decimal::new(50000, 2)))
            .await
            .unwrap();

        let deleted = engine.delete_charge(charges[0].id).await.unwrap();
        assert!(deleted);

        // Sole charge gone: the invoice would be zero, so it is removed.
        assert!(engine
            .storage()
            .invoice_for_period(card.id, period(2025, 1))
            .await
            .unwrap()
            .is_none());

        let card = engine.get_card(card.id).await.unwrap();
        assert_eq!(card.current_limit, card.limit);
    }

    #[tokio::test]
    async fn test_delete_missing_charge_is_idempotent_noop() {
        let engine = engine();
        let card = register_card(&engine, Decimal::new(100000, 2)).await;

        let deleted = engine.delete_charge(999).await.unwrap();

        assert!(!deleted);
        let card = engine.get_card(card.id).await.unwrap();
        assert_eq!(card.current_limit, card.limit);
    }

    #[tokio::test]
    async fn test_ledger_replay_invariant_across_lifecycle() {
        // After any sequence of create/update/delete, current_limit equals
        // limit minus the signed sum of surviving charges.
        let engine = engine();
        let limit = Decimal::new(500000, 2);
        let card = register_card(&engine, limit).await;

        let a = engine
            .create_charge(charge_request(card.id, Decimal::new(120000, 2)))
            .await
            .unwrap();
        let b = engine
            .create_charge(charge_request(card.id, Decimal::new(80000, 2)))
            .await
            .unwrap();
        let mut refund = charge_request(card.id, Decimal::new(30000, 2));
        refund.charge_type = ChargeType::Income;
        engine.create_charge(refund).await.unwrap();

        engine
            .update_charge(
                a[0].id,
                UpdateChargeRequest {
                    description: "adjusted".to_string(),
                    amount: Decimal::new(100000, 2),
                    date: a[0].date,
                    installment: None,
                    period: a[0].period,
                    charge_type: ChargeType::Expense,
                },
            )
            .await
            .unwrap();
        engine.delete_charge(b[0].id).await.unwrap();

        let card = engine.get_card(card.id).await.unwrap();
        let charges = engine.charges_for_card(card.id).await.unwrap();
        let signed_sum: Decimal = charges
            .iter()
            .map(|c| c.charge_type.signed(c.amount))
            .sum();
        assert_eq!(card.current_limit, limit - signed_sum);
    }

    #[tokio::test]
    async fn test_invoice_summary_recomputes_total() {
        let engine = engine();
        let card = register_card(&engine, Decimal::new(100000, 2)).await;

        engine
            .create_charge(charge_request(card.id, Decimal::new(30000, 2)))
            .await
            .unwrap();
        let mut refund = charge_request(card.id, Decimal::new(10000, 2));
        refund.charge_type = ChargeType::Income;
        engine.create_charge(refund).await.unwrap();

        // Corrupt the stored aggregate: the summary must not read it.
        let mut invoice = engine
            .storage()
            .invoice_for_period(card.id, period(2025, 1))
            .await
            .unwrap()
            .unwrap();
        invoice.amount = Decimal::new(999999, 2);
        engine.storage().update_invoice(&invoice).await.unwrap();

        let summary = engine
            .invoice_summary(card.id, period(2025, 1))
            .await
            .unwrap();

        assert_eq!(summary.card_name, "Gold");
        assert_eq!(summary.invoice_total, Decimal::new(20000, 2));
        assert_eq!(summary.charges.len(), 2);
        assert_eq!(summary.current_limit, Decimal::new(80000, 2));
    }

    #[tokio::test]
    async fn test_invoice_summary_missing_card() {
        let engine = engine();
        let result = engine.invoice_summary(7, period(2025, 1)).await;
        assert!(matches!(
            result.unwrap_err(),
            LedgerError::CardNotFound { card_id: 7 }
        ));
    }

    #[tokio::test]
    async fn test_set_card_limit_recalculates_ignoring_past_periods() {
        let engine = engine();
        let card = register_card(&engine, Decimal::new(100000, 2)).await;

        // A charge billed in January and one in March
        let mut old = charge_request(card.id, Decimal::new(90000, 2));
        old.period = Some(period(2025, 1));
        engine.create_charge(old).await.unwrap();

        let mut current = charge_request(card.id, Decimal::new(20000, 2));
        current.period = Some(period(2025, 3));
        engine.create_charge(current).await.unwrap();

        // Today 2025-02-20 with closing 10 / due 15 resolves to period
        // 2025-03, so only the March charge counts against the new limit.
        let card = engine
            .set_card_limit(card.id, Decimal::new(200000, 2), date(2025, 2, 20))
            .await
            .unwrap();

        assert_eq!(card.limit, Decimal::new(200000, 2));
        assert_eq!(card.current_limit, Decimal::new(180000, 2));
    }

    #[tokio::test]
    async fn test_set_card_limit_rejects_non_positive() {
        let engine = engine();
        let card = register_card(&engine, Decimal::new(100000, 2)).await;

        let result = engine
            .set_card_limit(card.id, Decimal::ZERO, date(2025, 1, 1))
            .await;

        assert!(matches!(
            result.unwrap_err(),
            LedgerError::InvalidAmount { .. }
        ));
    }

    #[tokio::test]
    async fn test_paying_invoice_frees_credit() {
        let engine = engine();
        let card = register_card(&engine, Decimal::new(100000, 2)).await;

        engine
            .create_charge(charge_request(card.id, Decimal::new(50000, 2)))
            .await
            .unwrap();
        let invoice = engine
            .storage()
            .invoice_for_period(card.id, period(2025, 1))
            .await
            .unwrap()
            .unwrap();

        let paid = engine.set_invoice_paid(invoice.id, true).await.unwrap();
        assert!(paid.is_paid);

        let card_state = engine.get_card(card.id).await.unwrap();
        assert_eq!(card_state.current_limit, card.limit);

        // Un-paying consumes the credit again
        engine.set_invoice_paid(invoice.id, false).await.unwrap();
        let card_state = engine.get_card(card.id).await.unwrap();
        assert_eq!(card_state.current_limit, Decimal::new(50000, 2));
    }

    #[tokio::test]
    async fn test_paying_twice_is_noop() {
        let engine = engine();
        let card = register_card(&engine, Decimal::new(100000, 2)).await;

        engine
            .create_charge(charge_request(card.id, Decimal::new(50000, 2)))
            .await
            .unwrap();
        let invoice = engine
            .storage()
            .invoice_for_period(card.id, period(2025, 1))
            .await
            .unwrap()
            .unwrap();

        engine.set_invoice_paid(invoice.id, true).await.unwrap();
        engine.set_invoice_paid(invoice.id, true).await.unwrap();

        let card_state = engine.get_card(card.id).await.unwrap();
        assert_eq!(card_state.current_limit, card.limit);
    }

    #[tokio::test]
    async fn test_concurrent_charges_serialize_per_card() {
        let engine = Arc::new(engine());
        let card = register_card(&engine, Decimal::new(1000000, 2)).await;

        let mut handles = Vec::new();
        for _ in 0..20 {
            let engine = engine.clone();
            let card_id = card.id;
            handles.push(tokio::spawn(async move {
                engine
                    .create_charge(CreateChargeRequest {
                        card_id,
                        description: "concurrent".to_string(),
                        amount: Decimal::new(1000, 2), // 10.00
                        date: NaiveDate::from_ymd_opt(2025, 1, 5).unwrap(),
                        charge_type: ChargeType::Expense,
                        installments: 1,
                        period: None,
                    })
                    .await
                    .unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        // No lost updates: all twenty charges landed on the ledger.
        let card = engine.get_card(card.id).await.unwrap();
        assert_eq!(card.current_limit, Decimal::new(980000, 2));

        let invoice = engine
            .storage()
            .invoice_for_period(card.id, period(2025, 1))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(invoice.amount, Decimal::new(20000, 2));
    }

    #[tokio::test]
    async fn test_delete_card_cascades() {
        let engine = engine();
        let card = register_card(&engine, Decimal::new(100000, 2)).await;
        engine
            .create_charge(charge_request(card.id, Decimal::new(10000, 2)))
            .await
            .unwrap();

        assert!(engine.delete_card(card.id).await.unwrap());
        assert!(matches!(
            engine.get_card(card.id).await.unwrap_err(),
            LedgerError::CardNotFound { .. }
        ));
    }

    #[tokio::test]
    async fn test_create_card_validation_precedes_write() {
        let engine = engine();

        let result = engine
            .create_card(NewCard {
                name: String::new(),
                bank: "Acme Bank".to_string(),
                closing_day: 10,
                due_day: 15,
                limit: Decimal::new(100000, 2),
            })
            .await;

        assert!(matches!(
            result.unwrap_err(),
            LedgerError::MissingField { .. }
        ));
    }
}
