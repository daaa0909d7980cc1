//! Core business logic module
//!
//! This module contains the ledger engine components:
//! - `resolver` - Pure invoice period resolution
//! - `installments` - Installment plan generation
//! - `ledger` - The card credit ledger (apply/revert/recalculate)
//! - `invoice_sync` - Invoice aggregate synchronization
//! - `engine` - Charge lifecycle orchestration
//! - `traits` - Storage collaborator abstractions
//! - `locks` - Per-card operation serialization

pub mod engine;
pub mod installments;
pub mod invoice_sync;
pub mod ledger;
pub mod locks;
pub mod resolver;
pub mod traits;

pub use engine::LedgerEngine;
pub use installments::{PlannedCharge, RoundingPolicy};
pub use invoice_sync::InvoiceSynchronizer;
pub use locks::CardLockMap;
pub use resolver::{current_period, resolve_period};
pub use traits::{CardStore, CategoryStore, ChargeStore, InvoiceStore, Storage};
