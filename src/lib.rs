//! Card Ledger Engine Library
//! # Overview
//!
//! This library implements the credit-card invoice and limit ledger engine
//! of a personal-finance tracker: it decides which monthly invoice a charge
//! belongs to, maintains each card's available credit as charges are
//! created, edited, and deleted, and keeps a derived invoice record in
//! sync with the charges assigned to each billing period.
//!
//! # Architecture
//!
//! The system is organized into several key components:
//!
//! - [`types`] - Core data types (Card, CardCharge, Invoice, etc.)
//! - [`cli`] - CLI argument parsing
//! - [`core`] - Business logic components:
//!   - [`core::resolver`] - Pure invoice period resolution
//!   - [`core::installments`] - Installment plan generation
//!   - [`core::ledger`] - Available-credit maintenance (apply/revert/recalculate)
//!   - [`core::invoice_sync`] - Invoice aggregate synchronization
//!   - [`core::engine`] - Charge lifecycle orchestration
//! - [`store`] - In-memory reference storage behind the collaborator traits
//! - [`io`] - CSV parsing and state output
//! - [`replay`] - The CSV replay pipeline the CLI drives
//!
//! # Charge Lifecycle
//!
//! Each charge's contribution to the card ledger and to its period's
//! invoice is always in exactly one of two states: not yet applied, or
//! applied. Create applies it; Update withdraws the old contribution and
//! applies the new one; Delete withdraws it and removes the row. No
//! partial state is observable after any operation completes.
//!
//! # Billing Cycles
//!
//! A card's cycle closes on its closing day; charges after closing roll
//! into the next cycle. If the due day does not come after the closing
//! day within a month, the invoice is due one month later. The resolver
//! in [`core::resolver`] is the single implementation of this rule.

// Module declarations
pub mod cli;
pub mod core;
pub mod io;
pub mod replay;
pub mod store;
pub mod types;

pub use crate::core::{resolve_period, LedgerEngine, Storage};
pub use replay::{replay, ReplayConfig};
pub use store::MemoryStore;
pub use types::{
    Card, CardCharge, CardId, ChargeId, ChargeType, CreateChargeRequest, Invoice, InvoicePeriod,
    InvoiceSummary, LedgerError, NewCard, UpdateChargeRequest,
};
