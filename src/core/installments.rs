//! Installment plan generation
//!
//! This module expands a purchase into N dated, invoice-tagged planned
//! charges. Both installment rounding policies found in personal-finance
//! trackers live behind this one generator:
//!
//! - [`RoundingPolicy::Uniform`] gives every installment the same
//!   `round(total / n, 2)` amount. The sum can diverge from the total by
//!   up to `n * 0.005` - the historical card-charge behavior, preserved
//!   for compatibility.
//! - [`RoundingPolicy::RemainderCorrected`] gives the last installment
//!   whatever remains after the first `n - 1`, so the sum is exact.
//!
//! Installment dates advance one calendar month at a time (clamped to the
//! target month's length); periods advance from the initial period without
//! re-resolving against the card's cycle.

use crate::types::{ChargeType, InvoicePeriod, LedgerError};
use chrono::{Months, NaiveDate};
use rust_decimal::{Decimal, RoundingStrategy};

/// How installment amounts are rounded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundingPolicy {
    /// Every installment is `round(total / n, 2)`; the sum may diverge
    /// from the total
    Uniform,

    /// The last installment absorbs the rounding remainder; the sum is
    /// exactly the total
    RemainderCorrected,
}

/// One planned installment, ready for the orchestrator to persist
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedCharge {
    /// Amount of this installment
    pub amount: Decimal,

    /// Date of this installment (purchase date advanced by its index in
    /// months)
    pub date: NaiveDate,

    /// Invoice period of this installment (initial period advanced by its
    /// index in months)
    pub period: InvoicePeriod,

    /// Label in `"i/n"` form
    pub installment: String,

    /// Charge direction, shared by the whole plan
    pub charge_type: ChargeType,
}

/// Expand a purchase into its installment plan
///
/// # Arguments
///
/// * `total` - Total purchase amount (validated > 0 by the caller)
/// * `count` - Number of installments (must be >= 1)
/// * `date` - Purchase date; installment `i` lands `i` months later
/// * `period` - Initial invoice period, already resolved by the caller
/// * `charge_type` - Expense or income, shared by all installments
/// * `policy` - Rounding policy for the per-installment amounts
///
/// # Returns
///
/// * `Ok(Vec<PlannedCharge>)` - The `count` planned installments, in order
/// * `Err(LedgerError::InvalidInstallmentCount)` - If `count` is zero
pub fn plan(
    total: Decimal,
    count: u32,
    date: NaiveDate,
    period: InvoicePeriod,
    charge_type: ChargeType,
    policy: RoundingPolicy,
) -> Result<Vec<PlannedCharge>, LedgerError> {
    if count == 0 {
        return Err(LedgerError::invalid_installment_count(count));
    }

    if count == 1 {
        return Ok(vec![PlannedCharge {
            amount: total,
            date,
            period,
            installment: "1/1".to_string(),
            charge_type,
        }]);
    }

    let per_installment = (total / Decimal::from(count))
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);

    let mut charges = Vec::with_capacity(count as usize);
    for i in 0..count {
        let amount = match policy {
            RoundingPolicy::Uniform => per_installment,
            RoundingPolicy::RemainderCorrected if i == count - 1 => {
                total - per_installment * Decimal::from(count - 1)
            }
            RoundingPolicy::RemainderCorrected => per_installment,
        };

        let installment_date = date
            .checked_add_months(Months::new(i))
            .unwrap_or(NaiveDate::MAX);

        charges.push(PlannedCharge {
            amount,
            date: installment_date,
            period: period.plus_months(i),
            installment: format!("{}/{}", i + 1, count),
            charge_type,
        });
    }

    Ok(charges)
}
