//! Card credit ledger
//!
//! This module is the single write API for a card's available credit.
//! Every mutation of `current_limit` goes through `apply`, `revert`, or
//! `recalculate`, keeping the ledger invariant in one place:
//!
//! ```text
//! current_limit == limit - sum of signed amounts of applied charges
//! ```
//!
//! Expenses reduce available credit; incomes increase it. `revert` is
//! `apply` with the effect negated, which is what Update and Delete use to
//! withdraw a charge's contribution before re-applying or removing it.
//!
//! All arithmetic is checked; overflow rejects the operation and leaves
//! the card unchanged.

use crate::types::{Card, CardCharge, ChargeType, InvoicePeriod, LedgerError};
use rust_decimal::Decimal;

/// Apply a charge's effect to the card's available credit
///
/// An expense of `amount` reduces `current_limit` by `amount`; an income
/// increases it. The available credit may go negative (overdrawn card).
///
/// # Arguments
///
/// * `card` - The card aggregate to mutate
/// * `amount` - The charge amount (always positive)
/// * `charge_type` - Direction of the charge
///
/// # Returns
///
/// * `Ok(())` - If the balance was updated
/// * `Err(LedgerError::ArithmeticOverflow)` - If the update would overflow;
///   the card is left unchanged
pub fn apply(card: &mut Card, amount: Decimal, charge_type: ChargeType) -> Result<(), LedgerError> {
    let new_limit = card
        .current_limit
        .checked_sub(charge_type.signed(amount))
        .ok_or_else(|| LedgerError::arithmetic_overflow("apply", card.id))?;

    card.current_limit = new_limit;
    Ok(())
}

/// Withdraw a previously applied charge's effect from the card
///
/// Exactly inverts [`apply`] for the same amount and type.
///
/// # Arguments
///
/// * `card` - The card aggregate to mutate
/// * `amount` - The charge amount (always positive)
/// * `charge_type` - Direction of the charge being withdrawn
///
/// # Returns
///
/// * `Ok(())` - If the balance was updated
/// * `Err(LedgerError::ArithmeticOverflow)` - If the update would overflow;
///   the card is left unchanged
pub fn revert(
    card: &mut Card,
    amount: Decimal,
    charge_type: ChargeType,
) -> Result<(), LedgerError> {
    let new_limit = card
        .current_limit
        .checked_add(charge_type.signed(amount))
        .ok_or_else(|| LedgerError::arithmetic_overflow("revert", card.id))?;

    card.current_limit = new_limit;
    Ok(())
}

/// Recompute available credit from charge history
///
/// Sums the signed amounts of every charge whose invoice period is
/// `current` or later and sets `current_limit = limit - sum`. Charges
/// strictly before the current period are deliberately ignored: closed
/// unpaid invoices are tracked through invoice paid transitions, not
/// through this ledger.
///
/// Invoked when the card's `limit` itself changes, where no incremental
/// delta exists. The current period is injected by the caller (resolved
/// from "today" via the period resolver); this function performs no I/O
/// and reads no clock.
///
/// # Arguments
///
/// * `card` - The card aggregate to mutate
/// * `charges` - The card's charges from `current` onward (earlier entries
///   are filtered out defensively)
/// * `current` - The invoice period "today" resolves to
///
/// # Returns
///
/// * `Ok(())` - If the balance was recomputed
/// * `Err(LedgerError::ArithmeticOverflow)` - If summation overflows; the
///   card is left unchanged
pub fn recalculate(
    card: &mut Card,
    charges: &[CardCharge],
    current: InvoicePeriod,
) -> Result<(), LedgerError> {
    let mut sum = Decimal::ZERO;
    for charge in charges.iter().filter(|c| c.period >= current) {
        sum = sum
            .checked_add(charge.charge_type.signed(charge.amount))
            .ok_or_else(|| LedgerError::arithmetic_overflow("recalculate", card.id))?;
    }

    card.current_limit = card
        .limit
        .checked_sub(sum)
        .ok_or_else(|| LedgerError::arithmetic_overflow("recalculate", card.id))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::NewCard;
    use chrono::{NaiveDate, Utc};

    fn test_card(limit: Decimal) -> Card {
        NewCard {
            name: "Test".to_string(),
            bank: "Test Bank".to_string(),
            closing_day: 10,
            due_day: 15,
            limit,
        }
        .into_card(1, Utc::now())
    }

    fn charge(amount: Decimal, charge_type: ChargeType, year: i32, month: u32) -> CardCharge {
        CardCharge {
            id: 0,
            card_id: 1,
            description: "test".to_string(),
            amount,
            date: NaiveDate::from_ymd_opt(year, month, 1).unwrap(),
            installment: "1/1".to_string(),
            period: InvoicePeriod::new(year, month).unwrap(),
            charge_type,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_apply_expense_reduces_limit() {
        let mut card = test_card(Decimal::new(100000, 2)); // 1000.00

        apply(&mut card, Decimal::new(30000, 2), ChargeType::Expense).unwrap();

        assert_eq!(card.current_limit, Decimal::new(70000, 2));
        assert_eq!(card.limit, Decimal::new(100000, 2));
    }

    #[test]
    fn test_apply_income_increases_limit() {
        let mut card = test_card(Decimal::new(100000, 2));
        apply(&mut card, Decimal::new(40000, 2), ChargeType::Expense).unwrap();

        apply(&mut card, Decimal::new(10000, 2), ChargeType::Income).unwrap();

        assert_eq!(card.current_limit, Decimal::new(70000, 2));
    }

    #[test]
    fn test_apply_can_overdraw() {
        let mut card = test_card(Decimal::new(10000, 2)); // 100.00

        apply(&mut card, Decimal::new(15000, 2), ChargeType::Expense).unwrap();

        assert_eq!(card.current_limit, Decimal::new(-5000, 2));
    }

    #[test]
    fn test_revert_inverts_apply() {
        let mut card = test_card(Decimal::new(100000, 2));
        let amount = Decimal::new(25050, 2);

        apply(&mut card, amount, ChargeType::Expense).unwrap();
        revert(&mut card, amount, ChargeType::Expense).unwrap();

        assert_eq!(card.current_limit, Decimal::new(100000, 2));
    }

    #[test]
    fn test_revert_income_consumes_credit() {
        let mut card = test_card(Decimal::new(100000, 2));
        apply(&mut card, Decimal::new(20000, 2), ChargeType::Income).unwrap();
        assert_eq!(card.current_limit, Decimal::new(120000, 2));

        revert(&mut card, Decimal::new(20000, 2), ChargeType::Income).unwrap();
        assert_eq!(card.current_limit, Decimal::new(100000, 2));
    }

    #[test]
    fn test_apply_overflow_leaves_card_unchanged() {
        let mut card = test_card(Decimal::new(100000, 2));
        card.current_limit = Decimal::MIN;

        let result = apply(&mut card, Decimal::MAX, ChargeType::Expense);

        if result.is_err() {
            assert!(matches!(
                result.unwrap_err(),
                LedgerError::ArithmeticOverflow { .. }
            ));
            assert_eq!(card.current_limit, Decimal::MIN);
        }
    }

    #[test]
    fn test_recalculate_sums_current_and_future_periods() {
        let mut card = test_card(Decimal::new(100000, 2));
        card.current_limit = Decimal::ZERO; // stale value

        let charges = vec![
            charge(Decimal::new(20000, 2), ChargeType::Expense, 2025, 3),
            charge(Decimal::new(30000, 2), ChargeType::Expense, 2025, 4),
            charge(Decimal::new(5000, 2), ChargeType::Income, 2025, 4),
        ];

        recalculate(&mut card, &charges, InvoicePeriod::new(2025, 3).unwrap()).unwrap();

        // 1000.00 - (200.00 + 300.00 - 50.00) = 550.00
        assert_eq!(card.current_limit, Decimal::new(55000, 2));
    }

    #[test]
    fn test_recalculate_ignores_past_periods() {
        let mut card = test_card(Decimal::new(100000, 2));

        let charges = vec![
            charge(Decimal::new(90000, 2), ChargeType::Expense, 2025, 1),
            charge(Decimal::new(20000, 2), ChargeType::Expense, 2025, 3),
        ];

        recalculate(&mut card, &charges, InvoicePeriod::new(2025, 3).unwrap()).unwrap();

        // Only the March charge counts; the January one is a closed cycle.
        assert_eq!(card.current_limit, Decimal::new(80000, 2));
    }

    #[test]
    fn test_recalculate_with_no_charges_restores_full_limit() {
        let mut card = test_card(Decimal::new(100000, 2));
        card.current_limit = Decimal::new(12345, 2);

        recalculate(&mut card, &[], InvoicePeriod::new(2025, 1).unwrap()).unwrap();

        assert_eq!(card.current_limit, card.limit);
    }

    #[test]
    fn test_replay_invariant_over_operation_sequence() {
        // current_limit == limit - sum of signed amounts of live charges,
        // after an arbitrary apply/revert sequence.
        let limit = Decimal::new(500000, 2); // 5000.00
        let mut card = test_card(limit);

        let e1 = Decimal::new(120000, 2); // expense 1200.00
        let e2 = Decimal::new(80000, 2); // expense 800.00
        let i1 = Decimal::new(30000, 2); // income 300.00

        apply(&mut card, e1, ChargeType::Expense).unwrap();
        apply(&mut card, e2, ChargeType::Expense).unwrap();
        apply(&mut card, i1, ChargeType::Income).unwrap();
        // Delete the second expense
        revert(&mut card, e2, ChargeType::Expense).unwrap();

        let live_sum = e1 - i1;
        assert_eq!(card.current_limit, limit - live_sum);
    }
}
