//! Invoice period resolution
//!
//! This module maps a charge date and a card's billing cycle (closing day,
//! due day) to the (year, month) bucket of the invoice the charge belongs
//! to. It is the single source of period resolution for every caller -
//! the lifecycle orchestrator, the limit recalculation, and external
//! callers pre-computing a period for a request.
//!
//! # Algorithm
//!
//! 1. The effective closing month is the charge's own month, unless the
//!    charge date falls after the closing day, in which case it rolls one
//!    month forward (the charge lands in the next cycle).
//! 2. If the due day numerically precedes or equals the closing day, the
//!    due date cannot fall in the closing month itself (it would predate
//!    the close), so the invoice is due one month after the effective
//!    closing month; otherwise it is due in the same month.
//!
//! Both branches produce a cycle of roughly thirty days, and the month
//! arithmetic rolls December into January of the next year.
//!
//! Deterministic, no I/O, fully unit-testable.

use crate::types::{Card, InvoicePeriod};
use chrono::{Datelike, NaiveDate};

/// Resolve the invoice period a charge on `date` is billed under
///
/// # Arguments
///
/// * `date` - The charge date
/// * `closing_day` - Day of month the card's cycle closes (1-31)
/// * `due_day` - Day of month the card's invoice is due (1-31)
///
/// # Returns
///
/// The (year, month) bucket of the invoice's due date
pub fn resolve_period(date: NaiveDate, closing_day: u8, due_day: u8) -> InvoicePeriod {
    let mut closing = InvoicePeriod::from_date(date);

    // Charges after the closing day roll into the next cycle
    if date.day() > closing_day as u32 {
        closing = closing.next();
    }

    if due_day <= closing_day {
        closing.next()
    } else {
        closing
    }
}

/// The invoice period "today" falls under for the given card's cycle
///
/// Used by limit recalculation to decide which charges still count against
/// available credit. Today is always injected by the caller; this module
/// never reads a system clock.
pub fn current_period(today: NaiveDate, card: &Card) -> InvoicePeriod {
    resolve_period(today, card.closing_day, card.due_day)
}
