//! Invoice period type for the card ledger engine
//!
//! An invoice period is the (year, month) bucket a card charge is billed
//! under, identified by the month of its due date. Periods are totally
//! ordered chronologically and support month arithmetic with year rollover,
//! which the period resolver and the installment planner both rely on.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A (year, month) invoice bucket
///
/// The derived ordering compares `year` first and `month` second, which is
/// chronological order. This is what makes "this period or later" queries
/// work with a plain comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct InvoicePeriod {
    /// Calendar year of the invoice due date
    pub year: i32,

    /// Calendar month of the invoice due date (1-12)
    pub month: u32,
}

impl InvoicePeriod {
    /// Create a period, validating the month is in 1-12
    ///
    /// # Returns
    ///
    /// * `Some(InvoicePeriod)` - If the month is valid
    /// * `None` - If the month is outside 1-12
    pub fn new(year: i32, month: u32) -> Option<Self> {
        if (1..=12).contains(&month) {
            Some(InvoicePeriod { year, month })
        } else {
            None
        }
    }

    /// The period containing the given calendar date
    pub fn from_date(date: NaiveDate) -> Self {
        InvoicePeriod {
            year: date.year(),
            month: date.month(),
        }
    }

    /// Advance this period by `months`, rolling the year as needed
    ///
    /// December plus one month is January of the next year.
    pub fn plus_months(self, months: u32) -> Self {
        let zero_based = (self.month - 1) + months;
        InvoicePeriod {
            year: self.year + (zero_based / 12) as i32,
            month: zero_based % 12 + 1,
        }
    }

    /// The period immediately after this one
    pub fn next(self) -> Self {
        self.plus_months(1)
    }

    /// The given day of this period, clamped to the month's length
    ///
    /// Day 31 of a 30-day month resolves to day 30; day 31 of February
    /// resolves to the 28th or 29th. Used to place invoice due dates for
    /// cards whose due day exceeds the length of short months.
    pub fn day(self, day: u8) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, day as u32)
            .unwrap_or_else(|| self.last_day())
    }

    /// The last calendar day of this period
    pub fn last_day(self) -> NaiveDate {
        let next = self.next();
        NaiveDate::from_ymd_opt(next.year, next.month, 1)
            .expect("first of month is always valid")
            .pred_opt()
            .expect("predecessor of first of month is always valid")
    }
}

impl fmt::Display for InvoicePeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}
