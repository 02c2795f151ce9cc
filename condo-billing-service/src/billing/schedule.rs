//! Calendar arithmetic for monthly billing.

use chrono::{Datelike, NaiveDate};
use std::fmt;

/// A calendar month being billed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BillingPeriod {
    pub year: i32,
    pub month: u32,
}

impl BillingPeriod {
    /// The period `date` falls in.
    pub fn containing(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// Last calendar day of the period. Invoices fall due on this day.
    pub fn last_day(&self) -> NaiveDate {
        let (year, month) = if self.month == 12 {
            (self.year + 1, 1)
        } else {
            (self.year, self.month + 1)
        };

        NaiveDate::from_ymd_opt(year, month, 1)
            .and_then(|d| d.pred_opt())
            .unwrap_or(NaiveDate::MAX)
    }

    pub fn days(&self) -> u32 {
        self.last_day().day()
    }

    /// Month as stored in the `period_month` column.
    pub fn month_i32(&self) -> i32 {
        self.month as i32
    }
}

impl fmt::Display for BillingPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{:02}", self.year, self.month)
    }
}

/// Day of `period` on which a subscription that started on `start_date`
/// is billed. Start days past the end of a short month clamp to its last
/// day.
pub fn billing_day(start_date: NaiveDate, period: BillingPeriod) -> u32 {
    start_date.day().min(period.days())
}

/// Where a subscription stands relative to the billing window on a given day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Eligibility {
    Due,
    /// The billing day of this month has not been reached.
    NotYetDue { billing_day: u32 },
    /// The subscription starts in a later month.
    NotStarted,
}

/// Decide whether a subscription starting on `start_date` is due on `today`.
///
/// A run on any day from the billing day through the end of the month
/// yields `Due`; the idempotency check keeps those runs from double billing.
pub fn eligibility(start_date: NaiveDate, today: NaiveDate) -> Eligibility {
    let period = BillingPeriod::containing(today);

    if start_date > period.last_day() {
        return Eligibility::NotStarted;
    }

    let day = billing_day(start_date, period);
    if today.day() >= day {
        Eligibility::Due
    } else {
        Eligibility::NotYetDue { billing_day: day }
    }
}
