//! Recurring-order templates and next-run date arithmetic.

use chrono::{Duration, Months, NaiveDate};
use serde::{Deserialize, Serialize};

use dentiva_core::{CustomerId, ItemId, Money, RecurringOrderId};

/// Unit of a recurring-order interval.
///
/// The ERP stores the unit as free text. Unrecognized values fall back to
/// weeks; the original system had two processors disagreeing on this default
/// ("weeks" vs "months"), resolved here in favor of weeks (see DESIGN.md).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntervalUnit {
    Weeks,
    Months,
}

impl IntervalUnit {
    /// Parse the ERP's free-text unit field, defaulting to weeks.
    pub fn parse_or_weeks(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "month" | "months" => IntervalUnit::Months,
            _ => IntervalUnit::Weeks,
        }
    }
}

/// Lifecycle status of a recurring-order template.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecurringStatus {
    Active,
    Paused,
}

/// A recurring-order template, keyed and owned by the ERP.
///
/// This code reads due templates and PATCHes `next_run` after a cycle; it
/// never creates or deletes templates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecurringOrder {
    pub id: RecurringOrderId,
    pub customer_id: CustomerId,
    pub customer_email: String,
    pub item_id: ItemId,
    pub quantity: u32,
    pub amount: Money,
    pub interval: u32,
    pub interval_unit: IntervalUnit,
    pub next_run: NaiveDate,
    pub status: RecurringStatus,
}

impl RecurringOrder {
    /// Whether this template is due for processing as of `as_of`.
    pub fn is_due(&self, as_of: NaiveDate) -> bool {
        self.status == RecurringStatus::Active && self.next_run <= as_of
    }

    /// The next run date after the current one.
    ///
    /// Advances from the stored `next_run`, not from today, so a template
    /// processed late keeps its original cadence.
    pub fn advanced_next_run(&self) -> NaiveDate {
        next_run_after(self.next_run, self.interval, self.interval_unit)
    }
}

/// Add `interval` `unit`s to a date.
///
/// Month addition clamps to month-end (Jan 31 + 1 month = Feb 28/29). An
/// out-of-range result (far future overflow) leaves the date unchanged
/// rather than panicking.
pub fn next_run_after(from: NaiveDate, interval: u32, unit: IntervalUnit) -> NaiveDate {
    match unit {
        IntervalUnit::Weeks => from
            .checked_add_signed(Duration::weeks(i64::from(interval)))
            .unwrap_or(from),
        IntervalUnit::Months => from.checked_add_months(Months::new(interval)).unwrap_or(from),
    }
}
