//! Aggregations over expense records.
//!
//! Everything here is pure: callers load the expenses and hand them in.
//! Undated expenses are skipped by every function.

use rust_decimal::Decimal;
use std::collections::BTreeMap;

use crate::models::{Expense, SpendingLimit};

/// The day with the lowest total, with that total.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct MinSpendDay {
    pub(crate) day: String,
    pub(crate) total: Decimal,
}

#[derive(Debug, Clone)]
pub(crate) struct Summary {
    pub(crate) monthly: BTreeMap<String, Decimal>,
    pub(crate) min_day: Option<MinSpendDay>,
    /// Sum over dated expenses only.
    pub(crate) total: Decimal,
    pub(crate) undated: usize,
    pub(crate) current_month: String,
    pub(crate) current_month_total: Decimal,
    pub(crate) limit: Option<SpendingLimit>,
}

impl Summary {
    /// `Some(remaining)` when a limit is stored; negative once exceeded.
    pub(crate) fn limit_remaining(&self) -> Option<Decimal> {
        self.limit
            .as_ref()
            .map(|l| l.remaining(self.current_month_total))
    }
}

fn group_by<F>(expenses: &[Expense], key: F) -> BTreeMap<String, Decimal>
where
    F: Fn(&Expense) -> Option<String>,
{
    let mut totals: BTreeMap<String, Decimal> = BTreeMap::new();
    for expense in expenses {
        if let Some(k) = key(expense) {
            *totals.entry(k).or_insert(Decimal::ZERO) += expense.amount;
        }
    }
    totals
}

/// Sum of amounts per "YYYY-MM", in calendar order.
pub(crate) fn monthly_totals(expenses: &[Expense]) -> BTreeMap<String, Decimal> {
    group_by(expenses, Expense::month_key)
}

/// Sum of amounts per "YYYY-MM-DD", in calendar order.
pub(crate) fn daily_totals(expenses: &[Expense]) -> BTreeMap<String, Decimal> {
    group_by(expenses, Expense::day_key)
}

/// The day whose total is lowest. Ties go to the earliest day; that order
/// falls out of the sorted grouping and carries no meaning of its own.
pub(crate) fn min_spend_day(expenses: &[Expense]) -> Option<MinSpendDay> {
    let mut best: Option<MinSpendDay> = None;
    for (day, total) in daily_totals(expenses) {
        let lower = match &best {
            None => true,
            Some(b) => total < b.total,
        };
        if lower {
            best = Some(MinSpendDay { day, total });
        }
    }
    best
}

pub(crate) fn summarize(
    expenses: &[Expense],
    current_month: &str,
    limit: Option<SpendingLimit>,
) -> Summary {
    let monthly = monthly_totals(expenses);
    let total = monthly.values().copied().sum();
    let current_month_total = monthly
        .get(current_month)
        .copied()
        .unwrap_or(Decimal::ZERO);
    Summary {
        min_day: min_spend_day(expenses),
        undated: expenses.iter().filter(|e| e.date.is_none()).count(),
        monthly,
        total,
        current_month: current_month.to_string(),
        current_month_total,
        limit,
    }
}
