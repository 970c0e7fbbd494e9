use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use std::str::FromStr;

use crate::error::{AppError, AppResult};

/// Storage and interchange format for expense timestamps.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone)]
pub struct Expense {
    pub id: Option<i64>,
    pub description: String,
    pub amount: Decimal,
    pub category_id: i64,
    pub payment_method_id: i64,
    /// `None` for rows that were stored without a date; those are left out of reports.
    pub date: Option<NaiveDateTime>,
    pub created_at: String,
    pub updated_at: String,
}

impl Expense {
    pub fn new(
        description: String,
        amount: Decimal,
        category_id: i64,
        payment_method_id: i64,
        date: Option<NaiveDateTime>,
    ) -> Self {
        let now = super::now_stamp();
        Self {
            id: None,
            description,
            amount,
            category_id,
            payment_method_id,
            date,
            created_at: now.clone(),
            updated_at: now,
        }
    }

    /// "YYYY-MM" bucket used by the monthly report.
    pub fn month_key(&self) -> Option<String> {
        self.date.map(|d| d.format("%Y-%m").to_string())
    }

    /// "YYYY-MM-DD" bucket used by the daily report.
    pub fn day_key(&self) -> Option<String> {
        self.date.map(|d| d.format("%Y-%m-%d").to_string())
    }

    pub fn date_display(&self) -> String {
        self.date.map(format_timestamp).unwrap_or_default()
    }
}

/// An expense joined with the names of its category and payment method.
#[derive(Debug, Clone)]
pub struct ExpenseDetail {
    pub expense: Expense,
    pub category: String,
    pub payment_method: String,
}

/// Optional narrowing for expense listings. Every `Some` field must match.
#[derive(Debug, Clone, Default)]
pub struct ExpenseFilter {
    /// Inclusive lower bound on the expense day.
    pub from: Option<NaiveDate>,
    /// Inclusive upper bound on the expense day.
    pub to: Option<NaiveDate>,
    /// "YYYY-MM" prefix.
    pub month: Option<String>,
    pub category_id: Option<i64>,
    pub payment_method_id: Option<i64>,
}

/// Parse a user-entered amount. Currency symbols and thousand separators are dropped.
pub fn parse_amount(s: &str) -> AppResult<Decimal> {
    let invalid = || AppError::Validation(format!("'{s}' is not a valid amount"));
    let cleaned = s.replace('$', "");
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        return Err(AppError::Validation("amount is empty".into()));
    }
    let plain = if cleaned.contains(',') {
        strip_thousands(cleaned).ok_or_else(invalid)?
    } else {
        cleaned.to_string()
    };
    Decimal::from_str(&plain).map_err(|_| invalid())
}

/// Drop thousand separators from the integer part. Every group after the
/// first must hold exactly three digits, so a decimal comma ("50,75") is
/// rejected instead of read as 5075.
fn strip_thousands(s: &str) -> Option<String> {
    let (int_part, frac) = match s.split_once('.') {
        Some((int_part, frac)) => (int_part, Some(frac)),
        None => (s, None),
    };
    if frac.is_some_and(|f| f.contains(',')) {
        return None;
    }

    let mut groups = int_part.trim_start_matches(['-', '+']).split(',');
    let first = groups.next()?;
    if first.is_empty() || first.len() > 3 {
        return None;
    }
    if groups.any(|g| g.len() != 3 || !g.bytes().all(|b| b.is_ascii_digit())) {
        return None;
    }

    let mut plain = int_part.replace(',', "");
    if let Some(f) = frac {
        plain.push('.');
        plain.push_str(f);
    }
    Some(plain)
}

/// Parse a timestamp in the interchange format, falling back to ISO `T`
/// separators and bare dates (midnight).
pub fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    for fmt in [TIMESTAMP_FORMAT, "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Like `parse_timestamp` but an unparseable, non-empty value is an error.
pub fn parse_date_arg(s: &str) -> AppResult<NaiveDateTime> {
    parse_timestamp(s).ok_or_else(|| {
        AppError::Validation(format!(
            "'{s}' is not a date (expected YYYY-MM-DD or YYYY-MM-DD HH:MM:SS)"
        ))
    })
}

/// Validate a "YYYY-MM" month key. A single- or two-digit month is taken
/// relative to `year`.
pub fn parse_month(s: &str, year: i32) -> AppResult<String> {
    let s = s.trim();
    let candidate = if s.len() <= 2 {
        format!("{year}-{s:0>2}")
    } else {
        s.to_string()
    };
    match NaiveDate::parse_from_str(&format!("{candidate}-01"), "%Y-%m-%d") {
        Ok(d) => Ok(d.format("%Y-%m").to_string()),
        Err(_) => Err(AppError::Validation(format!(
            "'{s}' is not a month (expected YYYY-MM)"
        ))),
    }
}

pub fn format_timestamp(dt: NaiveDateTime) -> String {
    dt.format(TIMESTAMP_FORMAT).to_string()
}
