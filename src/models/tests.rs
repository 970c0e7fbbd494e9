#![allow(clippy::unwrap_used)]

use chrono::NaiveDate;
use rust_decimal_macros::dec;

use super::*;

fn at(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> chrono::NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(h, min, s)
        .unwrap()
}

// ── Expense ───────────────────────────────────────────────────

#[test]
fn test_expense_new_defaults() {
    let e = Expense::new("Pan".into(), dec!(1.20), 1, 2, None);
    assert!(e.id.is_none());
    assert_eq!(e.category_id, 1);
    assert_eq!(e.payment_method_id, 2);
    assert!(!e.created_at.is_empty());
    assert_eq!(e.created_at, e.updated_at);
}

#[test]
fn test_expense_keys() {
    let e = Expense::new("Bus".into(), dec!(2.50), 1, 1, Some(at(2024, 2, 1, 8, 30, 0)));
    assert_eq!(e.month_key().as_deref(), Some("2024-02"));
    assert_eq!(e.day_key().as_deref(), Some("2024-02-01"));
    assert_eq!(e.date_display(), "2024-02-01 08:30:00");
}

#[test]
fn test_expense_keys_without_date() {
    let e = Expense::new("?".into(), dec!(1), 1, 1, None);
    assert!(e.month_key().is_none());
    assert!(e.day_key().is_none());
    assert_eq!(e.date_display(), "");
}

// ── parse_amount ──────────────────────────────────────────────

#[test]
fn test_parse_amount_basic() {
    assert_eq!(parse_amount("50.75").unwrap(), dec!(50.75));
    assert_eq!(parse_amount(" 12 ").unwrap(), dec!(12));
}

#[test]
fn test_parse_amount_with_currency() {
    assert_eq!(parse_amount("$1,234.56").unwrap(), dec!(1234.56));
    assert_eq!(parse_amount("1,000,000").unwrap(), dec!(1000000));
    assert_eq!(parse_amount("-$2,500.10").unwrap(), dec!(-2500.10));
}

#[test]
fn test_parse_amount_decimal_comma_rejected() {
    for input in ["50,75", "1,5", "1,2345", ",500", "1,234,5", "12.5,0"] {
        assert!(
            matches!(parse_amount(input), Err(crate::error::AppError::Validation(_))),
            "{input} should be rejected"
        );
    }
}

#[test]
fn test_parse_amount_negative_is_accepted() {
    assert_eq!(parse_amount("-3.00").unwrap(), dec!(-3.00));
}

#[test]
fn test_parse_amount_invalid() {
    assert!(matches!(
        parse_amount("doce"),
        Err(crate::error::AppError::Validation(_))
    ));
    assert!(parse_amount("").is_err());
    assert!(parse_amount("$").is_err());
}

// ── parse_timestamp ───────────────────────────────────────────

#[test]
fn test_parse_timestamp_formats() {
    assert_eq!(
        parse_timestamp("2024-01-05 13:45:10"),
        Some(at(2024, 1, 5, 13, 45, 10))
    );
    assert_eq!(
        parse_timestamp("2024-01-05T13:45:10"),
        Some(at(2024, 1, 5, 13, 45, 10))
    );
    assert_eq!(parse_timestamp("2024-01-05"), Some(at(2024, 1, 5, 0, 0, 0)));
}

#[test]
fn test_parse_timestamp_rejects_garbage() {
    assert!(parse_timestamp("").is_none());
    assert!(parse_timestamp("   ").is_none());
    assert!(parse_timestamp("05/01/2024").is_none());
    assert!(parse_timestamp("2024-13-01").is_none());
}

#[test]
fn test_parse_date_arg_error() {
    assert!(parse_date_arg("ayer").is_err());
    assert!(parse_date_arg("2024-03-09").is_ok());
}

#[test]
fn test_parse_month() {
    assert_eq!(parse_month("2024-01", 2030).unwrap(), "2024-01");
    assert_eq!(parse_month("3", 2024).unwrap(), "2024-03");
    assert_eq!(parse_month("11", 2024).unwrap(), "2024-11");
    assert!(parse_month("2024-13", 2024).is_err());
    assert!(parse_month("enero", 2024).is_err());
}

#[test]
fn test_format_timestamp_matches_parse() {
    let dt = at(2023, 12, 31, 23, 59, 59);
    assert_eq!(parse_timestamp(&format_timestamp(dt)), Some(dt));
}

// ── Lookups ───────────────────────────────────────────────────

#[test]
fn test_find_by_name_case_insensitive() {
    let cats = vec![
        Category::from_parts(1, "Alimentación".into(), String::new(), String::new()),
        Category::from_parts(2, "Transporte".into(), String::new(), String::new()),
    ];
    assert_eq!(find_by_name(&cats, "transporte").and_then(|c| c.id), Some(2));
    assert_eq!(find_by_name(&cats, " Transporte ").and_then(|c| c.id), Some(2));
    assert!(find_by_name(&cats, "Salud").is_none());
}

#[test]
fn test_lookup_labels() {
    assert_eq!(Category::TABLE, "categories");
    assert_eq!(PaymentMethod::TABLE, "payment_methods");
    assert_eq!(PaymentMethod::LABEL, "Payment method");
}

#[test]
fn test_category_display() {
    let cat = Category::from_parts(3, "Salud".into(), String::new(), String::new());
    assert_eq!(format!("{cat}"), "Salud");
    assert_eq!(cat.id(), Some(3));
}

// ── SpendingLimit ─────────────────────────────────────────────

#[test]
fn test_spending_limit_remaining() {
    let limit = SpendingLimit {
        id: Some(1),
        amount: dec!(500),
        created_at: String::new(),
        updated_at: String::new(),
    };
    assert_eq!(limit.remaining(dec!(120.50)), dec!(379.50));
    assert!(!limit.is_exceeded_by(dec!(500)));
    assert!(limit.is_exceeded_by(dec!(500.01)));
}

