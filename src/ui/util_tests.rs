#![allow(clippy::unwrap_used)]

use rust_decimal_macros::dec;

use super::util::*;

// ── truncate ──────────────────────────────────────────────────

#[test]
fn test_truncate_fits() {
    assert_eq!(truncate("Salud", 10), "Salud");
    assert_eq!(truncate("Salud", 5), "Salud");
    assert_eq!(truncate("", 0), "");
}

#[test]
fn test_truncate_accents() {
    assert_eq!(truncate("Transferencia Bancaria", 10), "Transfere…");
    assert_eq!(truncate("Alimentación", 11), "Alimentaci…");
}

#[test]
fn test_truncate_tiny_widths() {
    assert_eq!(truncate("Efectivo", 1), "…");
    assert_eq!(truncate("Efectivo", 0), "");
}

// ── format_amount ─────────────────────────────────────────────

#[test]
fn test_format_amount() {
    assert_eq!(format_amount(dec!(1234.56)), "$1,234.56");
    assert_eq!(format_amount(dec!(0)), "$0.00");
    assert_eq!(format_amount(dec!(2.5)), "$2.50");
    assert_eq!(format_amount(dec!(10000000)), "$10,000,000.00");
}

#[test]
fn test_format_amount_negative() {
    assert_eq!(format_amount(dec!(-30.75)), "-$30.75");
    assert_eq!(format_amount(dec!(-99999.01)), "-$99,999.01");
}

// ── split_fields ──────────────────────────────────────────────

#[test]
fn test_split_fields() {
    assert_eq!(
        split_fields("12.50 | Salud | Efectivo | Farmacia"),
        vec!["12.50", "Salud", "Efectivo", "Farmacia"]
    );
    assert_eq!(split_fields(" | Transporte |  | "), vec!["", "Transporte", "", ""]);
    assert!(split_fields("   ").is_empty());
}

#[test]
fn test_split_fields_escaped_pipe() {
    assert_eq!(
        split_fields(r"9 | Salud | Efectivo | Farmacia \| turno noche"),
        vec!["9", "Salud", "Efectivo", "Farmacia | turno noche"]
    );
    let escaped = escape_field("a|b");
    assert_eq!(escaped, r"a\|b");
    assert_eq!(split_fields(&format!("{escaped} | c")), vec!["a|b", "c"]);
}

// ── shift_month ───────────────────────────────────────────────

#[test]
fn test_shift_month() {
    assert_eq!(shift_month("2024-01", 1).unwrap(), "2024-02");
    assert_eq!(shift_month("2024-01", -1).unwrap(), "2023-12");
    assert_eq!(shift_month("2024-12", 13).unwrap(), "2026-01");
    assert!(shift_month("enero", 1).is_none());
}

// ── scrolling ─────────────────────────────────────────────────

#[test]
fn test_scroll_down_keeps_cursor_visible() {
    let (mut index, mut scroll) = (0, 0);
    for _ in 0..5 {
        scroll_down(&mut index, &mut scroll, 10, 3);
    }
    assert_eq!(index, 5);
    assert_eq!(scroll, 3);
    scroll_up(&mut index, &mut scroll);
    scroll_up(&mut index, &mut scroll);
    scroll_up(&mut index, &mut scroll);
    assert_eq!((index, scroll), (2, 2));
}

#[test]
fn test_scroll_stops_at_ends() {
    let (mut index, mut scroll) = (0, 0);
    scroll_up(&mut index, &mut scroll);
    assert_eq!(index, 0);
    scroll_to_bottom(&mut index, &mut scroll, 4, 10);
    assert_eq!((index, scroll), (3, 0));
    scroll_down(&mut index, &mut scroll, 4, 10);
    assert_eq!(index, 3);
}
