#![allow(clippy::unwrap_used)]

use super::*;
use chrono::NaiveDate;
use rust_decimal_macros::dec;

fn day(s: &str) -> Option<chrono::NaiveDateTime> {
    parse_timestamp(s)
}

fn category_id(db: &Database, name: &str) -> i64 {
    db.resolve_category(name).unwrap().id.unwrap()
}

fn method_id(db: &Database, name: &str) -> i64 {
    db.resolve_payment_method(name).unwrap().id.unwrap()
}

fn add_expense(db: &mut Database, desc: &str, amount: Decimal, cat: &str, date: &str) -> i64 {
    let expense = Expense::new(
        desc.into(),
        amount,
        category_id(db, cat),
        method_id(db, "Efectivo"),
        day(date),
    );
    db.insert_expense(&expense).unwrap()
}

// ── Default data ──────────────────────────────────────────────

#[test]
fn test_defaults_seeded() {
    let db = Database::open_in_memory().unwrap();
    let cats = db.get_categories().unwrap();
    assert_eq!(cats.len(), 5);
    assert!(cats.iter().any(|c| c.name == "Alimentación"));
    let methods = db.get_payment_methods().unwrap();
    assert!(methods.iter().any(|m| m.name == "Tarjeta de Débito"));
    assert_eq!(db.get_phrases().unwrap().len(), 5);
    assert!(db.get_spending_limit().unwrap().is_none());
    assert_eq!(db.get_expense_count().unwrap(), 0);
}

#[test]
fn test_defaults_not_reseeded_on_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("gastos.db");
    {
        Database::open(&path).unwrap();
    }
    let db = Database::open(&path).unwrap();
    assert_eq!(db.get_categories().unwrap().len(), 5);
    assert_eq!(db.get_payment_methods().unwrap().len(), 4);
    assert_eq!(db.get_phrases().unwrap().len(), 5);
}

#[test]
fn test_deleted_defaults_stay_deleted_after_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("gastos.db");
    {
        let mut db = Database::open(&path).unwrap();
        for phrase in db.get_phrases().unwrap() {
            db.delete_phrase(phrase.id.unwrap()).unwrap();
        }
        let id = category_id(&db, "Salud");
        db.delete_category(id).unwrap();
    }
    let db = Database::open(&path).unwrap();
    assert!(db.get_phrases().unwrap().is_empty());
    assert!(db.random_phrase().unwrap().is_none());
    assert!(db.resolve_category("Salud").is_err());
    assert_eq!(db.get_categories().unwrap().len(), 4);
}

#[test]
fn test_migrate_is_idempotent() {
    let mut db = Database::open_in_memory().unwrap();
    db.migrate().unwrap();
    let version: i32 = db
        .conn
        .query_row("SELECT version FROM schema_version", [], |row| row.get(0))
        .unwrap();
    assert_eq!(version, schema::CURRENT_VERSION);
}

#[test]
fn test_open_file_database() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("gastos.db");
    {
        let mut db = Database::open(&path).unwrap();
        db.insert_category("Hogar").unwrap();
    }
    let db = Database::open(&path).unwrap();
    assert!(db.resolve_category("Hogar").is_ok());
    assert_eq!(db.get_categories().unwrap().len(), 6);
}

// ── Categories ────────────────────────────────────────────────

#[test]
fn test_category_add_and_list() {
    let mut db = Database::open_in_memory().unwrap();
    let id = db.insert_category("Mascotas").unwrap();
    assert!(id > 0);
    let cats = db.get_categories().unwrap();
    assert!(cats.iter().any(|c| c.name == "Mascotas" && c.id == Some(id)));
    // Listing is alphabetical
    let names: Vec<String> = cats.iter().map(|c| c.name.to_lowercase()).collect();
    let mut sorted = names.clone();
    sorted.sort();
    assert_eq!(names, sorted);
}

#[test]
fn test_category_duplicate_rejected() {
    let mut db = Database::open_in_memory().unwrap();
    let err = db.insert_category("Transporte").unwrap_err();
    assert!(matches!(err, AppError::Duplicate { entity: "Category", .. }));
    // Case and surrounding whitespace don't make a new name
    assert!(db.insert_category("  transporte ").is_err());
    assert_eq!(db.get_categories().unwrap().len(), 5);
}

#[test]
fn test_accented_names_unique_in_any_case() {
    let mut db = Database::open_in_memory().unwrap();
    for name in ["ALIMENTACIÓN", "alimentación", "AlimentaciÓn"] {
        assert!(matches!(
            db.insert_category(name),
            Err(AppError::Duplicate { .. })
        ));
    }
    for name in ["TARJETA DE CRÉDITO", "tarjeta de crédito"] {
        assert!(matches!(
            db.insert_payment_method(name),
            Err(AppError::Duplicate { .. })
        ));
    }
    assert_eq!(db.get_categories().unwrap().len(), 5);
    assert_eq!(db.get_payment_methods().unwrap().len(), 4);
}

#[test]
fn test_resolve_accented_name_matches_import_lookup() {
    let db = Database::open_in_memory().unwrap();
    let resolved = db.resolve_category("ALIMENTACIÓN").unwrap();
    assert_eq!(resolved.name, "Alimentación");

    let cats = db.get_categories().unwrap();
    let found = find_by_name(&cats, "ALIMENTACIÓN").unwrap();
    assert_eq!(found.id, resolved.id);
    assert_eq!(
        db.resolve_payment_method("  TARJETA DE DÉBITO ").unwrap().name,
        "Tarjeta de Débito"
    );
}

#[test]
fn test_category_name_trimmed() {
    let mut db = Database::open_in_memory().unwrap();
    let id = db.insert_category("  Viajes  ").unwrap();
    let cat = db.get_lookup_by_id::<Category>(id).unwrap().unwrap();
    assert_eq!(cat.name, "Viajes");
}

#[test]
fn test_category_empty_name_rejected() {
    let mut db = Database::open_in_memory().unwrap();
    assert!(matches!(
        db.insert_category("   "),
        Err(AppError::Validation(_))
    ));
}

#[test]
fn test_category_delete() {
    let mut db = Database::open_in_memory().unwrap();
    let id = db.insert_category("Temporal").unwrap();
    db.delete_category(id).unwrap();
    assert!(db.get_lookup_by_id::<Category>(id).unwrap().is_none());
}

#[test]
fn test_category_delete_not_found() {
    let mut db = Database::open_in_memory().unwrap();
    let err = db.delete_category(9999).unwrap_err();
    assert!(err.is_not_found());
}

#[test]
fn test_category_delete_in_use() {
    let mut db = Database::open_in_memory().unwrap();
    add_expense(&mut db, "Cine", dec!(12), "Entretenimiento", "2024-01-10");
    let id = category_id(&db, "Entretenimiento");
    let err = db.delete_category(id).unwrap_err();
    assert!(matches!(err, AppError::InUse { count: 1, .. }));
    assert!(db.get_lookup_by_id::<Category>(id).unwrap().is_some());
}

#[test]
fn test_resolve_category_by_id_or_name() {
    let db = Database::open_in_memory().unwrap();
    let id = category_id(&db, "salud");
    assert_eq!(db.resolve_category(&id.to_string()).unwrap().name, "Salud");
    assert!(db.resolve_category("No existe").unwrap_err().is_not_found());
}

// ── Payment methods ───────────────────────────────────────────

#[test]
fn test_payment_method_crud() {
    let mut db = Database::open_in_memory().unwrap();
    let id = db.insert_payment_method("PayPal").unwrap();
    assert_eq!(
        db.get_lookup_by_id::<PaymentMethod>(id).unwrap().unwrap().name,
        "PayPal"
    );
    assert!(matches!(
        db.insert_payment_method("paypal"),
        Err(AppError::Duplicate { .. })
    ));
    db.delete_payment_method(id).unwrap();
    assert!(db.get_lookup_by_id::<PaymentMethod>(id).unwrap().is_none());
    assert!(db.delete_payment_method(id).unwrap_err().is_not_found());
}

#[test]
fn test_payment_method_delete_in_use() {
    let mut db = Database::open_in_memory().unwrap();
    add_expense(&mut db, "Pan", dec!(1.10), "Alimentación", "2024-01-10");
    let id = method_id(&db, "Efectivo");
    assert!(matches!(
        db.delete_payment_method(id),
        Err(AppError::InUse { .. })
    ));
}

// ── Expenses ──────────────────────────────────────────────────

#[test]
fn test_expense_insert_and_list() {
    let mut db = Database::open_in_memory().unwrap();
    let id = add_expense(&mut db, "Compra de comestibles", dec!(50.75), "Alimentación", "2024-01-05");
    assert!(id > 0);

    let all = db.get_expense_details(&ExpenseFilter::default()).unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].expense.description, "Compra de comestibles");
    assert_eq!(all[0].expense.amount, dec!(50.75));
    assert_eq!(all[0].category, "Alimentación");
    assert_eq!(all[0].payment_method, "Efectivo");
    assert_eq!(all[0].expense.date_display(), "2024-01-05 00:00:00");
}

#[test]
fn test_expense_insert_unknown_references() {
    let mut db = Database::open_in_memory().unwrap();
    let bad_cat = Expense::new("x".into(), dec!(1), 9999, method_id(&db, "Efectivo"), None);
    let err = db.insert_expense(&bad_cat).unwrap_err();
    assert!(matches!(err, AppError::NotFound { entity: "Category", .. }));

    let bad_method = Expense::new("x".into(), dec!(1), category_id(&db, "Salud"), 9999, None);
    let err = db.insert_expense(&bad_method).unwrap_err();
    assert!(matches!(err, AppError::NotFound { entity: "Payment method", .. }));
    assert_eq!(db.get_expense_count().unwrap(), 0);
}

#[test]
fn test_expense_without_date() {
    let mut db = Database::open_in_memory().unwrap();
    let expense = Expense::new(
        "Sin fecha".into(),
        dec!(3),
        category_id(&db, "Salud"),
        method_id(&db, "Efectivo"),
        None,
    );
    let id = db.insert_expense(&expense).unwrap();
    let fetched = db.get_expense_by_id(id).unwrap().unwrap();
    assert!(fetched.expense.date.is_none());
}

#[test]
fn test_expense_list_newest_first() {
    let mut db = Database::open_in_memory().unwrap();
    add_expense(&mut db, "old", dec!(1), "Salud", "2023-05-01");
    add_expense(&mut db, "new", dec!(1), "Salud", "2024-05-01");
    add_expense(&mut db, "mid", dec!(1), "Salud", "2024-01-01");
    let list = db.get_expenses(&ExpenseFilter::default()).unwrap();
    let descs: Vec<&str> = list.iter().map(|e| e.description.as_str()).collect();
    assert_eq!(descs, vec!["new", "mid", "old"]);
}

#[test]
fn test_expense_filters() {
    let mut db = Database::open_in_memory().unwrap();
    add_expense(&mut db, "a", dec!(1), "Salud", "2024-01-01");
    add_expense(&mut db, "b", dec!(2), "Transporte", "2024-01-15 18:30:00");
    add_expense(&mut db, "c", dec!(3), "Transporte", "2024-02-01");

    let by_month = db
        .get_expenses(&ExpenseFilter {
            month: Some("2024-01".into()),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(by_month.len(), 2);

    let by_category = db
        .get_expenses(&ExpenseFilter {
            category_id: Some(category_id(&db, "Transporte")),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(by_category.len(), 2);

    // The upper bound includes the whole last day
    let by_range = db
        .get_expenses(&ExpenseFilter {
            from: NaiveDate::from_ymd_opt(2024, 1, 2),
            to: NaiveDate::from_ymd_opt(2024, 1, 15),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(by_range.len(), 1);
    assert_eq!(by_range[0].description, "b");

    let by_method = db
        .get_expenses(&ExpenseFilter {
            payment_method_id: Some(method_id(&db, "Tarjeta de Crédito")),
            ..Default::default()
        })
        .unwrap();
    assert!(by_method.is_empty());
}

#[test]
fn test_expense_update() {
    let mut db = Database::open_in_memory().unwrap();
    let id = add_expense(&mut db, "Cena", dec!(30), "Alimentación", "2024-01-20");

    let mut expense = db.get_expense_by_id(id).unwrap().unwrap().expense;
    expense.description = "Cena en restaurante".into();
    expense.amount = dec!(32.40);
    expense.category_id = category_id(&db, "Entretenimiento");
    expense.payment_method_id = method_id(&db, "Tarjeta de Crédito");
    expense.date = day("2024-01-21 21:00:00");
    db.update_expense(&expense).unwrap();

    let updated = db.get_expense_by_id(id).unwrap().unwrap();
    assert_eq!(updated.expense.description, "Cena en restaurante");
    assert_eq!(updated.expense.amount, dec!(32.40));
    assert_eq!(updated.category, "Entretenimiento");
    assert_eq!(updated.payment_method, "Tarjeta de Crédito");
    assert_eq!(updated.expense.date_display(), "2024-01-21 21:00:00");
}

#[test]
fn test_expense_update_not_found() {
    let mut db = Database::open_in_memory().unwrap();
    let mut expense = Expense::new("x".into(), dec!(1), 1, 1, None);
    expense.id = Some(4242);
    assert!(db.update_expense(&expense).unwrap_err().is_not_found());
}

#[test]
fn test_expense_update_bad_reference_rolls_back() {
    let mut db = Database::open_in_memory().unwrap();
    let id = add_expense(&mut db, "Bus", dec!(2.50), "Transporte", "2024-02-01");
    let mut expense = db.get_expense_by_id(id).unwrap().unwrap().expense;
    expense.description = "changed".into();
    expense.category_id = 9999;
    assert!(db.update_expense(&expense).is_err());
    let unchanged = db.get_expense_by_id(id).unwrap().unwrap();
    assert_eq!(unchanged.expense.description, "Bus");
}

#[test]
fn test_expense_delete() {
    let mut db = Database::open_in_memory().unwrap();
    let id = add_expense(&mut db, "Cine", dec!(12), "Entretenimiento", "2024-01-10");
    db.delete_expense(id).unwrap();
    assert!(db.get_expense_by_id(id).unwrap().is_none());
    assert!(db
        .get_expenses(&ExpenseFilter::default())
        .unwrap()
        .is_empty());
}

#[test]
fn test_expense_delete_not_found() {
    let db = Database::open_in_memory().unwrap();
    let err = db.delete_expense(12345).unwrap_err();
    assert!(matches!(err, AppError::NotFound { entity: "Expense", .. }));
}

#[test]
fn test_expense_batch_is_atomic() {
    let mut db = Database::open_in_memory().unwrap();
    let cat = category_id(&db, "Salud");
    let method = method_id(&db, "Efectivo");
    let batch = vec![
        Expense::new("ok".into(), dec!(1), cat, method, None),
        Expense::new("bad".into(), dec!(1), 9999, method, None),
    ];
    assert!(db.insert_expenses_batch(&batch).is_err());
    assert_eq!(db.get_expense_count().unwrap(), 0);

    let count = db.insert_expenses_batch(&batch[..1]).unwrap();
    assert_eq!(count, 1);
    assert_eq!(db.get_expense_count().unwrap(), 1);
}

// ── Phrases ───────────────────────────────────────────────────

#[test]
fn test_phrase_crud() {
    let db = Database::open_in_memory().unwrap();
    let id = db.insert_phrase("Ahorra hoy para disfrutar mañana.").unwrap();
    let phrases = db.get_phrases().unwrap();
    assert_eq!(phrases.last().unwrap().id, Some(id));
    assert!(db.insert_phrase("  ").is_err());

    db.delete_phrase(id).unwrap();
    assert!(db.delete_phrase(id).unwrap_err().is_not_found());
}

#[test]
fn test_random_phrase() {
    let db = Database::open_in_memory().unwrap();
    let phrase = db.random_phrase().unwrap().unwrap();
    assert!(!phrase.text.is_empty());

    for p in db.get_phrases().unwrap() {
        db.delete_phrase(p.id.unwrap()).unwrap();
    }
    assert!(db.random_phrase().unwrap().is_none());
}

// ── Spending limit ────────────────────────────────────────────

#[test]
fn test_spending_limit_lazy_singleton() {
    let mut db = Database::open_in_memory().unwrap();
    assert!(db.get_spending_limit().unwrap().is_none());

    db.set_spending_limit(dec!(500)).unwrap();
    let first = db.get_spending_limit().unwrap().unwrap();
    assert_eq!(first.amount, dec!(500));

    db.set_spending_limit(dec!(750.50)).unwrap();
    let second = db.get_spending_limit().unwrap().unwrap();
    assert_eq!(second.amount, dec!(750.50));
    assert_eq!(second.id, first.id);

    let rows: i64 = db
        .conn
        .query_row("SELECT COUNT(*) FROM settings", [], |row| row.get(0))
        .unwrap();
    assert_eq!(rows, 1);
}

#[test]
fn test_spending_limit_negative_rejected() {
    let mut db = Database::open_in_memory().unwrap();
    assert!(matches!(
        db.set_spending_limit(dec!(-1)),
        Err(AppError::Validation(_))
    ));
    assert!(db.get_spending_limit().unwrap().is_none());
}

// ── Reports over stored data ──────────────────────────────────

#[test]
fn test_reports_from_database() {
    let mut db = Database::open_in_memory().unwrap();
    add_expense(&mut db, "Compra", dec!(50.75), "Alimentación", "2024-01-05");
    add_expense(&mut db, "Cena", dec!(30.00), "Alimentación", "2024-01-20");
    add_expense(&mut db, "Bus", dec!(2.50), "Transporte", "2024-02-01");

    let expenses = db.get_expenses(&ExpenseFilter::default()).unwrap();
    let monthly = crate::report::monthly_totals(&expenses);
    assert_eq!(monthly["2024-01"], dec!(80.75));
    assert_eq!(monthly["2024-02"], dec!(2.50));
    let min = crate::report::min_spend_day(&expenses).unwrap();
    assert_eq!(min.day, "2024-02-01");
}
