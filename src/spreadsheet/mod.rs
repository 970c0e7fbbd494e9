//! Spreadsheet interchange for expenses.
//!
//! One sheet, one header row, one row per expense. The layout is the same for
//! `.xlsx` and `.csv`; the file extension picks the format.

mod delimited;
mod xlsx;

use chrono::NaiveDateTime;
use std::io::{Read, Seek};
use std::path::Path;
use tracing::{info, warn};

use crate::db::Database;
use crate::error::{AppError, AppResult};
use crate::models::{
    find_by_name, parse_amount, parse_timestamp, Category, Expense, ExpenseDetail, ExpenseFilter,
    PaymentMethod,
};

pub(crate) const SHEET_NAME: &str = "Gastos";

pub(crate) const HEADERS: [&str; 6] = [
    "ID",
    "Fecha",
    "Monto",
    "Descripción",
    "Categoría",
    "Método de Pago",
];

/// Older exports used this header for the date column.
const LEGACY_DATE_HEADER: &str = "Fecha de Creación";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FileFormat {
    Xlsx,
    Csv,
}

impl FileFormat {
    /// `.csv` selects CSV; anything else is treated as a workbook.
    pub(crate) fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("csv") => Self::Csv,
            _ => Self::Xlsx,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SkippedRow {
    /// 1-based sheet row, header included.
    pub(crate) row: usize,
    pub(crate) reason: String,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct ImportOutcome {
    pub(crate) imported: usize,
    pub(crate) skipped: Vec<SkippedRow>,
}

// ── Export ────────────────────────────────────────────────────

fn export_rows(db: &Database) -> AppResult<Vec<ExpenseDetail>> {
    let mut details = db.get_expense_details(&ExpenseFilter::default())?;
    details.sort_by_key(|d| d.expense.id);
    Ok(details)
}

/// Write every expense to `path`. Returns the number of rows written.
pub(crate) fn export_file(db: &Database, path: &Path) -> AppResult<usize> {
    let details = export_rows(db)?;
    match FileFormat::from_path(path) {
        FileFormat::Xlsx => xlsx::write_path(&details, path)?,
        FileFormat::Csv => delimited::write_path(&details, path)?,
    }
    info!(path = %path.display(), rows = details.len(), "exported expenses");
    Ok(details.len())
}

/// Build the workbook in memory.
pub(crate) fn export_to_buffer(db: &Database) -> AppResult<Vec<u8>> {
    let details = export_rows(db)?;
    xlsx::write_buffer(&details)
}

// ── Import ────────────────────────────────────────────────────

pub(crate) fn import_file(db: &mut Database, path: &Path) -> AppResult<ImportOutcome> {
    let table = match FileFormat::from_path(path) {
        FileFormat::Xlsx => xlsx::read_path(path)?,
        FileFormat::Csv => delimited::read_path(path)?,
    };
    let outcome = import_table(db, &table)?;
    info!(
        path = %path.display(),
        imported = outcome.imported,
        skipped = outcome.skipped.len(),
        "imported expenses"
    );
    Ok(outcome)
}

/// Import a workbook held in memory.
pub(crate) fn import_from_reader<R: Read + Seek>(
    db: &mut Database,
    reader: R,
) -> AppResult<ImportOutcome> {
    let table = xlsx::read_reader(reader)?;
    import_table(db, &table)
}

fn import_table(db: &mut Database, table: &[Vec<String>]) -> AppResult<ImportOutcome> {
    let categories = db.get_categories()?;
    let methods = db.get_payment_methods()?;
    let now = chrono::Local::now().naive_local();

    let (expenses, skipped) = build_expenses(table, &categories, &methods, now)?;
    for s in &skipped {
        warn!(row = s.row, reason = %s.reason, "skipped import row");
    }
    let imported = db.insert_expenses_batch(&expenses)?;
    Ok(ImportOutcome { imported, skipped })
}

struct Columns {
    date: Option<usize>,
    amount: usize,
    description: usize,
    category: usize,
    payment_method: usize,
}

fn normalize_header(h: &str) -> String {
    h.trim_start_matches('\u{feff}').trim().to_lowercase()
}

fn locate_columns(header: &[String]) -> AppResult<Columns> {
    let names: Vec<String> = header.iter().map(|h| normalize_header(h)).collect();
    let find = |name: &str| {
        let wanted = normalize_header(name);
        names.iter().position(|n| *n == wanted)
    };
    let require = |name: &str| {
        find(name).ok_or_else(|| AppError::Import(format!("missing required column '{name}'")))
    };

    Ok(Columns {
        date: find(HEADERS[1]).or_else(|| find(LEGACY_DATE_HEADER)),
        amount: require(HEADERS[2])?,
        description: require(HEADERS[3])?,
        category: require(HEADERS[4])?,
        payment_method: require(HEADERS[5])?,
    })
}

/// Turn a raw table (header row first) into expenses. Rows that cannot be
/// resolved are reported in the second vector instead of failing the import.
fn build_expenses(
    table: &[Vec<String>],
    categories: &[Category],
    methods: &[PaymentMethod],
    now: NaiveDateTime,
) -> AppResult<(Vec<Expense>, Vec<SkippedRow>)> {
    let Some((header, rows)) = table.split_first() else {
        return Err(AppError::Import("sheet is empty".into()));
    };
    let cols = locate_columns(header)?;

    let mut expenses = Vec::new();
    let mut skipped = Vec::new();

    for (i, row) in rows.iter().enumerate() {
        let row_number = i + 2;
        if row.iter().all(|c| c.trim().is_empty()) {
            continue;
        }
        let cell = |idx: usize| row.get(idx).map(|s| s.trim()).unwrap_or("");

        let amount = match parse_amount(cell(cols.amount)) {
            Ok(a) => a,
            Err(_) => {
                skipped.push(SkippedRow {
                    row: row_number,
                    reason: format!("invalid amount '{}'", cell(cols.amount)),
                });
                continue;
            }
        };

        let category_name = cell(cols.category);
        let Some(category) = find_by_name(categories, category_name) else {
            skipped.push(SkippedRow {
                row: row_number,
                reason: format!("unknown category '{category_name}'"),
            });
            continue;
        };

        let method_name = cell(cols.payment_method);
        let Some(method) = find_by_name(methods, method_name) else {
            skipped.push(SkippedRow {
                row: row_number,
                reason: format!("unknown payment method '{method_name}'"),
            });
            continue;
        };

        let (Some(category_id), Some(method_id)) = (category.id, method.id) else {
            continue;
        };

        let date = cols
            .date
            .and_then(|idx| parse_timestamp(cell(idx)))
            .unwrap_or(now);

        expenses.push(Expense::new(
            cell(cols.description).to_string(),
            amount,
            category_id,
            method_id,
            Some(date),
        ));
    }

    Ok((expenses, skipped))
}
