use std::path::Path;

use super::HEADERS;
use crate::error::{AppError, AppResult};
use crate::models::ExpenseDetail;

pub(super) fn write_path(details: &[ExpenseDetail], path: &Path) -> AppResult<()> {
    let mut wtr = csv::Writer::from_path(path).map_err(|e| AppError::Export(e.to_string()))?;
    wtr.write_record(HEADERS)
        .map_err(|e| AppError::Export(e.to_string()))?;

    for detail in details {
        let expense = &detail.expense;
        wtr.write_record([
            expense.id.map(|id| id.to_string()).unwrap_or_default(),
            expense.date_display(),
            expense.amount.to_string(),
            expense.description.clone(),
            detail.category.clone(),
            detail.payment_method.clone(),
        ])
        .map_err(|e| AppError::Export(e.to_string()))?;
    }

    wtr.flush()?;
    Ok(())
}

pub(super) fn read_path(path: &Path) -> AppResult<Vec<Vec<String>>> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .has_headers(false)
        .from_path(path)?;

    let mut rows = Vec::new();
    for record in rdr.records() {
        let record = record?;
        rows.push(record.iter().map(|s| s.to_string()).collect());
    }
    Ok(rows)
}
