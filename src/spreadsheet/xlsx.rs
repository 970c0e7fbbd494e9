use calamine::{open_workbook_auto, Data, Reader, Xlsx};
use rust_decimal::prelude::ToPrimitive;
use rust_xlsxwriter::{Format, Workbook};
use std::io::{Read, Seek};
use std::path::Path;

use super::{HEADERS, SHEET_NAME};
use crate::error::{AppError, AppResult};
use crate::models::{format_timestamp, ExpenseDetail};

fn build_workbook(details: &[ExpenseDetail]) -> AppResult<Workbook> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(SHEET_NAME)?;

    let bold = Format::new().set_bold();
    for (col, header) in HEADERS.iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, *header, &bold)?;
    }

    for (i, detail) in details.iter().enumerate() {
        let row = (i + 1) as u32;
        let expense = &detail.expense;
        let amount = expense.amount.to_f64().ok_or_else(|| {
            AppError::Export(format!("amount {} does not fit a cell", expense.amount))
        })?;

        if let Some(id) = expense.id {
            worksheet.write_number(row, 0, id as f64)?;
        }
        worksheet.write_string(row, 1, expense.date_display())?;
        worksheet.write_number(row, 2, amount)?;
        worksheet.write_string(row, 3, &expense.description)?;
        worksheet.write_string(row, 4, &detail.category)?;
        worksheet.write_string(row, 5, &detail.payment_method)?;
    }

    worksheet.set_column_width(1, 20)?;
    worksheet.set_column_width(3, 40)?;
    worksheet.set_column_width(4, 18)?;
    worksheet.set_column_width(5, 22)?;
    Ok(workbook)
}

pub(super) fn write_path(details: &[ExpenseDetail], path: &Path) -> AppResult<()> {
    let mut workbook = build_workbook(details)?;
    workbook.save(path)?;
    Ok(())
}

pub(super) fn write_buffer(details: &[ExpenseDetail]) -> AppResult<Vec<u8>> {
    let mut workbook = build_workbook(details)?;
    Ok(workbook.save_to_buffer()?)
}

pub(super) fn read_path(path: &Path) -> AppResult<Vec<Vec<String>>> {
    let mut workbook = open_workbook_auto(path)?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| AppError::Import("workbook has no sheets".into()))??;
    Ok(range
        .rows()
        .map(|row| row.iter().map(cell_text).collect())
        .collect())
}

pub(super) fn read_reader<R: Read + Seek>(reader: R) -> AppResult<Vec<Vec<String>>> {
    let mut workbook: Xlsx<R> = Xlsx::new(reader)?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| AppError::Import("workbook has no sheets".into()))??;
    Ok(range
        .rows()
        .map(|row| row.iter().map(cell_text).collect())
        .collect())
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        Data::Float(f) => f.to_string(),
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => dt.as_datetime().map(format_timestamp).unwrap_or_default(),
        _ => String::new(),
    }
}
