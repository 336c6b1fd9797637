//! Write pipeline artifacts back to workbook files

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use rust_xlsxwriter::{Workbook, Worksheet};

use crate::model::ProductRecord;

use super::{CellValue, RawTable};

/// Upload-ready columns, in the order the backend documents them
const CANONICAL_COLUMNS: &[&str] = &[
    "name",
    "description",
    "price",
    "discount",
    "stock",
    "images",
    "is_out_of_stock",
    "is_active",
    "category_id",
    "created_by",
];

/// Enrichment bookkeeping columns appended after the canonical set
const ENRICHMENT_COLUMNS: &[&str] = &["image_match_score", "image_match_name", "image_source"];

fn write_cell(ws: &mut Worksheet, row: u32, col: u16, value: &CellValue) -> Result<()> {
    match value {
        CellValue::Empty => { /* Leave cell empty */ }
        CellValue::String(s) => {
            ws.write_string(row, col, s)?;
        }
        CellValue::Int(i) => {
            ws.write_number(row, col, *i as f64)?;
        }
        CellValue::Float(f) => {
            ws.write_number(row, col, *f)?;
        }
        CellValue::Bool(b) => {
            ws.write_string(row, col, &b.to_string())?;
        }
    }
    Ok(())
}

/// Source-sheet columns not consumed by the column plan, carried through
/// so the output stays a superset of the input.
fn passthrough_columns(table: &RawTable, used: &HashSet<usize>) -> Vec<usize> {
    (0..table.headers.len())
        .filter(|i| !used.contains(i) && !table.headers[*i].is_empty())
        .collect()
}

fn write_record_row(
    ws: &mut Worksheet,
    row: u32,
    record: &ProductRecord,
    table: &RawTable,
    passthrough: &[usize],
) -> Result<()> {
    ws.write_string(row, 0, &record.name)?;
    ws.write_string(row, 1, &record.description)?;
    if let Some(price) = record.price {
        ws.write_number(row, 2, price)?;
    }
    if let Some(discount) = record.discount {
        ws.write_number(row, 3, discount)?;
    }
    if let Some(stock) = record.stock {
        ws.write_number(row, 4, stock as f64)?;
    }
    ws.write_string(row, 5, &record.images.join(","))?;
    ws.write_string(row, 6, &record.is_out_of_stock.to_string())?;
    ws.write_string(row, 7, &record.is_active.to_string())?;
    ws.write_string(row, 8, &record.category_id)?;
    ws.write_string(row, 9, &record.created_by)?;
    ws.write_number(row, 10, record.image_match_score)?;
    ws.write_string(row, 11, &record.image_match_name)?;
    let source = record.image_source.map(|s| s.label()).unwrap_or("");
    ws.write_string(row, 12, source)?;

    let base = (CANONICAL_COLUMNS.len() + ENRICHMENT_COLUMNS.len()) as u16;
    for (offset, &col) in passthrough.iter().enumerate() {
        if let Some(cell) = table.cell(record.row, col) {
            write_cell(ws, row, base + offset as u16, cell)?;
        }
    }
    Ok(())
}

fn write_records(
    table: &RawTable,
    records: &[ProductRecord],
    used: &HashSet<usize>,
    path: &Path,
    limit: Option<usize>,
) -> Result<()> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name("products")?;

    let passthrough = passthrough_columns(table, used);

    let mut col = 0u16;
    for name in CANONICAL_COLUMNS.iter().chain(ENRICHMENT_COLUMNS.iter()) {
        worksheet.write_string(0, col, *name)?;
        col += 1;
    }
    for &source_col in &passthrough {
        worksheet.write_string(0, col, &table.headers[source_col])?;
        col += 1;
    }

    let take = limit.unwrap_or(records.len());
    for (row_idx, record) in records.iter().take(take).enumerate() {
        write_record_row(worksheet, (row_idx + 1) as u32, record, table, &passthrough)?;
    }

    workbook
        .save(path)
        .with_context(|| format!("Failed to save workbook: {}", path.display()))?;
    Ok(())
}

/// Write the enriched record set: canonical upload columns, enrichment
/// bookkeeping, then any source columns the mapping did not consume.
pub fn write_enriched_workbook(
    table: &RawTable,
    records: &[ProductRecord],
    used: &HashSet<usize>,
    path: &Path,
) -> Result<()> {
    write_records(table, records, used, path, None)
}

/// Single-row copy of the enriched output for manual smoke-testing uploads
pub fn write_sample_workbook(
    table: &RawTable,
    records: &[ProductRecord],
    used: &HashSet<usize>,
    path: &Path,
) -> Result<()> {
    write_records(table, records, used, path, Some(1))
}

/// Rows the reader rejected (blank name or sub-header sentinel), saved
/// under the original headers for operator review.
pub fn write_dropped_workbook(
    headers: &[String],
    rows: &[Vec<CellValue>],
    path: &Path,
) -> Result<()> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name("dropped")?;

    for (col, header) in headers.iter().enumerate() {
        worksheet.write_string(0, col as u16, header)?;
    }
    for (row_idx, row) in rows.iter().enumerate() {
        for (col, cell) in row.iter().enumerate() {
            write_cell(worksheet, (row_idx + 1) as u32, col as u16, cell)?;
        }
    }

    workbook
        .save(path)
        .with_context(|| format!("Failed to save workbook: {}", path.display()))?;
    Ok(())
}
