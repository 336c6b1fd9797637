//! Read product tables from loosely-structured workbooks
//!
//! Merchant exports in this spreadsheet family put banner rows and report
//! titles above the real header, so the header row is located by scanning
//! for a product-name marker cell instead of assuming row zero.

use std::path::Path;

use anyhow::{Context, Result, bail};
use calamine::{Data, Reader, Xlsx, open_workbook};

use super::{CellValue, RawTable};

/// How many leading rows to scan for the header marker
pub const DEFAULT_HEADER_SCAN_LIMIT: usize = 10;

/// Marker row inserted between product groups; never a real product
const NON_PRODUCT_SENTINEL: &str = "deal";

/// Convert a calamine cell to our own cell type.
///
/// Whole-number floats collapse to integers so stock counts read back as
/// "12" rather than "12.0".
fn cell_to_value(cell: &Data) -> CellValue {
    match cell {
        Data::Empty => CellValue::Empty,
        Data::String(s) if s.trim().is_empty() => CellValue::Empty,
        Data::String(s) => CellValue::String(s.clone()),
        Data::Int(i) => CellValue::Int(*i),
        Data::Float(f) => {
            if f.fract() == 0.0 && *f >= i64::MIN as f64 && *f <= i64::MAX as f64 {
                CellValue::Int(*f as i64)
            } else {
                CellValue::Float(*f)
            }
        }
        Data::Bool(b) => CellValue::Bool(*b),
        Data::DateTime(dt) => CellValue::String(format!("{}", dt)),
        Data::DateTimeIso(s) => CellValue::String(s.clone()),
        Data::DurationIso(s) => CellValue::String(s.clone()),
        Data::Error(_) => CellValue::Empty,
    }
}

/// Locate the header row within the first `scan_limit` rows.
///
/// A row qualifies when any cell case-insensitively contains "product name"
/// or equals exactly "name".
pub fn detect_header_row(rows: &[Vec<CellValue>], scan_limit: usize) -> Option<usize> {
    for (index, row) in rows.iter().take(scan_limit).enumerate() {
        for cell in row {
            let text = cell.as_text().trim().to_lowercase();
            if text.contains("product name") || text == "name" {
                return Some(index);
            }
        }
    }
    None
}

/// Column index of the name-equivalent header within the header row
fn name_column_index(headers: &[String]) -> Option<usize> {
    headers.iter().position(|h| {
        let text = h.trim().to_lowercase();
        text.contains("product name") || text == "name"
    })
}

/// Split data rows into product rows and rejected rows.
///
/// A row is rejected when its name cell is blank or holds the sub-header
/// sentinel ("Deal"), or when the whole row is empty.
pub(crate) fn split_product_rows(
    rows: Vec<Vec<CellValue>>,
    name_column: usize,
) -> (Vec<Vec<CellValue>>, Vec<Vec<CellValue>>) {
    let mut kept = Vec::new();
    let mut dropped = Vec::new();
    for row in rows {
        if row.iter().all(CellValue::is_blank) {
            continue;
        }
        let name = row
            .get(name_column)
            .map(|c| c.as_text().trim().to_lowercase())
            .unwrap_or_default();
        if name.is_empty() || name == NON_PRODUCT_SENTINEL {
            dropped.push(row);
        } else {
            kept.push(row);
        }
    }
    (kept, dropped)
}

/// Open a products workbook and build a [`RawTable`] from its first sheet.
///
/// Fails when no header row is found within the scan window.
pub fn read_products_table<P: AsRef<Path>>(path: P, scan_limit: usize) -> Result<RawTable> {
    let path = path.as_ref();
    let mut workbook: Xlsx<_> = open_workbook(path)
        .with_context(|| format!("Failed to open spreadsheet: {}", path.display()))?;

    let range = workbook
        .worksheet_range_at(0)
        .context("Workbook has no sheets")?
        .with_context(|| format!("Failed to read first sheet of {}", path.display()))?;

    let all_rows: Vec<Vec<CellValue>> = range
        .rows()
        .map(|row| row.iter().map(cell_to_value).collect())
        .collect();

    let header_index = match detect_header_row(&all_rows, scan_limit) {
        Some(index) => index,
        None => bail!(
            "No header row containing \"Product Name\" (or \"name\") within the first {} rows of {}",
            scan_limit,
            path.display()
        ),
    };
    log::info!("Detected header row at sheet row {}", header_index + 1);

    let headers: Vec<String> = all_rows[header_index]
        .iter()
        .map(|c| c.as_text().trim().to_string())
        .collect();

    let name_column = name_column_index(&headers)
        .context("Header row matched but no product-name column resolved")?;

    let data_rows: Vec<Vec<CellValue>> = all_rows.into_iter().skip(header_index + 1).collect();
    let (rows, dropped) = split_product_rows(data_rows, name_column);

    log::info!(
        "Loaded {} product rows ({} rejected as blank or sub-header)",
        rows.len(),
        dropped.len()
    );

    Ok(RawTable {
        headers,
        rows,
        name_column,
        dropped,
    })
}
