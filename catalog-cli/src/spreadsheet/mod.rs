//! Spreadsheet I/O
//!
//! Reading uses calamine, writing uses rust_xlsxwriter. The header-row
//! heuristics live in [`reader`] as pure functions so they can be tested
//! without real workbook files.

pub mod reader;
pub mod writer;

pub use reader::{DEFAULT_HEADER_SCAN_LIMIT, detect_header_row, read_products_table};

/// A single spreadsheet cell, detached from calamine's richer cell type
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Empty,
    String(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl CellValue {
    /// Render the cell as text; `Empty` becomes an empty string
    pub fn as_text(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::String(s) => s.clone(),
            CellValue::Int(i) => i.to_string(),
            CellValue::Float(f) => f.to_string(),
            CellValue::Bool(b) => b.to_string(),
        }
    }

    /// True when the cell holds no usable text
    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::String(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Numeric view of the cell, parsing strings when possible
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Int(i) => Some(*i as f64),
            CellValue::Float(f) => Some(*f),
            CellValue::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
    }
}

/// Tabular view of a products sheet after header detection
#[derive(Debug, Clone)]
pub struct RawTable {
    /// Trimmed header texts from the detected header row
    pub headers: Vec<String>,
    /// Data rows below the header that passed the product-row filter
    pub rows: Vec<Vec<CellValue>>,
    /// Column index of the product-name header
    pub name_column: usize,
    /// Rows rejected by the product-row filter, kept for review exports
    pub dropped: Vec<Vec<CellValue>>,
}

impl RawTable {
    /// Case-insensitive lookup of a header's column index
    pub fn column_index(&self, header: &str) -> Option<usize> {
        self.headers
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(header.trim()))
    }

    /// Cell at (row, col), if present
    pub fn cell(&self, row: usize, col: usize) -> Option<&CellValue> {
        self.rows.get(row).and_then(|r| r.get(col))
    }
}
