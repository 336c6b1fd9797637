//! Map arbitrary merchant spreadsheet columns onto the backend schema
//!
//! Two layers: a generic fuzzy pass that matches canonical field names
//! against the sheet's headers, and per-field fallback chains for the known
//! vendor schema. The chains are data, not control flow, so the policy can
//! be read (and changed) in one place.

use std::collections::{HashMap, HashSet};

use anyhow::{Context, Result};

use crate::model::{ProductRecord, RecordDefaults};
use crate::services::matching;
use crate::spreadsheet::{CellValue, RawTable};

/// Fields the bulk-upload endpoint expects
pub const CANONICAL_FIELDS: &[&str] = &[
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

/// Minimum fuzzy score for a header to be accepted as a canonical field
pub const COLUMN_MAP_THRESHOLD: f64 = 80.0;

/// Ordered source-column candidates per target field, tried when the fuzzy
/// pass leaves the field unmapped. Tied to one spreadsheet vendor's schema.
const NAME_SOURCES: &[&str] = &["Product Name", "Code"];
const PRICE_SOURCES: &[&str] = &["Sales Price", "M.R.P.", "Purchase Price"];
const STOCK_SOURCES: &[&str] = &["Current Stock"];
const DISCOUNT_SOURCES: &[&str] = &["Sales Scheme"];
const DESCRIPTION_SOURCES: &[&str] = &["Company", "Manufacturer"];

/// Fuzzy-map canonical field names onto actual sheet headers.
///
/// Partial by design: fields whose best header score does not clear
/// [`COLUMN_MAP_THRESHOLD`] are left out and must be resolved by the
/// fallback chains.
pub fn map_columns(headers: &[String]) -> HashMap<String, String> {
    let mut mapped = HashMap::new();
    for field in CANONICAL_FIELDS {
        if let Some(best) = matching::extract_one(field, headers) {
            if best.score > COLUMN_MAP_THRESHOLD {
                mapped.insert((*field).to_string(), best.choice);
            }
        }
    }
    mapped
}

/// Resolved source columns for one sheet
#[derive(Debug, Clone)]
pub struct ColumnPlan {
    pub name: usize,
    /// Columns joined with " | " to form the description
    pub description: Vec<usize>,
    pub price: Option<usize>,
    pub discount: Option<usize>,
    pub stock: Option<usize>,
    pub images: Option<usize>,
    pub category_id: Option<usize>,
    pub created_by: Option<usize>,
    used: HashSet<usize>,
}

impl ColumnPlan {
    /// Source columns consumed by this plan
    pub fn used_columns(&self) -> &HashSet<usize> {
        &self.used
    }
}

fn header_index(headers: &[String], candidate: &str) -> Option<usize> {
    headers
        .iter()
        .position(|h| h.trim().eq_ignore_ascii_case(candidate.trim()))
}

/// Build the column plan for a sheet: fuzzy mapping first, then the
/// per-field fallback chain. A sheet with no usable name column is
/// unrecoverable.
pub fn resolve_plan(headers: &[String]) -> Result<ColumnPlan> {
    let fuzzy = map_columns(headers);

    let fuzzy_index = |field: &str| -> Option<usize> {
        fuzzy
            .get(field)
            .and_then(|header| headers.iter().position(|h| h == header))
    };
    let resolve = |field: &str, chain: &[&str]| -> Option<usize> {
        fuzzy_index(field).or_else(|| chain.iter().find_map(|c| header_index(headers, c)))
    };

    let name = resolve("name", NAME_SOURCES).context(
        "No usable product name column found; expected \"Product Name\" or \"Code\"",
    )?;

    let description = match fuzzy_index("description") {
        Some(index) => vec![index],
        None => DESCRIPTION_SOURCES
            .iter()
            .filter_map(|c| header_index(headers, c))
            .collect(),
    };

    let price = resolve("price", PRICE_SOURCES);
    let discount = resolve("discount", DISCOUNT_SOURCES);
    let stock = resolve("stock", STOCK_SOURCES);
    let images = fuzzy_index("images");
    let category_id = fuzzy_index("category_id");
    let created_by = fuzzy_index("created_by");

    let mut used = HashSet::new();
    used.insert(name);
    used.extend(description.iter().copied());
    for col in [price, discount, stock, images, category_id, created_by]
        .into_iter()
        .flatten()
    {
        used.insert(col);
    }

    Ok(ColumnPlan {
        name,
        description,
        price,
        discount,
        stock,
        images,
        category_id,
        created_by,
        used,
    })
}

fn text_at(row: &[CellValue], col: Option<usize>) -> Option<String> {
    col.and_then(|c| row.get(c))
        .map(|cell| cell.as_text().trim().to_string())
        .filter(|s| !s.is_empty())
}

fn number_at(row: &[CellValue], col: Option<usize>) -> Option<f64> {
    col.and_then(|c| row.get(c)).and_then(CellValue::as_f64)
}

/// Apply a column plan to every row of the table, producing one record per
/// product row. Numeric coercion failures stay `None` for the validator to
/// judge; identifier defaults fill in when the sheet lacks those columns.
pub fn build_records(
    table: &RawTable,
    plan: &ColumnPlan,
    defaults: &RecordDefaults,
) -> Vec<ProductRecord> {
    let mut records = Vec::with_capacity(table.rows.len());
    for (row_index, row) in table.rows.iter().enumerate() {
        let name = row
            .get(plan.name)
            .map(|c| c.as_text().trim().to_string())
            .unwrap_or_default();

        let description = plan
            .description
            .iter()
            .filter_map(|&c| row.get(c))
            .map(|c| c.as_text().trim().to_string())
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" | ");

        let stock = number_at(row, plan.stock).map(|f| f.round() as i64);
        let images = text_at(row, plan.images)
            .map(|s| {
                s.split(',')
                    .map(str::trim)
                    .filter(|p| !p.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();

        records.push(ProductRecord {
            row: row_index,
            name,
            description,
            price: number_at(row, plan.price),
            discount: number_at(row, plan.discount),
            stock,
            images,
            is_out_of_stock: stock.unwrap_or(0) == 0,
            is_active: true,
            category_id: text_at(row, plan.category_id)
                .unwrap_or_else(|| defaults.category_id.to_string()),
            created_by: text_at(row, plan.created_by)
                .unwrap_or_else(|| defaults.created_by.to_string()),
            image_match_score: 0.0,
            image_match_name: String::new(),
            image_source: None,
        });
    }
    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spreadsheet::RawTable;
    use uuid::Uuid;

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn defaults() -> RecordDefaults {
        RecordDefaults {
            category_id: Uuid::from_u128(0x11111111_1111_1111_1111_111111111111),
            created_by: Uuid::from_u128(0xa1b2c3d4_e5f6_7890_1234_567890abcdef),
        }
    }

    #[test]
    fn test_map_columns_accepts_exact_headers() {
        let headers = headers(&["name", "description", "price", "stock"]);
        let mapped = map_columns(&headers);
        assert_eq!(mapped.get("name").unwrap(), "name");
        assert_eq!(mapped.get("price").unwrap(), "price");
        // Vendor-style headers are nowhere near these canonical names
        assert!(!mapped.contains_key("category_id"));
    }

    #[test]
    fn test_map_columns_leaves_vendor_headers_unmapped() {
        let headers = headers(&["Product Name", "Sales Price", "Current Stock"]);
        let mapped = map_columns(&headers);
        // All below the 80 threshold; fallback chains must resolve them
        assert!(!mapped.contains_key("name"));
        assert!(!mapped.contains_key("price"));
    }

    #[test]
    fn test_resolve_plan_uses_fallback_chains() {
        let headers = headers(&[
            "Code",
            "Product Name",
            "Company",
            "Manufacturer",
            "Sales Price",
            "M.R.P.",
            "Current Stock",
        ]);
        let plan = resolve_plan(&headers).unwrap();
        assert_eq!(plan.name, 1);
        assert_eq!(plan.price, Some(4));
        assert_eq!(plan.stock, Some(6));
        assert_eq!(plan.description, vec![2, 3]);
    }

    #[test]
    fn test_resolve_plan_price_chain_order() {
        let headers = headers(&["Product Name", "M.R.P.", "Purchase Price"]);
        let plan = resolve_plan(&headers).unwrap();
        // "Sales Price" absent, so "M.R.P." wins over "Purchase Price"
        assert_eq!(plan.price, Some(1));
    }

    #[test]
    fn test_resolve_plan_name_falls_back_to_code() {
        let headers = headers(&["Code", "Sales Price"]);
        let plan = resolve_plan(&headers).unwrap();
        assert_eq!(plan.name, 0);
    }

    #[test]
    fn test_resolve_plan_without_name_fails() {
        let headers = headers(&["Sales Price", "Current Stock"]);
        assert!(resolve_plan(&headers).is_err());
    }

    #[test]
    fn test_build_records_applies_plan_and_defaults() {
        let headers = headers(&["Product Name", "Company", "Sales Price", "Current Stock"]);
        let table = RawTable {
            headers: headers.clone(),
            rows: vec![
                vec![
                    CellValue::String("Amul Butter 500g".into()),
                    CellValue::String("Amul".into()),
                    CellValue::Float(260.0),
                    CellValue::Int(12),
                ],
                vec![
                    CellValue::String("Parle-G Biscuits".into()),
                    CellValue::Empty,
                    CellValue::String("not-a-price".into()),
                    CellValue::Int(0),
                ],
            ],
            name_column: 0,
            dropped: vec![],
        };
        let plan = resolve_plan(&headers).unwrap();
        let records = build_records(&table, &plan, &defaults());

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].name, "Amul Butter 500g");
        assert_eq!(records[0].description, "Amul");
        assert_eq!(records[0].price, Some(260.0));
        assert_eq!(records[0].stock, Some(12));
        assert!(!records[0].is_out_of_stock);
        assert_eq!(
            records[0].category_id,
            "11111111-1111-1111-1111-111111111111"
        );

        assert_eq!(records[1].price, None);
        assert_eq!(records[1].stock, Some(0));
        assert!(records[1].is_out_of_stock);
        assert!(records[1].is_active);
    }
}
