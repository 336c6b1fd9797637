//! Validate and normalize records into upload-ready shape
//!
//! Rows that cannot be repaired are dropped and counted by reason; the
//! operator sees aggregate totals, not per-row detail.

use std::fmt;

use anyhow::Result;
use regex::Regex;

use crate::model::ProductRecord;

/// 36 characters of hex digits and hyphens, the shape the backend accepts
const UUID_SHAPE_PATTERN: &str = r"^[0-9a-fA-F-]{36}$";

/// Aggregate drop totals for one validation pass
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DropCounts {
    /// A required field was missing or blank
    pub missing_required: usize,
    /// Price would not coerce to a number
    pub unparsable_price: usize,
    /// category_id or created_by failed the UUID shape check
    pub invalid_identifier: usize,
}

impl DropCounts {
    pub fn total(&self) -> usize {
        self.missing_required + self.unparsable_price + self.invalid_identifier
    }
}

impl fmt::Display for DropCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} dropped ({} missing required fields, {} unparsable price, {} invalid identifiers)",
            self.total(),
            self.missing_required,
            self.unparsable_price,
            self.invalid_identifier
        )
    }
}

/// Why a single record was rejected
enum Rejection {
    MissingRequired,
    UnparsablePrice,
    InvalidIdentifier,
}

fn check_record(record: &mut ProductRecord, uuid_shape: &Regex) -> Result<(), Rejection> {
    // Coercions first: stock and discount always repair to a numeric value
    record.stock = Some(record.stock.unwrap_or(0).max(0));
    record.discount = Some(record.discount.unwrap_or(0.0).max(0.0));

    let required_text = [
        &record.name,
        &record.description,
        &record.category_id,
        &record.created_by,
    ];
    if required_text.iter().any(|field| field.trim().is_empty()) {
        return Err(Rejection::MissingRequired);
    }

    if record.price.is_none() {
        return Err(Rejection::UnparsablePrice);
    }

    if !uuid_shape.is_match(&record.category_id) || !uuid_shape.is_match(&record.created_by) {
        return Err(Rejection::InvalidIdentifier);
    }

    record.is_out_of_stock = record.stock == Some(0);
    Ok(())
}

/// Filter the record set down to rows the bulk-upload endpoint will accept.
///
/// Idempotent: running the output back through drops nothing further.
pub fn validate_records(records: Vec<ProductRecord>) -> Result<(Vec<ProductRecord>, DropCounts)> {
    let uuid_shape = Regex::new(UUID_SHAPE_PATTERN)?;

    let mut kept = Vec::with_capacity(records.len());
    let mut counts = DropCounts::default();

    for mut record in records {
        match check_record(&mut record, &uuid_shape) {
            Ok(()) => kept.push(record),
            Err(Rejection::MissingRequired) => counts.missing_required += 1,
            Err(Rejection::UnparsablePrice) => counts.unparsable_price += 1,
            Err(Rejection::InvalidIdentifier) => counts.invalid_identifier += 1,
        }
    }

    Ok((kept, counts))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_record() -> ProductRecord {
        ProductRecord {
            row: 0,
            name: "Amul Butter 500g".to_string(),
            description: "Amul | GCMMF".to_string(),
            price: Some(260.0),
            discount: None,
            stock: None,
            images: vec!["https://x/img.jpg".to_string()],
            is_out_of_stock: false,
            is_active: true,
            category_id: "11111111-1111-1111-1111-111111111111".to_string(),
            created_by: "a1b2c3d4-e5f6-7890-1234-567890abcdef".to_string(),
            image_match_score: 92.0,
            image_match_name: "Amul Butter 500 g".to_string(),
            image_source: None,
        }
    }

    #[test]
    fn test_valid_record_passes_with_coercions() {
        let (kept, counts) = validate_records(vec![valid_record()]).unwrap();
        assert_eq!(kept.len(), 1);
        assert_eq!(counts.total(), 0);
        // Missing stock and discount repair to zero
        assert_eq!(kept[0].stock, Some(0));
        assert_eq!(kept[0].discount, Some(0.0));
        assert!(kept[0].is_out_of_stock);
    }

    #[test]
    fn test_blank_required_field_drops_row() {
        let mut record = valid_record();
        record.description = "   ".to_string();
        let (kept, counts) = validate_records(vec![record]).unwrap();
        assert!(kept.is_empty());
        assert_eq!(counts.missing_required, 1);
    }

    #[test]
    fn test_unparsable_price_drops_row() {
        let mut record = valid_record();
        record.price = None;
        let (kept, counts) = validate_records(vec![record]).unwrap();
        assert!(kept.is_empty());
        assert_eq!(counts.unparsable_price, 1);
    }

    #[test]
    fn test_malformed_identifier_drops_row() {
        let mut record = valid_record();
        record.category_id = "not-a-uuid".to_string();
        let (kept, counts) = validate_records(vec![record]).unwrap();
        assert!(kept.is_empty());
        assert_eq!(counts.invalid_identifier, 1);
        assert_eq!(counts.total(), 1);
    }

    #[test]
    fn test_uuid_shape_accepts_hex_and_hyphens_only() {
        let mut record = valid_record();
        record.created_by = "g1b2c3d4-e5f6-7890-1234-567890abcdef".to_string();
        let (kept, counts) = validate_records(vec![record]).unwrap();
        assert!(kept.is_empty());
        assert_eq!(counts.invalid_identifier, 1);
    }

    #[test]
    fn test_negative_stock_clamps_to_zero() {
        let mut record = valid_record();
        record.stock = Some(-3);
        let (kept, _) = validate_records(vec![record]).unwrap();
        assert_eq!(kept[0].stock, Some(0));
        assert!(kept[0].is_out_of_stock);
    }

    #[test]
    fn test_validation_is_idempotent() {
        let mut bad = valid_record();
        bad.category_id = "nope".to_string();
        let records = vec![valid_record(), bad, valid_record()];

        let (first_pass, counts) = validate_records(records).unwrap();
        assert_eq!(first_pass.len(), 2);
        assert_eq!(counts.total(), 1);

        let (second_pass, second_counts) = validate_records(first_pass.clone()).unwrap();
        assert_eq!(second_pass.len(), first_pass.len());
        assert_eq!(second_counts.total(), 0);
    }
}
