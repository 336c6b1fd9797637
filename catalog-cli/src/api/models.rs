//! Request and response shapes for the catalog backend

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::model::ProductRecord;

/// Record shape the bulk-upload endpoint accepts as a JSON array
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductPayload {
    pub name: String,
    pub description: String,
    pub price: f64,
    pub discount: f64,
    pub stock: i64,
    pub is_out_of_stock: bool,
    pub is_active: bool,
    pub category_id: String,
    pub created_by: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<String>,
}

impl ProductPayload {
    /// Build an upload payload from a validated record.
    ///
    /// `include_images` is off for the JSON upload path, which leaves image
    /// assignment to the enrichment flow.
    pub fn from_record(record: &ProductRecord, include_images: bool) -> Self {
        ProductPayload {
            name: record.name.clone(),
            description: record.description.clone(),
            price: record.price.unwrap_or(0.0),
            discount: record.discount.unwrap_or(0.0),
            stock: record.stock.unwrap_or(0),
            is_out_of_stock: record.is_out_of_stock,
            is_active: record.is_active,
            category_id: record.category_id.clone(),
            created_by: record.created_by.clone(),
            images: if include_images {
                record.images.clone()
            } else {
                Vec::new()
            },
        }
    }
}

/// A product as the backend returns it
#[derive(Debug, Clone, Deserialize)]
pub struct BackendProduct {
    pub id: String,
    pub name: String,
    /// Either a JSON array of URLs or a comma-separated string, depending
    /// on how the record was ingested
    #[serde(default)]
    pub images: Value,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub discount: Option<f64>,
}

impl BackendProduct {
    /// First image URL in either representation, or empty string
    pub fn first_image(&self) -> String {
        match &self.images {
            Value::Array(items) => items
                .first()
                .and_then(Value::as_str)
                .unwrap_or("")
                .to_string(),
            Value::String(joined) => joined
                .split(',')
                .next()
                .unwrap_or("")
                .trim()
                .to_string(),
            _ => String::new(),
        }
    }
}

/// Envelope around the paginated product list
#[derive(Debug, Deserialize)]
pub struct ProductListResponse {
    #[serde(default)]
    pub products: Vec<BackendProduct>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_payload_serializes_camel_case() {
        let payload = ProductPayload {
            name: "Amul Butter 500g".to_string(),
            description: "Amul".to_string(),
            price: 260.0,
            discount: 0.0,
            stock: 12,
            is_out_of_stock: false,
            is_active: true,
            category_id: "11111111-1111-1111-1111-111111111111".to_string(),
            created_by: "a1b2c3d4-e5f6-7890-1234-567890abcdef".to_string(),
            images: Vec::new(),
        };
        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(value["isOutOfStock"], json!(false));
        assert_eq!(value["categoryId"], json!("11111111-1111-1111-1111-111111111111"));
        // Empty image list is omitted entirely
        assert!(value.get("images").is_none());
    }

    #[test]
    fn test_first_image_from_array_and_string() {
        let from_array: BackendProduct = serde_json::from_value(json!({
            "id": "p1",
            "name": "Amul Butter 500g",
            "images": ["https://x/a.jpg", "https://x/b.jpg"]
        }))
        .unwrap();
        assert_eq!(from_array.first_image(), "https://x/a.jpg");

        let from_string: BackendProduct = serde_json::from_value(json!({
            "id": "p2",
            "name": "Tata Salt 1kg",
            "images": "https://x/salt.jpg, https://x/salt2.jpg"
        }))
        .unwrap();
        assert_eq!(from_string.first_image(), "https://x/salt.jpg");

        let missing: BackendProduct = serde_json::from_value(json!({
            "id": "p3",
            "name": "No Image Item"
        }))
        .unwrap();
        assert_eq!(missing.first_image(), "");
    }

    #[test]
    fn test_product_list_envelope() {
        let parsed: ProductListResponse = serde_json::from_value(json!({
            "products": [{"id": "p1", "name": "A"}],
            "total": 1
        }))
        .unwrap();
        assert_eq!(parsed.products.len(), 1);

        let empty: ProductListResponse = serde_json::from_value(json!({})).unwrap();
        assert!(empty.products.is_empty());
    }
}
