//! Record types flowing through the import pipeline

use uuid::Uuid;

/// Where a record's image came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageSource {
    /// Matched against the external reference dataset
    Dataset,
    /// Fetched from the web image search API
    Google,
    /// Fixed placeholder assigned when no trustworthy match existed
    Fallback,
}

impl ImageSource {
    /// String label used in spreadsheets and summaries
    pub fn label(&self) -> &'static str {
        match self {
            ImageSource::Dataset => "dataset",
            ImageSource::Google => "google",
            ImageSource::Fallback => "fallback",
        }
    }
}

/// Default identifiers applied when the source sheet has no such columns
#[derive(Debug, Clone)]
pub struct RecordDefaults {
    pub category_id: Uuid,
    pub created_by: Uuid,
}

/// A single product row as it moves through mapping, enrichment and
/// validation. Numeric fields stay optional until the validator coerces
/// or drops them.
#[derive(Debug, Clone)]
pub struct ProductRecord {
    /// Index into the source table's data rows, for column passthrough
    pub row: usize,
    pub name: String,
    pub description: String,
    pub price: Option<f64>,
    pub discount: Option<f64>,
    pub stock: Option<i64>,
    pub images: Vec<String>,
    pub is_out_of_stock: bool,
    pub is_active: bool,
    pub category_id: String,
    pub created_by: String,
    /// Confidence of the image match, 0-100
    pub image_match_score: f64,
    /// Reference name the image match resolved to
    pub image_match_name: String,
    pub image_source: Option<ImageSource>,
}

impl ProductRecord {
    /// First image URL, or empty string when none is assigned
    pub fn first_image(&self) -> &str {
        self.images.first().map(String::as_str).unwrap_or("")
    }
}
