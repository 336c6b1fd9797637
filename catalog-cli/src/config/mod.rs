//! Runtime configuration
//!
//! Settings come from an optional TOML file (platform config dir by
//! default) with environment-variable overrides on top, so no credential
//! or endpoint ever lives in the source. A missing file just means
//! defaults plus environment.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use uuid::Uuid;

/// Placeholder assigned when no trustworthy image match exists
const DEFAULT_FALLBACK_IMAGE: &str = "https://via.placeholder.com/400x400?text=No+Image";

/// Public reference dataset with product_name / image_url columns
const DEFAULT_DATASET_URL: &str =
    "https://static.openfoodfacts.org/data/en.openfoodfacts.org.products.csv";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the catalog backend
    pub backend_base_url: String,
    /// Bearer token for the admin API
    pub admin_token: String,
    /// Where to download the reference dataset from when absent
    pub dataset_url: String,
    /// Placeholder image for records without a trustworthy match
    pub fallback_image_url: String,
    /// Directory holding the input spreadsheet and generated artifacts
    pub data_dir: PathBuf,
    /// Applied when the sheet has no category_id column
    pub default_category_id: Uuid,
    /// Applied when the sheet has no created_by column
    pub default_created_by: Uuid,
    pub thresholds: Thresholds,
    pub google: GoogleSearchConfig,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    /// Minimum fuzzy score for a column-name mapping to be accepted
    pub column_map: f64,
    /// Matches below this score go to the manual-review export
    pub low_confidence: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Thresholds {
            column_map: 80.0,
            low_confidence: 60.0,
        }
    }
}

/// Credentials for the web image search provider
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GoogleSearchConfig {
    pub api_key: String,
    pub cse_id: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            backend_base_url: "http://localhost:5000".to_string(),
            admin_token: String::new(),
            dataset_url: DEFAULT_DATASET_URL.to_string(),
            fallback_image_url: DEFAULT_FALLBACK_IMAGE.to_string(),
            data_dir: PathBuf::from("data"),
            default_category_id: Uuid::from_u128(0x11111111_1111_1111_1111_111111111111),
            default_created_by: Uuid::from_u128(0xa1b2c3d4_e5f6_7890_1234_567890abcdef),
            thresholds: Thresholds::default(),
            google: GoogleSearchConfig::default(),
        }
    }
}

impl Config {
    /// Platform default config file location
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("catalog-cli").join("config.toml"))
    }

    /// Load configuration: explicit file if given, else the default file if
    /// it exists, else defaults; environment overrides always apply last.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(explicit) => Some(explicit.to_path_buf()),
            None => Self::default_path().filter(|p| p.exists()),
        };

        let mut config = match file {
            Some(path) => {
                let raw = std::fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read config file: {}", path.display()))?;
                toml::from_str(&raw)
                    .with_context(|| format!("Failed to parse config file: {}", path.display()))?
            }
            None => Config::default(),
        };
        config.apply_env_overrides();
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(value) = std::env::var("CATALOG_BACKEND_URL") {
            self.backend_base_url = value;
        }
        if let Ok(value) = std::env::var("CATALOG_ADMIN_TOKEN") {
            self.admin_token = value;
        }
        if let Ok(value) = std::env::var("CATALOG_DATASET_URL") {
            self.dataset_url = value;
        }
        if let Ok(value) = std::env::var("CATALOG_DATA_DIR") {
            self.data_dir = PathBuf::from(value);
        }
        if let Ok(value) = std::env::var("GOOGLE_API_KEY") {
            self.google.api_key = value;
        }
        if let Ok(value) = std::env::var("GOOGLE_CSE_ID") {
            self.google.cse_id = value;
        }
    }

    /// The admin token, or a setup error telling the operator where to put it
    pub fn require_admin_token(&self) -> Result<&str> {
        if self.admin_token.trim().is_empty() {
            bail!(
                "No admin token configured; set admin_token in the config file or CATALOG_ADMIN_TOKEN"
            );
        }
        Ok(&self.admin_token)
    }

    pub fn products_path(&self) -> PathBuf {
        self.data_dir.join("products.xlsx")
    }

    pub fn enriched_path(&self) -> PathBuf {
        self.data_dir.join("products_enriched.xlsx")
    }

    pub fn sample_path(&self) -> PathBuf {
        self.data_dir.join("products_enriched_single_row.xlsx")
    }

    pub fn dataset_path(&self) -> PathBuf {
        self.data_dir.join("external_grocery_dataset.csv")
    }

    pub fn review_path(&self) -> PathBuf {
        self.data_dir.join("low_confidence_image_matches.csv")
    }

    pub fn dropped_path(&self) -> PathBuf {
        self.data_dir.join("products_dropped_missing_name.xlsx")
    }

    pub fn google_output_path(&self) -> PathBuf {
        self.data_dir.join("products_with_images_google.xlsx")
    }

    pub fn google_review_path(&self) -> PathBuf {
        self.data_dir.join("products_images_manual_review.csv")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.backend_base_url, "http://localhost:5000");
        assert_eq!(config.thresholds.column_map, 80.0);
        assert_eq!(config.thresholds.low_confidence, 60.0);
        assert_eq!(
            config.default_category_id.to_string(),
            "11111111-1111-1111-1111-111111111111"
        );
        assert_eq!(
            config.default_created_by.to_string(),
            "a1b2c3d4-e5f6-7890-1234-567890abcdef"
        );
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: Config = toml::from_str(
            r#"
            backend_base_url = "https://api.example.com"
            admin_token = "secret"

            [thresholds]
            low_confidence = 70.0
            "#,
        )
        .unwrap();
        assert_eq!(config.backend_base_url, "https://api.example.com");
        assert_eq!(config.admin_token, "secret");
        assert_eq!(config.thresholds.low_confidence, 70.0);
        // Unspecified values fall back to defaults
        assert_eq!(config.thresholds.column_map, 80.0);
        assert_eq!(config.fallback_image_url, DEFAULT_FALLBACK_IMAGE);
    }

    #[test]
    fn test_missing_token_is_a_setup_error() {
        let config = Config::default();
        assert!(config.require_admin_token().is_err());
    }
}
