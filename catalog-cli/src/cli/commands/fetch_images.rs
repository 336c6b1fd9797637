//! Attach images from the web image search provider instead of the
//! offline reference dataset. One search per product name, rate-limited,
//! with the fallback placeholder and a manual-review export for misses.

use std::path::Path;

use anyhow::{Context, Result, bail};
use colored::*;

use crate::cli::FetchImagesArgs;
use crate::config::Config;
use crate::images::{ImageSearchClient, SEARCH_REQUEST_DELAY};
use crate::model::{ImageSource, ProductRecord, RecordDefaults};
use crate::spreadsheet::{self, DEFAULT_HEADER_SCAN_LIMIT, writer};
use crate::mapping;

pub async fn run(config: &Config, args: &FetchImagesArgs) -> Result<()> {
    if config.google.api_key.trim().is_empty() || config.google.cse_id.trim().is_empty() {
        bail!(
            "Image search credentials missing; set google.api_key and google.cse_id \
             (or GOOGLE_API_KEY / GOOGLE_CSE_ID)"
        );
    }

    let products_path = args
        .input
        .clone()
        .unwrap_or_else(|| config.products_path());
    let table = spreadsheet::read_products_table(&products_path, DEFAULT_HEADER_SCAN_LIMIT)?;
    let plan = mapping::resolve_plan(&table.headers)?;
    let defaults = RecordDefaults {
        category_id: config.default_category_id,
        created_by: config.default_created_by,
    };
    let mut records = mapping::build_records(&table, &plan, &defaults);

    let search = ImageSearchClient::new(&config.google.api_key, &config.google.cse_id);
    let total = records.len();
    let mut found = 0usize;
    let mut fallback = 0usize;
    let mut skipped_no_name = 0usize;

    println!("Searching images for {} products...", total.to_string().cyan());
    for (index, record) in records.iter_mut().enumerate() {
        if record.name.trim().is_empty() {
            log::warn!("Row {} has no product name, skipping search", record.row + 1);
            skipped_no_name += 1;
            continue;
        }

        log::info!("[{}/{}] {}", index + 1, total, record.name);
        match search.fetch_image_url(&record.name).await {
            Some(url) => {
                record.images = vec![url];
                record.image_source = Some(ImageSource::Google);
                found += 1;
            }
            None => {
                record.images = vec![config.fallback_image_url.clone()];
                record.image_source = Some(ImageSource::Fallback);
                fallback += 1;
            }
        }

        // Provider rate limit
        tokio::time::sleep(SEARCH_REQUEST_DELAY).await;
    }

    let output_path = config.google_output_path();
    writer::write_enriched_workbook(&table, &records, plan.used_columns(), &output_path)?;
    println!("Saved search results to {}", output_path.display());

    let misses: Vec<&ProductRecord> = records
        .iter()
        .filter(|r| r.image_source == Some(ImageSource::Fallback))
        .collect();
    if !misses.is_empty() {
        let review_path = config.google_review_path();
        match write_miss_csv(&misses, &review_path) {
            Ok(()) => println!(
                "Wrote {} products without a search hit to {}",
                misses.len(),
                review_path.display()
            ),
            Err(error) => log::warn!("Could not write the review file: {error:#}"),
        }
    }

    println!("Images found: {}", found.to_string().green());
    println!("Fallback placeholders: {}", fallback.to_string().yellow());
    if skipped_no_name > 0 {
        println!(
            "Rows skipped for missing name: {}",
            skipped_no_name.to_string().yellow()
        );
    }
    Ok(())
}

/// Products that got the placeholder, for a manual image hunt later
fn write_miss_csv(misses: &[&ProductRecord], path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create review file: {}", path.display()))?;
    writer.write_record(["name", "image"])?;
    for record in misses {
        writer.write_record([record.name.as_str(), record.first_image()])?;
    }
    writer
        .flush()
        .with_context(|| format!("Failed to write review file: {}", path.display()))?;
    Ok(())
}
