//! The full enrichment pipeline: spreadsheet -> images -> validation ->
//! bulk upload -> verification read-back

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Result, bail};
use colored::*;

use crate::api::{BackendProduct, CatalogClient};
use crate::cli::EnrichArgs;
use crate::config::Config;
use crate::model::{ProductRecord, RecordDefaults};
use crate::spreadsheet::{self, DEFAULT_HEADER_SCAN_LIMIT, writer};
use crate::{corpus, enrich, mapping, validate};

pub async fn run(config: &Config, args: &EnrichArgs) -> Result<()> {
    let products_path = args
        .input
        .clone()
        .unwrap_or_else(|| config.products_path());
    let client = CatalogClient::new(&config.backend_base_url, &config.admin_token);

    check_prerequisites(config, &products_path, &client, args.skip_upload).await?;

    let dataset_path = config.dataset_path();
    corpus::ensure_dataset(&config.dataset_url, &dataset_path).await?;
    let reference = corpus::load_reference_corpus(&dataset_path)?;

    let table = spreadsheet::read_products_table(&products_path, DEFAULT_HEADER_SCAN_LIMIT)?;
    let plan = mapping::resolve_plan(&table.headers)?;
    let defaults = RecordDefaults {
        category_id: config.default_category_id,
        created_by: config.default_created_by,
    };
    let mut records = mapping::build_records(&table, &plan, &defaults);

    println!(
        "Fuzzy matching {} products against {} reference entries...",
        records.len().to_string().cyan(),
        reference.len().to_string().cyan()
    );
    let summary = enrich::enrich_records(
        &mut records,
        &reference,
        &config.fallback_image_url,
        config.thresholds.low_confidence,
    );

    if !summary.review_rows.is_empty() {
        let review_path = config.review_path();
        match enrich::write_review_csv(&summary.review_rows, &review_path) {
            Ok(()) => println!(
                "Wrote {} low-confidence matches to {}",
                summary.review_rows.len(),
                review_path.display()
            ),
            Err(error) => log::warn!("Could not write the review file: {error:#}"),
        }
    }

    println!(
        "Products with dataset images: {}",
        summary.dataset.to_string().green()
    );
    println!(
        "Products with fallback images: {}",
        summary.fallback.to_string().yellow()
    );
    if summary.skipped_no_name > 0 {
        println!(
            "Rows skipped for missing name: {}",
            summary.skipped_no_name.to_string().yellow()
        );
    }

    let (records, drops) = validate::validate_records(records)?;
    if drops.total() > 0 {
        println!("Validation: {}", drops.to_string().yellow());
    }
    if records.is_empty() {
        bail!("No valid rows left to upload after validation");
    }

    let enriched_path = config.enriched_path();
    writer::write_enriched_workbook(&table, &records, plan.used_columns(), &enriched_path)?;
    println!("Saved enriched file to {}", enriched_path.display());

    let sample_path = config.sample_path();
    writer::write_sample_workbook(&table, &records, plan.used_columns(), &sample_path)?;
    println!("Saved single-row test file to {}", sample_path.display());

    if args.skip_upload {
        println!("{}", "Skipping upload as requested".yellow());
        return Ok(());
    }

    config.require_admin_token()?;
    client.check_token().await?;

    println!("Uploading {} to the backend...", enriched_path.display());
    client.bulk_upload_workbook(&enriched_path).await?;
    println!("{}", "Bulk upload succeeded".green());

    verify_backend(&client, &records).await;
    Ok(())
}

/// Setup errors are fatal before any processing starts
async fn check_prerequisites(
    config: &Config,
    products_path: &Path,
    client: &CatalogClient,
    skip_upload: bool,
) -> Result<()> {
    log::info!("Checking prerequisites...");
    if !config.data_dir.exists() {
        bail!("Missing data folder: {}", config.data_dir.display());
    }
    if !products_path.exists() {
        bail!("Missing input spreadsheet: {}", products_path.display());
    }
    log::info!("All required files and folders are present");

    if !skip_upload {
        client.check_reachable().await?;
        log::info!("Backend server is up");
    }
    Ok(())
}

/// Re-fetch the catalog and compare what landed against what was sent.
/// Best-effort: a failed fetch warns and returns.
async fn verify_backend(client: &CatalogClient, records: &[ProductRecord]) {
    println!("Fetching products from the backend for verification...");
    let products = match client.list_products(1, 2000).await {
        Ok(products) => products,
        Err(error) => {
            log::warn!("Verification fetch failed: {error:#}");
            return;
        }
    };

    let lookup: HashMap<String, &BackendProduct> = products
        .iter()
        .map(|product| (product.name.trim().to_lowercase(), product))
        .collect();

    let mut found = 0usize;
    let mut image_matched = 0usize;
    let mut mismatches: Vec<(String, String, Option<String>)> = Vec::new();

    for record in records {
        let expected = record.first_image().to_string();
        match lookup.get(&record.name.trim().to_lowercase()) {
            Some(product) => {
                found += 1;
                let backend_image = product.first_image();
                if backend_image == expected {
                    image_matched += 1;
                } else {
                    mismatches.push((record.name.clone(), expected, Some(backend_image)));
                }
            }
            None => mismatches.push((record.name.clone(), expected, None)),
        }
    }

    println!();
    println!("{}", "Verification summary".bold());
    println!("Records in enriched file: {}", records.len());
    println!("Found in backend: {}", found.to_string().green());
    println!("Images matching: {}", image_matched.to_string().green());
    println!(
        "Mismatched or missing: {}",
        mismatches.len().to_string().yellow()
    );
    for (name, expected, backend) in mismatches.iter().take(10) {
        println!(
            "  {}: expected '{}', backend has '{}'",
            name,
            expected,
            backend.as_deref().unwrap_or("<not found>")
        );
    }
}
