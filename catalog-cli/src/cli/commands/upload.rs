//! Clean the spreadsheet and push its rows to the backend as a JSON
//! bulk upload, optionally purging the catalog first.

use anyhow::{Result, bail};
use colored::*;

use crate::api::{CatalogClient, ProductPayload};
use crate::cli::UploadArgs;
use crate::config::Config;
use crate::model::RecordDefaults;
use crate::spreadsheet::{self, DEFAULT_HEADER_SCAN_LIMIT, writer};
use crate::{mapping, validate};

use super::purge;

pub async fn run(config: &Config, args: &UploadArgs) -> Result<()> {
    config.require_admin_token()?;
    let client = CatalogClient::new(&config.backend_base_url, &config.admin_token);
    client.check_token().await?;

    let products_path = args
        .input
        .clone()
        .unwrap_or_else(|| config.products_path());
    let table = spreadsheet::read_products_table(&products_path, DEFAULT_HEADER_SCAN_LIMIT)?;

    if !table.dropped.is_empty() {
        let dropped_path = config.dropped_path();
        match writer::write_dropped_workbook(&table.headers, &table.dropped, &dropped_path) {
            Ok(()) => println!(
                "Saved {} dropped rows to {}",
                table.dropped.len(),
                dropped_path.display()
            ),
            Err(error) => log::warn!("Could not save the dropped rows: {error:#}"),
        }
    }

    let plan = mapping::resolve_plan(&table.headers)?;
    let defaults = RecordDefaults {
        category_id: config.default_category_id,
        created_by: config.default_created_by,
    };
    let records = mapping::build_records(&table, &plan, &defaults);

    let (records, drops) = validate::validate_records(records)?;
    if drops.total() > 0 {
        println!("Validation: {}", drops.to_string().yellow());
    }
    if records.is_empty() {
        bail!("No valid rows to upload");
    }

    if args.purge {
        let deleted = purge::purge_all(&client, 100).await?;
        println!("Purged {deleted} existing products");
    }

    // Images stay out of this payload; the sheet carries stock numbers,
    // not image URLs, and the backend keeps whatever it already has.
    let payloads: Vec<ProductPayload> = records
        .iter()
        .map(|record| ProductPayload::from_record(record, false))
        .collect();

    println!("Uploading {} products...", payloads.len().to_string().cyan());
    client.bulk_upload_json(&payloads).await?;
    println!("{}", "Products uploaded successfully".green());
    Ok(())
}
