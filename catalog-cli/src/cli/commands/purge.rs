//! Drain every product out of the backend catalog

use anyhow::Result;
use colored::*;

use crate::api::{CatalogClient, is_credential_error};
use crate::cli::PurgeArgs;
use crate::config::Config;

pub async fn run(config: &Config, args: &PurgeArgs) -> Result<()> {
    config.require_admin_token()?;
    let client = CatalogClient::new(&config.backend_base_url, &config.admin_token);
    client.check_token().await?;

    let deleted = purge_all(&client, args.limit).await?;
    println!(
        "{}",
        format!("Purge complete, {deleted} products deleted").green()
    );
    Ok(())
}

/// Delete products page by page until the catalog is empty.
///
/// Always re-fetches the first page because each round of deletes
/// re-paginates the list underneath us. A rejected token aborts; any other
/// per-item failure is logged and the drain continues, bailing out of the
/// loop only when a full round makes no progress.
pub async fn purge_all(client: &CatalogClient, page_size: u32) -> Result<usize> {
    println!("Fetching products to delete...");
    let mut deleted = 0usize;

    loop {
        let products = match client.list_products(1, page_size).await {
            Ok(products) => products,
            Err(error) if is_credential_error(&error) => return Err(error),
            Err(error) => {
                log::warn!("Failed to fetch the product list: {error:#}");
                break;
            }
        };
        if products.is_empty() {
            break;
        }

        let mut deleted_this_round = 0usize;
        for product in products {
            match client.delete_product(&product.id).await {
                Ok(true) => {
                    log::info!("Deleted '{}' ({})", product.name, product.id);
                    deleted_this_round += 1;
                }
                Ok(false) => {}
                Err(error) if is_credential_error(&error) => return Err(error),
                Err(error) => {
                    log::warn!("Delete request failed for {}: {error:#}", product.id);
                }
            }
        }
        deleted += deleted_this_round;

        if deleted_this_round == 0 {
            log::warn!("No products could be deleted this round, stopping the purge");
            break;
        }
    }

    Ok(deleted)
}
