//! Push spreadsheet price and discount values onto products that already
//! exist in the backend, matched by normalized name.

use std::collections::HashMap;
use std::time::Duration;

use anyhow::Result;
use colored::*;

use crate::api::CatalogClient;
use crate::cli::UpdatePricesArgs;
use crate::config::Config;
use crate::spreadsheet::{self, CellValue, DEFAULT_HEADER_SCAN_LIMIT};

/// Resolve one sheet row into (price, discount).
///
/// The sales price wins when present and non-zero, otherwise the M.R.P.
/// stands in. Discount is the percentage gap between M.R.P. and sales
/// price, rounded to two decimals, and zero whenever either side is
/// missing or the M.R.P. is zero.
fn price_and_discount(sales_price: Option<f64>, mrp: Option<f64>) -> (f64, f64) {
    let price = match sales_price {
        Some(sales) if sales != 0.0 => sales,
        _ => mrp.unwrap_or(0.0),
    };
    let discount = match (mrp, sales_price) {
        (Some(mrp), Some(sales)) if mrp != 0.0 => {
            (((mrp - sales) / mrp) * 100.0 * 100.0).round() / 100.0
        }
        _ => 0.0,
    };
    (price, discount)
}

pub async fn run(config: &Config, args: &UpdatePricesArgs) -> Result<()> {
    config.require_admin_token()?;
    let client = CatalogClient::new(&config.backend_base_url, &config.admin_token);
    client.check_token().await?;

    let products_path = args
        .input
        .clone()
        .unwrap_or_else(|| config.products_path());
    let table = spreadsheet::read_products_table(&products_path, DEFAULT_HEADER_SCAN_LIMIT)?;
    let sales_col = table.column_index("Sales Price");
    let mrp_col = table.column_index("M.R.P.");
    if sales_col.is_none() && mrp_col.is_none() {
        anyhow::bail!("The sheet has neither a 'Sales Price' nor an 'M.R.P.' column");
    }

    let cell_number = |row: &[CellValue], col: Option<usize>| -> Option<f64> {
        col.and_then(|c| row.get(c)).and_then(CellValue::as_f64)
    };

    let mut sheet_prices: HashMap<String, (f64, f64)> = HashMap::new();
    for row in &table.rows {
        let name = row
            .get(table.name_column)
            .map(|cell| cell.as_text())
            .unwrap_or_default();
        let key = name.trim().to_lowercase();
        if key.is_empty() {
            continue;
        }
        let sales = cell_number(row, sales_col);
        let mrp = cell_number(row, mrp_col);
        sheet_prices.insert(key, price_and_discount(sales, mrp));
    }
    println!(
        "Loaded prices for {} sheet products",
        sheet_prices.len().to_string().cyan()
    );

    let products = client.list_all_products(100).await?;
    println!("Backend has {} products", products.len().to_string().cyan());

    let mut updated = 0usize;
    let mut skipped = 0usize;
    for product in &products {
        let key = product.name.trim().to_lowercase();
        match sheet_prices.get(&key) {
            Some(&(price, discount)) => {
                if client
                    .update_price_discount(&product.id, price, discount)
                    .await?
                {
                    log::info!(
                        "Updated '{}': price {:.2}, discount {:.2}%",
                        product.name,
                        price,
                        discount
                    );
                    updated += 1;
                }
            }
            None => {
                log::debug!("No sheet row for '{}'", product.name);
                skipped += 1;
            }
        }
        tokio::time::sleep(Duration::from_millis(args.delay_ms)).await;
    }

    println!(
        "Price update complete. Updated: {}, no sheet match: {}",
        updated.to_string().green(),
        skipped.to_string().yellow()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sales_price_wins() {
        assert_eq!(price_and_discount(Some(80.0), Some(100.0)), (80.0, 20.0));
    }

    #[test]
    fn test_mrp_stands_in_for_missing_sales_price() {
        let (price, discount) = price_and_discount(None, Some(120.0));
        assert_eq!(price, 120.0);
        assert_eq!(discount, 0.0);
    }

    #[test]
    fn test_zero_sales_price_falls_back_to_mrp() {
        let (price, discount) = price_and_discount(Some(0.0), Some(50.0));
        assert_eq!(price, 50.0);
        // Sales price of zero still counts in the discount formula
        assert_eq!(discount, 100.0);
    }

    #[test]
    fn test_discount_rounds_to_two_decimals() {
        let (_, discount) = price_and_discount(Some(70.0), Some(90.0));
        assert_eq!(discount, 22.22);
    }

    #[test]
    fn test_no_prices_at_all() {
        assert_eq!(price_and_discount(None, None), (0.0, 0.0));
    }

    #[test]
    fn test_zero_mrp_means_no_discount() {
        assert_eq!(price_and_discount(Some(10.0), Some(0.0)), (10.0, 0.0));
    }
}
