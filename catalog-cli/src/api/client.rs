//! Catalog backend client
//!
//! One reqwest client, one bearer token. A 401 from any call maps to
//! [`CredentialError`] so every entry point halts identically on an
//! invalid or expired token; other non-success statuses are either fatal
//! (bulk upload) or logged and skipped (delete, update), per operation.

use std::fmt;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use reqwest::StatusCode;

use super::models::{BackendProduct, ProductListResponse, ProductPayload};

/// Connect/read timeout for the reachability probe
const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Marker error for a rejected admin token (HTTP 401)
#[derive(Debug)]
pub struct CredentialError;

impl fmt::Display for CredentialError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid or expired admin token (HTTP 401); update admin_token and retry"
        )
    }
}

impl std::error::Error for CredentialError {}

/// True when the error chain bottoms out in a rejected credential
pub fn is_credential_error(error: &anyhow::Error) -> bool {
    error.is::<CredentialError>()
}

pub struct CatalogClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

impl CatalogClient {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        CatalogClient {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn check_status(&self, status: StatusCode) -> Result<StatusCode> {
        if status == StatusCode::UNAUTHORIZED {
            return Err(anyhow::Error::new(CredentialError));
        }
        Ok(status)
    }

    /// Probe the backend with a short timeout. Any HTTP response counts as
    /// reachable; only a transport failure is an error.
    pub async fn check_reachable(&self) -> Result<()> {
        self.http
            .get(&self.base_url)
            .timeout(PROBE_TIMEOUT)
            .send()
            .await
            .with_context(|| format!("Backend is not reachable at {}", self.base_url))?;
        Ok(())
    }

    /// Verify the admin token against a protected endpoint before doing any
    /// real work. 401 is fatal; other unexpected statuses only warn.
    pub async fn check_token(&self) -> Result<()> {
        let response = self
            .http
            .get(self.url("/api/products"))
            .bearer_auth(&self.token)
            .query(&[("limit", 1u32)])
            .timeout(PROBE_TIMEOUT)
            .send()
            .await
            .context("Failed to reach the backend for the token check")?;

        let status = self.check_status(response.status())?;
        if status != StatusCode::OK {
            log::warn!("Unexpected status {} while checking the admin token", status);
        } else {
            log::info!("Admin token accepted");
        }
        Ok(())
    }

    /// Upload an enriched workbook to the bulk-import endpoint as a
    /// multipart file. Any non-200 aborts the run.
    pub async fn bulk_upload_workbook(&self, path: &Path) -> Result<()> {
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "products.xlsx".to_string());

        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(file_name)
            .mime_str(XLSX_MIME)?;
        let form = reqwest::multipart::Form::new().part("file", part);

        let response = self
            .http
            .post(self.url("/api/products/bulk-upload"))
            .bearer_auth(&self.token)
            .multipart(form)
            .send()
            .await
            .context("Bulk upload request failed")?;

        let status = self.check_status(response.status())?;
        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            bail!("Bulk upload failed with status {}: {}", status, body);
        }
        Ok(())
    }

    /// Upload validated records as a JSON array. Any non-200 aborts the run.
    pub async fn bulk_upload_json(&self, products: &[ProductPayload]) -> Result<()> {
        let response = self
            .http
            .post(self.url("/api/products/bulk-upload"))
            .bearer_auth(&self.token)
            .json(products)
            .send()
            .await
            .context("Bulk upload request failed")?;

        let status = self.check_status(response.status())?;
        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            bail!("Bulk upload failed with status {}: {}", status, body);
        }
        Ok(())
    }

    /// One page of the product list
    pub async fn list_products(&self, page: u32, limit: u32) -> Result<Vec<BackendProduct>> {
        let response = self
            .http
            .get(self.url("/api/products"))
            .bearer_auth(&self.token)
            .query(&[("page", page), ("limit", limit)])
            .send()
            .await
            .context("Product list request failed")?;

        let status = self.check_status(response.status())?;
        if status != StatusCode::OK {
            bail!("Product list returned status {}", status);
        }
        let body: ProductListResponse = response
            .json()
            .await
            .context("Failed to decode product list response")?;
        Ok(body.products)
    }

    /// Every product in the backend, paginating until a short page
    pub async fn list_all_products(&self, page_size: u32) -> Result<Vec<BackendProduct>> {
        let mut all = Vec::new();
        let mut page = 1u32;
        loop {
            let products = self.list_products(page, page_size).await?;
            let count = products.len();
            all.extend(products);
            if count < page_size as usize {
                break;
            }
            page += 1;
        }
        Ok(all)
    }

    /// Delete one product. Returns false (after logging) on a non-200 so
    /// the caller can continue with the rest of the batch.
    pub async fn delete_product(&self, id: &str) -> Result<bool> {
        let response = self
            .http
            .delete(self.url(&format!("/api/products/{id}")))
            .bearer_auth(&self.token)
            .send()
            .await
            .with_context(|| format!("Delete request failed for product {id}"))?;

        let status = self.check_status(response.status())?;
        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            log::warn!("Failed to delete product {}: {} {}", id, status, body);
            return Ok(false);
        }
        Ok(true)
    }

    /// Partial update of price and discount for one product. Non-200 is
    /// logged and skipped, same contract as delete.
    pub async fn update_price_discount(&self, id: &str, price: f64, discount: f64) -> Result<bool> {
        let body = serde_json::json!({ "price": price, "discount": discount });
        let response = self
            .http
            .put(self.url(&format!("/api/products/{id}")))
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await
            .with_context(|| format!("Update request failed for product {id}"))?;

        let status = self.check_status(response.status())?;
        if status != StatusCode::OK {
            let text = response.text().await.unwrap_or_default();
            log::warn!("Failed to update product {}: {} {}", id, status, text);
            return Ok(false);
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_is_normalized() {
        let client = CatalogClient::new("http://localhost:5000/", "token");
        assert_eq!(
            client.url("/api/products"),
            "http://localhost:5000/api/products"
        );
    }

    #[test]
    fn test_unauthorized_maps_to_credential_error() {
        let client = CatalogClient::new("http://localhost:5000", "token");
        let error = client.check_status(StatusCode::UNAUTHORIZED).unwrap_err();
        assert!(is_credential_error(&error));

        assert!(client.check_status(StatusCode::NOT_FOUND).is_ok());
    }
}
