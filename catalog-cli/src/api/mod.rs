//! HTTP client for the product catalog backend
//!
//! Wraps the handful of remote operations the import pipeline needs: bulk
//! upload, paginated listing, single-record delete, and price/discount
//! updates. All calls are sequential; there is no retry logic anywhere.

pub mod client;
pub mod models;

pub use client::{CatalogClient, CredentialError, is_credential_error};
pub use models::{BackendProduct, ProductListResponse, ProductPayload};
