//! Web image search provider
//!
//! Queries a parameterized image search endpoint once per product name.
//! Callers serialize requests with [`SEARCH_REQUEST_DELAY`] between calls
//! to stay inside the provider's rate limit; there is no concurrency here.

use std::time::Duration;

use serde::Deserialize;

const SEARCH_URL: &str = "https://www.googleapis.com/customsearch/v1";

/// Fixed inter-request delay for rate-limit compliance (1 request/second)
pub const SEARCH_REQUEST_DELAY: Duration = Duration::from_secs(1);

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    link: String,
}

pub struct ImageSearchClient {
    http: reqwest::Client,
    api_key: String,
    cse_id: String,
}

impl ImageSearchClient {
    pub fn new(api_key: impl Into<String>, cse_id: impl Into<String>) -> Self {
        ImageSearchClient {
            http: reqwest::Client::new(),
            api_key: api_key.into(),
            cse_id: cse_id.into(),
        }
    }

    /// First direct image link for a query, or `None`.
    ///
    /// Provider errors (non-2xx, transport failures, undecodable bodies)
    /// are logged and reported as "no image" so one bad lookup never stops
    /// the pass.
    pub async fn fetch_image_url(&self, query: &str) -> Option<String> {
        let response = match self
            .http
            .get(SEARCH_URL)
            .query(&[
                ("q", query),
                ("cx", self.cse_id.as_str()),
                ("key", self.api_key.as_str()),
                ("searchType", "image"),
                ("num", "1"),
                ("imgType", "photo"),
                ("safe", "medium"),
            ])
            .send()
            .await
        {
            Ok(response) => response,
            Err(error) => {
                log::warn!("Image search request failed for '{}': {}", query, error);
                return None;
            }
        };

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            log::warn!("Image search error for '{}': {} {}", query, status, body);
            return None;
        }

        let body: SearchResponse = match response.json().await {
            Ok(body) => body,
            Err(error) => {
                log::warn!("Undecodable image search response for '{}': {}", query, error);
                return None;
            }
        };

        body.items.into_iter().next().map(|item| item.link)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_response_decodes_items() {
        let body: SearchResponse = serde_json::from_str(
            r#"{"items": [{"link": "https://img.example/a.jpg", "title": "A"}]}"#,
        )
        .unwrap();
        assert_eq!(body.items[0].link, "https://img.example/a.jpg");
    }

    #[test]
    fn test_search_response_without_items() {
        let body: SearchResponse = serde_json::from_str(r#"{"kind": "customsearch#search"}"#).unwrap();
        assert!(body.items.is_empty());
    }
}
