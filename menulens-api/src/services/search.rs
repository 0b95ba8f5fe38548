//! Search-provider collaborator
//!
//! Trait seam over the SerpAPI-style search service. The provider is assumed
//! unreliable (timeouts, empty results); every caller supplies an
//! empty-result fallback rather than failing hard.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

use menulens_common::{Error, Result};

const SEARCH_TIMEOUT: Duration = Duration::from_secs(15);

/// One review returned by the maps-reviews engine
#[derive(Debug, Clone, Deserialize)]
pub struct ReviewSnippet {
    #[serde(default)]
    pub snippet: Option<String>,
}

/// Search-provider interface
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Image search; returns candidate URLs in provider rank order
    async fn image_search(&self, query: &str, count: usize) -> Result<Vec<String>>;

    /// Place search; returns the first local result's data_id, if any
    async fn maps_search(&self, query: &str) -> Result<Option<String>>;

    /// Reviews for a place identified by data_id
    async fn maps_reviews(&self, data_id: &str) -> Result<Vec<ReviewSnippet>>;
}

/// SerpAPI-backed search provider
pub struct SerpApiClient {
    http_client: reqwest::Client,
    base_url: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct ImageSearchResponse {
    #[serde(default)]
    images_results: Vec<ImageResult>,
}

#[derive(Debug, Deserialize)]
struct ImageResult {
    #[serde(default)]
    original: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MapsSearchResponse {
    #[serde(default)]
    local_results: Vec<LocalResult>,
}

#[derive(Debug, Deserialize)]
struct LocalResult {
    #[serde(default)]
    data_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MapsReviewsResponse {
    #[serde(default)]
    reviews: Vec<ReviewSnippet>,
}

impl SerpApiClient {
    pub fn new(base_url: String, api_key: String) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(SEARCH_TIMEOUT)
            .build()
            .map_err(|e| Error::Upstream(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            base_url,
            api_key,
        })
    }

    async fn search_request<T: serde::de::DeserializeOwned>(
        &self,
        params: &[(&str, &str)],
    ) -> Result<T> {
        let response = self
            .http_client
            .get(&self.base_url)
            .query(params)
            .query(&[("api_key", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| Error::Upstream(format!("Search request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(Error::Upstream(format!(
                "Search API error {}: {}",
                status.as_u16(),
                error_text
            )));
        }

        response
            .json()
            .await
            .map_err(|e| Error::Upstream(format!("Search response parse error: {}", e)))
    }
}

#[async_trait]
impl SearchProvider for SerpApiClient {
    async fn image_search(&self, query: &str, count: usize) -> Result<Vec<String>> {
        let count_str = count.to_string();
        let parsed: ImageSearchResponse = self
            .search_request(&[
                ("engine", "google_images"),
                ("q", query),
                ("num", &count_str),
            ])
            .await?;

        Ok(parsed
            .images_results
            .into_iter()
            .filter_map(|r| r.original)
            .collect())
    }

    async fn maps_search(&self, query: &str) -> Result<Option<String>> {
        let parsed: MapsSearchResponse = self
            .search_request(&[
                ("engine", "google_maps"),
                ("q", query),
                ("type", "search"),
            ])
            .await?;

        Ok(parsed.local_results.into_iter().next().and_then(|r| r.data_id))
    }

    async fn maps_reviews(&self, data_id: &str) -> Result<Vec<ReviewSnippet>> {
        let parsed: MapsReviewsResponse = self
            .search_request(&[
                ("engine", "google_maps_reviews"),
                ("data_id", data_id),
                ("hl", "en"),
            ])
            .await?;

        Ok(parsed.reviews)
    }
}
