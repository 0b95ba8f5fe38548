//! Review mention engine
//!
//! URL validation and resolution, review fetch, and cross-reference against
//! the menu's dish names. Everything past validation degrades softly: an
//! unextractable place, a failed search, or unparseable model output all
//! yield an empty mention list rather than an error.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use std::time::Duration;

use menulens_common::{Error, Result};

use crate::models::DishMention;
use crate::services::completion::{strip_code_fence, CompletionModel, TextCompletionRequest};
use crate::services::search::{ReviewSnippet, SearchProvider};

const RESOLVE_TIMEOUT: Duration = Duration::from_secs(10);

/// Most reviews fetched per place
pub const MAX_REVIEWS: usize = 20;

/// Most review snippets fed to the mention model
pub const MAX_SNIPPETS: usize = 15;

pub const SHARE_GOOGLE_MESSAGE: &str =
    "share.google links are not supported. Please use the Google Maps app to share.";
pub const NOT_MAPS_LINK_MESSAGE: &str = "This doesn't look like a Google Maps link. \
     Open the restaurant in Google Maps, tap Share, and copy the link.";

/// Domain substrings accepted as Google Maps links
const VALID_URL_PATTERNS: &[&str] = &[
    "google.com/maps",
    "maps.google.com",
    "goo.gl/maps",
    "maps.app.goo.gl",
];

/// Short-link domains that need redirect resolution before parsing
const SHORT_LINK_DOMAINS: &[&str] = &["goo.gl", "maps.app"];

static DATA_CID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"0x[0-9a-fA-F]+:0x[0-9a-fA-F]+").expect("data-cid regex"));
static PLACE_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/maps/place/([^/@]+)").expect("place-name regex"));

/// Outcome of URL format validation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UrlPolicy {
    /// Accepted Google Maps link
    Supported,
    /// Known-unsupported short-link family with its own rejection message
    UnsupportedShareLink,
    /// Not recognizable as a Google Maps link at all
    NotMapsLink,
}

/// Classify a URL against the Maps-link policy
pub fn validate_maps_url(url: &str) -> UrlPolicy {
    if url.contains("share.google") {
        return UrlPolicy::UnsupportedShareLink;
    }
    if VALID_URL_PATTERNS.iter().any(|pattern| url.contains(pattern)) {
        return UrlPolicy::Supported;
    }
    UrlPolicy::NotMapsLink
}

/// Redirect-following URL resolution, behind a trait so tests stay offline
#[async_trait]
pub trait UrlResolver: Send + Sync {
    async fn resolve(&self, url: &str) -> Result<String>;
}

/// reqwest-backed resolver: HEAD request following redirects
pub struct HttpUrlResolver {
    http_client: reqwest::Client,
}

impl HttpUrlResolver {
    pub fn new() -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(RESOLVE_TIMEOUT)
            .build()
            .map_err(|e| Error::Upstream(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { http_client })
    }
}

#[async_trait]
impl UrlResolver for HttpUrlResolver {
    async fn resolve(&self, url: &str) -> Result<String> {
        let response = self
            .http_client
            .head(url)
            .send()
            .await
            .map_err(|e| Error::Upstream(format!("Short URL resolution failed: {}", e)))?;
        Ok(response.url().to_string())
    }
}

/// Resolve short links to full Maps URLs; resolution failure falls back to
/// the original URL
pub async fn resolve_short_url(resolver: &dyn UrlResolver, url: &str) -> String {
    if !SHORT_LINK_DOMAINS.iter().any(|domain| url.contains(domain)) {
        return url.to_string();
    }
    match resolver.resolve(url).await {
        Ok(resolved) => resolved,
        Err(e) => {
            tracing::warn!(url = %url, error = %e, "Error resolving short URL");
            url.to_string()
        }
    }
}

/// Place identity extracted from a Maps URL
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlaceIdentity {
    /// Structured place identifier ("0x...:0x...")
    pub data_cid: Option<String>,
    /// Free-text place name from the URL path
    pub query: Option<String>,
}

impl PlaceIdentity {
    pub fn is_empty(&self) -> bool {
        self.data_cid.is_none() && self.query.is_none()
    }
}

/// Extract place identity from a (resolved) Maps URL
pub fn extract_place_identity(url: &str) -> PlaceIdentity {
    let data_cid = DATA_CID_RE.find(url).map(|m| m.as_str().to_string());

    let query = PLACE_NAME_RE.captures(url).map(|caps| {
        caps.get(1)
            .map(|m| m.as_str())
            .unwrap_or_default()
            .replace('+', " ")
            .replace("%20", " ")
    });

    PlaceIdentity { data_cid, query }
}

/// Fetch review snippets for the place behind a Maps URL.
///
/// Degrades to an empty list on any failure: unextractable place identity,
/// failed place search, missing data_id, or a provider error.
pub async fn fetch_reviews(
    search: &dyn SearchProvider,
    resolver: &dyn UrlResolver,
    maps_url: &str,
) -> Vec<ReviewSnippet> {
    let resolved = resolve_short_url(resolver, maps_url).await;
    let place = extract_place_identity(&resolved);

    if place.is_empty() {
        tracing::warn!(url = %maps_url, "Could not extract place info from URL");
        return Vec::new();
    }

    let data_id = if let Some(cid) = place.data_cid {
        cid
    } else {
        // Free-text name: preliminary search resolves the identifier from
        // only its first result
        let query = place.query.unwrap_or_default();
        match search.maps_search(&query).await {
            Ok(Some(data_id)) => data_id,
            Ok(None) => {
                tracing::warn!(query = %query, "No local results found");
                return Vec::new();
            }
            Err(e) => {
                tracing::warn!(query = %query, error = %e, "Error searching for place");
                return Vec::new();
            }
        }
    };

    match search.maps_reviews(&data_id).await {
        Ok(mut reviews) => {
            reviews.truncate(MAX_REVIEWS);
            reviews
        }
        Err(e) => {
            tracing::warn!(error = %e, "Error fetching reviews");
            Vec::new()
        }
    }
}

const MENTION_SYSTEM_PROMPT: &str = "You analyze restaurant reviews to find mentions of specific dishes.
Given a list of dishes from the menu and customer reviews, identify which dishes are mentioned positively.
Return a JSON array of objects with \"dish\" (exact name from menu) and \"quote\" (brief excerpt from review mentioning it).
Only include dishes that are clearly mentioned positively. Return max 5 dishes.
If no dishes are clearly mentioned, return an empty array.";

/// Cross-reference review snippets against menu dish names.
///
/// Model or parse failure degrades to an empty mention list.
pub async fn extract_dish_mentions(
    model: &dyn CompletionModel,
    reviews: &[ReviewSnippet],
    dish_names: &[String],
) -> Vec<DishMention> {
    let snippets: Vec<&str> = reviews
        .iter()
        .filter_map(|r| r.snippet.as_deref())
        .filter(|s| !s.is_empty())
        .take(MAX_SNIPPETS)
        .collect();

    if snippets.is_empty() {
        return Vec::new();
    }

    let dish_list = match serde_json::to_string(dish_names) {
        Ok(json) => json,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to serialize dish names");
            return Vec::new();
        }
    };

    let user_prompt = format!(
        "Menu dishes: {}\n\nReviews:\n{}\n\nReturn JSON array only, no other text.",
        dish_list,
        snippets.join("\n---\n")
    );

    let raw = match model
        .complete_text(TextCompletionRequest {
            system: Some(MENTION_SYSTEM_PROMPT.to_string()),
            user: user_prompt,
            max_tokens: 500,
            temperature: 0.3,
        })
        .await
    {
        Ok(raw) => raw,
        Err(e) => {
            tracing::warn!(error = %e, "Error extracting dish mentions");
            return Vec::new();
        }
    };

    match serde_json::from_str::<Vec<DishMention>>(strip_code_fence(&raw)) {
        Ok(mentions) => mentions,
        Err(e) => {
            tracing::warn!(error = %e, "Dish mention output was not a valid JSON array");
            Vec::new()
        }
    }
}
