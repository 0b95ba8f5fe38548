//! Per-dish image lookup with bounded-concurrency fan-out
//!
//! Each dish is looked up independently against the search provider, behind
//! a cross-run cache keyed by the normalized dish name. Lookups fan out over
//! a bounded pool of 10 concurrent workers; a failing lookup yields an empty
//! list for that dish only and never aborts the batch. The aggregate's
//! per-dish order reflects completion order, not input order.

use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use std::sync::Arc;

use menulens_common::Result;

use crate::cache::sha256_hex;
use crate::db::image_cache;
use crate::services::search::SearchProvider;

/// Fan-out width for per-dish lookups
pub const FANOUT_WORKERS: usize = 10;

/// Desired image count per dish; the provider is asked for 3x this to
/// absorb later broken-link filtering.
pub const IMAGES_PER_DISH: usize = 5;

/// Domains to skip - blocked by tracking prevention or unreliable
const BLOCKED_DOMAINS: &[&str] = &[
    "wp.com",           // WordPress CDN - blocked by Safari/Firefox tracking prevention
    "tiktok.com",       // Slow/timeouts + tracking prevention
    "wsj.net",          // Paywall/403 issues
    "craftbeering.com", // Consistent 403s
];

/// Image candidates for one dish
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DishImages {
    pub name: String,
    pub images: Vec<String>,
}

/// Aggregate fan-out result, cached once per run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DishImageSet {
    pub dishes: Vec<DishImages>,
}

/// Check if a URL's host matches the blocklist
pub fn is_blocked_domain(url: &str) -> bool {
    match reqwest::Url::parse(url) {
        Ok(parsed) => match parsed.host_str() {
            Some(host) => {
                let host = host.to_lowercase();
                BLOCKED_DOMAINS.iter().any(|blocked| host.contains(blocked))
            }
            None => false,
        },
        Err(_) => false,
    }
}

/// Cache key for a dish name: hash of the lower-cased, trimmed form,
/// shared across runs
pub fn dish_cache_key(dish_name: &str) -> String {
    sha256_hex(&dish_name.trim().to_lowercase())
}

/// Search images for a single dish.
///
/// Cache hits return the first `num_results` entries. Fresh fetches request
/// 3x that count, drop blocklisted hosts, cache the filtered list under the
/// normalized key with a long TTL, and return all of it so the frontend can
/// skip broken links.
pub async fn search_dish_images(
    search: &dyn SearchProvider,
    pool: &SqlitePool,
    dish_name: &str,
    num_results: usize,
) -> Result<Vec<String>> {
    let dish_hash = dish_cache_key(dish_name);

    if let Some(cached) = image_cache::get_cached_images(pool, &dish_hash).await? {
        let mut cached = cached;
        cached.truncate(num_results);
        return Ok(cached);
    }

    let fetch_count = num_results * 3;
    let query = format!("{} food", dish_name);
    let candidates = search.image_search(&query, fetch_count).await?;

    let images: Vec<String> = candidates
        .into_iter()
        .filter(|url| !is_blocked_domain(url))
        .take(fetch_count)
        .collect();

    if images.is_empty() {
        tracing::warn!(dish = %dish_name, "No images found");
        return Ok(Vec::new());
    }

    image_cache::cache_images(pool, &dish_hash, &images).await?;
    Ok(images)
}

/// Fan out per-dish lookups across a bounded worker pool.
///
/// A per-dish failure degrades that entry to an empty image list; the batch
/// always completes with one entry per input name, in completion order.
pub async fn fetch_dish_image_set(
    search: Arc<dyn SearchProvider>,
    pool: SqlitePool,
    dish_names: Vec<String>,
) -> DishImageSet {
    let dishes: Vec<DishImages> = stream::iter(dish_names)
        .map(|name| {
            let search = Arc::clone(&search);
            let pool = pool.clone();
            async move {
                match search_dish_images(search.as_ref(), &pool, &name, IMAGES_PER_DISH).await {
                    Ok(images) => DishImages { name, images },
                    Err(e) => {
                        tracing::warn!(dish = %name, error = %e, "Image lookup failed");
                        DishImages {
                            name,
                            images: Vec::new(),
                        }
                    }
                }
            }
        })
        .buffer_unordered(FANOUT_WORKERS)
        .collect()
        .await;

    DishImageSet { dishes }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blocklist_matches_host_not_path() {
        assert!(is_blocked_domain("https://i0.wp.com/food/1.jpg"));
        assert!(is_blocked_domain("https://www.tiktok.com/video.jpg"));
        assert!(!is_blocked_domain("https://example.com/wp.com/1.jpg"));
        assert!(!is_blocked_domain("https://goodfood.example/pad-thai.jpg"));
    }

    #[test]
    fn unparseable_urls_are_not_blocked() {
        assert!(!is_blocked_domain("not a url"));
    }

    #[test]
    fn dish_cache_key_normalizes_case_and_whitespace() {
        assert_eq!(dish_cache_key("Pad Thai"), dish_cache_key("  pad thai "));
        assert_ne!(dish_cache_key("Pad Thai"), dish_cache_key("Green Curry"));
    }
}
