//! Content-addressed cache for derived JSON artifacts
//!
//! Every engine follows the same check-then-compute-then-write-through
//! sequence, factored into [`ContentCache::get_or_compute`]. Concurrent
//! first-callers may both compute and overwrite; last write wins. This is
//! deliberately not single-flight-locked: duplicate computation under races
//! is an accepted cost.

use menulens_common::{Error, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::future::Future;
use std::sync::Arc;
use uuid::Uuid;

use crate::storage::ObjectStore;

const JSON_CONTENT_TYPE: &str = "application/json";

/// Hex-encoded SHA-256 of a string, the cache-key hash used throughout
pub fn sha256_hex(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    let digest = hasher.finalize();
    let mut out = String::with_capacity(64);
    for byte in digest {
        out.push_str(&format!("{:02x}", byte));
    }
    out
}

/// Artifact key for the extracted menu
pub fn menu_key(run_id: Uuid) -> String {
    format!("{}/menu.json", run_id)
}

/// Artifact key for the aggregate per-dish image result
pub fn images_key(run_id: Uuid) -> String {
    format!("{}/images.json", run_id)
}

/// Artifact key for a recommendation set, parameterized by preference hash
pub fn recommendations_key(run_id: Uuid, prefs_hash: &str) -> String {
    format!("{}/recommendations/{}.json", run_id, prefs_hash)
}

/// Artifact key for review mentions, parameterized by the exact URL string.
/// Two URLs resolving to the same place cache separately on purpose.
pub fn reviews_key(run_id: Uuid, url: &str) -> String {
    let url_hash = &sha256_hex(url)[..8];
    format!("{}/reviews_{}.json", run_id, url_hash)
}

/// JSON artifact cache over the object store
#[derive(Clone)]
pub struct ContentCache {
    store: Arc<dyn ObjectStore>,
}

impl ContentCache {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }

    /// Fetch and deserialize an artifact; `Ok(None)` on miss
    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.store.get(key).await? {
            Some(obj) => {
                let value = serde_json::from_slice(&obj.bytes).map_err(|e| {
                    Error::Internal(format!("Corrupt cache artifact {}: {}", key, e))
                })?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    /// Serialize and store an artifact, overwriting any previous value
    pub async fn put_json<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let bytes = serde_json::to_vec(value)
            .map_err(|e| Error::Internal(format!("Failed to serialize artifact {}: {}", key, e)))?;
        self.store.put(key, bytes, JSON_CONTENT_TYPE).await
    }

    /// Check-then-compute-then-write-through.
    ///
    /// On a hit the stored payload is returned verbatim. On a miss `compute`
    /// runs, its result is written through, and the freshly computed value is
    /// returned. A compute failure is never cached.
    pub async fn get_or_compute<T, F, Fut>(&self, key: &str, compute: F) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        if let Some(cached) = self.get_json(key).await? {
            tracing::debug!(key = %key, "Cache hit");
            return Ok(cached);
        }

        tracing::debug!(key = %key, "Cache miss, computing");
        let value = compute().await?;
        self.put_json(key, &value).await?;
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::FsObjectStore;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn test_cache() -> (tempfile::TempDir, ContentCache) {
        let tmp = tempfile::tempdir().unwrap();
        let cache = ContentCache::new(Arc::new(FsObjectStore::new(tmp.path())));
        (tmp, cache)
    }

    #[test]
    fn sha256_hex_is_stable() {
        assert_eq!(sha256_hex("abc"), sha256_hex("abc"));
        assert_ne!(sha256_hex("abc"), sha256_hex("abd"));
        assert_eq!(sha256_hex("abc").len(), 64);
    }

    #[test]
    fn artifact_keys_have_expected_shapes() {
        let run_id = Uuid::new_v4();
        assert_eq!(menu_key(run_id), format!("{}/menu.json", run_id));
        assert_eq!(images_key(run_id), format!("{}/images.json", run_id));
        assert!(recommendations_key(run_id, "deadbeef").ends_with("/recommendations/deadbeef.json"));

        let rk = reviews_key(run_id, "https://maps.app.goo.gl/xyz");
        assert!(rk.starts_with(&format!("{}/reviews_", run_id)));
        // 8-hex-char URL hash
        let hash_part = rk.rsplit('_').next().unwrap().trim_end_matches(".json");
        assert_eq!(hash_part.len(), 8);
    }

    #[test]
    fn different_urls_cache_separately() {
        let run_id = Uuid::new_v4();
        assert_ne!(
            reviews_key(run_id, "https://maps.app.goo.gl/a"),
            reviews_key(run_id, "https://maps.app.goo.gl/b")
        );
    }

    #[tokio::test]
    async fn get_or_compute_computes_once_then_hits() {
        let (_tmp, cache) = test_cache();
        let calls = AtomicUsize::new(0);

        let first: Vec<String> = cache
            .get_or_compute("k.json", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(vec!["a".to_string()])
            })
            .await
            .unwrap();
        let second: Vec<String> = cache
            .get_or_compute("k.json", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(vec!["b".to_string()])
            })
            .await
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn compute_failure_is_not_cached() {
        let (_tmp, cache) = test_cache();

        let err: Result<Vec<String>> = cache
            .get_or_compute("k.json", || async {
                Err(Error::Upstream("model timeout".to_string()))
            })
            .await;
        assert!(err.is_err());

        // Next caller recomputes successfully
        let ok: Vec<String> = cache
            .get_or_compute("k.json", || async { Ok(vec!["a".to_string()]) })
            .await
            .unwrap();
        assert_eq!(ok, vec!["a"]);
    }
}
