//! Cross-run dish image cache
//!
//! Keyed by a hash of the normalized (lower-cased, trimmed) dish name so the
//! same dish photographed at two restaurants shares one entry. Entries carry
//! a long TTL independent of any run's lifetime.

use chrono::{Duration, Utc};
use sqlx::{Row, SqlitePool};

use menulens_common::{Error, Result};

/// Days before a cached dish image list expires
pub const IMAGE_CACHE_TTL_DAYS: i64 = 30;

/// Get cached images for a dish hash, honoring expiry
pub async fn get_cached_images(pool: &SqlitePool, dish_hash: &str) -> Result<Option<Vec<String>>> {
    let row = sqlx::query(
        "SELECT images FROM dish_image_cache WHERE dish_hash = ? AND expires_at >= ?",
    )
    .bind(dish_hash)
    .bind(Utc::now().to_rfc3339())
    .fetch_optional(pool)
    .await?;

    match row {
        Some(row) => {
            let images: String = row.get("images");
            let images: Vec<String> = serde_json::from_str(&images)
                .map_err(|e| Error::Internal(format!("Failed to deserialize images: {}", e)))?;
            Ok(Some(images))
        }
        None => Ok(None),
    }
}

/// Cache images for a dish hash with a fresh TTL, overwriting any entry
pub async fn cache_images(pool: &SqlitePool, dish_hash: &str, images: &[String]) -> Result<()> {
    let images_json = serde_json::to_string(images)
        .map_err(|e| Error::Internal(format!("Failed to serialize images: {}", e)))?;
    let now = Utc::now();
    let expires_at = now + Duration::days(IMAGE_CACHE_TTL_DAYS);

    sqlx::query(
        r#"
        INSERT INTO dish_image_cache (dish_hash, images, cached_at, expires_at)
        VALUES (?, ?, ?, ?)
        ON CONFLICT(dish_hash) DO UPDATE SET
            images = excluded.images,
            cached_at = excluded.cached_at,
            expires_at = excluded.expires_at
        "#,
    )
    .bind(dish_hash)
    .bind(&images_json)
    .bind(now.to_rfc3339())
    .bind(expires_at.to_rfc3339())
    .execute(pool)
    .await?;

    Ok(())
}
