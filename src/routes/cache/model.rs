use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::cache::{RateCache, expiry_for};
use crate::error::AppError;

/// Confirmation returned after a cache write. `updated_at` is the write
/// instant, not the computed expiry.
#[derive(Debug, Serialize)]
pub struct UpdateCacheResponse {
    pub status: String,
    pub updated_at: DateTime<Utc>,
}

/// Records `rate` for the pair with expiry `now + ttl` (one hour when the
/// TTL is absent or zero). The write is a single atomic upsert, so the net
/// state is always exactly one entry for the pair.
pub async fn update_cache(
    store: &dyn RateCache,
    base: String,
    target: String,
    rate: f64,
    ttl_secs: Option<i64>,
) -> Result<UpdateCacheResponse, AppError> {
    let now = Utc::now();
    let valid_until = expiry_for(now, ttl_secs);

    store.upsert(&base, &target, rate, valid_until).await?;

    Ok(UpdateCacheResponse {
        status: "Cache updated successfully.".to_string(),
        updated_at: now,
    })
}
