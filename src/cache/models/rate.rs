use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Cached exchange-rate entity. At most one row exists per
/// (base_currency, target_currency) pair; writes for an existing pair update
/// the row in place. Rows are never deleted, stale ones persist until
/// overwritten.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CachedRateEntity {
    pub id: uuid::Uuid,
    pub base_currency: String,
    pub target_currency: String,
    pub rate: f64,
    pub valid_until: DateTime<Utc>,
}

impl CachedRateEntity {
    /// A row is stale once the clock reaches `valid_until`.
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        now < self.valid_until
    }
}
