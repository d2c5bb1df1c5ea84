use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::cache::models::rate::CachedRateEntity;
use crate::error::AppError;

/// Seconds a cached rate stays valid when the writer gives no TTL.
pub const DEFAULT_TTL_SECS: i64 = 3600;

/// Computes the expiry instant for a write happening at `now`. A missing or
/// zero TTL falls back to the one-hour default.
pub fn expiry_for(now: DateTime<Utc>, ttl_secs: Option<i64>) -> DateTime<Utc> {
    match ttl_secs {
        Some(secs) if secs > 0 => now + Duration::seconds(secs),
        _ => now + Duration::seconds(DEFAULT_TTL_SECS),
    }
}

/// Store of cached rates keyed uniquely by (base_currency, target_currency).
#[async_trait]
pub trait RateCache: Send + Sync {
    /// Point lookup by the unique pair key.
    async fn find(&self, base: &str, target: &str)
    -> Result<Option<CachedRateEntity>, AppError>;

    /// Fetches every cached entry for `base` whose target is in `targets`,
    /// live or stale.
    async fn find_many(
        &self,
        base: &str,
        targets: &[String],
    ) -> Result<Vec<CachedRateEntity>, AppError>;

    /// Insert-or-update keyed by the unique pair. Must be atomic: concurrent
    /// writers for the same pair may not observe a duplicate-key failure or
    /// a torn entry, the last write wins.
    async fn upsert(
        &self,
        base: &str,
        target: &str,
        rate: f64,
        valid_until: DateTime<Utc>,
    ) -> Result<(), AppError>;
}

/// Postgres-backed store over the `cached_rates` table.
pub struct PgRateCache {
    db: Arc<PgPool>,
}

impl PgRateCache {
    pub fn new(db: Arc<PgPool>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl RateCache for PgRateCache {
    async fn find(
        &self,
        base: &str,
        target: &str,
    ) -> Result<Option<CachedRateEntity>, AppError> {
        let entry = sqlx::query_as::<_, CachedRateEntity>(
            r#"
            SELECT id, base_currency, target_currency, rate, valid_until
            FROM cached_rates
            WHERE base_currency = $1 AND target_currency = $2
            "#,
        )
        .bind(base)
        .bind(target)
        .fetch_optional(&*self.db)
        .await?;

        Ok(entry)
    }

    async fn find_many(
        &self,
        base: &str,
        targets: &[String],
    ) -> Result<Vec<CachedRateEntity>, AppError> {
        let entries = sqlx::query_as::<_, CachedRateEntity>(
            r#"
            SELECT id, base_currency, target_currency, rate, valid_until
            FROM cached_rates
            WHERE base_currency = $1 AND target_currency = ANY($2)
            "#,
        )
        .bind(base)
        .bind(targets)
        .fetch_all(&*self.db)
        .await?;

        Ok(entries)
    }

    async fn upsert(
        &self,
        base: &str,
        target: &str,
        rate: f64,
        valid_until: DateTime<Utc>,
    ) -> Result<(), AppError> {
        // Single conditional statement, so concurrent writers for the same
        // pair serialize inside Postgres instead of racing a find-then-write.
        sqlx::query(
            r#"
            INSERT INTO cached_rates (id, base_currency, target_currency, rate, valid_until)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (base_currency, target_currency)
            DO UPDATE SET rate = EXCLUDED.rate, valid_until = EXCLUDED.valid_until
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(base)
        .bind(target)
        .bind(rate)
        .bind(valid_until)
        .execute(&*self.db)
        .await?;

        Ok(())
    }
}

/// In-memory store with the same upsert semantics as the Postgres table.
/// Used by tests that exercise the route logic without a database.
#[cfg(test)]
pub struct MemoryRateCache {
    entries: std::sync::Mutex<Vec<CachedRateEntity>>,
}

#[cfg(test)]
impl MemoryRateCache {
    pub fn new() -> Self {
        Self {
            entries: std::sync::Mutex::new(Vec::new()),
        }
    }

    pub fn get(&self, base: &str, target: &str) -> Option<CachedRateEntity> {
        self.entries
            .lock()
            .unwrap()
            .iter()
            .find(|e| e.base_currency == base && e.target_currency == target)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn preload(&self, base: &str, target: &str, rate: f64, valid_until: DateTime<Utc>) {
        self.entries.lock().unwrap().push(CachedRateEntity {
            id: Uuid::new_v4(),
            base_currency: base.to_string(),
            target_currency: target.to_string(),
            rate,
            valid_until,
        });
    }
}

#[cfg(test)]
#[async_trait]
impl RateCache for MemoryRateCache {
    async fn find(
        &self,
        base: &str,
        target: &str,
    ) -> Result<Option<CachedRateEntity>, AppError> {
        Ok(self.get(base, target))
    }

    async fn find_many(
        &self,
        base: &str,
        targets: &[String],
    ) -> Result<Vec<CachedRateEntity>, AppError> {
        Ok(self
            .entries
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.base_currency == base && targets.contains(&e.target_currency))
            .cloned()
            .collect())
    }

    async fn upsert(
        &self,
        base: &str,
        target: &str,
        rate: f64,
        valid_until: DateTime<Utc>,
    ) -> Result<(), AppError> {
        let mut entries = self.entries.lock().unwrap();
        match entries
            .iter_mut()
            .find(|e| e.base_currency == base && e.target_currency == target)
        {
            Some(existing) => {
                // Identity preserved: only rate and expiry change
                existing.rate = rate;
                existing.valid_until = valid_until;
            }
            None => entries.push(CachedRateEntity {
                id: Uuid::new_v4(),
                base_currency: base.to_string(),
                target_currency: target.to_string(),
                rate,
                valid_until,
            }),
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_ttl_defaults_to_one_hour() {
        let now = Utc::now();
        assert_eq!(expiry_for(now, None), now + Duration::seconds(3600));
    }

    #[test]
    fn zero_ttl_defaults_to_one_hour() {
        let now = Utc::now();
        assert_eq!(expiry_for(now, Some(0)), now + Duration::seconds(3600));
    }

    #[test]
    fn explicit_ttl_is_honored() {
        let now = Utc::now();
        assert_eq!(expiry_for(now, Some(60)), now + Duration::seconds(60));
    }

    #[tokio::test]
    async fn memory_upsert_keeps_one_entry_per_pair() {
        let store = MemoryRateCache::new();
        let now = Utc::now();

        store.upsert("USD", "EUR", 0.92, now + Duration::seconds(10)).await.unwrap();
        let first_id = store.get("USD", "EUR").unwrap().id;

        store.upsert("USD", "EUR", 0.95, now + Duration::seconds(20)).await.unwrap();

        assert_eq!(store.len(), 1);
        let entry = store.get("USD", "EUR").unwrap();
        assert_eq!(entry.id, first_id);
        assert_eq!(entry.rate, 0.95);
        assert_eq!(entry.valid_until, now + Duration::seconds(20));
    }
}
