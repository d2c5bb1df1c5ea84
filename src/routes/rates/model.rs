use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::warn;

use crate::cache::{RateCache, expiry_for};
use crate::error::AppError;
use crate::provider::RateProvider;

/// Response returned to the caller: the rate(s) for the requested pair(s)
/// plus the instant the data was retrieved.
#[derive(Debug, Serialize)]
pub struct ExchangeRateResponse {
    pub base_currency: String,
    pub rates: HashMap<String, f64>,
    pub timestamp: DateTime<Utc>,
}

/// Read-through lookup.
///
/// Live cached entries are served when they cover the whole target list.
/// Otherwise the provider is called and the fetched rates repopulate the
/// cache with the default TTL. When the provider fails, cached entries
/// (stale allowed) are served as a last resort, but only when every target
/// has one; a failed fetch never mutates the store.
pub async fn get_exchange_rate(
    provider: &dyn RateProvider,
    store: &dyn RateCache,
    default_ttl_secs: i64,
    base: String,
    targets: Vec<String>,
) -> Result<ExchangeRateResponse, AppError> {
    let now = Utc::now();
    let cached = store.find_many(&base, &targets).await?;

    let live: HashMap<String, f64> = cached
        .iter()
        .filter(|e| e.is_live(now))
        .map(|e| (e.target_currency.clone(), e.rate))
        .collect();

    if targets.iter().all(|t| live.contains_key(t)) {
        return Ok(ExchangeRateResponse {
            base_currency: base,
            rates: live,
            timestamp: now,
        });
    }

    match provider.fetch_rates(&base, &targets).await {
        Ok(quote) => {
            let valid_until = expiry_for(now, Some(default_ttl_secs));
            for (target, rate) in &quote.rates {
                store.upsert(&base, target, *rate, valid_until).await?;
            }

            Ok(ExchangeRateResponse {
                base_currency: base,
                rates: quote.rates,
                timestamp: quote.timestamp,
            })
        }
        Err(err @ AppError::Upstream(_)) => {
            let stale: HashMap<String, f64> = cached
                .iter()
                .map(|e| (e.target_currency.clone(), e.rate))
                .collect();

            if targets.iter().all(|t| stale.contains_key(t)) {
                warn!(
                    "Upstream fetch for {} failed, serving cached rates: {}",
                    base, err
                );
                return Ok(ExchangeRateResponse {
                    base_currency: base,
                    rates: stale,
                    timestamp: now,
                });
            }

            Err(err)
        }
        Err(err) => Err(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    use crate::cache::operations::rate::MemoryRateCache;
    use crate::provider::{MockRateProvider, RateQuote};

    fn targets(codes: &[&str]) -> Vec<String> {
        codes.iter().map(|c| c.to_string()).collect()
    }

    fn quote(rates: &[(&str, f64)], timestamp: DateTime<Utc>) -> RateQuote {
        RateQuote {
            rates: rates.iter().map(|(c, r)| (c.to_string(), *r)).collect(),
            timestamp,
        }
    }

    #[tokio::test]
    async fn live_cache_covering_all_targets_skips_the_provider() {
        let now = Utc::now();
        let store = MemoryRateCache::new();
        store.preload("USD", "EUR", 0.92, now + Duration::seconds(600));
        store.preload("USD", "GBP", 0.79, now + Duration::seconds(600));

        let provider = MockRateProvider::failing_with_status(500);

        let resp = get_exchange_rate(&provider, &store, 3600, "USD".into(), targets(&["EUR", "GBP"]))
            .await
            .unwrap();

        assert_eq!(provider.call_count(), 0);
        assert_eq!(resp.base_currency, "USD");
        assert_eq!(resp.rates["EUR"], 0.92);
        assert_eq!(resp.rates["GBP"], 0.79);
    }

    #[tokio::test]
    async fn cache_miss_fetches_and_repopulates() {
        let fetched_at = Utc::now() - Duration::seconds(5);
        let store = MemoryRateCache::new();
        let provider =
            MockRateProvider::returning(quote(&[("EUR", 0.92), ("GBP", 0.79)], fetched_at));

        let before = Utc::now();
        let resp = get_exchange_rate(&provider, &store, 3600, "USD".into(), targets(&["EUR", "GBP"]))
            .await
            .unwrap();

        assert_eq!(provider.call_count(), 1);
        assert_eq!(resp.timestamp, fetched_at);
        assert_eq!(resp.rates.len(), 2);

        // Both pairs were written back with the default TTL
        assert_eq!(store.len(), 2);
        let entry = store.get("USD", "EUR").unwrap();
        assert_eq!(entry.rate, 0.92);
        assert!(entry.valid_until >= before + Duration::seconds(3600));
        assert!(entry.valid_until <= Utc::now() + Duration::seconds(3600));
    }

    #[tokio::test]
    async fn expired_entry_triggers_a_fresh_fetch() {
        let now = Utc::now();
        let store = MemoryRateCache::new();
        store.preload("USD", "EUR", 0.90, now - Duration::seconds(60));

        let provider = MockRateProvider::returning(quote(&[("EUR", 0.92)], now));

        let resp = get_exchange_rate(&provider, &store, 3600, "USD".into(), targets(&["EUR"]))
            .await
            .unwrap();

        assert_eq!(provider.call_count(), 1);
        assert_eq!(resp.rates["EUR"], 0.92);
        assert_eq!(store.get("USD", "EUR").unwrap().rate, 0.92);
    }

    #[tokio::test]
    async fn upstream_failure_with_empty_cache_propagates_and_writes_nothing() {
        let store = MemoryRateCache::new();
        let provider = MockRateProvider::failing_with_status(503);

        let err = get_exchange_rate(&provider, &store, 3600, "USD".into(), targets(&["EUR", "GBP"]))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Upstream(_)));
        assert_eq!(store.len(), 0);
    }

    #[tokio::test]
    async fn upstream_failure_falls_back_to_stale_entries() {
        let now = Utc::now();
        let store = MemoryRateCache::new();
        store.preload("USD", "EUR", 0.91, now - Duration::seconds(60));

        let provider = MockRateProvider::failing_with_status(503);

        let resp = get_exchange_rate(&provider, &store, 3600, "USD".into(), targets(&["EUR"]))
            .await
            .unwrap();

        assert_eq!(resp.rates["EUR"], 0.91);
    }

    #[tokio::test]
    async fn stale_fallback_requires_every_target() {
        let now = Utc::now();
        let store = MemoryRateCache::new();
        store.preload("USD", "EUR", 0.91, now - Duration::seconds(60));

        let provider = MockRateProvider::failing_with_status(503);

        // GBP has no cached entry at all, so the failure propagates
        let err = get_exchange_rate(&provider, &store, 3600, "USD".into(), targets(&["EUR", "GBP"]))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Upstream(_)));
    }
}
