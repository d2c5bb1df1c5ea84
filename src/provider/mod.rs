// Upstream rate provider
// Stateless client for the external exchange-rate API

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::AppError;

pub mod open_exchange;

pub use open_exchange::OpenExchangeProvider;

/// Rates fetched from the upstream provider for one base currency, together
/// with the provider's retrieval timestamp. Produced fresh per request and
/// never persisted as-is.
#[derive(Debug, Clone)]
pub struct RateQuote {
    pub rates: HashMap<String, f64>,
    pub timestamp: DateTime<Utc>,
}

#[async_trait]
pub trait RateProvider: Send + Sync {
    /// Fetches current rates for `base` against every code in `targets`.
    /// Implementations return only the requested codes, even when the
    /// provider responds with extra currencies.
    async fn fetch_rates(&self, base: &str, targets: &[String]) -> Result<RateQuote, AppError>;
}

/// Drops any rate the caller did not ask for.
pub fn retain_requested(rates: &mut HashMap<String, f64>, targets: &[String]) {
    rates.retain(|code, _| targets.iter().any(|t| t == code));
}

/// Scripted provider for tests: returns a fixed quote or a fixed failure and
/// counts how often it was called.
#[cfg(test)]
pub struct MockRateProvider {
    quote: Option<RateQuote>,
    fail_with_status: Option<u16>,
    pub calls: std::sync::atomic::AtomicUsize,
}

#[cfg(test)]
impl MockRateProvider {
    pub fn returning(quote: RateQuote) -> Self {
        Self {
            quote: Some(quote),
            fail_with_status: None,
            calls: std::sync::atomic::AtomicUsize::new(0),
        }
    }

    pub fn failing_with_status(status: u16) -> Self {
        Self {
            quote: None,
            fail_with_status: Some(status),
            calls: std::sync::atomic::AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[cfg(test)]
#[async_trait]
impl RateProvider for MockRateProvider {
    async fn fetch_rates(&self, _base: &str, _targets: &[String]) -> Result<RateQuote, AppError> {
        self.calls
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);

        if let Some(status) = self.fail_with_status {
            return Err(crate::error::UpstreamError::Status(status).into());
        }

        Ok(self
            .quote
            .clone()
            .expect("mock provider configured without a quote"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retain_requested_drops_extra_currencies() {
        let mut rates = HashMap::from([
            ("EUR".to_string(), 0.92),
            ("GBP".to_string(), 0.79),
            ("JPY".to_string(), 149.5),
        ]);

        retain_requested(&mut rates, &["EUR".to_string(), "GBP".to_string()]);

        assert_eq!(rates.len(), 2);
        assert!(rates.contains_key("EUR"));
        assert!(rates.contains_key("GBP"));
        assert!(!rates.contains_key("JPY"));
    }
}
