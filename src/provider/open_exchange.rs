use std::collections::HashMap;

use async_trait::async_trait;
use chrono::DateTime;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::config::Config;
use crate::error::{AppError, UpstreamError};

use super::{RateProvider, RateQuote, retain_requested};

/// Client for the Open Exchange Rates style "latest" endpoint. Holds no
/// state beyond the connection pool inside the reqwest client.
pub struct OpenExchangeProvider {
    client: Client,
    base_url: String,
}

/// Expected upstream response shape. Missing `rates` or `timestamp` keys
/// fail deserialization and surface as an upstream error.
#[derive(Debug, Deserialize)]
struct LatestRatesBody {
    rates: HashMap<String, f64>,
    timestamp: i64,
}

impl OpenExchangeProvider {
    pub fn new(config: &Config) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(config.fetch_timeout()).build()?;

        Ok(Self {
            client,
            base_url: config.provider_base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl RateProvider for OpenExchangeProvider {
    async fn fetch_rates(&self, base: &str, targets: &[String]) -> Result<RateQuote, AppError> {
        let url = format!(
            "{}/v6/latest?base={}&symbols={}",
            self.base_url,
            base,
            targets.join(",")
        );
        debug!("Fetching upstream rates: {}", url);

        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(UpstreamError::Transport)?;

        if !resp.status().is_success() {
            return Err(UpstreamError::Status(resp.status().as_u16()).into());
        }

        let body: LatestRatesBody = resp
            .json()
            .await
            .map_err(|e| UpstreamError::Malformed(e.to_string()))?;

        let timestamp = DateTime::from_timestamp(body.timestamp, 0).ok_or_else(|| {
            UpstreamError::Malformed(format!("timestamp {} out of range", body.timestamp))
        })?;

        let mut rates = body.rates;
        retain_requested(&mut rates, targets);

        Ok(RateQuote { rates, timestamp })
    }
}
