use std::sync::Arc;

use config::Config;

pub mod cache;
pub mod config;
pub mod error;
pub mod middleware;
pub mod provider;
pub mod routes;
pub mod utils;

use cache::RateCache;
use provider::RateProvider;

/// Shared application state. The cache store and the upstream provider sit
/// behind trait objects so route logic can run against in-memory doubles.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub provider: Arc<dyn RateProvider>,
    pub store: Arc<dyn RateCache>,
}
