// Cache store module
// Entities and operations for the cached-rates table

pub mod models;
pub mod operations;

// Re-export the common types so callers don't reach into submodules
pub use models::rate::CachedRateEntity;
pub use operations::rate::{DEFAULT_TTL_SECS, PgRateCache, RateCache, expiry_for};
