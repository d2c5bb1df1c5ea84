// Cached-rate entity definitions

pub mod rate;

pub use rate::CachedRateEntity;
