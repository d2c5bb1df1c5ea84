// Cache store operations

pub mod rate;

pub use rate::{PgRateCache, RateCache};
