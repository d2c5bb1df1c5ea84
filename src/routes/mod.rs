pub mod cache;
pub mod rates;
