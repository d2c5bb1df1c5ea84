pub mod handler;
pub mod model;

pub use handler::update_cache;
