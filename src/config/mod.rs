use std::env;
use std::time::Duration;

#[derive(Debug, Clone, serde::Deserialize)]
pub struct Config {
    pub database_url: String,
    pub server_host: String,
    pub server_port: u16,
    pub provider_base_url: String,
    pub fetch_timeout_secs: u64,
    pub default_ttl_secs: i64,
}

impl Config {
    pub fn from_env() -> Result<Self, env::VarError> {
        dotenv::dotenv().ok();

        Ok(Config {
            database_url: env::var("DATABASE_URL")?,
            server_host: env::var("SERVER_HOST").unwrap_or_else(|_| "::".into()),
            server_port: env::var("SERVER_PORT")
                .map(|v| v.parse().unwrap_or(3000))
                .unwrap_or(3000),
            provider_base_url: env::var("PROVIDER_BASE_URL")
                .unwrap_or_else(|_| "https://open.exchangerate-api.com".into()),
            fetch_timeout_secs: env::var("FETCH_TIMEOUT_SECS")
                .map(|v| v.parse().unwrap_or(10))
                .unwrap_or(10),
            default_ttl_secs: env::var("DEFAULT_TTL_SECS")
                .map(|v| v.parse().unwrap_or(3600))
                .unwrap_or(3600),
        })
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}
