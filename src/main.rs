use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use axum::{
    Router,
    routing::{get, patch},
};
use forex_cache_backend::{
    AppState,
    cache::PgRateCache,
    config::Config,
    middleware::log_errors,
    provider::OpenExchangeProvider,
    routes,
};
use sqlx::Executor;
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::CorsLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().expect("Failed to load configuration");

    // Pool is acquired here and closed after the server drains, so the store
    // never sees a connection handle outliving the process lifecycle
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .after_connect(|conn, _meta| {
            Box::pin(async move {
                conn.execute("SET application_name = 'forex_cache_backend';")
                    .await?;
                Ok(())
            })
        })
        .connect(&config.database_url)
        .await
        .expect("Failed to connect to Postgres");

    let provider =
        OpenExchangeProvider::new(&config).expect("Failed to build upstream HTTP client");
    let store = PgRateCache::new(Arc::new(pool.clone()));

    let state = AppState {
        config: config.clone(),
        provider: Arc::new(provider),
        store: Arc::new(store),
    };

    let router = Router::new()
        .route(
            "/exchange-rate/{base}/{targets}",
            get(routes::rates::get_exchange_rate),
        )
        .route("/cache/update", patch(routes::cache::update_cache))
        .layer(axum::middleware::from_fn(log_errors));

    #[cfg(debug_assertions)]
    let router = {
        tracing::debug!("Adding CORS layer for development mode");
        router.layer(CorsLayer::permissive())
    };

    let app = router.with_state(state);

    let addr = SocketAddr::new(
        config.server_host.parse().unwrap_or_else(|_| {
            tracing::warn!("Invalid server_host, falling back to dual-stack default");
            IpAddr::V6(std::net::Ipv6Addr::UNSPECIFIED)
        }),
        config.server_port,
    );
    tracing::info!("Server listening on {}", addr);
    axum::serve(
        tokio::net::TcpListener::bind(&addr)
            .await
            .expect("Failed to bind"),
        app,
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .expect("Failed to start server");

    pool.close().await;
    tracing::info!("Database pool closed, exiting");
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to listen for shutdown signal");
    tracing::info!("Shutdown signal received");
}
