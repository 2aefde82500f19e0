mod cache_store;
mod cache_validator;
mod circuit_breaker;
mod company_store;
mod config;
mod db;
mod errors;
mod handlers;
mod indicators;
mod models;
mod registry_client;
mod risk;
mod risk_cache;

use axum::{routing::get, Router};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_governor::{
    governor::GovernorConfigBuilder, key_extractor::SmartIpKeyExtractor, GovernorLayer,
};
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::cache_store::MokaCacheStore;
use crate::config::Config;
use crate::db::Database;
use crate::registry_client::RegistryGatewayClient;
use crate::risk_cache::RiskIndicatorService;

/// Main entry point for the application.
///
/// Initializes logging, configuration, the database pool, the cache
/// store, the registry gateway client and the HTTP routes, then starts
/// the Axum server.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "firmenbuch_risk_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;

    // Initialize database connection pool
    let db = Database::new(&config.database_url).await?;
    tracing::info!("Database connection pool established");

    // One shared cache client for all namespaces; lifecycle is owned
    // here and the client is injected everywhere it is used.
    let cache = MokaCacheStore::new(100_000);
    tracing::info!("Cache store initialized (100k capacity)");

    // Risk computation service with the indicator cache contract
    let risk_service = RiskIndicatorService::new(cache.clone());

    // Registry document gateway client (circuit-broken)
    let registry_client = RegistryGatewayClient::new(
        config.registry_gateway_url.clone(),
        config.registry_api_key.clone(),
    )?;
    tracing::info!(
        "Registry gateway client initialized: {}",
        config.registry_gateway_url
    );

    // Build application state
    let app_state = Arc::new(handlers::AppState {
        db: db.pool.clone(),
        config: config.clone(),
        registry_client,
        cache,
        risk_service,
    });

    // Configure rate limiter: 10 requests/second per IP, burst of 20
    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(10)
            .burst_size(20)
            .key_extractor(SmartIpKeyExtractor)
            .finish()
            .unwrap(),
    );

    // Build protected routes with security layers
    let protected_routes = Router::new()
        .route("/api/v1/companies", get(handlers::search_companies))
        .route("/api/v1/companies/suggest", get(handlers::suggest_companies))
        .route("/api/v1/companies/:fnr", get(handlers::get_company))
        .route("/api/v1/companies/:fnr/risk", get(handlers::get_company_risk))
        .layer(
            ServiceBuilder::new()
                // Request size limit: 1MB max payload
                .layer(RequestBodyLimitLayer::new(1024 * 1024))
                // Rate limiting: 10 req/sec per IP, burst of 20
                .layer(GovernorLayer {
                    config: governor_conf,
                }),
        );

    // Build final app with health check (bypasses rate limiting)
    let app = Router::new()
        .route("/health", get(handlers::health))
        .merge(protected_routes)
        .with_state(app_state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
