//! Billing Core service entrypoint
//!
//! Wires configuration, Postgres, Redis and the Stripe adapter into the
//! HTTP router and serves it with axum.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use billing_core::adapters::cache::{CachedPaymentRepository, RedisCacheStore};
use billing_core::adapters::http::{payment_router, PaymentAppState};
use billing_core::adapters::postgres::{PostgresBalanceStore, PostgresPaymentRepository};
use billing_core::adapters::stripe::{StripeConfig, StripePaymentAdapter};
use billing_core::application::handlers::payment::InitializePaymentConfig;
use billing_core::config::AppConfig;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    config.validate()?;

    init_tracing(&config);

    info!(
        environment = ?config.server.environment,
        "Starting billing-core"
    );

    let pool = config
        .database
        .pool_options()
        .connect(&config.database.url)
        .await?;
    info!("Database connection pool initialized");

    if config.database.run_migrations {
        sqlx::migrate!("./migrations").run(&pool).await?;
        info!("Database migrations applied");
    }

    let redis_client = redis::Client::open(config.redis.url.as_str())?;
    let redis_conn = redis_client.get_multiplexed_tokio_connection().await?;
    info!("Redis connection established");

    let postgres_repository = Arc::new(PostgresPaymentRepository::new(pool.clone()));
    let cache_store = Arc::new(
        RedisCacheStore::new(redis_conn).with_key_prefix(config.redis.key_prefix.clone()),
    );
    let payment_repository = Arc::new(
        CachedPaymentRepository::new(postgres_repository, cache_store)
            .with_ttl(config.redis.cache_ttl()),
    );
    let balance_store = Arc::new(PostgresBalanceStore::new(pool));

    let stripe_config = StripeConfig::new(
        config.payment.stripe_api_key.clone(),
        config.payment.stripe_webhook_secret.clone(),
    )
    .with_require_livemode(config.payment.require_livemode);
    let payment_provider = Arc::new(StripePaymentAdapter::new(stripe_config));

    if config.is_production() && !config.payment.is_live_mode() {
        warn!("Production environment is using a Stripe test key");
    }

    let state = PaymentAppState {
        payment_repository,
        balance_store,
        payment_provider,
        payment_config: InitializePaymentConfig {
            minimum_amount_minor: config.payment.minimum_amount_minor,
            currency: config.payment.currency.clone(),
            publishable_key: config.payment.stripe_publishable_key.clone(),
            cancel_on_intent_failure: config.payment.cancel_on_intent_failure,
        },
    };

    let app = Router::new()
        .nest("/api", payment_router())
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(build_cors_layer(&config));

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.server.log_level.clone()));

    if config.is_production() {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

fn build_cors_layer(config: &AppConfig) -> CorsLayer {
    let origins = config.server.cors_origins_list();
    if origins.is_empty() {
        return CorsLayer::permissive();
    }

    let parsed: Vec<_> = origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(parsed))
        .allow_methods(tower_http::cors::Any)
        .allow_headers(tower_http::cors::Any)
}
