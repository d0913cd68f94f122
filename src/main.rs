use std::net::SocketAddr;
use std::sync::Arc;

use tower::ServiceBuilder;
use tower_governor::{
    governor::GovernorConfigBuilder, key_extractor::SmartIpKeyExtractor, GovernorLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use credit_application_system::config::{Config, StorageBackend};
use credit_application_system::db::Database;
use credit_application_system::db_storage::{PgCreditRepository, PgCustomerRepository};
use credit_application_system::handlers::AppState;
use credit_application_system::memory::InMemoryStore;
use credit_application_system::routes;

/// Main entry point for the application.
///
/// Initializes tracing, loads configuration, connects the selected storage
/// backend (running migrations for PostgreSQL), then serves the API with
/// per-IP rate limiting on everything except `/health`.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "credit_application_system=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    let app_state = match config.storage {
        StorageBackend::Postgres => {
            let db = Database::new(&config.database_url, config.db_max_connections).await?;
            tracing::info!("Database connection pool established");
            Arc::new(AppState {
                customers: Arc::new(PgCustomerRepository::new(db.pool.clone())),
                credits: Arc::new(PgCreditRepository::new(db.pool.clone())),
                credit_rules: config.credit_rules.clone(),
            })
        }
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage; data is lost on restart");
            let store = Arc::new(InMemoryStore::new());
            Arc::new(AppState {
                customers: store.clone(),
                credits: store,
                credit_rules: config.credit_rules.clone(),
            })
        }
    };

    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(config.rate_limit_per_second)
            .burst_size(config.rate_limit_burst)
            .key_extractor(SmartIpKeyExtractor)
            .finish()
            .ok_or_else(|| anyhow::anyhow!("Invalid rate limit configuration"))?,
    );
    tracing::info!(
        "Rate limiting: {} req/sec per IP, burst of {}",
        config.rate_limit_per_second,
        config.rate_limit_burst
    );

    // Health check bypasses rate limiting
    let protected_routes = routes::api_routes().layer(ServiceBuilder::new().layer(GovernorLayer {
        config: governor_conf,
    }));
    let app = routes::app(app_state, protected_routes);

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
