use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pitlane::{
    cache::STALE_TEMP_AGE,
    config::AppConfig,
    prediction::PredictionRepository,
    telemetry::JsonFileProducer,
    user::UserRepository,
    AppState, ArtifactCache, FsArtifactStore, InMemoryRepository, PostgresRepository,
    RaceDataService,
};

type Repositories = (
    Arc<dyn UserRepository + Send + Sync>,
    Arc<dyn PredictionRepository + Send + Sync>,
);

async fn repositories(database_url: Option<&str>) -> Result<Repositories, Box<dyn std::error::Error>> {
    match database_url {
        Some(url) => {
            let pool = sqlx::PgPool::connect(url).await?;
            let repository = Arc::new(PostgresRepository::new(pool));
            repository.ensure_schema().await?;
            info!("Using PostgreSQL repository");
            let users: Arc<dyn UserRepository + Send + Sync> = repository.clone();
            let predictions: Arc<dyn PredictionRepository + Send + Sync> = repository;
            Ok((users, predictions))
        }
        None => {
            info!("DATABASE_URL not set, using in-memory repository");
            let repository = Arc::new(InMemoryRepository::new());
            let users: Arc<dyn UserRepository + Send + Sync> = repository.clone();
            let predictions: Arc<dyn PredictionRepository + Send + Sync> = repository;
            Ok((users, predictions))
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pitlane=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting PitLane server");

    let config = AppConfig::from_env();

    let (user_repository, prediction_repository) =
        repositories(config.database_url.as_deref()).await.map_err(|e| {
            error!(error = %e, "Failed to set up storage");
            e
        })?;

    let store = FsArtifactStore::new(config.cache.cache_dir.clone());
    if let Err(e) = store.remove_stale_temp_files(STALE_TEMP_AGE).await {
        warn!(error = %e, "Could not sweep stale staged artifacts");
    }
    let cache = Arc::new(ArtifactCache::new(Arc::new(store)));
    let race_data = Arc::new(RaceDataService::new(
        cache,
        Arc::new(JsonFileProducer::new(config.cache.raw_dir.clone())),
        config.cache.producer_timeout,
    ));
    info!(
        cache_dir = %config.cache.cache_dir.display(),
        raw_dir = %config.cache.raw_dir.display(),
        producer_timeout_secs = config.cache.producer_timeout.as_secs(),
        "Race data cache configured"
    );

    let app_state = AppState::new(
        user_repository,
        prediction_repository,
        race_data,
        &config.admin_key,
    );

    let app = pitlane::router(app_state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!("Server running on http://{}", config.bind_addr);
    axum::serve(listener, app).await?;
    Ok(())
}
