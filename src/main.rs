use axum::Router;
use busroute::cache::{GeocodeCache, MemoryCacheService, RedisCacheService};
use busroute::config::Config;
use busroute::constants::DEFAULT_MEMORY_CACHE_MAX_ENTRIES;
use busroute::services::{AdminAuth, GeocodingService, JourneyPlanner};
use busroute::AppState;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "busroute=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env().map_err(|e| format!("Failed to load configuration: {}", e))?;

    tracing::info!("Starting bus route API server");
    tracing::info!("Configuration loaded successfully");

    // Connect and migrate; the URL scheme picks the backend
    tracing::info!("Connecting to database...");
    let repo = busroute::db::connect(&config.database_url).await?;
    tracing::info!(
        "Database connection established ({}), migrations applied",
        repo.backend_name()
    );

    // Initialize cache: try Redis, fall back to in-memory
    let cache: Arc<dyn GeocodeCache> = if let Some(ref redis_url) = config.redis_url {
        tracing::info!("Connecting to Redis cache...");
        match RedisCacheService::new(redis_url, config.geocode_cache_ttl).await {
            Ok(redis_cache) => Arc::new(redis_cache),
            Err(e) => {
                tracing::warn!(
                    "Failed to connect to Redis: {}. Falling back to in-memory cache.",
                    e
                );
                Arc::new(MemoryCacheService::new(
                    config.geocode_cache_ttl,
                    DEFAULT_MEMORY_CACHE_MAX_ENTRIES,
                ))
            }
        }
    } else {
        tracing::info!("Redis URL not configured. Using in-memory cache.");
        Arc::new(MemoryCacheService::new(
            config.geocode_cache_ttl,
            DEFAULT_MEMORY_CACHE_MAX_ENTRIES,
        ))
    };

    // Initialize services
    let geocoder = if config.geocoding.enabled {
        Some(GeocodingService::new(&config.geocoding, cache.clone())?)
    } else {
        tracing::info!("Geocoding disabled");
        None
    };

    let state = Arc::new(AppState {
        repo,
        planner: JourneyPlanner::new(config.fares),
        geocoder,
        auth: AdminAuth::new(&config.auth),
        cache: Some(cache),
    });

    // Build router with CORS and tracing
    let mut app = Router::new().nest("/api/v1", busroute::routes::create_router(state));

    if let Some(ref static_dir) = config.static_dir {
        tracing::info!("Serving static files from {}", static_dir);
        app = app.fallback_service(ServeDir::new(static_dir));
    }

    let app = app
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http());

    // Start server
    let addr = config.server_address();
    tracing::info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
