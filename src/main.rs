use actix_cors::Cors;
use actix_web::{web, App, HttpServer, HttpResponse, middleware, error, http::StatusCode};
use hero_match::config::{LoggingSettings, Settings};
use hero_match::core::{ProximityMatcher, RetryPolicy};
use hero_match::reference::{CoordinateTable, RegionIndex};
use hero_match::routes::{self, proximity::AppState};
use hero_match::services::{AppwriteClient, AppwriteCollections, GeocodingClient};
use hero_match::shutdown::{cancel_on, shutdown_signal};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, error};
use tracing_subscriber::EnvFilter;

/// JSON error response for JSON payload errors
#[derive(Debug, serde::Serialize)]
pub struct JsonError {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}

impl std::fmt::Display for JsonError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.error, self.message)
    }
}

impl std::error::Error for JsonError {}

impl error::ResponseError for JsonError {
    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::BAD_REQUEST))
            .json(self)
    }
}

/// Handle JSON payload errors
pub fn handle_json_payload_error(err: error::JsonPayloadError, req: &actix_web::HttpRequest) -> actix_web::Error {
    tracing::info!("JSON payload error on {}: {}", req.path(), err);
    JsonError {
        error: "invalid_json".to_string(),
        message: format!("Invalid JSON: {}", err),
        status_code: 400,
    }
    .into()
}

/// Handle query payload errors
pub fn handle_query_payload_error(err: error::QueryPayloadError, req: &actix_web::HttpRequest) -> actix_web::Error {
    tracing::info!("Query error on {}: {}", req.path(), err);
    JsonError {
        error: "invalid_query".to_string(),
        message: format!("Invalid query: {}", err),
        status_code: 400,
    }
    .into()
}

/// Install the global subscriber; `LOG_LEVEL` / `LOG_FORMAT` win over the config file
fn init_logging(logging: &LoggingSettings) {
    let level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| logging.level.clone());
    let format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| logging.format.clone());

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&level));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true);

    if format == "pretty" {
        subscriber.pretty().init();
    } else {
        subscriber.json().init();
    }
}

fn startup_error(context: &str, err: impl std::fmt::Display) -> std::io::Error {
    error!("{}: {}", context, err);
    std::io::Error::new(std::io::ErrorKind::Other, format!("{}: {}", context, err))
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenv::dotenv().ok();

    let settings = match Settings::load() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            return Err(std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string()));
        }
    };

    init_logging(&settings.logging);
    info!("Starting Hero Match proximity service...");

    // Reference snapshots are loaded once and shared read-only
    let coordinates = CoordinateTable::load(&settings.reference.coordinates_path)
        .map_err(|e| startup_error("Failed to load coordinate table", e))?;
    let regions = RegionIndex::load(&settings.reference.regions_path)
        .map_err(|e| startup_error("Failed to load region index", e))?;

    let collections = AppwriteCollections {
        heroes: settings.collection.heroes.clone(),
        facilities: settings.collection.facilities.clone(),
    };
    let appwrite = Arc::new(
        AppwriteClient::new(
            settings.appwrite.endpoint.clone(),
            settings.appwrite.api_key.clone(),
            settings.appwrite.project_id.clone(),
            settings.appwrite.database_id.clone(),
            collections,
        )
        .map_err(|e| startup_error("Failed to build Appwrite client", e))?,
    );

    info!("Appwrite client initialized");

    let retry = RetryPolicy::new(
        settings.geocoder.max_attempts,
        Duration::from_millis(settings.geocoder.retry_delay_ms),
    );
    let geocoder = GeocodingClient::new(
        settings.geocoder.endpoint.clone(),
        settings.geocoder.api_key.clone(),
        settings.geocoder.country.clone(),
        retry,
    )
    .map_err(|e| startup_error("Failed to build geocoding client", e))?;

    let matcher = ProximityMatcher::new(Arc::new(coordinates));
    let shutdown = CancellationToken::new();

    info!(
        "Matcher initialized with tiers {}km/{}km for {:?}",
        settings.matching.near_km, settings.matching.far_km, settings.matching.categories
    );

    let app_state = AppState {
        store: appwrite.clone(),
        recipients: appwrite,
        geocoder: Arc::new(geocoder),
        matcher,
        regions: Arc::new(regions),
        matching: settings.matching.clone(),
        digest: settings.digest.clone(),
        cache_ttl_secs: settings.cache.ttl_secs,
        shutdown: shutdown.clone(),
    };

    // Configure HTTP server
    let host = settings.server.host.clone();
    let port = settings.server.port;
    let workers = settings.server.workers.unwrap_or(4);

    info!("Starting HTTP server on {}:{}", host, port);

    // Fires while workers are still draining, not after they are gone
    let watcher = cancel_on(shutdown_signal(), shutdown.clone());

    let result = HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .app_data(web::JsonConfig::default().error_handler(handle_json_payload_error))
            .app_data(web::QueryConfig::default().error_handler(handle_query_payload_error))
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .wrap(middleware::Compress::default())
            .configure(routes::configure_routes)
    })
    .workers(workers)
    .bind((host, port))?
    .run()
    .await;

    shutdown.cancel();
    let _ = watcher.await;
    info!("Server stopped");

    result
}
