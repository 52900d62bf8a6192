use actix_cors::Cors;
use actix_web::{web, App, HttpServer, HttpResponse, middleware, error, http::StatusCode};
use artconnect_match::config::Settings;
use artconnect_match::core::{Matcher, SessionStore};
use artconnect_match::models::ScoringWeights;
use artconnect_match::routes::{self, AppState};
use artconnect_match::services::{
    CandidateSource, InMemoryCandidateSource, PostgresCandidateSource, ProposalClient,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, error, warn};
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
            .content_type("application/json")
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
pub fn handle_query_payload_error(err: error::QueryPayloadError, _req: &actix_web::HttpRequest) -> actix_web::Error {
    JsonError {
        error: "invalid_query".to_string(),
        message: format!("Invalid query: {}", err),
        status_code: 400,
    }
    .into()
}

fn init_logging() {
    let log_level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "json".to_string());

    // RUST_LOG wins over LOG_LEVEL when both are set
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true);

    if log_format == "pretty" {
        subscriber.pretty().init();
    } else {
        subscriber.init();
    }
}

async fn build_candidate_source(settings: &Settings) -> std::io::Result<Arc<dyn CandidateSource>> {
    let max_candidates = settings.matching.max_candidates;

    if let Some(url) = settings.database.url.as_deref() {
        let postgres = PostgresCandidateSource::from_settings(
            url,
            settings.database.max_connections,
            settings.database.min_connections,
            Some(max_candidates),
        )
        .await
        .map_err(|e| {
            error!("Failed to connect to PostgreSQL: {}", e);
            std::io::Error::new(std::io::ErrorKind::Other, e.to_string())
        })?;

        info!("PostgreSQL candidate source initialized");
        return Ok(Arc::new(postgres));
    }

    let source = match settings.matching.fixture_path.as_deref() {
        Some(path) => InMemoryCandidateSource::from_json_file(path).map_err(|e| {
            error!("Failed to load designer fixture: {}", e);
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })?,
        None => {
            warn!("No database url or fixture configured, designer pool is empty");
            InMemoryCandidateSource::default()
        }
    };

    info!("In-memory candidate source initialized ({} designers)", source.len());
    Ok(Arc::new(source.with_limit(max_candidates)))
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenv::dotenv().ok();

    init_logging();

    info!("Starting ArtConnect designer matching service...");

    // Load configuration
    let settings = Settings::load().map_err(|e| {
        error!("Failed to load configuration: {}", e);
        std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string())
    })?;

    info!("Configuration loaded successfully");

    let candidates = build_candidate_source(&settings).await?;

    let proposals = Arc::new(
        ProposalClient::new(
            settings.llm.endpoint.clone(),
            settings.llm.api_key.clone(),
            settings.llm.model.clone(),
            settings.llm.max_tokens,
            Duration::from_secs(settings.llm.timeout_secs),
        )
        .map_err(|e| {
            error!("Failed to build proposal client: {}", e);
            std::io::Error::new(std::io::ErrorKind::Other, e.to_string())
        })?,
    );

    info!("Proposal client initialized (model: {})", settings.llm.model);

    // Initialize matcher with configured weights
    let weights = ScoringWeights::from(&settings.scoring.weights);
    let matcher = Matcher::new(weights, settings.matching.top_k);

    info!("Matcher initialized with weights: {:?}, top_k: {}", weights, settings.matching.top_k);

    let session_config = settings.matching.session_config();
    info!(
        "Session store initialized (ttl: {}s, page size: {})",
        session_config.ttl.num_seconds(),
        session_config.page_size
    );
    let sessions = Arc::new(SessionStore::new(session_config));

    // Build application state
    let app_state = AppState {
        proposals,
        candidates,
        sessions,
        matcher,
    };

    // Configure HTTP server
    let host = settings.server.host.clone();
    let port = settings.server.port;
    let workers = settings.server.workers.unwrap_or(4);

    info!("Starting HTTP server on {}:{}", host, port);

    HttpServer::new(move || {
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
    .await
}
