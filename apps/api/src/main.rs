mod config;
mod db;
mod documents;
mod errors;
mod llm_client;
mod matching;
mod models;
mod routes;
mod state;

use anyhow::Result;
use aws_config::Region;
use aws_sdk_s3::config::Credentials;
use std::net::SocketAddr;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use std::sync::Arc;

use crate::config::Config;
use crate::db::create_pool;
use crate::documents::storage::ObjectStore;
use crate::llm_client::ollama::OllamaProvider;
use crate::llm_client::openai::OpenAiProvider;
use crate::llm_client::LlmService;
use crate::matching::batch::BatchMatcher;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={},tower_http={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log,
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting hiring API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL
    let db = create_pool(&config.database_url).await?;

    // Initialize S3 / MinIO
    let s3 = build_s3_client(&config).await;
    let storage = ObjectStore::new(s3, config.s3_bucket.clone());
    info!("S3 client initialized (bucket: {})", config.s3_bucket);

    // Initialize LLM providers
    let hosted = OpenAiProvider::new(
        config.openai_base_url.clone(),
        config.openai_api_key.clone(),
        config.default_hosted_model.clone(),
    )?;
    if !hosted.has_credential() {
        warn!("OPENAI_API_KEY is not set; hosted categorization and matching will fall back");
    }
    let self_hosted = OllamaProvider::new(config.ollama_url.clone(), config.ollama_model.clone())?;
    info!(
        "LLM providers initialized (hosted default: {}, self-hosted: {} at {})",
        config.default_hosted_model,
        self_hosted.model(),
        config.ollama_url
    );

    let llm = Arc::new(LlmService::new(
        Arc::new(hosted),
        Arc::new(self_hosted),
        config.default_hosted_model.clone(),
    ));
    let matcher = Arc::new(BatchMatcher::new(llm.clone(), config.batch_pause));

    // Build app state
    let state = AppState {
        db,
        storage,
        llm,
        matcher,
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Constructs an S3 client configured for MinIO (local) or AWS (production).
async fn build_s3_client(config: &Config) -> aws_sdk_s3::Client {
    let credentials = Credentials::new(
        &config.aws_access_key_id,
        &config.aws_secret_access_key,
        None,
        None,
        "hiring-static",
    );

    let s3_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(Region::new("us-east-1"))
        .credentials_provider(credentials)
        .endpoint_url(&config.s3_endpoint)
        .load()
        .await;

    // MinIO serves buckets by path, not by virtual host.
    let s3_config = aws_sdk_s3::config::Builder::from(&s3_config)
        .force_path_style(true)
        .build();

    aws_sdk_s3::Client::from_conf(s3_config)
}
