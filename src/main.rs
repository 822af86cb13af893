use anyhow::Context as _;
use research_assistant::arxiv::ArxivClient;
use research_assistant::cache::{ContextCache, PaperCache};
use research_assistant::chat::ChatOrchestrator;
use research_assistant::config::Config;
use research_assistant::context::ContextBuilder;
use research_assistant::gateway::{api_router, AppState};
use research_assistant::ollama::OllamaClient;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.yml".to_string());
    let config = Config::load(&config_path)
        .with_context(|| format!("loading configuration from {config_path}"))?;
    config
        .ensure_data_folder()
        .context("creating data folder")?;

    let ttl = Duration::from_secs(config.cache_ttl_secs);
    let arxiv = Arc::new(
        ArxivClient::new(config.arxiv_url.clone()).context("building arxiv client")?,
    );
    let papers = PaperCache::new(config.cache_capacity, ttl);
    let contexts = ContextCache::new(config.cache_capacity, ttl);
    let ollama = OllamaClient::new(config.llm_url.clone(), config.llm_name.clone());

    let context_builder = ContextBuilder::new(arxiv.clone(), papers.clone(), contexts);
    let chat = ChatOrchestrator::new(context_builder, ollama.clone());

    let state = Arc::new(AppState {
        arxiv,
        papers,
        chat,
        ollama,
    });

    // The frontend runs on a different origin during development.
    let app = api_router(state).layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .context("invalid host/port")?;
    info!("research assistant listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
