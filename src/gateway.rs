use crate::arxiv::ArxivClient;
use crate::cache::PaperCache;
use crate::chat::ChatOrchestrator;
use crate::model::{ChatRequest, ChatResponse, PaperResponse, SearchRequest, SearchResponse};
use crate::ollama::{GenerationError, OllamaClient};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};

pub struct AppState {
    pub arxiv: Arc<ArxivClient>,
    pub papers: PaperCache,
    pub chat: ChatOrchestrator,
    pub ollama: OllamaClient,
}

pub fn api_router(state: Arc<AppState>) -> axum::Router {
    use axum::routing::{get, post};

    axum::Router::new()
        .route("/api/research/:topic", post(handle_research))
        .route("/api/chat/:topic", post(handle_chat))
        .route("/health", get(handle_health))
        .with_state(state)
}

/// POST /api/research/{topic}
///
/// Clamps the requested bounds before touching the cache so the cache key
/// space stays small.
pub async fn handle_research(
    State(state): State<Arc<AppState>>,
    Path(topic): Path<String>,
    Json(req): Json<SearchRequest>,
) -> Response {
    let start = Instant::now();
    let max_results = req.max_results.unwrap_or(10).clamp(10, 20);
    let years = req.years.unwrap_or(5).clamp(1, 10);

    info!(%topic, max_results, years, "research request");

    let outcome = state
        .papers
        .get_or_fetch(&topic, max_results, years, || {
            state.arxiv.fetch(&topic, max_results, years)
        })
        .await;

    let papers: Vec<PaperResponse> = outcome.papers.iter().map(PaperResponse::from).collect();
    let total_papers = papers.len();

    info!(
        total_papers,
        degraded = outcome.degraded,
        elapsed = ?start.elapsed(),
        "research request served"
    );

    let warning = outcome
        .degraded
        .then(|| "paper source was unreachable; results may be incomplete".to_string());

    (
        StatusCode::OK,
        Json(SearchResponse {
            status: "success".to_string(),
            papers,
            total_papers,
            warning,
        }),
    )
        .into_response()
}

/// POST /api/chat/{topic}
pub async fn handle_chat(
    State(state): State<Arc<AppState>>,
    Path(topic): Path<String>,
    Json(req): Json<ChatRequest>,
) -> Response {
    let start = Instant::now();
    info!(%topic, "chat request");

    match state.chat.answer(&topic, &req.message).await {
        Ok(reply) => {
            info!(elapsed = ?start.elapsed(), fallback = reply.fallback, "chat request served");
            let status = if reply.fallback { "error" } else { "success" };
            (
                StatusCode::OK,
                Json(ChatResponse {
                    status: status.to_string(),
                    response: reply.text,
                }),
            )
                .into_response()
        }
        Err(e) => {
            error!("chat request failed: {e}");
            let (code, detail) = match e {
                GenerationError::Timeout => (
                    StatusCode::GATEWAY_TIMEOUT,
                    "The model is taking too long to respond. Please try again.".to_string(),
                ),
                GenerationError::Unavailable => (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "Unable to connect to the AI model service. Please check if Ollama is running."
                        .to_string(),
                ),
                GenerationError::Upstream { status, message } => (
                    StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY),
                    format!("Ollama error: {message}"),
                ),
                GenerationError::Internal(_) => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An error occurred while processing your request.".to_string(),
                ),
            };
            (code, Json(json!({ "detail": detail }))).into_response()
        }
    }
}

/// GET /health: probes the Ollama tags endpoint and checks the configured
/// model is loaded.
pub async fn handle_health(State(state): State<Arc<AppState>>) -> Response {
    match state.ollama.list_models().await {
        Ok(models) => {
            let model_loaded = models.iter().any(|m| m.starts_with(state.ollama.model()));
            Json(json!({
                "status": "healthy",
                "services": {
                    "ollama": "running",
                    "model_loaded": model_loaded,
                }
            }))
            .into_response()
        }
        Err(GenerationError::Upstream { .. }) => Json(json!({
            "status": "unhealthy",
            "error": "Ollama service not responding correctly",
        }))
        .into_response(),
        Err(e) => Json(json!({
            "status": "unhealthy",
            "error": e.to_string(),
        }))
        .into_response(),
    }
}
