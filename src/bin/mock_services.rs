//! Fake arXiv + Ollama upstream for local runs.
//!
//! Usage: mock_services [port] [latency_ms] [error_rate]
//!
//! Serves `/api/query` (arXiv Atom), `/api/generate` and `/api/tags`
//! (Ollama) so the assistant can be exercised without network access.

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use rand::Rng;
use serde_json::Value;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::time::sleep;

#[derive(Clone)]
struct ServerConfig {
    latency_ms: u64,
    error_rate: f64,
}

#[tokio::main]
async fn main() {
    let args: Vec<String> = std::env::args().collect();
    let port = args.get(1).unwrap_or(&"3000".to_string()).parse::<u16>().unwrap();
    let latency_ms = args.get(2).unwrap_or(&"200".to_string()).parse::<u64>().unwrap();
    let error_rate = args.get(3).unwrap_or(&"0.0".to_string()).parse::<f64>().unwrap();

    let config = ServerConfig {
        latency_ms,
        error_rate,
    };

    let app = Router::new()
        .route("/api/query", get(arxiv_handler))
        .route("/api/generate", post(generate_handler))
        .route("/api/tags", get(tags_handler))
        .with_state(config);

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    println!(
        "Mock services running on localhost:{}. Latency: {}ms, Error Rate: {}",
        port, latency_ms, error_rate
    );

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}

async fn simulate(config: &ServerConfig) -> bool {
    let jitter = rand::thread_rng().gen_range(0..=20);
    sleep(Duration::from_millis(config.latency_ms + jitter)).await;
    config.error_rate > 0.0 && rand::thread_rng().gen_bool(config.error_rate)
}

async fn arxiv_handler(State(config): State<ServerConfig>) -> (axum::http::StatusCode, String) {
    if simulate(&config).await {
        return (
            axum::http::StatusCode::INTERNAL_SERVER_ERROR,
            "simulated failure".to_string(),
        );
    }

    let entries: String = (0..10)
        .map(|i| {
            format!(
                r#"<entry>
  <id>http://arxiv.org/abs/2400.{i:04}v1</id>
  <published>2024-09-{:02}T00:00:00Z</published>
  <title>Synthetic Paper {i}</title>
  <summary>A synthetic abstract for local testing.</summary>
  <author><name>Mock Author</name></author>
  <link rel="related" type="application/pdf" href="http://arxiv.org/pdf/2400.{i:04}v1"/>
</entry>"#,
                30 - i
            )
        })
        .collect();

    (
        axum::http::StatusCode::OK,
        format!(r#"<feed xmlns="http://www.w3.org/2005/Atom">{entries}</feed>"#),
    )
}

async fn generate_handler(
    State(config): State<ServerConfig>,
    Json(_req): Json<Value>,
) -> (axum::http::StatusCode, Json<Value>) {
    if simulate(&config).await {
        return (
            axum::http::StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({"error": "simulated failure"})),
        );
    }

    (
        axum::http::StatusCode::OK,
        Json(serde_json::json!({
            "response": "1. This is a mock response grounded in the synthetic papers."
        })),
    )
}

async fn tags_handler(State(config): State<ServerConfig>) -> (axum::http::StatusCode, Json<Value>) {
    if simulate(&config).await {
        return (
            axum::http::StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({"error": "simulated failure"})),
        );
    }

    (
        axum::http::StatusCode::OK,
        Json(serde_json::json!({
            "models": [{ "name": "research_assistant:latest" }]
        })),
    )
}
