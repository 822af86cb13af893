//! Client for the local Ollama inference server.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Upper wait bound on a generation call; the model can take minutes on
/// long contexts.
pub const GENERATE_TIMEOUT: Duration = Duration::from_secs(240);
const HEALTH_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("the model is taking too long to respond")]
    Timeout,
    #[error("unable to connect to the model service")]
    Unavailable,
    #[error("model service error (HTTP {status}): {message}")]
    Upstream { status: u16, message: String },
    #[error("generation failed: {0}")]
    Internal(String),
}

impl From<reqwest::Error> for GenerationError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            GenerationError::Timeout
        } else if e.is_connect() {
            GenerationError::Unavailable
        } else {
            GenerationError::Internal(e.to_string())
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GenerateOptions {
    pub temperature: f32,
    pub num_predict: u32,
    pub num_ctx: u32,
    pub stop: Vec<String>,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            num_predict: 2048,
            num_ctx: 4096,
            stop: vec![
                "User:".to_string(),
                "Human:".to_string(),
                "<|im_end|>".to_string(),
            ],
        }
    }
}

#[derive(Serialize)]
struct GenerateBody<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: &'a GenerateOptions,
}

#[derive(Deserialize)]
struct GenerateReply {
    #[serde(default)]
    response: String,
}

#[derive(Deserialize)]
struct TagsReply {
    #[serde(default)]
    models: Vec<ModelTag>,
}

#[derive(Deserialize)]
struct ModelTag {
    name: String,
}

#[derive(Clone)]
pub struct OllamaClient {
    http: reqwest::Client,
    base_url: String,
    model: String,
    generate_timeout: Duration,
}

impl OllamaClient {
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            model: model.into(),
            generate_timeout: GENERATE_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.generate_timeout = timeout;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Submits a prompt and waits for the full, non-streamed completion,
    /// bounded by the configured timeout ([`GENERATE_TIMEOUT`] by default).
    pub async fn generate(
        &self,
        prompt: &str,
        options: &GenerateOptions,
    ) -> Result<String, GenerationError> {
        let body = GenerateBody {
            model: &self.model,
            prompt,
            stream: false,
            options,
        };

        let resp = self
            .http
            .post(format!("{}/api/generate", self.base_url))
            .timeout(self.generate_timeout)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        debug!(%status, "ollama response");
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(GenerationError::Upstream {
                status: status.as_u16(),
                message,
            });
        }

        let reply: GenerateReply = resp
            .json()
            .await
            .map_err(|e| GenerationError::Internal(e.to_string()))?;
        Ok(reply.response)
    }

    /// Lists the model names the server has loaded. Used by the health probe.
    pub async fn list_models(&self) -> Result<Vec<String>, GenerationError> {
        let resp = self
            .http
            .get(format!("{}/api/tags", self.base_url))
            .timeout(HEALTH_TIMEOUT)
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(GenerationError::Upstream {
                status: resp.status().as_u16(),
                message: "tags endpoint returned non-success".to_string(),
            });
        }

        let reply: TagsReply = resp
            .json()
            .await
            .map_err(|e| GenerationError::Internal(e.to_string()))?;
        Ok(reply.models.into_iter().map(|m| m.name).collect())
    }
}
