use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One paper as returned by the source. Immutable once constructed;
/// lives inside a cache entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaperRecord {
    pub title: String,
    pub authors: Vec<String>,
    pub published: DateTime<Utc>,
    pub url: String,
    pub abstract_text: Option<String>,
}

/// Result of a paper fetch. `degraded` is set when the upstream source
/// was unreachable or errored, so an empty list can be told apart from
/// "no papers exist for this query".
#[derive(Debug, Clone, Default)]
pub struct FetchOutcome {
    pub papers: Vec<PaperRecord>,
    pub degraded: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchRequest {
    #[serde(default)]
    pub max_results: Option<usize>,
    #[serde(default)]
    pub years: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

/// Wire shape of one paper in the research response. `published` is
/// rendered as YYYY-MM-DD for the frontend.
#[derive(Debug, Clone, Serialize)]
pub struct PaperResponse {
    pub title: String,
    pub authors: Vec<String>,
    pub published: String,
    pub url: String,
    #[serde(rename = "abstract")]
    pub abstract_text: Option<String>,
}

impl From<&PaperRecord> for PaperResponse {
    fn from(p: &PaperRecord) -> Self {
        Self {
            title: p.title.clone(),
            authors: p.authors.clone(),
            published: p.published.format("%Y-%m-%d").to_string(),
            url: p.url.clone(),
            abstract_text: p.abstract_text.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchResponse {
    pub status: String,
    pub papers: Vec<PaperResponse>,
    pub total_papers: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatResponse {
    pub status: String,
    pub response: String,
}
