//! Builds the "available papers" text block fed into chat prompts.

use crate::arxiv::ArxivClient;
use crate::cache::{ContextCache, PaperCache};
use crate::model::PaperRecord;
use std::sync::Arc;
use tracing::info;

pub const CONTEXT_PREAMBLE: &str = "Available research papers:\n\n";

// Chat context always draws on the same window regardless of what the
// search endpoint was asked for.
const CONTEXT_MAX_RESULTS: usize = 10;
const CONTEXT_YEARS: i64 = 5;

#[derive(Clone)]
pub struct ContextBuilder {
    arxiv: Arc<ArxivClient>,
    papers: PaperCache,
    contexts: ContextCache,
}

impl ContextBuilder {
    pub fn new(arxiv: Arc<ArxivClient>, papers: PaperCache, contexts: ContextCache) -> Self {
        Self {
            arxiv,
            papers,
            contexts,
        }
    }

    /// Returns the cached context blob for `topic`, building (and caching)
    /// it from the paper cache on a miss. Never fails: a degraded fetch
    /// produces the preamble-only blob.
    pub async fn get_or_build(&self, topic: &str) -> String {
        self.contexts
            .get_or_build(topic, || async {
                let outcome = self
                    .papers
                    .get_or_fetch(topic, CONTEXT_MAX_RESULTS, CONTEXT_YEARS, || {
                        self.arxiv.fetch(topic, CONTEXT_MAX_RESULTS, CONTEXT_YEARS)
                    })
                    .await;
                info!(papers = outcome.papers.len(), "building chat context");
                format_context(&outcome.papers)
            })
            .await
    }
}

/// One paragraph per paper: title, authors joined by comma, abstract.
pub fn format_context(papers: &[PaperRecord]) -> String {
    let mut context = String::from(CONTEXT_PREAMBLE);
    for paper in papers {
        context.push_str(&format!("Title: {}\n", paper.title));
        context.push_str(&format!("Authors: {}\n", paper.authors.join(", ")));
        context.push_str(&format!(
            "Abstract: {}\n\n",
            paper.abstract_text.as_deref().unwrap_or("")
        ));
    }
    context
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn empty_list_yields_preamble_only() {
        assert_eq!(format_context(&[]), "Available research papers:\n\n");
    }

    #[test]
    fn papers_are_rendered_as_paragraphs() {
        let papers = vec![PaperRecord {
            title: "Quantum Error Correction".to_string(),
            authors: vec!["A. Author".to_string(), "B. Author".to_string()],
            published: Utc::now(),
            url: "http://arxiv.org/pdf/1".to_string(),
            abstract_text: Some("We correct errors.".to_string()),
        }];
        let ctx = format_context(&papers);
        assert!(ctx.starts_with(CONTEXT_PREAMBLE));
        assert!(ctx.contains("Title: Quantum Error Correction\n"));
        assert!(ctx.contains("Authors: A. Author, B. Author\n"));
        assert!(ctx.contains("Abstract: We correct errors.\n\n"));
    }
}
