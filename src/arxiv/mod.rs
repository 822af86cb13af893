//! arXiv paper source client.
//!
//! Queries the arXiv Atom API with a topic plus a submitted-date window and
//! returns a bounded list of records, newest first (ordering comes from the
//! source, we never re-sort). Parsing uses quick-xml because Atom namespaces
//! make regex parsing brittle.

use crate::model::{FetchOutcome, PaperRecord};
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("arxiv request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("arxiv query failed: HTTP {0}")]
    Status(u16),
    #[error("invalid arxiv endpoint: {0}")]
    Endpoint(String),
}

pub struct ArxivClient {
    http: reqwest::Client,
    endpoint: String,
}

impl ArxivClient {
    /// Builds a client with a 30 s request timeout. Fails only if the
    /// underlying HTTP client cannot be constructed; the timeout is never
    /// silently dropped.
    pub fn new(endpoint: impl Into<String>) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            http,
            endpoint: endpoint.into(),
        })
    }

    /// Fetches up to `max_results` papers on `topic` submitted within the
    /// last `years * 365` days. Best-effort: an unreachable or erroring
    /// source degrades to an empty list with `degraded` set, never an error.
    ///
    /// Callers are expected to clamp `max_results` and `years` to sane
    /// ranges; the fetch itself does not enforce bounds.
    pub async fn fetch(&self, topic: &str, max_results: usize, years: i64) -> FetchOutcome {
        match self.try_fetch(topic, max_results, years).await {
            Ok(papers) => FetchOutcome {
                papers,
                degraded: false,
            },
            Err(e) => {
                warn!("paper fetch degraded to empty result: {e}");
                FetchOutcome {
                    papers: Vec::new(),
                    degraded: true,
                }
            }
        }
    }

    async fn try_fetch(
        &self,
        topic: &str,
        max_results: usize,
        years: i64,
    ) -> Result<Vec<PaperRecord>, FetchError> {
        let query = build_query(topic, years, Utc::now());

        let mut url = reqwest::Url::parse(&self.endpoint)
            .map_err(|e| FetchError::Endpoint(e.to_string()))?;
        // Request double the target count to compensate for entries lost to
        // client-side parse skips, then truncate after parsing.
        url.query_pairs_mut()
            .append_pair("search_query", &query)
            .append_pair("start", "0")
            .append_pair("max_results", &(max_results * 2).to_string())
            .append_pair("sortBy", "submittedDate")
            .append_pair("sortOrder", "descending");

        info!(%query, max_results, "fetching papers from arxiv");

        let resp = self.http.get(url).send().await?;
        if !resp.status().is_success() {
            return Err(FetchError::Status(resp.status().as_u16()));
        }
        let body = resp.text().await?;

        let (mut papers, skipped) = parse_atom(&body);
        if skipped > 0 {
            warn!(skipped, "skipped malformed arxiv entries");
        }
        papers.truncate(max_results);
        info!(count = papers.len(), "arxiv fetch complete");
        Ok(papers)
    }
}

/// arXiv query with the submitted-date filter, e.g.
/// `quantum computing AND submittedDate:[20200101* TO 20250101*]`.
/// The window uses a fixed 365-day year, not calendar years.
fn build_query(topic: &str, years: i64, now: DateTime<Utc>) -> String {
    let start = now - ChronoDuration::days(years * 365);
    format!(
        "{} AND submittedDate:[{}* TO {}*]",
        topic,
        start.format("%Y%m%d"),
        now.format("%Y%m%d")
    )
}

fn normalize_ws(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Streaming Atom parse. Returns the records in feed order plus the number
/// of entries dropped for missing or unparsable fields; one bad entry never
/// aborts the batch.
fn parse_atom(body: &str) -> (Vec<PaperRecord>, usize) {
    use quick_xml::events::Event;

    #[derive(Default)]
    struct Entry {
        title: String,
        summary: String,
        published: String,
        authors: Vec<String>,
        pdf_url: Option<String>,
        in_author: bool,
    }

    impl Entry {
        fn finish(self) -> Option<PaperRecord> {
            if self.title.is_empty() {
                return None;
            }
            let published = DateTime::parse_from_rfc3339(&self.published)
                .ok()?
                .with_timezone(&Utc);
            Some(PaperRecord {
                title: self.title,
                authors: self.authors,
                published,
                url: self.pdf_url?,
                abstract_text: (!self.summary.is_empty()).then_some(self.summary),
            })
        }
    }

    fn pdf_link(e: &quick_xml::events::BytesStart<'_>) -> Option<String> {
        let mut ty = None;
        let mut href = None;
        for a in e.attributes().flatten() {
            let k = String::from_utf8_lossy(a.key.as_ref()).to_string();
            let v = a.unescape_value().map(|v| v.to_string()).unwrap_or_default();
            match k.as_str() {
                "type" => ty = Some(v),
                "href" => href = Some(v),
                _ => {}
            }
        }
        (ty.as_deref() == Some("application/pdf")).then_some(href).flatten()
    }

    let mut reader = quick_xml::Reader::from_str(body);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();

    let mut papers = Vec::new();
    let mut skipped = 0usize;
    let mut cur: Option<Entry> = None;
    let mut text = String::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Eof) => break,
            Ok(Event::Start(e)) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                text.clear();
                if name.ends_with("entry") {
                    cur = Some(Entry::default());
                } else if let Some(entry) = cur.as_mut() {
                    if name.ends_with("author") {
                        entry.in_author = true;
                    } else if name.ends_with("link") {
                        if let Some(href) = pdf_link(&e) {
                            entry.pdf_url = Some(href);
                        }
                    }
                }
            }
            Ok(Event::Empty(e)) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                if name.ends_with("link") {
                    if let Some(entry) = cur.as_mut() {
                        if let Some(href) = pdf_link(&e) {
                            entry.pdf_url = Some(href);
                        }
                    }
                }
            }
            Ok(Event::Text(t)) => {
                text.push_str(&t.unescape().map(|t| t.to_string()).unwrap_or_default());
            }
            Ok(Event::End(e)) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                if name.ends_with("entry") {
                    match cur.take().map(Entry::finish) {
                        Some(Some(p)) => papers.push(p),
                        Some(None) => skipped += 1,
                        None => {}
                    }
                } else if let Some(entry) = cur.as_mut() {
                    let txt = normalize_ws(&text);
                    if name.ends_with("title") {
                        entry.title = txt;
                    } else if name.ends_with("summary") {
                        entry.summary = txt;
                    } else if name.ends_with("published") {
                        entry.published = txt;
                    } else if entry.in_author && name.ends_with("name") && !txt.is_empty() {
                        entry.authors.push(txt);
                    } else if name.ends_with("author") {
                        entry.in_author = false;
                    }
                }
                text.clear();
            }
            Err(e) => {
                warn!("arxiv feed parse aborted: {e}");
                break;
            }
            _ => {}
        }
        buf.clear();
    }

    (papers, skipped)
}
