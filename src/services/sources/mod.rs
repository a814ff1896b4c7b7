// Source Adapters
// Uniform text/membership capability over independent public data sources.
// Each adapter owns its transport; failures stop at `fetch_text` and never
// reach the classifier.

pub mod doesthedogdie;
pub mod google_books;
pub mod open_library;
pub mod storygraph;
pub mod tmdb;
pub mod wikipedia;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::models::{DetectionMethod, MediaType, MembershipFlag, SourceResult, Work};
use crate::services::config_store::{AppConfig, HttpConfig};
use crate::services::text_processor::join_blocks;

pub use doesthedogdie::DoesTheDogDieSource;
pub use google_books::GoogleBooksSource;
pub use open_library::OpenLibrarySource;
pub use storygraph::StoryGraphSource;
pub use tmdb::TmdbSource;
pub use wikipedia::{WikipediaCategorySource, WikipediaSummarySource};

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),
    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },
    #[error("JSON parse error: {0}")]
    JsonError(String),
    #[error("No match for title")]
    NoMatch,
    #[error("API key not configured")]
    MissingApiKey,
    #[error("Timed out after {0:?}")]
    Timeout(Duration),
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SourceKind {
    /// Movie or book registry; a miss here counts toward "no results found".
    PrimaryMetadata,
    SecondaryMetadata,
    Encyclopedia,
    CategoryMembership,
    TriggerDatabase,
    /// Scraped community page. Optional enrichment only.
    Review,
}

impl SourceKind {
    pub fn is_metadata(self) -> bool {
        matches!(self, SourceKind::PrimaryMetadata | SourceKind::SecondaryMetadata)
    }

    pub fn is_enrichment(self) -> bool {
        self == SourceKind::Review
    }

    /// Detection method reported when this kind's membership check fires.
    pub fn membership_method(self) -> Option<DetectionMethod> {
        match self {
            SourceKind::CategoryMembership => Some(DetectionMethod::CategoryList),
            SourceKind::TriggerDatabase => Some(DetectionMethod::TriggerDatabase),
            _ => None,
        }
    }
}

/// What an adapter found: free-text blocks and, for categorical sources, a membership answer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceFetch {
    pub blocks: Vec<String>,
    pub membership: Option<bool>,
}

impl SourceFetch {
    pub fn text(blocks: Vec<String>) -> Self {
        Self {
            blocks,
            membership: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.membership.is_none() && self.blocks.iter().all(|b| b.trim().is_empty())
    }
}

#[async_trait]
pub trait TextSource: Send + Sync {
    fn name(&self) -> &str;

    fn kind(&self) -> SourceKind;

    fn supports(&self, media_type: MediaType) -> bool;

    async fn fetch(&self, work: &Work) -> Result<SourceFetch, SourceError>;
}

/// Run one adapter under a deadline and fold every failure into `found = false`.
pub async fn fetch_text(source: &dyn TextSource, work: &Work, timeout: Duration) -> SourceResult {
    let name = source.name().to_string();
    let started = Instant::now();

    let outcome = match tokio::time::timeout(timeout, source.fetch(work)).await {
        Ok(res) => res,
        Err(_) => Err(SourceError::Timeout(timeout)),
    };

    match outcome {
        Ok(fetch) if !fetch.is_empty() => {
            let membership = match (fetch.membership, source.kind().membership_method()) {
                (Some(matched), Some(method)) => Some(MembershipFlag {
                    name: name.clone(),
                    method,
                    matched,
                }),
                _ => None,
            };
            let text = join_blocks(&fetch.blocks);
            debug!(
                "[SOURCES] {} found \"{}\": {} chars, membership={:?}, elapsed_ms={}",
                name,
                work.title,
                text.chars().count(),
                membership.as_ref().map(|m| m.matched),
                started.elapsed().as_millis()
            );
            SourceResult {
                source_name: name,
                text,
                found: true,
                membership,
            }
        }
        Ok(_) | Err(SourceError::NoMatch) => {
            debug!("[SOURCES] {} has no match for \"{}\"", name, work.title);
            SourceResult::not_found(name)
        }
        Err(e) => {
            warn!(
                "[SOURCES] {} unavailable for \"{}\" (elapsed_ms={}): {}",
                name,
                work.title,
                started.elapsed().as_millis(),
                e
            );
            SourceResult::not_found(name)
        }
    }
}

pub fn build_http_client(config: &HttpConfig) -> Result<Client, SourceError> {
    let mut builder = Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs.max(1)))
        .user_agent(config.user_agent.clone());
    if let Some(proxy_url) = config.proxy.as_deref().filter(|p| !p.trim().is_empty()) {
        builder = builder.proxy(reqwest::Proxy::all(proxy_url)?);
    }
    Ok(builder.build()?)
}

async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, SourceError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(SourceError::ApiError {
            status: status.as_u16(),
            message: body.chars().take(300).collect(),
        });
    }
    Ok(response)
}

/// Send and decode a JSON body, mapping non-2xx to `ApiError`.
pub(crate) async fn send_json<T: DeserializeOwned>(
    request: RequestBuilder,
) -> Result<T, SourceError> {
    let response = ensure_success(request.send().await?).await?;
    response
        .json()
        .await
        .map_err(|e| SourceError::JsonError(e.to_string()))
}

pub(crate) async fn send_text(request: RequestBuilder) -> Result<String, SourceError> {
    let response = ensure_success(request.send().await?).await?;
    Ok(response.text().await?)
}

/// Adapters wired from config, in the order their text is concatenated.
pub fn default_sources(config: &AppConfig, client: Client) -> Vec<Arc<dyn TextSource>> {
    let mut sources: Vec<Arc<dyn TextSource>> = Vec::new();

    let tmdb = config.source(tmdb::SOURCE_NAME);
    if tmdb.enabled {
        match TmdbSource::new(client.clone(), &tmdb) {
            Ok(s) => sources.push(Arc::new(s)),
            Err(e) => info!("[SOURCES] {} not registered: {}", tmdb::SOURCE_NAME, e),
        }
    }

    let google = config.source(google_books::SOURCE_NAME);
    if google.enabled {
        sources.push(Arc::new(GoogleBooksSource::new(client.clone(), &google)));
    }

    let open_library = config.source(open_library::SOURCE_NAME);
    if open_library.enabled {
        sources.push(Arc::new(OpenLibrarySource::new(client.clone(), &open_library)));
    }

    let wiki = config.source(wikipedia::SUMMARY_SOURCE_NAME);
    if wiki.enabled {
        sources.push(Arc::new(WikipediaSummarySource::new(client.clone(), &wiki)));
    }

    let wiki_categories = config.source(wikipedia::CATEGORY_SOURCE_NAME);
    if wiki_categories.enabled {
        sources.push(Arc::new(WikipediaCategorySource::new(
            client.clone(),
            &wiki_categories,
            config.detection.wikipedia_categories.clone(),
        )));
    }

    let ddd = config.source(doesthedogdie::SOURCE_NAME);
    if ddd.enabled {
        let topics = config.detection.trigger_topics.clone();
        match DoesTheDogDieSource::new(client.clone(), &ddd, topics) {
            Ok(s) => sources.push(Arc::new(s)),
            Err(e) => info!("[SOURCES] {} not registered: {}", doesthedogdie::SOURCE_NAME, e),
        }
    }

    let storygraph = config.source(storygraph::SOURCE_NAME);
    if storygraph.enabled {
        sources.push(Arc::new(StoryGraphSource::new(
            client,
            &storygraph,
            config.detection.review_max_chars,
        )));
    }

    info!(
        "[SOURCES] Registered {} sources: {}",
        sources.len(),
        sources.iter().map(|s| s.name()).collect::<Vec<_>>().join(", ")
    );
    sources
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::config_store::SourceSettings;

    struct Fixed {
        kind: SourceKind,
        outcome: fn() -> Result<SourceFetch, SourceError>,
    }

    #[async_trait]
    impl TextSource for Fixed {
        fn name(&self) -> &str {
            "fixed"
        }
        fn kind(&self) -> SourceKind {
            self.kind
        }
        fn supports(&self, _media_type: MediaType) -> bool {
            true
        }
        async fn fetch(&self, _work: &Work) -> Result<SourceFetch, SourceError> {
            (self.outcome)()
        }
    }

    struct Stalled;

    #[async_trait]
    impl TextSource for Stalled {
        fn name(&self) -> &str {
            "stalled"
        }
        fn kind(&self) -> SourceKind {
            SourceKind::Encyclopedia
        }
        fn supports(&self, _media_type: MediaType) -> bool {
            true
        }
        async fn fetch(&self, _work: &Work) -> Result<SourceFetch, SourceError> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(SourceFetch::text(vec!["late".to_string()]))
        }
    }

    fn work() -> Work {
        Work::new("Dune", MediaType::Book)
    }

    #[tokio::test]
    async fn test_fetch_text_joins_blocks() {
        let src = Fixed {
            kind: SourceKind::PrimaryMetadata,
            outcome: || {
                Ok(SourceFetch::text(vec![
                    "Dune".to_string(),
                    "".to_string(),
                    "desert".to_string(),
                ]))
            },
        };
        let res = fetch_text(&src, &work(), Duration::from_secs(1)).await;
        assert!(res.found);
        assert_eq!(res.text, "Dune\n\ndesert");
        assert!(res.membership.is_none());
    }

    #[tokio::test]
    async fn test_fetch_text_error_becomes_not_found() {
        let src = Fixed {
            kind: SourceKind::PrimaryMetadata,
            outcome: || {
                Err(SourceError::ApiError {
                    status: 503,
                    message: "down".to_string(),
                })
            },
        };
        let res = fetch_text(&src, &work(), Duration::from_secs(1)).await;
        assert!(!res.found);
        assert!(res.text.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_text_membership_uses_kind_method() {
        let src = Fixed {
            kind: SourceKind::TriggerDatabase,
            outcome: || {
                Ok(SourceFetch {
                    blocks: vec![],
                    membership: Some(true),
                })
            },
        };
        let res = fetch_text(&src, &work(), Duration::from_secs(1)).await;
        assert!(res.found);
        let flag = res.membership.unwrap();
        assert!(flag.matched);
        assert_eq!(flag.method, DetectionMethod::TriggerDatabase);
    }

    #[tokio::test]
    async fn test_fetch_text_timeout_is_a_failure() {
        let res = fetch_text(&Stalled, &work(), Duration::from_millis(50)).await;
        assert!(!res.found);
        assert_eq!(res.source_name, "stalled");
    }

    #[test]
    fn test_default_sources_skip_keyless_and_disabled() {
        let mut config = AppConfig::default();
        config.sources.insert(
            storygraph::SOURCE_NAME.to_string(),
            SourceSettings {
                enabled: false,
                ..Default::default()
            },
        );
        let client = build_http_client(&config.http).unwrap();
        let names: Vec<String> = default_sources(&config, client)
            .iter()
            .map(|s| s.name().to_string())
            .collect();
        assert_eq!(
            names,
            vec!["google_books", "open_library", "wikipedia", "wikipedia_categories"]
        );
    }
}
