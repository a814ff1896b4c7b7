// Classifier
// Validates the request, fans out to every registered source concurrently and
// feeds the collected signals to the aggregator.

use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinSet;
use tracing::{info, warn};
use uuid::Uuid;

use crate::models::{CheckError, CheckRequest, Classification, MediaType, SourceResult, Work};
use crate::services::config_store::AppConfig;
use crate::services::sources::{
    build_http_client, default_sources, fetch_text, SourceKind, TextSource,
};
use crate::services::text_processor::{join_blocks, validate_title};

use super::aggregation::aggregate;
use super::curated_catalog::{curated_catalog, CuratedCatalog};
use super::term_scanner::{default_vocabulary, scan_terms, TermVocabulary};

const DEFAULT_SOURCE_TIMEOUT: Duration = Duration::from_secs(10);

pub struct Classifier {
    sources: Vec<Arc<dyn TextSource>>,
    catalog: &'static CuratedCatalog,
    vocabulary: &'static TermVocabulary,
    source_timeout: Duration,
    scan_enrichment_text: bool,
}

impl Classifier {
    /// Wire every enabled source from config. Keys must already be resolved.
    pub fn new(config: &AppConfig) -> Result<Self, String> {
        let client = build_http_client(&config.http)
            .map_err(|e| format!("Failed to build HTTP client: {}", e))?;
        let sources = default_sources(config, client);
        Ok(Self::with_sources(sources)
            .with_source_timeout(Duration::from_secs(config.http.timeout_secs.max(1)))
            .with_enrichment_text(config.detection.scan_enrichment_text))
    }

    pub fn with_sources(sources: Vec<Arc<dyn TextSource>>) -> Self {
        Self {
            sources,
            catalog: curated_catalog(),
            vocabulary: default_vocabulary(),
            source_timeout: DEFAULT_SOURCE_TIMEOUT,
            scan_enrichment_text: true,
        }
    }

    pub fn with_catalog(mut self, catalog: &'static CuratedCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn with_vocabulary(mut self, vocabulary: &'static TermVocabulary) -> Self {
        self.vocabulary = vocabulary;
        self
    }

    pub fn with_source_timeout(mut self, timeout: Duration) -> Self {
        self.source_timeout = timeout;
        self
    }

    pub fn with_enrichment_text(mut self, enabled: bool) -> Self {
        self.scan_enrichment_text = enabled;
        self
    }

    /// Validate and classify. Only invalid input is an error.
    pub async fn classify(&self, request: &CheckRequest) -> Result<Classification, CheckError> {
        let title = validate_title(&request.title)?;
        let media_type = MediaType::parse(&request.media_type)?;
        Ok(self.classify_work(Work::new(title, media_type)).await)
    }

    pub async fn classify_work(&self, work: Work) -> Classification {
        let request_id = Uuid::new_v4();
        let started = Instant::now();
        info!(
            "[CLASSIFIER] {} start title=\"{}\" media={}",
            request_id, work.title, work.media_type
        );

        let curated = self.catalog.match_title(&work.title, work.media_type);
        let fetched = self.fetch_all(&work).await;

        let membership_flags: Vec<_> = fetched
            .iter()
            .filter_map(|(_, res)| res.membership.clone())
            .collect();

        // Review text alone never overturns a safe verdict; it is only scanned
        // once another signal already fired.
        let mut combined = scanned_text(&fetched, false);
        let mut term_matches = scan_terms(&combined, self.vocabulary);
        let corroborated = curated.matched
            || membership_flags.iter().any(|f| f.matched)
            || !term_matches.is_empty();
        if self.scan_enrichment_text && corroborated {
            combined = scanned_text(&fetched, true);
            term_matches = scan_terms(&combined, self.vocabulary);
        }

        let metadata_found = metadata_found(&fetched);
        let verdict = aggregate(&work, &curated, &membership_flags, &term_matches);

        info!(
            "[CLASSIFIER] {} done safe={} method={} confidence={} sources_found={}/{} \
             text_chars={} elapsed_ms={}",
            request_id,
            verdict.safe,
            verdict.detection_method,
            verdict.confidence,
            fetched.iter().filter(|(_, r)| r.found).count(),
            fetched.len(),
            combined.chars().count(),
            started.elapsed().as_millis()
        );

        Classification {
            work,
            verdict,
            sources: fetched.into_iter().map(|(_, res)| res).collect(),
            metadata_found,
        }
    }

    /// Query every source that supports the media type at once. Results come back
    /// in registration order; a panicked task counts as a miss.
    async fn fetch_all(&self, work: &Work) -> Vec<(SourceKind, SourceResult)> {
        let active: Vec<Arc<dyn TextSource>> = self
            .sources
            .iter()
            .filter(|s| s.supports(work.media_type))
            .cloned()
            .collect();

        let mut slots: Vec<(SourceKind, SourceResult)> = active
            .iter()
            .map(|s| (s.kind(), SourceResult::not_found(s.name())))
            .collect();

        let shared_work = Arc::new(work.clone());
        let mut join_set: JoinSet<(usize, SourceResult)> = JoinSet::new();
        for (idx, source) in active.into_iter().enumerate() {
            let work = shared_work.clone();
            let timeout = self.source_timeout;
            join_set.spawn(async move { (idx, fetch_text(source.as_ref(), &work, timeout).await) });
        }

        while let Some(res) = join_set.join_next().await {
            match res {
                Ok((idx, result)) => slots[idx].1 = result,
                Err(e) => warn!("[CLASSIFIER] source task failed: {}", e),
            }
        }

        slots
    }
}

/// Found texts in registration order, optionally including review pages.
fn scanned_text(fetched: &[(SourceKind, SourceResult)], include_enrichment: bool) -> String {
    let blocks: Vec<&str> = fetched
        .iter()
        .filter(|(kind, res)| res.found && (include_enrichment || !kind.is_enrichment()))
        .map(|(_, res)| res.text.as_str())
        .collect();
    join_blocks(&blocks)
}

/// Whether the mandatory metadata lookups found the work. With no metadata
/// source wired for the media type, any found source counts.
fn metadata_found(fetched: &[(SourceKind, SourceResult)]) -> bool {
    let mut metadata = fetched.iter().filter(|(kind, _)| kind.is_metadata()).peekable();
    if metadata.peek().is_some() {
        metadata.any(|(_, res)| res.found)
    } else {
        fetched.iter().any(|(_, res)| res.found)
    }
}
