// TMDB movie metadata: title, overview, genres

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use super::{send_json, SourceError, SourceFetch, SourceKind, TextSource};
use crate::models::{MediaType, Work};
use crate::services::config_store::SourceSettings;

pub const SOURCE_NAME: &str = "tmdb";
const TMDB_DEFAULT_URL: &str = "https://api.themoviedb.org/3";

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<MovieHit>,
}

#[derive(Debug, Deserialize)]
struct MovieHit {
    id: u64,
    title: Option<String>,
    overview: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MovieDetails {
    #[serde(default)]
    genres: Vec<Genre>,
    tagline: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Genre {
    name: String,
}

pub struct TmdbSource {
    client: Client,
    base_url: String,
    api_key: String,
}

impl TmdbSource {
    pub fn new(client: Client, settings: &SourceSettings) -> Result<Self, SourceError> {
        let api_key = settings
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or(SourceError::MissingApiKey)?;
        Ok(Self {
            client,
            base_url: settings.base_url_or(TMDB_DEFAULT_URL),
            api_key,
        })
    }

    async fn details(&self, id: u64) -> Result<MovieDetails, SourceError> {
        let url = format!("{}/movie/{}", self.base_url, id);
        send_json(self.client.get(url).query(&[("api_key", self.api_key.as_str())])).await
    }
}

#[async_trait]
impl TextSource for TmdbSource {
    fn name(&self) -> &str {
        SOURCE_NAME
    }

    fn kind(&self) -> SourceKind {
        SourceKind::PrimaryMetadata
    }

    fn supports(&self, media_type: MediaType) -> bool {
        media_type == MediaType::Movie
    }

    async fn fetch(&self, work: &Work) -> Result<SourceFetch, SourceError> {
        let url = format!("{}/search/movie", self.base_url);
        let search: SearchResponse = send_json(self.client.get(url).query(&[
            ("api_key", self.api_key.as_str()),
            ("query", work.title.as_str()),
            ("include_adult", "false"),
        ]))
        .await?;

        let hit = search.results.into_iter().next().ok_or(SourceError::NoMatch)?;

        let mut blocks = Vec::new();
        blocks.extend(hit.title);
        blocks.extend(hit.overview);

        // Genres are enrichment; the search hit alone is a valid result.
        match self.details(hit.id).await {
            Ok(details) => {
                blocks.extend(details.tagline);
                if !details.genres.is_empty() {
                    let genres: Vec<String> = details.genres.into_iter().map(|g| g.name).collect();
                    blocks.push(genres.join(", "));
                }
            }
            Err(e) => debug!("[SOURCES] tmdb details for {} failed: {}", hit.id, e),
        }

        Ok(SourceFetch::text(blocks))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requires_api_key() {
        let settings = SourceSettings::default();
        assert!(matches!(
            TmdbSource::new(Client::new(), &settings),
            Err(SourceError::MissingApiKey)
        ));
    }

    #[test]
    fn test_movie_only() {
        let settings = SourceSettings {
            api_key: Some("k".to_string()),
            ..Default::default()
        };
        let src = TmdbSource::new(Client::new(), &settings).unwrap();
        assert!(src.supports(MediaType::Movie));
        assert!(!src.supports(MediaType::Book));
        assert_eq!(src.base_url, TMDB_DEFAULT_URL);
    }

    #[test]
    fn test_search_response_parses_sparse_hits() {
        let parsed: SearchResponse = serde_json::from_str(
            r#"{"page":1,"results":[{"id":11036,"title":"The Notebook","overview":null}]}"#,
        )
        .unwrap();
        assert_eq!(parsed.results[0].id, 11036);
        assert!(parsed.results[0].overview.is_none());
    }
}
