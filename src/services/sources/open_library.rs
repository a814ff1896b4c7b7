// Open Library search + work record: title, authors, description, subjects

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use super::{send_json, SourceError, SourceFetch, SourceKind, TextSource};
use crate::models::{MediaType, Work};
use crate::services::config_store::SourceSettings;

pub const SOURCE_NAME: &str = "open_library";
const OPEN_LIBRARY_DEFAULT_URL: &str = "https://openlibrary.org";

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    docs: Vec<SearchDoc>,
}

#[derive(Debug, Deserialize)]
struct SearchDoc {
    key: Option<String>,
    title: Option<String>,
    #[serde(default)]
    author_name: Vec<String>,
    #[serde(default)]
    subject: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct WorkRecord {
    description: Option<Description>,
}

/// Work descriptions come either as a bare string or as `{type, value}`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Description {
    Plain(String),
    Typed { value: String },
}

impl Description {
    fn into_text(self) -> String {
        match self {
            Description::Plain(s) => s,
            Description::Typed { value } => value,
        }
    }
}

pub struct OpenLibrarySource {
    client: Client,
    base_url: String,
}

impl OpenLibrarySource {
    pub fn new(client: Client, settings: &SourceSettings) -> Self {
        Self {
            client,
            base_url: settings.base_url_or(OPEN_LIBRARY_DEFAULT_URL),
        }
    }

    async fn description(&self, key: &str) -> Result<Option<String>, SourceError> {
        let url = format!("{}{}.json", self.base_url, key);
        let record: WorkRecord = send_json(self.client.get(url)).await?;
        Ok(record.description.map(Description::into_text))
    }
}

#[async_trait]
impl TextSource for OpenLibrarySource {
    fn name(&self) -> &str {
        SOURCE_NAME
    }

    fn kind(&self) -> SourceKind {
        SourceKind::SecondaryMetadata
    }

    fn supports(&self, media_type: MediaType) -> bool {
        media_type == MediaType::Book
    }

    async fn fetch(&self, work: &Work) -> Result<SourceFetch, SourceError> {
        let url = format!("{}/search.json", self.base_url);
        let search: SearchResponse = send_json(self.client.get(url).query(&[
            ("title", work.title.as_str()),
            ("limit", "1"),
            ("fields", "key,title,author_name,subject"),
        ]))
        .await?;

        let doc = search.docs.into_iter().next().ok_or(SourceError::NoMatch)?;

        let mut blocks = Vec::new();
        blocks.extend(doc.title);
        if !doc.author_name.is_empty() {
            blocks.push(doc.author_name.join(", "));
        }

        if let Some(key) = doc.key.as_deref().filter(|k| k.starts_with("/works/")) {
            match self.description(key).await {
                Ok(Some(desc)) => blocks.push(desc),
                Ok(None) => {}
                Err(e) => debug!("[SOURCES] open_library work {} failed: {}", key, e),
            }
        }

        if !doc.subject.is_empty() {
            blocks.push(doc.subject.join(", "));
        }

        Ok(SourceFetch::text(blocks))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_description_variants() {
        let plain: WorkRecord = serde_json::from_str(r#"{"description":"A plain one."}"#).unwrap();
        assert_eq!(plain.description.unwrap().into_text(), "A plain one.");

        let typed: WorkRecord = serde_json::from_str(
            r#"{"description":{"type":"/type/text","value":"A typed one."}}"#,
        )
        .unwrap();
        assert_eq!(typed.description.unwrap().into_text(), "A typed one.");

        let missing: WorkRecord = serde_json::from_str(r#"{"title":"x"}"#).unwrap();
        assert!(missing.description.is_none());
    }

    #[test]
    fn test_search_doc_defaults() {
        let body = r#"{"numFound":1,"docs":[{"key":"/works/OL1W","title":"Dune"}]}"#;
        let parsed: SearchResponse = serde_json::from_str(body).unwrap();
        let doc = &parsed.docs[0];
        assert!(doc.author_name.is_empty());
        assert!(doc.subject.is_empty());
    }
}
