// Google Books volume lookup: title, authors, description, categories

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use super::{send_json, SourceError, SourceFetch, SourceKind, TextSource};
use crate::models::{MediaType, Work};
use crate::services::config_store::SourceSettings;

pub const SOURCE_NAME: &str = "google_books";
const GOOGLE_BOOKS_DEFAULT_URL: &str = "https://www.googleapis.com/books/v1";

#[derive(Debug, Deserialize)]
struct VolumesResponse {
    #[serde(default)]
    items: Vec<Volume>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Volume {
    volume_info: VolumeInfo,
}

#[derive(Debug, Default, Deserialize)]
struct VolumeInfo {
    title: Option<String>,
    #[serde(default)]
    authors: Vec<String>,
    description: Option<String>,
    #[serde(default)]
    categories: Vec<String>,
}

impl VolumeInfo {
    fn into_blocks(self) -> Vec<String> {
        let mut blocks = Vec::new();
        blocks.extend(self.title);
        if !self.authors.is_empty() {
            blocks.push(self.authors.join(", "));
        }
        blocks.extend(self.description);
        if !self.categories.is_empty() {
            blocks.push(self.categories.join(", "));
        }
        blocks
    }
}

pub struct GoogleBooksSource {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl GoogleBooksSource {
    pub fn new(client: Client, settings: &SourceSettings) -> Self {
        Self {
            client,
            base_url: settings.base_url_or(GOOGLE_BOOKS_DEFAULT_URL),
            api_key: settings.api_key.clone(),
        }
    }
}

#[async_trait]
impl TextSource for GoogleBooksSource {
    fn name(&self) -> &str {
        SOURCE_NAME
    }

    fn kind(&self) -> SourceKind {
        SourceKind::PrimaryMetadata
    }

    fn supports(&self, media_type: MediaType) -> bool {
        media_type == MediaType::Book
    }

    async fn fetch(&self, work: &Work) -> Result<SourceFetch, SourceError> {
        let url = format!("{}/volumes", self.base_url);
        let query = format!("intitle:{}", work.title);
        let mut request = self
            .client
            .get(url)
            .query(&[("q", query.as_str()), ("maxResults", "1"), ("printType", "books")]);
        if let Some(key) = self.api_key.as_deref() {
            request = request.query(&[("key", key)]);
        }

        let response: VolumesResponse = send_json(request).await?;
        let volume = response.items.into_iter().next().ok_or(SourceError::NoMatch)?;
        Ok(SourceFetch::text(volume.volume_info.into_blocks()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_volume_blocks() {
        let parsed: VolumesResponse = serde_json::from_str(
            r#"{"totalItems":1,"items":[{"volumeInfo":{
                "title":"The Fault in Our Stars",
                "authors":["John Green"],
                "description":"Hazel, a sixteen-year-old with terminal cancer...",
                "categories":["Young Adult Fiction"]}}]}"#,
        )
        .unwrap();
        let blocks = parsed.items.into_iter().next().unwrap().volume_info.into_blocks();
        assert_eq!(
            blocks,
            vec![
                "The Fault in Our Stars",
                "John Green",
                "Hazel, a sixteen-year-old with terminal cancer...",
                "Young Adult Fiction"
            ]
        );
    }

    #[test]
    fn test_empty_response_has_no_items() {
        let parsed: VolumesResponse =
            serde_json::from_str(r#"{"kind":"books#volumes","totalItems":0}"#).unwrap();
        assert!(parsed.items.is_empty());
    }
}
