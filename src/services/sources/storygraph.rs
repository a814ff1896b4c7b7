// StoryGraph community page scrape.
// The whole flattened page is kept, including collapsed spoiler and content-warning
// blocks, capped at `review_max_chars`.

use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use std::sync::OnceLock;

use super::{send_text, SourceError, SourceFetch, SourceKind, TextSource};
use crate::models::{MediaType, Work};
use crate::services::config_store::SourceSettings;
use crate::services::text_processor::{html_to_text, truncate_chars};

pub const SOURCE_NAME: &str = "storygraph";
const STORYGRAPH_DEFAULT_URL: &str = "https://app.thestorygraph.com";

fn book_link_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"href="(/books/[A-Za-z0-9-]+)""#).expect("book link regex"))
}

fn first_book_path(search_html: &str) -> Option<String> {
    book_link_re()
        .captures(search_html)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

pub struct StoryGraphSource {
    client: Client,
    base_url: String,
    max_chars: usize,
}

impl StoryGraphSource {
    pub fn new(client: Client, settings: &SourceSettings, max_chars: usize) -> Self {
        Self {
            client,
            base_url: settings.base_url_or(STORYGRAPH_DEFAULT_URL),
            max_chars,
        }
    }
}

#[async_trait]
impl TextSource for StoryGraphSource {
    fn name(&self) -> &str {
        SOURCE_NAME
    }

    fn kind(&self) -> SourceKind {
        SourceKind::Review
    }

    fn supports(&self, media_type: MediaType) -> bool {
        media_type == MediaType::Book
    }

    async fn fetch(&self, work: &Work) -> Result<SourceFetch, SourceError> {
        let search_html = send_text(
            self.client
                .get(format!("{}/browse", self.base_url))
                .query(&[("search_term", work.title.as_str())]),
        )
        .await?;
        let path = first_book_path(&search_html).ok_or(SourceError::NoMatch)?;

        let page_html = send_text(self.client.get(format!("{}{}", self.base_url, path))).await?;
        let text = html_to_text(&page_html);
        Ok(SourceFetch::text(vec![truncate_chars(&text, self.max_chars).to_string()]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_book_path() {
        let html = r#"<div><a href="/browse?page=2">next</a>
            <a href="/books/0a1b2c3d-9f">The Fault in Our Stars</a>
            <a href="/books/ffff-0000">Other</a></div>"#;
        assert_eq!(first_book_path(html).as_deref(), Some("/books/0a1b2c3d-9f"));
        assert!(first_book_path("<p>No results</p>").is_none());
    }

    #[test]
    fn test_book_only() {
        let src = StoryGraphSource::new(Client::new(), &SourceSettings::default(), 100);
        assert!(src.supports(MediaType::Book));
        assert!(!src.supports(MediaType::Movie));
        assert_eq!(src.kind(), SourceKind::Review);
    }
}
