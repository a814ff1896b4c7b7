// Wikipedia: intro summary text and category membership.
// Both adapters resolve the page through a single search hit, biased by media type.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use super::{send_json, SourceError, SourceFetch, SourceKind, TextSource};
use crate::models::{MediaType, Work};
use crate::services::config_store::SourceSettings;

pub const SUMMARY_SOURCE_NAME: &str = "wikipedia";
pub const CATEGORY_SOURCE_NAME: &str = "wikipedia_categories";
const WIKIPEDIA_DEFAULT_URL: &str = "https://en.wikipedia.org";

#[derive(Debug, Deserialize)]
struct QueryResponse {
    query: Option<QueryPages>,
}

#[derive(Debug, Deserialize)]
struct QueryPages {
    #[serde(default)]
    pages: Vec<WikiPage>,
}

#[derive(Debug, Deserialize)]
struct WikiPage {
    title: String,
    #[serde(default)]
    index: u32,
    extract: Option<String>,
    #[serde(default)]
    categories: Vec<WikiCategory>,
    #[serde(default)]
    missing: bool,
}

#[derive(Debug, Deserialize)]
struct WikiCategory {
    title: String,
}

fn search_phrase(work: &Work) -> String {
    let hint = match work.media_type {
        MediaType::Book => "novel",
        MediaType::Movie => "film",
    };
    format!("{} {}", work.title, hint)
}

/// First page of a generator search, by search rank.
fn top_page(response: QueryResponse) -> Option<WikiPage> {
    response
        .query?
        .pages
        .into_iter()
        .filter(|p| !p.missing)
        .min_by_key(|p| p.index)
}

fn category_param(categories: &[String]) -> String {
    categories
        .iter()
        .map(|c| {
            let c = c.trim();
            if c.starts_with("Category:") {
                c.to_string()
            } else {
                format!("Category:{}", c)
            }
        })
        .collect::<Vec<_>>()
        .join("|")
}

struct WikiClient {
    client: Client,
    api_url: String,
}

impl WikiClient {
    fn new(client: Client, settings: &SourceSettings) -> Self {
        Self {
            client,
            api_url: format!("{}/w/api.php", settings.base_url_or(WIKIPEDIA_DEFAULT_URL)),
        }
    }

    async fn search_page(
        &self,
        work: &Work,
        extra: &[(&str, &str)],
    ) -> Result<WikiPage, SourceError> {
        let phrase = search_phrase(work);
        let request = self
            .client
            .get(&self.api_url)
            .query(&[
                ("action", "query"),
                ("format", "json"),
                ("formatversion", "2"),
                ("redirects", "1"),
                ("generator", "search"),
                ("gsrlimit", "1"),
                ("gsrsearch", phrase.as_str()),
            ])
            .query(extra);
        let response: QueryResponse = send_json(request).await?;
        top_page(response).ok_or(SourceError::NoMatch)
    }
}

pub struct WikipediaSummarySource {
    wiki: WikiClient,
}

impl WikipediaSummarySource {
    pub fn new(client: Client, settings: &SourceSettings) -> Self {
        Self {
            wiki: WikiClient::new(client, settings),
        }
    }
}

#[async_trait]
impl TextSource for WikipediaSummarySource {
    fn name(&self) -> &str {
        SUMMARY_SOURCE_NAME
    }

    fn kind(&self) -> SourceKind {
        SourceKind::Encyclopedia
    }

    fn supports(&self, _media_type: MediaType) -> bool {
        true
    }

    async fn fetch(&self, work: &Work) -> Result<SourceFetch, SourceError> {
        let page = self
            .wiki
            .search_page(
                work,
                &[("prop", "extracts"), ("exintro", "1"), ("explaintext", "1")],
            )
            .await?;
        let extract = page.extract.filter(|e| !e.trim().is_empty()).ok_or(SourceError::NoMatch)?;
        Ok(SourceFetch::text(vec![page.title, extract]))
    }
}

pub struct WikipediaCategorySource {
    wiki: WikiClient,
    categories: Vec<String>,
}

impl WikipediaCategorySource {
    pub fn new(client: Client, settings: &SourceSettings, categories: Vec<String>) -> Self {
        Self {
            wiki: WikiClient::new(client, settings),
            categories,
        }
    }
}

#[async_trait]
impl TextSource for WikipediaCategorySource {
    fn name(&self) -> &str {
        CATEGORY_SOURCE_NAME
    }

    fn kind(&self) -> SourceKind {
        SourceKind::CategoryMembership
    }

    fn supports(&self, _media_type: MediaType) -> bool {
        true
    }

    async fn fetch(&self, work: &Work) -> Result<SourceFetch, SourceError> {
        if self.categories.is_empty() {
            return Err(SourceError::NoMatch);
        }
        let clcategories = category_param(&self.categories);
        let page = self
            .wiki
            .search_page(
                work,
                &[
                    ("prop", "categories"),
                    ("cllimit", "max"),
                    ("clcategories", clcategories.as_str()),
                ],
            )
            .await?;

        // clcategories filters server-side: any returned category is a member hit.
        let hits: Vec<String> = page.categories.into_iter().map(|c| c.title).collect();
        Ok(category_fetch(page.title, hits))
    }
}

/// A resolved page with no category hits still reports its title.
fn category_fetch(page_title: String, hits: Vec<String>) -> SourceFetch {
    if hits.is_empty() {
        SourceFetch {
            blocks: vec![page_title],
            membership: Some(false),
        }
    } else {
        SourceFetch {
            blocks: hits,
            membership: Some(true),
        }
    }
}
