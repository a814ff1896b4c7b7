// DoesTheDogDie community trigger database.
// Topics the community voted "yes" on become text; an illness topic with a
// yes majority is a membership hit.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use super::{send_json, SourceError, SourceFetch, SourceKind, TextSource};
use crate::models::{MediaType, Work};
use crate::services::config_store::SourceSettings;

pub const SOURCE_NAME: &str = "doesthedogdie";
const DDD_DEFAULT_URL: &str = "https://www.doesthedogdie.com";

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<MediaItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MediaItem {
    id: u64,
    item_type: Option<ItemType>,
}

#[derive(Debug, Deserialize)]
struct ItemType {
    name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MediaResponse {
    #[serde(default)]
    topic_item_stats: Vec<TopicStat>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TopicStat {
    topic: Topic,
    #[serde(default)]
    yes_sum: i64,
    #[serde(default)]
    no_sum: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Topic {
    name: String,
    does_name: Option<String>,
}

fn item_type_name(media_type: MediaType) -> &'static str {
    match media_type {
        MediaType::Book => "book",
        MediaType::Movie => "movie",
    }
}

/// First search item of the requested media type, else the first item.
fn pick_item(items: Vec<MediaItem>, media_type: MediaType) -> Option<MediaItem> {
    let wanted = item_type_name(media_type);
    let pos = items.iter().position(|i| {
        i.item_type
            .as_ref()
            .map(|t| t.name.eq_ignore_ascii_case(wanted))
            .unwrap_or(false)
    });
    let mut items = items;
    match pos {
        Some(p) => Some(items.swap_remove(p)),
        None => items.into_iter().next(),
    }
}

/// Confirmed topic texts and whether any of them is an illness topic.
fn evaluate_topics(stats: Vec<TopicStat>, trigger_topics: &[String]) -> (Vec<String>, bool) {
    let mut blocks = Vec::new();
    let mut hit = false;
    for stat in stats {
        if stat.yes_sum <= stat.no_sum {
            continue;
        }
        let name = stat.topic.name.to_lowercase();
        if trigger_topics.iter().any(|t| name.contains(&t.to_lowercase())) {
            hit = true;
        }
        blocks.push(stat.topic.does_name.unwrap_or(stat.topic.name));
    }
    (blocks, hit)
}

pub struct DoesTheDogDieSource {
    client: Client,
    base_url: String,
    api_key: String,
    trigger_topics: Vec<String>,
}

impl DoesTheDogDieSource {
    pub fn new(
        client: Client,
        settings: &SourceSettings,
        trigger_topics: Vec<String>,
    ) -> Result<Self, SourceError> {
        let api_key = settings
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or(SourceError::MissingApiKey)?;
        Ok(Self {
            client,
            base_url: settings.base_url_or(DDD_DEFAULT_URL),
            api_key,
            trigger_topics,
        })
    }

    fn get(&self, url: String) -> reqwest::RequestBuilder {
        self.client
            .get(url)
            .header("Accept", "application/json")
            .header("X-API-KEY", &self.api_key)
    }
}

#[async_trait]
impl TextSource for DoesTheDogDieSource {
    fn name(&self) -> &str {
        SOURCE_NAME
    }

    fn kind(&self) -> SourceKind {
        SourceKind::TriggerDatabase
    }

    fn supports(&self, _media_type: MediaType) -> bool {
        true
    }

    async fn fetch(&self, work: &Work) -> Result<SourceFetch, SourceError> {
        let search: SearchResponse = send_json(
            self.get(format!("{}/dddsearch", self.base_url))
                .query(&[("q", work.title.as_str())]),
        )
        .await?;
        let item = pick_item(search.items, work.media_type).ok_or(SourceError::NoMatch)?;

        let media: MediaResponse =
            send_json(self.get(format!("{}/media/{}", self.base_url, item.id))).await?;
        let (blocks, hit) = evaluate_topics(media.topic_item_stats, &self.trigger_topics);

        Ok(SourceFetch {
            blocks,
            membership: Some(hit),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn topics() -> Vec<String> {
        vec!["cancer".to_string(), "terminal illness".to_string()]
    }

    #[test]
    fn test_pick_item_prefers_media_type() {
        let search: SearchResponse = serde_json::from_str(
            r#"{"items":[
                {"id":1,"name":"Wit","itemType":{"name":"Movie"}},
                {"id":2,"name":"Wit","itemType":{"name":"Book"}}
            ]}"#,
        )
        .unwrap();
        assert_eq!(pick_item(search.items, MediaType::Book).unwrap().id, 2);
    }

    #[test]
    fn test_pick_item_falls_back_to_first() {
        let body = r#"{"items":[{"id":7,"name":"Wit","itemType":{"name":"TV Show"}}]}"#;
        let search: SearchResponse = serde_json::from_str(body).unwrap();
        assert_eq!(pick_item(search.items, MediaType::Movie).unwrap().id, 7);
        assert!(pick_item(vec![], MediaType::Movie).is_none());
    }

    #[test]
    fn test_evaluate_topics_requires_yes_majority() {
        let media: MediaResponse = serde_json::from_str(
            r#"{"topicItemStats":[
                {"topic":{"name":"Someone has cancer","doesName":"Does someone have cancer"},
                 "yesSum":40,"noSum":3},
                {"topic":{"name":"A dog dies"},"yesSum":1,"noSum":20}
            ]}"#,
        )
        .unwrap();
        let (blocks, hit) = evaluate_topics(media.topic_item_stats, &topics());
        assert!(hit);
        assert_eq!(blocks, vec!["Does someone have cancer"]);
    }

    #[test]
    fn test_evaluate_topics_disputed_illness_is_no_hit() {
        let media: MediaResponse = serde_json::from_str(
            r#"{"topicItemStats":[
                {"topic":{"name":"Someone has cancer"},"yesSum":5,"noSum":5},
                {"topic":{"name":"There are jump scares"},"yesSum":9,"noSum":0}
            ]}"#,
        )
        .unwrap();
        let (blocks, hit) = evaluate_topics(media.topic_item_stats, &topics());
        assert!(!hit);
        assert_eq!(blocks, vec!["There are jump scares"]);
    }
}
