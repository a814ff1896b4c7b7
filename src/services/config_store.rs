// Configuration Storage Service
// Handles config file read/write, version backup and API key resolution

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_REVIEW_MAX_CHARS: usize = 50_000;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub detection: DetectionConfig,
    #[serde(default)]
    pub sources: HashMap<String, SourceSettings>,
    #[serde(default)]
    pub api_keys: HashMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpConfig {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    pub proxy: Option<String>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
            proxy: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionConfig {
    /// Raw chars of a review page kept for scanning, hidden spoiler text included.
    #[serde(default = "default_review_max_chars")]
    pub review_max_chars: usize,
    /// Whether review-page text joins the term scan once another signal fired.
    #[serde(default = "default_true")]
    pub scan_enrichment_text: bool,
    #[serde(default = "default_wikipedia_categories")]
    pub wikipedia_categories: Vec<String>,
    /// Community topics that count as an illness membership hit.
    #[serde(default = "default_trigger_topics")]
    pub trigger_topics: Vec<String>,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            review_max_chars: default_review_max_chars(),
            scan_enrichment_text: true,
            wikipedia_categories: default_wikipedia_categories(),
            trigger_topics: default_trigger_topics(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceSettings {
    #[serde(default = "default_true")]
    pub enabled: bool,
    pub base_url: Option<String>,
    /// Filled from env or `apiKeys` by `ConfigStore::resolve`.
    #[serde(skip)]
    pub api_key: Option<String>,
}

impl Default for SourceSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: None,
            api_key: None,
        }
    }
}

impl SourceSettings {
    pub fn base_url_or(&self, default: &str) -> String {
        self.base_url
            .as_deref()
            .map(|u| u.trim().trim_end_matches('/'))
            .filter(|u| !u.is_empty())
            .unwrap_or(default)
            .to_string()
    }
}

impl AppConfig {
    /// Settings for a source, defaulting to enabled with no overrides.
    pub fn source(&self, name: &str) -> SourceSettings {
        self.sources.get(name).cloned().unwrap_or_default()
    }
}

fn default_timeout_secs() -> u64 { 10 }
fn default_user_agent() -> String { format!("safeshelf/{}", env!("CARGO_PKG_VERSION")) }
fn default_review_max_chars() -> usize { DEFAULT_REVIEW_MAX_CHARS }
fn default_true() -> bool { true }
fn default_wikipedia_categories() -> Vec<String> {
    vec![
        "Films about cancer".to_string(),
        "Novels about cancer".to_string(),
        "Films about diseases".to_string(),
        "Novels about diseases and disorders".to_string(),
    ]
}
fn default_trigger_topics() -> Vec<String> {
    vec![
        "cancer".to_string(),
        "terminal illness".to_string(),
        "chronic illness".to_string(),
        "someone is hospitalized".to_string(),
    ]
}

/// Env vars consulted for a source's API key, in priority order.
fn api_key_env_vars(source: &str) -> &'static [&'static str] {
    match source {
        "tmdb" => &["TMDB_API_KEY", "SAFESHELF_TMDB_API_KEY"],
        "google_books" => &["GOOGLE_BOOKS_API_KEY", "SAFESHELF_GOOGLE_BOOKS_API_KEY"],
        "doesthedogdie" => &["DDD_API_KEY", "SAFESHELF_DDD_API_KEY"],
        _ => &[],
    }
}

/// Sources whose adapters accept an API key.
pub const KEYED_SOURCES: [&str; 3] = ["tmdb", "google_books", "doesthedogdie"];

pub struct ConfigStore {
    config_dir: PathBuf,
    config_file: PathBuf,
}

impl ConfigStore {
    pub fn new(config_dir: PathBuf) -> Self {
        let config_file = config_dir.join("config.json");
        Self { config_dir, config_file }
    }

    /// Get default config directory
    pub fn default_config_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("safeshelf"))
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    /// Ensure config directory exists
    pub fn ensure_dir(&self) -> Result<(), String> {
        fs::create_dir_all(&self.config_dir)
            .map_err(|e| format!("Failed to create config dir: {}", e))
    }

    /// Load configuration from file
    pub fn load(&self) -> Result<AppConfig, String> {
        if !self.config_file.exists() {
            return Ok(AppConfig::default());
        }

        let content = fs::read_to_string(&self.config_file)
            .map_err(|e| format!("Failed to read config: {}", e))?;

        serde_json::from_str(&content)
            .map_err(|e| format!("Failed to parse config: {}", e))
    }

    /// Load the file and fill every keyed source's API key (env first, then file).
    pub fn resolve(&self) -> Result<AppConfig, String> {
        let mut config = self.load()?;
        for name in KEYED_SOURCES {
            let key = env_api_key(name).or_else(|| config.api_keys.get(name).cloned());
            if let Some(key) = key.filter(|k| !k.trim().is_empty()) {
                config
                    .sources
                    .entry(name.to_string())
                    .or_default()
                    .api_key = Some(key.trim().to_string());
            }
        }
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self, config: &AppConfig) -> Result<(), String> {
        self.ensure_dir()?;

        if self.config_file.exists() {
            self.create_backup()?;
        }

        let content = serde_json::to_string_pretty(config)
            .map_err(|e| format!("Failed to serialize config: {}", e))?;

        fs::write(&self.config_file, content)
            .map_err(|e| format!("Failed to write config: {}", e))
    }

    fn create_backup(&self) -> Result<(), String> {
        let backup_dir = self.config_dir.join("backups");
        fs::create_dir_all(&backup_dir)
            .map_err(|e| format!("Failed to create backup dir: {}", e))?;

        let timestamp = chrono::Utc::now().format("%Y%m%d_%H%M%S%3f");
        let backup_file = backup_dir.join(format!("config_{}.json", timestamp));

        fs::copy(&self.config_file, &backup_file)
            .map_err(|e| format!("Failed to create backup: {}", e))?;

        // Keep only last 10 backups
        self.cleanup_old_backups(&backup_dir, 10)
    }

    fn cleanup_old_backups(&self, backup_dir: &Path, keep: usize) -> Result<(), String> {
        let mut entries: Vec<_> = fs::read_dir(backup_dir)
            .map_err(|e| format!("Failed to read backup dir: {}", e))?
            .filter_map(|e| e.ok())
            .filter(|e| e.path().extension().map_or(false, |ext| ext == "json"))
            .collect();

        if entries.len() <= keep {
            return Ok(());
        }

        // Oldest first
        entries.sort_by_key(|e| {
            e.metadata()
                .and_then(|m| m.modified())
                .unwrap_or(std::time::SystemTime::UNIX_EPOCH)
        });

        for entry in entries.iter().take(entries.len() - keep) {
            let _ = fs::remove_file(entry.path());
        }

        Ok(())
    }

    /// Store a source API key in the config file
    pub fn set_api_key(&self, source: &str, key: &str) -> Result<(), String> {
        if !KEYED_SOURCES.contains(&source) {
            return Err(format!(
                "Unknown source '{}', expected one of: {}",
                source,
                KEYED_SOURCES.join(", ")
            ));
        }
        let mut config = self.load()?;
        config.api_keys.insert(source.to_string(), key.trim().to_string());
        self.save(&config)
    }

    /// Delete a source API key from the config file
    pub fn delete_api_key(&self, source: &str) -> Result<(), String> {
        if !KEYED_SOURCES.contains(&source) {
            return Err(format!("Unknown source '{}'", source));
        }
        let mut config = self.load()?;
        config.api_keys.remove(source);
        self.save(&config)
    }
}

fn env_api_key(source: &str) -> Option<String> {
    api_key_env_vars(source).iter().find_map(|var| {
        env::var(var)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store() -> ConfigStore {
        let dir = env::temp_dir().join(format!("safeshelf-test-{}", uuid::Uuid::new_v4()));
        ConfigStore::new(dir)
    }

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.detection.review_max_chars, 50_000);
        assert!(config.detection.scan_enrichment_text);
        assert_eq!(config.http.timeout_secs, 10);
        assert!(config.source("open_library").enabled);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let parsed: AppConfig =
            serde_json::from_str(r#"{"sources": {"storygraph": {"enabled": false}}}"#).unwrap();
        assert!(!parsed.source("storygraph").enabled);
        assert_eq!(parsed.detection.review_max_chars, DEFAULT_REVIEW_MAX_CHARS);
        assert!(!parsed.detection.wikipedia_categories.is_empty());
    }

    #[test]
    fn test_base_url_override_trims_slash() {
        let settings = SourceSettings {
            base_url: Some("http://localhost:9000/".to_string()),
            ..Default::default()
        };
        assert_eq!(settings.base_url_or("https://x"), "http://localhost:9000");
        assert_eq!(SourceSettings::default().base_url_or("https://x"), "https://x");
    }

    #[test]
    fn test_missing_file_loads_default() {
        let store = temp_store();
        let config = store.load().unwrap();
        assert!(config.api_keys.is_empty());
    }

    #[test]
    fn test_set_api_key_roundtrip_and_backup() {
        let store = temp_store();
        store.set_api_key("doesthedogdie", " abc ").unwrap();
        store.set_api_key("doesthedogdie", "def").unwrap();

        let config = store.load().unwrap();
        assert_eq!(config.api_keys.get("doesthedogdie").map(String::as_str), Some("def"));
        assert!(store.config_dir().join("backups").exists());

        store.delete_api_key("doesthedogdie").unwrap();
        assert!(store.load().unwrap().api_keys.is_empty());
        let _ = fs::remove_dir_all(store.config_dir());
    }

    #[test]
    fn test_set_api_key_rejects_unknown_source() {
        let store = temp_store();
        assert!(store.set_api_key("imdb", "k").is_err());
        assert!(store.delete_api_key("imdb").is_err());
    }
}
