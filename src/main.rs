use safeshelf_lib::models::{CheckError, CheckRequest};
use safeshelf_lib::services::{Classifier, ConfigStore};
use std::path::PathBuf;

const USAGE: &str = "Usage:
  safeshelf <title> [--media book|movie] [--config <dir>] [--sources]
  safeshelf set-key <tmdb|google_books|doesthedogdie> <key> [--config <dir>]
  safeshelf delete-key <tmdb|google_books|doesthedogdie> [--config <dir>]

Notes:
  - API keys are read from env first (TMDB_API_KEY, GOOGLE_BOOKS_API_KEY, DDD_API_KEY),
    then the config file.
  - `--sources` also prints what each source returned.";

fn parse_arg_value(args: &[String], key: &str) -> Option<String> {
    args.iter()
        .position(|a| a == key)
        .and_then(|i| args.get(i + 1))
        .cloned()
}

fn has_flag(args: &[String], key: &str) -> bool {
    args.iter().any(|a| a == key)
}

/// Positional args, skipping flags and their values.
fn positionals(args: &[String]) -> Vec<String> {
    let mut out = Vec::new();
    let mut iter = args.iter().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--media" | "--config" => {
                iter.next();
            }
            a if a.starts_with("--") => {}
            _ => out.push(arg.clone()),
        }
    }
    out
}

fn open_store(args: &[String]) -> anyhow::Result<ConfigStore> {
    let dir = match parse_arg_value(args, "--config") {
        Some(dir) => PathBuf::from(dir),
        None => ConfigStore::default_config_dir()
            .ok_or_else(|| anyhow::anyhow!("no config directory available on this platform"))?,
    };
    Ok(ConfigStore::new(dir))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().collect();
    let positional = positionals(&args);
    if positional.is_empty() || has_flag(&args, "--help") {
        eprintln!("{}", USAGE);
        return Ok(());
    }

    safeshelf_lib::init_logging();
    let store = open_store(&args)?;

    if positional[0] == "set-key" {
        let (source, key) = match (positional.get(1), positional.get(2)) {
            (Some(s), Some(k)) => (s, k),
            _ => anyhow::bail!("set-key needs <source> <key>\n\n{}", USAGE),
        };
        store.set_api_key(source, key).map_err(anyhow::Error::msg)?;
        eprintln!("Stored API key for {} in {}", source, store.config_dir().display());
        return Ok(());
    }

    if positional[0] == "delete-key" {
        let source = positional
            .get(1)
            .ok_or_else(|| anyhow::anyhow!("delete-key needs <source>\n\n{}", USAGE))?;
        store.delete_api_key(source).map_err(anyhow::Error::msg)?;
        eprintln!("Removed API key for {} from {}", source, store.config_dir().display());
        return Ok(());
    }

    let config = store.resolve().map_err(anyhow::Error::msg)?;
    let classifier = Classifier::new(&config).map_err(anyhow::Error::msg)?;

    let request = CheckRequest {
        title: positional.join(" "),
        media_type: parse_arg_value(&args, "--media").unwrap_or_else(|| "book".to_string()),
    };

    let classification = match classifier.classify(&request).await {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(2);
        }
    };

    if has_flag(&args, "--sources") {
        println!("{}", serde_json::to_string_pretty(&classification.sources)?);
    }

    match classification.into_response() {
        Ok(response) => println!("{}", serde_json::to_string_pretty(&response)?),
        Err(e @ CheckError::NotFound(_)) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
        Err(e) => return Err(e.into()),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_positionals_skip_flag_values() {
        let a = args(&["safeshelf", "The", "Notebook", "--media", "movie", "--sources"]);
        assert_eq!(positionals(&a), vec!["The", "Notebook"]);
        assert_eq!(parse_arg_value(&a, "--media").as_deref(), Some("movie"));
        assert!(has_flag(&a, "--sources"));
    }
}
