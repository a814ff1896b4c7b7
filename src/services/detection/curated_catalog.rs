// Curated Catalog
// Known-sensitive titles per media type, and the containment matcher run against them.
//
// Matching is deliberately loose: an entry matches when either normalized form of
// the input contains the entry or is contained in it. Short or partial titles
// ("Ove") therefore match longer entries ("A Man Called Ove"). That bias toward
// false positives is a product decision; keep it.

use serde::Deserialize;
use std::sync::OnceLock;

use crate::models::{CuratedMatch, MediaType};
use crate::services::text_processor::{normalize_title, normalize_title_strict};

#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[allow(dead_code)]
    version: String,
    books: Vec<String>,
    movies: Vec<String>,
}

/// A curated title with both comparison forms precomputed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CuratedEntry {
    pub title: String,
    strict: String,
    loose: String,
}

impl CuratedEntry {
    pub fn new(title: impl Into<String>) -> Self {
        let title = title.into();
        Self {
            strict: normalize_title_strict(&title),
            loose: normalize_title(&title),
            title,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CuratedCatalog {
    books: Vec<CuratedEntry>,
    movies: Vec<CuratedEntry>,
}

impl CuratedCatalog {
    pub fn new<S: AsRef<str>>(books: &[S], movies: &[S]) -> Self {
        Self {
            books: build_entries(books),
            movies: build_entries(movies),
        }
    }

    pub fn list(&self, media_type: MediaType) -> &[CuratedEntry] {
        match media_type {
            MediaType::Book => &self.books,
            MediaType::Movie => &self.movies,
        }
    }

    pub fn match_title(&self, title: &str, media_type: MediaType) -> CuratedMatch {
        match_curated_entries(title, self.list(media_type))
    }
}

fn build_entries<S: AsRef<str>>(titles: &[S]) -> Vec<CuratedEntry> {
    titles
        .iter()
        .map(|t| t.as_ref().trim())
        .filter(|t| !t.is_empty())
        .map(CuratedEntry::new)
        .collect()
}

static CATALOG: OnceLock<CuratedCatalog> = OnceLock::new();

/// Process-wide catalog, parsed once from the embedded list.
pub fn curated_catalog() -> &'static CuratedCatalog {
    CATALOG.get_or_init(|| {
        let raw = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/data/curated_titles.json"));
        let parsed: CatalogFile =
            serde_json::from_str(raw).expect("curated_titles.json parse failed");
        CuratedCatalog::new(&parsed.books, &parsed.movies)
    })
}

fn contains_either_way(input: &str, entry: &str) -> bool {
    if input.is_empty() || entry.is_empty() {
        return false;
    }
    input.contains(entry) || entry.contains(input)
}

/// First entry, in list order, that matches the title under any of the four checks.
pub fn match_curated_entries(title: &str, entries: &[CuratedEntry]) -> CuratedMatch {
    let strict = normalize_title_strict(title);
    let loose = normalize_title(title);

    entries
        .iter()
        .find(|e| contains_either_way(&strict, &e.strict) || contains_either_way(&loose, &e.loose))
        .map(|e| CuratedMatch::hit(e.title.clone()))
        .unwrap_or_else(CuratedMatch::none)
}

/// Match against an ad hoc list of titles.
pub fn match_curated<S: AsRef<str>>(title: &str, list: &[S]) -> CuratedMatch {
    match_curated_entries(title, &build_entries(list))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_order_breaks_ties() {
        let m = match_curated("A Man Called Ove", &["ove", "a man called ove"]);
        assert_eq!(m, CuratedMatch::hit("ove"));

        let m = match_curated("A Man Called Ove", &["a man called ove", "ove"]);
        assert_eq!(m.matched_entry.as_deref(), Some("a man called ove"));
    }

    #[test]
    fn test_partial_title_over_matches() {
        let m = match_curated("Ove", &["A Man Called Ove"]);
        assert!(m.matched);
        assert_eq!(m.matched_entry.as_deref(), Some("A Man Called Ove"));
    }

    #[test]
    fn test_loose_form_ignores_punctuation() {
        // strict forms differ on the apostrophe; loose forms agree
        let m = match_curated("my sisters keeper", &["My Sister's Keeper"]);
        assert!(m.matched);
        let m = match_curated("THE FAULT IN OUR STARS!!", &["the fault in our stars"]);
        assert!(m.matched);
    }

    #[test]
    fn test_no_match_and_empty_entries() {
        assert_eq!(match_curated("Dune", &["The Fault in Our Stars"]), CuratedMatch::none());
        assert!(!match_curated("Dune", &["", "   ", "!!"]).matched);
        assert!(!match_curated("", &["Wit"]).matched);
    }

    #[test]
    fn test_embedded_catalog_loads() {
        let catalog = curated_catalog();
        assert!(!catalog.list(MediaType::Book).is_empty());
        assert!(!catalog.list(MediaType::Movie).is_empty());
        let m = catalog.match_title("The Fault in Our Stars", MediaType::Book);
        assert!(m.matched);
        assert!(!catalog.match_title("Dune", MediaType::Book).matched);
    }

    #[test]
    fn test_embedded_catalog_skips_other_themes() {
        let catalog = curated_catalog();
        for title in ["Bridge to Terabithia", "The Lovely Bones", "Where the Red Fern Grows"] {
            assert!(!catalog.match_title(title, MediaType::Book).matched, "{}", title);
        }
        assert!(!catalog.match_title("Marley & Me", MediaType::Movie).matched);
    }
}
