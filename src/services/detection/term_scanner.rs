// Term Scanner
// Plain substring scan of combined source text against the trigger vocabulary.
// No stemming and no word boundaries: "terminal" also hits "terminally", so the
// vocabulary avoids short risky words and keeps them inside longer phrases.

use serde::Deserialize;
use std::collections::HashSet;
use std::sync::OnceLock;

#[derive(Debug, Deserialize)]
struct VocabularyFile {
    #[allow(dead_code)]
    version: String,
    terms: Vec<String>,
}

/// Ordered, lower-cased, de-duplicated trigger terms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TermVocabulary {
    terms: Vec<String>,
}

impl TermVocabulary {
    pub fn new<I, S>(terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen = HashSet::new();
        let terms = terms
            .into_iter()
            .map(|t| t.as_ref().trim().to_lowercase())
            .filter(|t| !t.is_empty())
            .filter(|t| seen.insert(t.clone()))
            .collect();
        Self { terms }
    }

    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

static VOCABULARY: OnceLock<TermVocabulary> = OnceLock::new();

/// Process-wide vocabulary, parsed once from the embedded list.
pub fn default_vocabulary() -> &'static TermVocabulary {
    VOCABULARY.get_or_init(|| {
        let raw = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/data/trigger_terms.json"));
        let parsed: VocabularyFile =
            serde_json::from_str(raw).expect("trigger_terms.json parse failed");
        TermVocabulary::new(parsed.terms)
    })
}

/// Vocabulary terms found in `text`, in vocabulary order, each at most once.
pub fn scan_terms(text: &str, vocabulary: &TermVocabulary) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }
    let haystack = text.to_lowercase();
    vocabulary
        .terms
        .iter()
        .filter(|term| haystack.contains(term.as_str()))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vocab() -> TermVocabulary {
        TermVocabulary::new(["cancer", "cancer treatment", "terminal", "hospice"])
    }

    #[test]
    fn test_scan_returns_each_term_once() {
        let v = vocab();
        let text = "A story about cancer treatment. Cancer, cancer, CANCER.";
        for _ in 0..3 {
            assert_eq!(scan_terms(text, &v), vec!["cancer", "cancer treatment"]);
        }
    }

    #[test]
    fn test_scan_preserves_vocabulary_order() {
        let v = vocab();
        let found = scan_terms("Hospice nurses meet a terminal patient with cancer", &v);
        assert_eq!(found, vec!["cancer", "terminal", "hospice"]);
    }

    #[test]
    fn test_no_word_boundaries() {
        let v = vocab();
        assert_eq!(scan_terms("she was terminally ill", &v), vec!["terminal"]);
    }

    #[test]
    fn test_no_overlap_is_empty() {
        let v = vocab();
        assert!(scan_terms("a desert planet saga with political intrigue", &v).is_empty());
        assert!(scan_terms("", &v).is_empty());
    }

    #[test]
    fn test_vocabulary_normalizes_and_dedups() {
        let v = TermVocabulary::new(["  Cancer ", "cancer", "", "Remission"]);
        assert_eq!(v.terms(), &["cancer".to_string(), "remission".to_string()]);
    }

    #[test]
    fn test_default_vocabulary_loads() {
        let v = default_vocabulary();
        assert!(v.len() > 20);
        assert!(v.terms().iter().all(|t| t == &t.to_lowercase()));
        assert!(scan_terms("a desert planet saga with political intrigue", v).is_empty());
        assert!(scan_terms("she starts chemotherapy", v).contains(&"chemotherapy".to_string()));
    }
}
