// SafeShelf Data Models
// Request/response shapes and the per-classification records

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

// ============ Errors ============

/// Request-level failures. Source failures never surface here.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CheckError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("No results found for \"{0}\"")]
    NotFound(String),
}

// ============ Work ============

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Book,
    Movie,
}

impl MediaType {
    pub fn parse(val: &str) -> Result<Self, CheckError> {
        match val.trim().to_lowercase().as_str() {
            "book" => Ok(Self::Book),
            "movie" => Ok(Self::Movie),
            other => Err(CheckError::InvalidInput(format!(
                "unsupported media type '{}', expected 'book' or 'movie'",
                other
            ))),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MediaType::Book => "book",
            MediaType::Movie => "movie",
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The subject of one classification run. The title is already sanitized and validated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Work {
    pub title: String,
    pub media_type: MediaType,
}

impl Work {
    pub fn new(title: impl Into<String>, media_type: MediaType) -> Self {
        Self {
            title: title.into(),
            media_type,
        }
    }
}

// ============ Check Request ============

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckRequest {
    pub title: String,
    #[serde(default = "default_media_type")]
    pub media_type: String,
}

impl CheckRequest {
    pub fn new(title: impl Into<String>, media_type: MediaType) -> Self {
        Self {
            title: title.into(),
            media_type: media_type.as_str().to_string(),
        }
    }
}

fn default_media_type() -> String {
    "book".to_string()
}

// ============ Signals ============

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CuratedMatch {
    pub matched: bool,
    pub matched_entry: Option<String>,
}

impl CuratedMatch {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn hit(entry: impl Into<String>) -> Self {
        Self {
            matched: true,
            matched_entry: Some(entry.into()),
        }
    }
}

/// Boolean signal from a categorical source ("listed in category X").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MembershipFlag {
    pub name: String,
    pub method: DetectionMethod,
    pub matched: bool,
}

/// Per-source outcome of one fetch. `found == false` always carries empty text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceResult {
    pub source_name: String,
    pub text: String,
    pub found: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub membership: Option<MembershipFlag>,
}

impl SourceResult {
    pub fn not_found(source_name: impl Into<String>) -> Self {
        Self {
            source_name: source_name.into(),
            text: String::new(),
            found: false,
            membership: None,
        }
    }
}

// ============ Verdict ============

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum DetectionMethod {
    KnownList,
    CategoryList,
    TriggerDatabase,
    TermScan,
    None,
}

impl DetectionMethod {
    /// Fixed confidence per method; these values are part of the response contract.
    pub fn confidence(self) -> f64 {
        match self {
            DetectionMethod::KnownList
            | DetectionMethod::CategoryList
            | DetectionMethod::TriggerDatabase => 0.95,
            DetectionMethod::TermScan => 0.8,
            DetectionMethod::None => 0.9,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DetectionMethod::KnownList => "KnownList",
            DetectionMethod::CategoryList => "CategoryList",
            DetectionMethod::TriggerDatabase => "TriggerDatabase",
            DetectionMethod::TermScan => "TermScan",
            DetectionMethod::None => "None",
        }
    }
}

impl fmt::Display for DetectionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Verdict {
    pub safe: bool,
    pub confidence: f64,
    pub matched_terms: Vec<String>,
    pub detection_method: DetectionMethod,
    pub rationale: String,
}

/// Wire shape returned to the request-handling layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerdictResponse {
    pub safe: bool,
    pub confidence: f64,
    pub matched_terms: Vec<String>,
    pub detection_method: String,
    pub reason: String,
}

impl From<Verdict> for VerdictResponse {
    fn from(v: Verdict) -> Self {
        Self {
            safe: v.safe,
            confidence: v.confidence,
            matched_terms: v.matched_terms,
            detection_method: v.detection_method.as_str().to_string(),
            reason: v.rationale,
        }
    }
}

// ============ Classification ============

/// Full outcome of one run, including the per-source trail.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Classification {
    pub work: Work,
    pub verdict: Verdict,
    pub sources: Vec<SourceResult>,
    /// True when at least one mandatory metadata source found the title.
    pub metadata_found: bool,
}

impl Classification {
    /// Maps to the wire response. A title no metadata source knows, with no
    /// other signal, is reported as not found rather than as safe.
    pub fn into_response(self) -> Result<VerdictResponse, CheckError> {
        if !self.metadata_found && self.verdict.safe {
            return Err(CheckError::NotFound(self.work.title));
        }
        Ok(self.verdict.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_media_type_parse() {
        assert_eq!(MediaType::parse("Book").unwrap(), MediaType::Book);
        assert_eq!(MediaType::parse(" movie ").unwrap(), MediaType::Movie);
        assert!(matches!(MediaType::parse("tv"), Err(CheckError::InvalidInput(_))));
    }

    #[test]
    fn test_confidence_lookup() {
        assert_eq!(DetectionMethod::KnownList.confidence(), 0.95);
        assert_eq!(DetectionMethod::TriggerDatabase.confidence(), 0.95);
        assert_eq!(DetectionMethod::TermScan.confidence(), 0.8);
        assert_eq!(DetectionMethod::None.confidence(), 0.9);
    }

    #[test]
    fn test_verdict_response_shape() {
        let verdict = Verdict {
            safe: false,
            confidence: 0.8,
            matched_terms: vec!["chemotherapy".to_string()],
            detection_method: DetectionMethod::TermScan,
            rationale: "Found sensitive terms: chemotherapy".to_string(),
        };
        let json = serde_json::to_value(VerdictResponse::from(verdict)).unwrap();
        assert_eq!(json["safe"], false);
        assert_eq!(json["matchedTerms"][0], "chemotherapy");
        assert_eq!(json["detectionMethod"], "TermScan");
        assert!(json["reason"].as_str().unwrap().contains("chemotherapy"));
    }

    #[test]
    fn test_not_found_only_when_nothing_fired() {
        let safe = Verdict {
            safe: true,
            confidence: 0.9,
            matched_terms: vec![],
            detection_method: DetectionMethod::None,
            rationale: String::new(),
        };
        let c = Classification {
            work: Work::new("Nope", MediaType::Book),
            verdict: safe.clone(),
            sources: vec![],
            metadata_found: false,
        };
        assert_eq!(c.into_response(), Err(CheckError::NotFound("Nope".to_string())));

        let flagged = Verdict {
            safe: false,
            detection_method: DetectionMethod::KnownList,
            confidence: 0.95,
            ..safe
        };
        let c = Classification {
            work: Work::new("Nope", MediaType::Book),
            verdict: flagged,
            sources: vec![],
            metadata_found: false,
        };
        assert!(c.into_response().is_ok());
    }
}
