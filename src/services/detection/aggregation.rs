// Aggregation Logic
// Combines curated, membership and term signals into one verdict.
//
// Precedence is fixed and short-circuits the detection method:
//   1. curated list match
//   2. category / community membership
//   3. term scan
//   4. nothing fired -> safe
// Confidence is looked up from the winning method, never estimated.
// `matched_terms` is only populated when the term scan decides; otherwise the
// terms that also fired are reported in the rationale.

use crate::models::{CuratedMatch, DetectionMethod, MembershipFlag, Verdict, Work};

const SAFE_RATIONALE: &str = "No sensitive content detected";

fn verdict(
    safe: bool,
    method: DetectionMethod,
    matched_terms: &[String],
    rationale: String,
) -> Verdict {
    Verdict {
        safe,
        confidence: method.confidence(),
        matched_terms: matched_terms.to_vec(),
        detection_method: method,
        rationale,
    }
}

/// Trailing note for signals that fired but did not decide the method.
fn corroboration(flags: &[&MembershipFlag], term_matches: &[String]) -> String {
    let mut notes = Vec::new();
    if !flags.is_empty() {
        let names: Vec<&str> = flags.iter().map(|f| f.name.as_str()).collect();
        notes.push(format!("also flagged by {}", names.join(", ")));
    }
    if !term_matches.is_empty() {
        notes.push(format!("terms found: {}", term_matches.join(", ")));
    }
    if notes.is_empty() {
        String::new()
    } else {
        format!(" ({})", notes.join("; "))
    }
}

/// Decide the verdict for `work`. Unavailable sources simply contribute no flag.
pub fn aggregate(
    work: &Work,
    curated: &CuratedMatch,
    membership_flags: &[MembershipFlag],
    term_matches: &[String],
) -> Verdict {
    let fired: Vec<&MembershipFlag> = membership_flags.iter().filter(|f| f.matched).collect();

    if curated.matched {
        let entry = curated.matched_entry.as_deref().unwrap_or(work.title.as_str());
        let rationale = format!(
            "\"{}\" matches known {} \"{}\" in the curated list{}",
            work.title,
            work.media_type,
            entry,
            corroboration(&fired, term_matches)
        );
        return verdict(false, DetectionMethod::KnownList, &[], rationale);
    }

    if let Some(first) = fired.first() {
        let rationale = format!(
            "\"{}\" is listed by {}{}",
            work.title,
            first.name,
            corroboration(&fired[1..], term_matches)
        );
        return verdict(false, first.method, &[], rationale);
    }

    if !term_matches.is_empty() {
        let rationale = format!("Found sensitive terms: {}", term_matches.join(", "));
        return verdict(false, DetectionMethod::TermScan, term_matches, rationale);
    }

    verdict(true, DetectionMethod::None, &[], SAFE_RATIONALE.to_string())
}
