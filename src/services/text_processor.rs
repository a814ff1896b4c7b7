// Text Processing Service
// Title canonicalization, request sanitization and scraped-page flattening

use regex::Regex;
use std::sync::OnceLock;

use crate::models::CheckError;

/// Longest title accepted after sanitization, in chars.
pub const MAX_TITLE_CHARS: usize = 200;

/// Punctuation removed by the loose title form.
const STRIPPED_PUNCTUATION: [char; 8] = ['.', ',', '!', '?', ';', ':', '\'', '"'];

fn html_tag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<[^>]*>").expect("html tag regex"))
}

fn script_style_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?is)<script\b.*?</script>|<style\b.*?</style>|<!--.*?-->")
            .expect("script/style regex")
    })
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Loose title form: lower-case, strip `. , ! ? ; : ' "`, collapse whitespace, trim.
pub fn normalize_title(raw: &str) -> String {
    let lowered = raw.to_lowercase();
    let stripped: String = lowered
        .chars()
        .filter(|c| !STRIPPED_PUNCTUATION.contains(c))
        .collect();
    collapse_whitespace(&stripped)
}

/// Strict title form: lower-case and trim only.
pub fn normalize_title_strict(raw: &str) -> String {
    raw.to_lowercase().trim().to_string()
}

/// Truncate to at most `max_chars` chars without splitting a code point.
pub fn truncate_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// Strip HTML tags and control characters, collapse whitespace, cap the length.
pub fn sanitize_title(raw: &str) -> String {
    let no_tags = html_tag_re().replace_all(raw, " ");
    let no_ctrl: String = no_tags
        .chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect();
    let collapsed = collapse_whitespace(&no_ctrl);
    truncate_chars(&collapsed, MAX_TITLE_CHARS).trim_end().to_string()
}

/// Sanitize and reject titles that end up empty.
pub fn validate_title(raw: &str) -> Result<String, CheckError> {
    let title = sanitize_title(raw);
    if title.is_empty() {
        return Err(CheckError::InvalidInput(
            "title is empty after sanitization".to_string(),
        ));
    }
    Ok(title)
}

fn decode_entities(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&apos;", "'")
        .replace("&quot;", "\"")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

/// Flatten an HTML page to plain text. Hidden or collapsed elements are kept.
pub fn html_to_text(html: &str) -> String {
    let without_code = script_style_re().replace_all(html, " ");
    let without_tags = html_tag_re().replace_all(&without_code, " ");
    collapse_whitespace(&decode_entities(&without_tags))
}

/// Join non-empty blocks with a blank line.
pub fn join_blocks<S: AsRef<str>>(blocks: &[S]) -> String {
    blocks
        .iter()
        .map(|b| b.as_ref().trim())
        .filter(|b| !b.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}
