//! Extraction of a JSON payload from free-form model output.
//!
//! Models often wrap JSON in markdown fences or surround it with prose. The
//! extractor picks one candidate payload with a fixed priority:
//!
//! 1. the body of the first fence tagged `json` (tag matched case-insensitively)
//! 2. otherwise the body of the first fenced block of any kind
//! 3. otherwise the whole text, trimmed
//!
//! Fence bodies are trimmed. A fence opened inside a JSON string value ends
//! the payload early; callers see that as a parse failure on that attempt.

/// Markdown code fence delimiter.
const FENCE: &str = "```";

/// Language tag that marks a fence as JSON.
const JSON_TAG: &str = "json";

/// Returns the candidate JSON payload inside `text`.
///
/// # Examples
///
/// ```
/// use cs_llm::extract_payload;
///
/// let reply = "Here you go:\n```json\n{\"ok\": true}\n```\nAnything else?";
/// assert_eq!(extract_payload(reply), "{\"ok\": true}");
///
/// assert_eq!(extract_payload("```\n[1, 2]\n```"), "[1, 2]");
/// assert_eq!(extract_payload("  {\"bare\": 1}\n"), "{\"bare\": 1}");
/// ```
#[must_use]
pub fn extract_payload(text: &str) -> &str {
    tagged_fence_body(text)
        .or_else(|| generic_fence_body(text))
        .unwrap_or_else(|| text.trim())
}

/// Body of the first fence opened with the `json` tag.
fn tagged_fence_body(text: &str) -> Option<&str> {
    // ASCII lowercasing keeps byte offsets aligned with `text`.
    let lowered = text.to_ascii_lowercase();
    let opener = format!("{FENCE}{JSON_TAG}");
    let open = lowered.find(&opener)?;
    body_until_fence(text, open + opener.len())
}

/// Body of the first fenced block, whatever its tag.
///
/// The tag, if any, stays part of the body.
fn generic_fence_body(text: &str) -> Option<&str> {
    let open = text.find(FENCE)?;
    body_until_fence(text, open + FENCE.len())
}

/// Trimmed text from `start` up to the next fence, if one closes it.
fn body_until_fence(text: &str, start: usize) -> Option<&str> {
    let rest = text.get(start..)?;
    let close = rest.find(FENCE)?;
    Some(rest[..close].trim())
}
