// src/ingest/providers/mod.rs
pub mod fixture;
pub mod http_feed;

use metrics::counter;
use once_cell::sync::OnceCell;
use regex::Regex;

use crate::error::FetchError;
use crate::ingest::types::{Post, WireStatus};

/// Pull the JSON document out of a response body.
///
/// A browser asked for a raw JSON URL renders it inside `<pre>` (or bare in
/// `<body>`), HTML-escaped. Plain JSON bodies are returned as-is.
pub fn extract_json_payload(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.starts_with('[') || trimmed.starts_with('{') {
        return trimmed.to_string();
    }

    static RE_PRE: OnceCell<Regex> = OnceCell::new();
    static RE_BODY: OnceCell<Regex> = OnceCell::new();
    static RE_TAGS: OnceCell<Regex> = OnceCell::new();
    let re_pre = RE_PRE.get_or_init(|| Regex::new(r"(?is)<pre[^>]*>(.*)</pre>").unwrap());
    let re_body = RE_BODY.get_or_init(|| Regex::new(r"(?is)<body[^>]*>(.*)</body>").unwrap());
    let re_tags = RE_TAGS.get_or_init(|| Regex::new(r"(?s)<[/!]?[A-Za-z][^>]*>").unwrap());

    let inner = if let Some(c) = re_pre.captures(trimmed) {
        c[1].to_string()
    } else if let Some(c) = re_body.captures(trimmed) {
        re_tags.replace_all(&c[1], "").to_string()
    } else {
        return trimmed.to_string();
    };
    html_escape::decode_html_entities(inner.trim()).to_string()
}

/// Parse a feed body into posts, most recent first.
///
/// The body must be a JSON array. Individual entries that lack an id or a
/// timestamp are skipped with a warning rather than failing the whole page.
pub fn parse_feed_body(body: &str) -> Result<Vec<Post>, FetchError> {
    let payload = extract_json_payload(body);
    let items: Vec<serde_json::Value> = serde_json::from_str(&payload)?;

    let mut out = Vec::with_capacity(items.len());
    for (idx, item) in items.into_iter().enumerate() {
        match serde_json::from_value::<WireStatus>(item) {
            Ok(w) => out.push(w.into_post()),
            Err(e) => {
                tracing::warn!(stage = "fetch", index = idx, error = %e, "skipping malformed post");
                counter!("monitor_malformed_posts_total").increment(1);
            }
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ONE: &str = r#"[{"id":"114","created_at":"2025-04-10T14:02:11.000Z","content":"<p>Hi &amp; bye</p>"}]"#;

    #[test]
    fn plain_json_is_parsed() {
        let posts = parse_feed_body(ONE).unwrap();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].id.as_str(), "114");
        assert_eq!(posts[0].raw_content, "<p>Hi &amp; bye</p>");
    }

    #[test]
    fn browser_wrapped_json_is_unwrapped() {
        let escaped = html_escape::encode_text(ONE);
        let page = format!(
            "<html><head></head><body><pre style=\"word-wrap: break-word;\">{escaped}</pre></body></html>"
        );
        let posts = parse_feed_body(&page).unwrap();
        assert_eq!(posts[0].raw_content, "<p>Hi &amp; bye</p>");
    }

    #[test]
    fn non_array_body_is_a_decode_error() {
        let err = parse_feed_body(r#"{"error":"rate limited"}"#).unwrap_err();
        assert!(matches!(err, FetchError::Decode(_)));
    }

    #[test]
    fn malformed_entries_are_skipped() {
        let body = r#"[{"id":"2","created_at":"2025-04-10T14:02:11Z","content":"ok"},{"content":"no id"}]"#;
        let posts = parse_feed_body(body).unwrap();
        assert_eq!(posts.len(), 1);
    }
}
