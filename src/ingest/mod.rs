// src/ingest/mod.rs
pub mod providers;
pub mod types;

use crate::error::FetchError;
use crate::ingest::types::{FeedSource, Post};
use metrics::{counter, histogram};
use once_cell::sync::OnceCell;
use regex::Regex;

/// Maximum number of characters kept from a post body.
pub const MAX_TEXT_CHARS: usize = 4000;

/// Strip markup from a post body into plain text.
///
/// Block-level tags become spaces so adjacent paragraphs don't glue together,
/// every other tag is dropped, entities are decoded and whitespace (NBSP
/// included) is folded. Running it on its own output changes nothing.
pub fn normalize_text(s: &str) -> String {
    if s.is_empty() {
        return String::new();
    }

    // 1) Block tags -> space
    static RE_BLOCK: OnceCell<Regex> = OnceCell::new();
    let re_block = RE_BLOCK.get_or_init(|| {
        Regex::new(r"(?i)</?(?:br|p|div|li|ul|ol|h[1-6]|blockquote)\b[^>]*>").unwrap()
    });
    let out = re_block.replace_all(s, " ");

    // 2) Strip remaining tags (must start like a tag, so "a < b" survives)
    static RE_TAGS: OnceCell<Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| Regex::new(r"(?s)<[/!]?[A-Za-z][^>]*>").unwrap());
    let out = re_tags.replace_all(&out, "");

    // 3) HTML entity decode
    let out = html_escape::decode_html_entities(&out);

    // 4) Collapse whitespace
    static RE_WS: OnceCell<Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| Regex::new(r"\s+").unwrap());
    let mut out = re_ws.replace_all(&out, " ").trim().to_string();

    // 5) Length cap
    if out.chars().count() > MAX_TEXT_CHARS {
        out = out.chars().take(MAX_TEXT_CHARS).collect();
        out.truncate(out.trim_end().len());
    }

    out
}

/// First `max_chars` characters of `text`, with an ellipsis when cut.
pub fn excerpt(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(max_chars.saturating_sub(1)).collect();
    cut.truncate(cut.trim_end().len());
    cut.push('…');
    cut
}

/// Fetch one page from `source`, recording timing and failures.
pub async fn fetch_posts(source: &dyn FeedSource) -> Result<Vec<Post>, FetchError> {
    let t0 = std::time::Instant::now();
    let res = source.fetch_latest().await;
    histogram!("monitor_fetch_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);

    match &res {
        Ok(posts) => {
            tracing::debug!(source = source.name(), count = posts.len(), "feed fetched");
        }
        Err(e) => {
            tracing::warn!(stage = "fetch", source = source.name(), error = %e, "feed fetch failed");
            counter!("monitor_fetch_errors_total").increment(1);
        }
    }
    res
}
