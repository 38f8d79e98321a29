// src/ingest/types.rs
use std::cmp::Ordering;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::FetchError;

/// Post identifier as exposed by the feed.
///
/// Feeds hand out snowflake-style numeric ids, sometimes as JSON strings and
/// sometimes as integers. All-digit ids order numerically (length first, then
/// lexically, so ids wider than `u64` still compare correctly) and sort before
/// every non-numeric id; non-numeric ids order lexically among themselves.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct PostId(String);

impl PostId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn numeric_digits(&self) -> Option<&str> {
        let s = self.0.as_str();
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let trimmed = s.trim_start_matches('0');
        Some(if trimmed.is_empty() { "0" } else { trimmed })
    }
}

impl Ord for PostId {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.numeric_digits(), other.numeric_digits()) {
            (Some(a), Some(b)) => a
                .len()
                .cmp(&b.len())
                .then_with(|| a.cmp(b))
                .then_with(|| self.0.cmp(&other.0)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => self.0.cmp(&other.0),
        }
    }
}

impl PartialOrd for PostId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for PostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PostId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<u64> for PostId {
    fn from(n: u64) -> Self {
        Self(n.to_string())
    }
}

impl<'de> Deserialize<'de> for PostId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Str(String),
            Num(u64),
        }
        match Repr::deserialize(deserializer)? {
            Repr::Str(s) => Ok(PostId(s)),
            Repr::Num(n) => Ok(PostId(n.to_string())),
        }
    }
}

/// One post as fetched from the feed. Never mutated after parsing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Post {
    pub id: PostId,
    pub created_at: DateTime<Utc>,
    /// HTML body as delivered by the feed.
    pub raw_content: String,
    pub url: Option<String>,
    /// Preview of the first media attachment, if any.
    pub media_preview: Option<String>,
}

// --- wire format (Mastodon-compatible status objects) ---

#[derive(Debug, Deserialize)]
pub(crate) struct WireStatus {
    id: PostId,
    created_at: DateTime<Utc>,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    uri: Option<String>,
    #[serde(default)]
    media_attachments: Vec<WireMedia>,
    #[serde(default)]
    reblog: Option<Box<WireReblog>>,
}

#[derive(Debug, Deserialize)]
struct WireMedia {
    #[serde(default)]
    preview_url: Option<String>,
    #[serde(default)]
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireReblog {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    media_attachments: Vec<WireMedia>,
}

impl WireStatus {
    pub(crate) fn into_post(self) -> Post {
        let own = self.content.unwrap_or_default();
        let (raw_content, media) = match self.reblog {
            // Reposts carry an empty body; the text lives on the inner status.
            Some(rb) if own.trim().is_empty() => {
                let media = if self.media_attachments.is_empty() {
                    rb.media_attachments
                } else {
                    self.media_attachments
                };
                (rb.content.unwrap_or_default(), media)
            }
            _ => (own, self.media_attachments),
        };
        let media_preview = media
            .into_iter()
            .find_map(|m| m.preview_url.or(m.url))
            .filter(|u| !u.trim().is_empty());

        Post {
            id: self.id,
            created_at: self.created_at,
            raw_content,
            url: self.url.or(self.uri),
            media_preview,
        }
    }
}

#[async_trait::async_trait]
pub trait FeedSource: Send + Sync {
    /// Current page of posts, most recent first, as the upstream returns it.
    async fn fetch_latest(&self) -> Result<Vec<Post>, FetchError>;
    fn name(&self) -> &'static str;
}
