use async_trait::async_trait;

use crate::error::FetchError;
use crate::ingest::providers::parse_feed_body;
use crate::ingest::types::{FeedSource, Post};

/// Serves a fixed feed body through the same parser as the HTTP provider.
pub struct FixtureFeedProvider {
    body: String,
}

impl FixtureFeedProvider {
    pub fn from_fixture_str(s: &str) -> Self {
        Self {
            body: s.to_string(),
        }
    }
}

#[async_trait]
impl FeedSource for FixtureFeedProvider {
    async fn fetch_latest(&self) -> Result<Vec<Post>, FetchError> {
        parse_feed_body(&self.body)
    }

    fn name(&self) -> &'static str {
        "fixture"
    }
}
