//! New-post detection against the last identifier the monitor has seen.

use std::collections::HashSet;
use std::str::FromStr;

use crate::ingest::types::{Post, PostId};

/// What to do on the very first successful fetch, when nothing has been seen yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FirstRunPolicy {
    /// Record the newest id and report nothing; only later posts are new.
    #[default]
    SeedOnly,
    /// Treat every fetched post as new.
    NotifyAll,
}

impl FromStr for FirstRunPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "seed" | "seed-only" | "seed_only" => Ok(Self::SeedOnly),
            "all" | "notify-all" | "notify_all" => Ok(Self::NotifyAll),
            other => Err(format!("expected `seed` or `all`, got `{other}`")),
        }
    }
}

/// Last-seen tracking owned by the monitor loop. Lives only in memory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MonitorState {
    last_seen_id: Option<PostId>,
}

impl MonitorState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_last_seen(id: impl Into<PostId>) -> Self {
        Self {
            last_seen_id: Some(id.into()),
        }
    }

    pub fn last_seen_id(&self) -> Option<&PostId> {
        self.last_seen_id.as_ref()
    }

    /// Move the marker forward. Older or equal ids are ignored.
    /// Returns whether the marker changed.
    pub fn advance(&mut self, id: &PostId) -> bool {
        match &self.last_seen_id {
            Some(cur) if id <= cur => false,
            _ => {
                self.last_seen_id = Some(id.clone());
                true
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Detection {
    /// Unseen posts, oldest first.
    pub new_posts: Vec<Post>,
    /// Highest id known after this fetch (never lower than the previous marker).
    pub newest_id: Option<PostId>,
}

/// Split a fetched page into unseen posts.
///
/// Pure: the same page and marker always give the same answer.
pub fn detect_new_posts(
    posts: &[Post],
    last_seen: Option<&PostId>,
    policy: FirstRunPolicy,
) -> Detection {
    let newest_fetched = posts.iter().map(|p| &p.id).max();
    let newest_id = match (last_seen, newest_fetched) {
        (Some(seen), Some(fetched)) => Some(seen.max(fetched).clone()),
        (Some(seen), None) => Some(seen.clone()),
        (None, fetched) => fetched.cloned(),
    };

    if last_seen.is_none() && policy == FirstRunPolicy::SeedOnly {
        return Detection {
            new_posts: Vec::new(),
            newest_id,
        };
    }

    let mut ids = HashSet::new();
    let mut new_posts: Vec<Post> = posts
        .iter()
        .filter(|p| last_seen.map_or(true, |seen| p.id > *seen))
        .filter(|p| ids.insert(p.id.clone()))
        .cloned()
        .collect();
    new_posts.sort_by(|a, b| a.id.cmp(&b.id));

    Detection {
        new_posts,
        newest_id,
    }
}
