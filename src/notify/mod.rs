pub mod email;

use async_trait::async_trait;

use crate::analyze::verdict::ClassificationResult;
use crate::error::NotificationError;
use crate::ingest::types::Post;
use crate::ingest::{excerpt, normalize_text};

pub use email::SmtpNotifier;

const SUBJECT_EXCERPT_CHARS: usize = 60;
const BODY_TEXT_CHARS: usize = 2000;

#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver one alert. `verdict` is `None` when the post is sent without a
    /// usable classification (NOTIFY_ALL fallback).
    async fn send(
        &self,
        post: &Post,
        verdict: Option<&ClassificationResult>,
    ) -> Result<(), NotificationError>;
    fn name(&self) -> &'static str;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailContent {
    pub subject: String,
    pub body: String,
}

fn headline_text(text: &str, post: &Post) -> String {
    if !text.is_empty() {
        excerpt(text, SUBJECT_EXCERPT_CHARS)
    } else if post.media_preview.is_some() {
        "[media only]".to_string()
    } else {
        "[no text]".to_string()
    }
}

/// Subject and plain-text body for one alert.
pub fn compose_email(post: &Post, verdict: Option<&ClassificationResult>) -> EmailContent {
    let text = normalize_text(&post.raw_content);
    let headline = headline_text(&text, post);

    let subject = match verdict {
        Some(v) if v.relevant => {
            let subjects = if v.subjects.is_empty() {
                "market".to_string()
            } else {
                v.subjects.join(", ")
            };
            format!("[{}] Market-relevant post ({subjects}): {headline}", v.direction)
        }
        Some(_) => format!("New post (not market-relevant): {headline}"),
        None => format!("New post (unclassified): {headline}"),
    };

    let mut body = String::with_capacity(512 + text.len());
    body.push_str("A new post was published on the monitored feed.\n\n");
    body.push_str(&format!("Post ID: {}\n", post.id));
    body.push_str(&format!("Posted: {}\n", post.created_at.to_rfc3339()));
    if let Some(url) = &post.url {
        body.push_str(&format!("Link: {url}\n"));
    }
    if let Some(media) = &post.media_preview {
        body.push_str(&format!("Media preview: {media}\n"));
    }

    body.push_str("\nText:\n");
    if text.is_empty() {
        body.push_str("[post has no text content]\n");
    } else {
        body.push_str(&excerpt(&text, BODY_TEXT_CHARS));
        body.push('\n');
    }

    body.push_str("\nAssessment:\n");
    match verdict {
        Some(v) => {
            body.push_str(&format!(
                "Market-relevant: {}\n",
                if v.relevant { "yes" } else { "no" }
            ));
            body.push_str(&format!("Direction: {}\n", v.direction));
            if !v.subjects.is_empty() {
                body.push_str(&format!("Subjects: {}\n", v.subjects.join(", ")));
            }
            if !v.rationale.is_empty() {
                body.push_str(&format!("Rationale: {}\n", v.rationale));
            }
        }
        None => {
            body.push_str(
                "No assessment available (classification failed or was skipped). \
                 Sent because NOTIFY_ALL is enabled.\n",
            );
        }
    }

    EmailContent { subject, body }
}
