//! The polling loop: fetch, detect, classify, notify, advance, sleep.
//!
//! State is passed in and handed back by every cycle so tests can drive single
//! cycles with fake collaborators. Only startup can fail; every error inside a
//! cycle is logged and the loop carries on.

use std::future::Future;
use std::time::Duration;

use metrics::{counter, gauge};

use crate::analyze::ai_adapter::DynClassifier;
use crate::analyze::verdict::ClassificationResult;
use crate::config::MonitorConfig;
use crate::detector::{detect_new_posts, FirstRunPolicy, MonitorState};
use crate::error::ClassificationError;
use crate::ingest::types::{FeedSource, Post};
use crate::ingest::{excerpt, fetch_posts, normalize_text};
use crate::metrics::ensure_metrics_described;
use crate::notify::Notifier;

#[derive(Debug, Clone)]
pub struct MonitorSettings {
    pub interval: Duration,
    pub focus: Option<String>,
    pub notify_all: bool,
    pub first_run: FirstRunPolicy,
}

impl From<&MonitorConfig> for MonitorSettings {
    fn from(cfg: &MonitorConfig) -> Self {
        Self {
            interval: cfg.check_interval,
            focus: cfg.focus.clone(),
            notify_all: cfg.notify_all,
            first_run: cfg.first_run,
        }
    }
}

/// What a cycle did. Returned for logging and tests.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub fetch_failed: bool,
    pub fetched: usize,
    pub new_posts: usize,
    pub relevant: usize,
    pub classification_errors: usize,
    pub skipped_no_text: usize,
    pub notified: usize,
    pub notification_errors: usize,
}

/// Result of looking at one post.
#[derive(Debug)]
pub enum PostOutcome {
    Classified(ClassificationResult),
    Failed(ClassificationError),
    /// Nothing to send to the model (media-only or empty body).
    NoText,
}

impl PostOutcome {
    /// `Some(verdict)` if the post should be emailed; the inner `None` marks
    /// an unclassified fallback alert.
    pub fn alert(&self, notify_all: bool) -> Option<Option<&ClassificationResult>> {
        match self {
            PostOutcome::Classified(v) if v.relevant || notify_all => Some(Some(v)),
            PostOutcome::Classified(_) => None,
            PostOutcome::Failed(_) | PostOutcome::NoText if notify_all => Some(None),
            PostOutcome::Failed(_) | PostOutcome::NoText => None,
        }
    }
}

pub struct Monitor {
    feed: Box<dyn FeedSource>,
    classifier: DynClassifier,
    notifier: Box<dyn Notifier>,
    settings: MonitorSettings,
}

impl Monitor {
    pub fn new(
        feed: Box<dyn FeedSource>,
        classifier: DynClassifier,
        notifier: Box<dyn Notifier>,
        settings: MonitorSettings,
    ) -> Self {
        ensure_metrics_described();
        Self {
            feed,
            classifier,
            notifier,
            settings,
        }
    }

    pub fn settings(&self) -> &MonitorSettings {
        &self.settings
    }

    /// One full pass. The returned state is never behind the one passed in.
    pub async fn run_cycle(&self, mut state: MonitorState) -> (MonitorState, CycleReport) {
        let mut report = CycleReport::default();

        let posts = match fetch_posts(self.feed.as_ref()).await {
            Ok(p) => p,
            Err(_) => {
                // fetch_posts already logged the cause
                report.fetch_failed = true;
                return (state, report);
            }
        };
        report.fetched = posts.len();

        let first_run = state.last_seen_id().is_none();
        let detection = detect_new_posts(&posts, state.last_seen_id(), self.settings.first_run);
        report.new_posts = detection.new_posts.len();
        counter!("monitor_new_posts_total").increment(report.new_posts as u64);

        if first_run {
            if let Some(id) = &detection.newest_id {
                tracing::info!(
                    post_id = %id,
                    policy = ?self.settings.first_run,
                    new = report.new_posts,
                    "initial latest post recorded"
                );
            }
        }

        for post in &detection.new_posts {
            self.process_post(post, &mut report).await;
        }

        if let Some(id) = &detection.newest_id {
            state.advance(id);
        }

        counter!("monitor_cycles_total").increment(1);
        gauge!("monitor_last_cycle_ts").set(chrono::Utc::now().timestamp() as f64);
        (state, report)
    }

    async fn process_post(&self, post: &Post, report: &mut CycleReport) {
        let text = normalize_text(&post.raw_content);
        tracing::info!(
            post_id = %post.id,
            created_at = %post.created_at.to_rfc3339(),
            excerpt = %excerpt(&text, 80),
            "new post detected"
        );

        let outcome = if text.is_empty() {
            tracing::info!(
                stage = "classify",
                post_id = %post.id,
                has_media = post.media_preview.is_some(),
                "post has no text content, skipping model"
            );
            report.skipped_no_text += 1;
            PostOutcome::NoText
        } else {
            match self
                .classifier
                .classify(&text, self.settings.focus.as_deref())
                .await
            {
                Ok(v) => PostOutcome::Classified(v),
                Err(e) => {
                    tracing::warn!(
                        stage = "classify",
                        post_id = %post.id,
                        provider = self.classifier.provider_name(),
                        error = %e,
                        "classification failed, using fallback"
                    );
                    counter!("monitor_classification_errors_total").increment(1);
                    report.classification_errors += 1;
                    PostOutcome::Failed(e)
                }
            }
        };

        if let PostOutcome::Classified(v) = &outcome {
            tracing::info!(
                post_id = %post.id,
                relevant = v.relevant,
                direction = %v.direction,
                subjects = ?v.subjects,
                "post classified"
            );
            if v.relevant {
                report.relevant += 1;
                counter!("monitor_relevant_posts_total").increment(1);
            }
        }

        let Some(verdict) = outcome.alert(self.settings.notify_all) else {
            return;
        };
        match self.notifier.send(post, verdict).await {
            Ok(()) => {
                tracing::info!(post_id = %post.id, notifier = self.notifier.name(), "notification sent");
                counter!("monitor_notifications_total").increment(1);
                report.notified += 1;
            }
            Err(e) => {
                tracing::error!(
                    stage = "notify",
                    post_id = %post.id,
                    notifier = self.notifier.name(),
                    error = %e,
                    "notification failed, not retrying"
                );
                counter!("monitor_notification_errors_total").increment(1);
                report.notification_errors += 1;
            }
        }
    }

    /// Run cycles until `shutdown` resolves. The first cycle starts at once;
    /// shutdown is observed between cycles.
    pub async fn run<F>(&self, mut state: MonitorState, shutdown: F) -> MonitorState
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        tracing::info!(
            interval_secs = self.settings.interval.as_secs(),
            feed = self.feed.name(),
            provider = self.classifier.provider_name(),
            notify_all = self.settings.notify_all,
            focus = self.settings.focus.as_deref().unwrap_or(""),
            "monitoring for new posts"
        );

        loop {
            let (next, report) = self.run_cycle(state).await;
            state = next;
            if report.new_posts > 0 {
                tracing::info!(
                    new = report.new_posts,
                    relevant = report.relevant,
                    notified = report.notified,
                    last_seen = ?state.last_seen_id().map(|i| i.as_str()),
                    "cycle finished"
                );
            } else {
                tracing::debug!(fetch_failed = report.fetch_failed, fetched = report.fetched, "no new posts");
            }

            tokio::select! {
                _ = &mut shutdown => {
                    tracing::info!("shutdown requested, monitor stopped");
                    return state;
                }
                _ = tokio::time::sleep(self.settings.interval) => {}
            }
        }
    }
}
