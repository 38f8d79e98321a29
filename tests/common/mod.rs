// tests/common/mod.rs
// Fake collaborators shared by the integration tests.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use parking_lot::Mutex;
use post_impact_monitor::analyze::ai_adapter::ClassifyFuture;
use post_impact_monitor::{
    ClassificationError, ClassificationResult, Direction, FeedSource, FetchError, FirstRunPolicy,
    ImpactClassifier, MonitorSettings, NotificationError, Notifier, Post, PostId,
};

pub fn post(id: &str, html: &str) -> Post {
    Post {
        id: PostId::from(id),
        created_at: Utc.with_ymd_and_hms(2025, 4, 9, 17, 0, 0).unwrap(),
        raw_content: html.to_string(),
        url: Some(format!("https://example.test/@acct/{id}")),
        media_preview: None,
    }
}

/// Most-recent-first page, like the upstream feed.
pub fn page(ids: &[&str]) -> Vec<Post> {
    let mut v: Vec<Post> = ids.iter().map(|id| post(id, &format!("<p>post {id}</p>"))).collect();
    v.sort_by(|a, b| b.id.cmp(&a.id));
    v
}

pub fn settings(notify_all: bool) -> MonitorSettings {
    MonitorSettings {
        interval: Duration::from_millis(10),
        focus: None,
        notify_all,
        first_run: FirstRunPolicy::SeedOnly,
    }
}

// ---------------- feed ----------------

/// Returns queued pages in order; repeats the last one when the queue runs dry.
pub struct ScriptedFeed {
    pages: Mutex<VecDeque<Result<Vec<Post>, u16>>>,
    last: Mutex<Vec<Post>>,
    pub calls: Arc<Mutex<usize>>,
}

impl ScriptedFeed {
    /// `Err(status)` entries simulate an HTTP failure.
    pub fn new(pages: Vec<Result<Vec<Post>, u16>>) -> Self {
        Self {
            pages: Mutex::new(pages.into()),
            last: Mutex::new(Vec::new()),
            calls: Arc::new(Mutex::new(0)),
        }
    }
}

#[async_trait]
impl FeedSource for ScriptedFeed {
    async fn fetch_latest(&self) -> Result<Vec<Post>, FetchError> {
        *self.calls.lock() += 1;
        match self.pages.lock().pop_front() {
            Some(Ok(p)) => {
                *self.last.lock() = p.clone();
                Ok(p)
            }
            Some(Err(status)) => Err(FetchError::Status { status }),
            None => Ok(self.last.lock().clone()),
        }
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

// ---------------- classifier ----------------

#[derive(Clone, Copy)]
pub enum Script {
    Relevant,
    NotRelevant,
    ParseFailure,
}

pub struct FakeClassifier {
    script: Script,
    pub seen: Arc<Mutex<Vec<(String, Option<String>)>>>,
}

impl FakeClassifier {
    pub fn new(script: Script) -> Self {
        Self {
            script,
            seen: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl ImpactClassifier for FakeClassifier {
    fn classify<'a>(&'a self, text: &'a str, focus: Option<&'a str>) -> ClassifyFuture<'a> {
        self.seen
            .lock()
            .push((text.to_string(), focus.map(str::to_string)));
        let script = self.script;
        Box::pin(async move {
            match script {
                Script::Relevant => Ok(ClassificationResult {
                    relevant: true,
                    direction: Direction::Down,
                    subjects: vec!["SOXX".into()],
                    rationale: "Tariffs on chips.".into(),
                }),
                Script::NotRelevant => Ok(ClassificationResult::not_relevant("Personal remark.")),
                Script::ParseFailure => Err(ClassificationError::Parse(
                    "no JSON object in reply".into(),
                )),
            }
        })
    }

    fn provider_name(&self) -> &'static str {
        "fake"
    }
}

// ---------------- notifier ----------------

#[derive(Debug, Clone)]
pub struct Sent {
    pub post_id: String,
    pub verdict: Option<ClassificationResult>,
}

pub struct RecordingNotifier {
    pub sent: Arc<Mutex<Vec<Sent>>>,
    pub attempts: Arc<Mutex<usize>>,
    fail_auth: bool,
}

impl RecordingNotifier {
    pub fn ok() -> Self {
        Self {
            sent: Arc::new(Mutex::new(Vec::new())),
            attempts: Arc::new(Mutex::new(0)),
            fail_auth: false,
        }
    }

    pub fn failing_auth() -> Self {
        Self {
            fail_auth: true,
            ..Self::ok()
        }
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(
        &self,
        post: &Post,
        verdict: Option<&ClassificationResult>,
    ) -> Result<(), NotificationError> {
        *self.attempts.lock() += 1;
        if self.fail_auth {
            return Err(NotificationError::Auth(
                "535 5.7.8 Username and Password not accepted".into(),
            ));
        }
        self.sent.lock().push(Sent {
            post_id: post.id.to_string(),
            verdict: verdict.cloned(),
        });
        Ok(())
    }

    fn name(&self) -> &'static str {
        "recording"
    }
}
