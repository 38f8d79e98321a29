// tests/e2e_smoke.rs
// Fixture feed -> mock model -> recording notifier, two cycles.
mod common;

use std::sync::Arc;

use common::{settings, RecordingNotifier};
use post_impact_monitor::analyze::ai_adapter::{MockProvider, ModelClassifier};
use post_impact_monitor::ingest::providers::fixture::FixtureFeedProvider;
use post_impact_monitor::notify::compose_email;
use post_impact_monitor::{Direction, FeedSource, Monitor, MonitorState, PostId};

const FIXTURE: &str = include_str!("fixtures/statuses.json");

#[tokio::test]
async fn fixture_feed_parses_most_recent_first() {
    let posts = FixtureFeedProvider::from_fixture_str(FIXTURE)
        .fetch_latest()
        .await
        .unwrap();
    assert_eq!(posts.len(), 3);
    assert!(posts[0].id > posts[1].id);
    assert_eq!(
        posts[2].media_preview.as_deref(),
        Some("https://static-assets.truthsocial.com/media/small/a.png")
    );
}

#[tokio::test]
async fn relevant_posts_after_marker_are_emailed() {
    let reply = r#"```json
{"relevant": true, "direction": "MENTIONED", "subjects": ["DJT"], "rationale": "Names a ticker."}
```"#;
    let notifier = RecordingNotifier::ok();
    let sent = notifier.sent.clone();
    let monitor = Monitor::new(
        Box::new(FixtureFeedProvider::from_fixture_str(FIXTURE)),
        Arc::new(ModelClassifier::new(MockProvider::new(reply), None)),
        Box::new(notifier),
        settings(false),
    );

    let (state, report) = monitor
        .run_cycle(MonitorState::with_last_seen("114311127114777163"))
        .await;

    assert_eq!(report.fetched, 3);
    assert_eq!(report.new_posts, 2);
    assert_eq!(report.notified, 2);
    assert_eq!(
        state.last_seen_id(),
        Some(&PostId::from("114311127114777170"))
    );

    let (first_id, verdict) = {
        let sent = sent.lock();
        (sent[0].post_id.clone(), sent[0].verdict.clone().unwrap())
    };
    assert_eq!(first_id, "114311127114777169");
    assert_eq!(verdict.direction, Direction::Mentioned);

    // what the SMTP notifier would have sent for the first alert
    let posts = FixtureFeedProvider::from_fixture_str(FIXTURE)
        .fetch_latest()
        .await
        .unwrap();
    let mail = compose_email(&posts[1], Some(&verdict));
    assert_eq!(
        mail.subject,
        "[MENTIONED] Market-relevant post (DJT): THIS IS A GREAT TIME TO BUY!!! DJT"
    );
    assert!(mail
        .body
        .contains("Link: https://truthsocial.com/@realDonaldTrump/114311127114777169"));

    // second cycle over the same page finds nothing
    let (_, again) = monitor.run_cycle(state).await;
    assert_eq!(again.new_posts, 0);
}
