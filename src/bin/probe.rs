//! One-off check of the classifier (and optionally email delivery).
//!
//! Usage: `probe [--send] [post text...]`
//! Without text a built-in sample is classified. `--send` also emails the result
//! to RECIPIENT_EMAIL so SMTP credentials can be verified.

use anyhow::Context;
use chrono::Utc;
use post_impact_monitor::analyze::build_classifier;
use post_impact_monitor::notify::{Notifier, SmtpNotifier};
use post_impact_monitor::{init_tracing, MonitorConfig, Post, PostId};

const SAMPLE: &str = "I am hereby ordering a 25% tariff on all imported semiconductors, effective immediately!";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    init_tracing();

    let mut send = false;
    let mut words = Vec::new();
    for arg in std::env::args().skip(1) {
        if arg == "--send" {
            send = true;
        } else {
            words.push(arg);
        }
    }
    let text = if words.is_empty() {
        SAMPLE.to_string()
    } else {
        words.join(" ")
    };

    let cfg = MonitorConfig::from_env().context("load configuration")?;
    let classifier = build_classifier(&cfg.gemini).context("build classifier")?;

    let verdict = match classifier.classify(&text, cfg.focus.as_deref()).await {
        Ok(v) => {
            println!("{}", serde_json::to_string_pretty(&v)?);
            Some(v)
        }
        Err(e) => {
            println!("classification failed: {e}");
            None
        }
    };

    if send {
        let notifier = SmtpNotifier::new(&cfg.email).context("build SMTP transport")?;
        let post = Post {
            id: PostId::from("probe"),
            created_at: Utc::now(),
            raw_content: html_escape::encode_text(&text).to_string(),
            url: None,
            media_preview: None,
        };
        notifier
            .send(&post, verdict.as_ref())
            .await
            .context("send probe email")?;
        println!("probe email sent to {}", cfg.email.recipient);
    }

    Ok(())
}
