//! Post impact monitor — binary entrypoint.
//! Loads configuration from the environment (and `.env`), wires the feed,
//! the classifier and the SMTP notifier, then polls until SIGINT/SIGTERM.

use std::future::Future;
use std::process::ExitCode;

use anyhow::Context;
use post_impact_monitor::analyze::build_classifier;
use post_impact_monitor::ingest::providers::http_feed::HttpFeedProvider;
use post_impact_monitor::notify::SmtpNotifier;
use post_impact_monitor::{init_tracing, metrics, Monitor, MonitorConfig, MonitorSettings, MonitorState};

/// Register signal handlers now so a signal arriving mid-cycle is not lost.
#[cfg(unix)]
fn shutdown_signal() -> anyhow::Result<impl Future<Output = ()>> {
    use tokio::signal::unix::{signal, SignalKind};
    let mut int = signal(SignalKind::interrupt()).context("install SIGINT handler")?;
    let mut term = signal(SignalKind::terminate()).context("install SIGTERM handler")?;
    Ok(async move {
        tokio::select! {
            _ = int.recv() => {}
            _ = term.recv() => {}
        }
    })
}

#[cfg(not(unix))]
fn shutdown_signal() -> anyhow::Result<impl Future<Output = ()>> {
    Ok(async {
        let _ = tokio::signal::ctrl_c().await;
    })
}

async fn build_monitor(cfg: &MonitorConfig) -> anyhow::Result<Monitor> {
    if let Some(addr) = cfg.metrics_addr {
        metrics::install_prometheus(addr)?;
    }

    let feed = HttpFeedProvider::new(&cfg.api_url, cfg.fetch_timeout).context("build feed client")?;
    let classifier = build_classifier(&cfg.gemini).context("build classifier")?;
    let notifier = SmtpNotifier::new(&cfg.email).context("build SMTP transport")?;

    tracing::info!(
        feed = %cfg.api_url,
        model = %cfg.gemini.model,
        smtp = %cfg.email.smtp_host,
        recipient = %cfg.email.recipient,
        "monitor configured"
    );

    Ok(Monitor::new(
        Box::new(feed),
        classifier,
        Box::new(notifier),
        MonitorSettings::from(cfg),
    ))
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cfg = match MonitorConfig::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::error!(error = %e, "configuration error");
            eprintln!("configuration error: {e}");
            return ExitCode::FAILURE;
        }
    };

    let started = async {
        let monitor = build_monitor(&cfg).await?;
        let shutdown = shutdown_signal()?;
        anyhow::Ok((monitor, shutdown))
    }
    .await;

    let (monitor, shutdown) = match started {
        Ok(v) => v,
        Err(e) => {
            tracing::error!(error = ?e, "startup failed");
            eprintln!("startup failed: {e:#}");
            return ExitCode::FAILURE;
        }
    };

    let state = monitor.run(MonitorState::new(), shutdown).await;
    tracing::info!(last_seen = ?state.last_seen_id().map(|i| i.as_str()), "exiting");
    ExitCode::SUCCESS
}
