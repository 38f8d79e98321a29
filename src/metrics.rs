use std::net::SocketAddr;

use metrics::{describe_counter, describe_gauge, describe_histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use once_cell::sync::OnceCell;

/// One-time metrics registration (so series show up on the exporter).
pub fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("monitor_cycles_total", "Completed monitor cycles.");
        describe_counter!("monitor_fetch_errors_total", "Feed fetches that failed.");
        describe_counter!(
            "monitor_malformed_posts_total",
            "Feed entries skipped because they lacked required fields."
        );
        describe_counter!("monitor_new_posts_total", "Posts detected as new.");
        describe_counter!(
            "monitor_classification_errors_total",
            "Model calls or replies that failed."
        );
        describe_counter!("monitor_relevant_posts_total", "Posts judged market-relevant.");
        describe_counter!("monitor_notifications_total", "Emails sent.");
        describe_counter!(
            "monitor_notification_errors_total",
            "Emails that failed to send."
        );
        describe_histogram!("monitor_fetch_ms", "Feed fetch time in milliseconds.");
        describe_histogram!("monitor_classify_ms", "Model call time in milliseconds.");
        describe_gauge!("monitor_last_cycle_ts", "Unix ts of the last finished cycle.");
    });
}

/// Install the Prometheus recorder with its own HTTP listener on `addr`.
/// Must run inside the tokio runtime.
pub fn install_prometheus(addr: SocketAddr) -> anyhow::Result<()> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| anyhow::anyhow!("prometheus exporter on {addr}: {e}"))?;
    ensure_metrics_described();
    tracing::info!(%addr, "prometheus exporter listening");
    Ok(())
}
