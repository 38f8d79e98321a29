// src/lib.rs
// Public library surface for the binaries and integration tests.

pub mod analyze;
pub mod config;
pub mod detector;
pub mod error;
pub mod ingest;
pub mod metrics;
pub mod monitor;
pub mod notify;

// ---- Re-exports for stable public API ----
pub use crate::analyze::ai_adapter::{DynClassifier, ImpactClassifier};
pub use crate::analyze::verdict::{ClassificationResult, Direction};
pub use crate::config::MonitorConfig;
pub use crate::detector::{detect_new_posts, Detection, FirstRunPolicy, MonitorState};
pub use crate::error::{ClassificationError, ConfigError, FetchError, NotificationError};
pub use crate::ingest::types::{FeedSource, Post, PostId};
pub use crate::monitor::{CycleReport, Monitor, MonitorSettings};
pub use crate::notify::Notifier;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Install the global tracing subscriber.
///
/// `RUST_LOG` picks the filter (default `post_impact_monitor=info,warn`);
/// `LOG_FORMAT=json` switches to JSON lines, anything else is compact text.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("post_impact_monitor=info,warn"));

    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer().compact()).init();
    }
}
