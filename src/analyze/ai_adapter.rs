//! AI adapter: classifier trait, model providers, and an in-memory daily call cap.

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{NaiveDate, Utc};
use metrics::histogram;
use serde::{Deserialize, Serialize};

use crate::analyze::prompt::build_prompt;
use crate::analyze::verdict::{parse_verdict, ClassificationResult};
use crate::config::ai::GeminiConfig;
use crate::error::ClassificationError;

// ------------------------------------------------------------
// Public surface
// ------------------------------------------------------------

pub type ClassifyFuture<'a> =
    Pin<Box<dyn Future<Output = Result<ClassificationResult, ClassificationError>> + Send + 'a>>;

/// Judges whether a cleaned post could move markets.
pub trait ImpactClassifier: Send + Sync {
    fn classify<'a>(&'a self, text: &'a str, focus: Option<&'a str>) -> ClassifyFuture<'a>;
    /// Provider name for diagnostics.
    fn provider_name(&self) -> &'static str;
}

pub type DynClassifier = Arc<dyn ImpactClassifier>;

/// Build the classifier for this process.
///
/// * `AI_TEST_MODE=mock` swaps in a provider with a fixed non-relevant reply.
/// * Otherwise Gemini, wrapped with the configured daily cap.
pub fn build_classifier(cfg: &GeminiConfig) -> Result<DynClassifier, ClassificationError> {
    if std::env::var("AI_TEST_MODE")
        .map(|v| v == "mock")
        .unwrap_or(false)
    {
        tracing::warn!("AI_TEST_MODE=mock: model calls are stubbed");
        let mock = MockProvider::new(
            r#"{"relevant": false, "direction": "NONE", "subjects": [], "rationale": "mock reply"}"#,
        );
        return Ok(Arc::new(ModelClassifier::new(mock, cfg.daily_limit)));
    }

    let provider = GeminiProvider::new(cfg)?;
    Ok(Arc::new(ModelClassifier::new(provider, cfg.daily_limit)))
}

// ------------------------------------------------------------
// Provider abstraction + concrete providers
// ------------------------------------------------------------

pub type CompleteFuture<'a> =
    Pin<Box<dyn Future<Output = Result<String, ClassificationError>> + Send + 'a>>;

/// Low-level provider: sends one prompt, returns the raw reply text.
pub trait Provider: Send + Sync + 'static {
    fn complete<'a>(&'a self, prompt: &'a str) -> CompleteFuture<'a>;
    fn name(&self) -> &'static str;
}

/// Google Gemini `generateContent` REST provider.
pub struct GeminiProvider {
    http: reqwest::Client,
    api_key: String,
    endpoint: String,
}

impl GeminiProvider {
    pub fn new(cfg: &GeminiConfig) -> Result<Self, ClassificationError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("post-impact-monitor/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(5))
            .timeout(cfg.timeout)
            .build()?;
        let endpoint = format!(
            "{}/models/{}:generateContent",
            cfg.base_url.trim_end_matches('/'),
            cfg.model
        );
        Ok(Self {
            http,
            api_key: cfg.api_key.clone(),
            endpoint,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}
#[derive(Serialize)]
struct Content<'a> {
    role: &'a str,
    parts: Vec<Part<'a>>,
}
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
    response_mime_type: &'static str,
}
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}
#[derive(Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}
#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}
#[derive(Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}
#[derive(Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}
#[derive(Deserialize)]
struct ApiErrorDetail {
    #[serde(default)]
    message: String,
}

impl GeminiProvider {
    async fn complete_impl(&self, prompt: &str) -> Result<String, ClassificationError> {
        let req = GenerateRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![Part { text: prompt }],
            }],
            generation_config: GenerationConfig {
                temperature: 0.2,
                max_output_tokens: 512,
                response_mime_type: "application/json",
            },
        };

        let resp = self
            .http
            .post(&self.endpoint)
            .header("x-goog-api-key", &self.api_key)
            .json(&req)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiErrorBody>(&body)
                .map(|b| b.error.message)
                .unwrap_or_else(|_| body.chars().take(200).collect());
            return Err(ClassificationError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: GenerateResponse = resp
            .json()
            .await
            .map_err(|e| ClassificationError::Parse(format!("gemini envelope: {e}")))?;

        let text: String = body
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        if text.trim().is_empty() {
            if let Some(reason) = body.prompt_feedback.and_then(|f| f.block_reason) {
                return Err(ClassificationError::Api {
                    status: status.as_u16(),
                    message: format!("prompt blocked: {reason}"),
                });
            }
            return Err(ClassificationError::EmptyResponse);
        }
        Ok(text)
    }
}

impl Provider for GeminiProvider {
    fn complete<'a>(&'a self, prompt: &'a str) -> CompleteFuture<'a> {
        Box::pin(self.complete_impl(prompt))
    }
    fn name(&self) -> &'static str {
        "gemini"
    }
}

/// Fixed-reply provider for tests and local runs.
#[derive(Clone)]
pub struct MockProvider {
    pub fixed: String,
}

impl MockProvider {
    pub fn new(fixed: impl Into<String>) -> Self {
        Self {
            fixed: fixed.into(),
        }
    }
}

impl Provider for MockProvider {
    fn complete<'a>(&'a self, _prompt: &'a str) -> CompleteFuture<'a> {
        let out = self.fixed.clone();
        Box::pin(async move { Ok(out) })
    }
    fn name(&self) -> &'static str {
        "mock"
    }
}

// ------------------------------------------------------------
// Classifier: prompt -> provider -> validated verdict
// ------------------------------------------------------------

pub struct ModelClassifier<P: Provider> {
    inner: P,
    daily_limit: Option<u32>,
    counter: Mutex<DailyCounter>,
}

impl<P: Provider> ModelClassifier<P> {
    /// `daily_limit` of `None` means unlimited.
    pub fn new(inner: P, daily_limit: Option<u32>) -> Self {
        Self {
            inner,
            daily_limit,
            counter: Mutex::new(DailyCounter::default()),
        }
    }

    /// Model calls made so far today (UTC).
    pub fn calls_today(&self) -> u32 {
        let mut g = self.counter.lock().unwrap_or_else(|e| e.into_inner());
        g.roll(Utc::now().date_naive());
        g.count
    }

    fn reserve_call(&self) -> Result<(), ClassificationError> {
        let mut g = self.counter.lock().unwrap_or_else(|e| e.into_inner());
        g.roll(Utc::now().date_naive());
        if let Some(limit) = self.daily_limit {
            if g.count >= limit {
                return Err(ClassificationError::DailyLimit { limit });
            }
        }
        // Failed calls still spend provider quota, so count before sending.
        g.count = g.count.saturating_add(1);
        Ok(())
    }

    async fn classify_impl(
        &self,
        text: &str,
        focus: Option<&str>,
    ) -> Result<ClassificationResult, ClassificationError> {
        self.reserve_call()?;
        let prompt = build_prompt(text, focus);

        let t0 = std::time::Instant::now();
        let reply = self.inner.complete(&prompt).await;
        histogram!("monitor_classify_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);

        let verdict = parse_verdict(&reply?)?;
        tracing::debug!(
            provider = self.inner.name(),
            relevant = verdict.relevant,
            direction = %verdict.direction,
            "model verdict"
        );
        Ok(verdict)
    }
}

impl<P: Provider> ImpactClassifier for ModelClassifier<P> {
    fn classify<'a>(&'a self, text: &'a str, focus: Option<&'a str>) -> ClassifyFuture<'a> {
        Box::pin(self.classify_impl(text, focus))
    }
    fn provider_name(&self) -> &'static str {
        self.inner.name()
    }
}

// ------------------------------------------------------------
// Daily counter
// ------------------------------------------------------------

#[derive(Debug, Clone)]
struct DailyCounter {
    day: NaiveDate,
    count: u32,
}

impl Default for DailyCounter {
    fn default() -> Self {
        Self {
            day: Utc::now().date_naive(),
            count: 0,
        }
    }
}

impl DailyCounter {
    fn roll(&mut self, today: NaiveDate) {
        if self.day != today {
            self.day = today;
            self.count = 0;
        }
    }
}
