//! Text-generation API interaction with exponential backoff retry logic.
//!
//! # Architecture
//!
//! - [`TextGeneration`]: core trait, "send a prompt with a response schema,
//!   get back the model's JSON text"
//! - [`GeminiClient`]: Gemini `generateContent` over HTTP with
//!   schema-constrained JSON output
//! - [`RetryGenerate`]: decorator that adds retry logic to any
//!   [`TextGeneration`] implementation
//!
//! # Retry Strategy
//!
//! - Only transport failures, HTTP 429 and 5xx are retried
//! - Exponential backoff starting at the base delay, capped at 30 seconds
//! - Random jitter (0-250ms) added to each delay
//!
//! A response that does not parse against the schema is never retried; it
//! surfaces as [`ClassificationError::Schema`] to the caller.

use crate::error::ClassificationError;
use rand::{Rng, rng};
use schemars::{JsonSchema, schema_for};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::time::{Duration as StdDuration, Instant};
use tokio::time::sleep;
use tracing::{debug, error, instrument, warn};

pub const DEFAULT_MODEL: &str = "gemini-2.0-flash-lite";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Trait for schema-constrained text generation.
pub trait TextGeneration {
    /// Send `prompt` and ask for a JSON response conforming to `schema`.
    ///
    /// Returns the raw JSON text of the response.
    async fn generate(&self, prompt: &str, schema: &Value) -> Result<String, ClassificationError>;
}

/// JSON schema for `T` in the shape the generation API accepts: top-level
/// object, no `$schema` marker, no `definitions` table.
pub fn response_schema<T: JsonSchema>() -> Value {
    let schema = schema_for!(T);
    let mut value = serde_json::to_value(schema).unwrap_or_default();
    if let Value::Object(map) = &mut value {
        map.remove("$schema");
        map.remove("definitions");
    }
    value
}

/// Wrapper that adds exponential backoff retry logic to any [`TextGeneration`].
///
/// ```text
/// delay = min(base_delay * 2^(attempt-1), max_delay) + random_jitter(0..250ms)
/// ```
pub struct RetryGenerate<T> {
    inner: T,
    max_retries: usize,
    base_delay: StdDuration,
    max_delay: StdDuration,
}

impl<T> RetryGenerate<T>
where
    T: TextGeneration,
{
    /// Wrap `inner`, allowing up to `max_retries` extra attempts per call.
    /// Delays start at `base_delay` and are capped at 30 seconds.
    pub fn new(inner: T, max_retries: usize, base_delay: StdDuration) -> Self {
        Self {
            inner,
            max_retries,
            base_delay,
            max_delay: StdDuration::from_secs(30),
        }
    }

    fn backoff(&self, attempt: usize) -> StdDuration {
        let exponent = (attempt - 1).min(16) as u32;
        let delay = self
            .base_delay
            .saturating_mul(1 << exponent)
            .min(self.max_delay);
        let jitter_ms: u64 = rng().random_range(0..=250);
        delay + StdDuration::from_millis(jitter_ms)
    }
}

impl<T> fmt::Debug for RetryGenerate<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryGenerate")
            .field("max_retries", &self.max_retries)
            .field("base_delay", &self.base_delay)
            .field("max_delay", &self.max_delay)
            .finish()
    }
}

impl<T> TextGeneration for RetryGenerate<T>
where
    T: TextGeneration,
{
    #[instrument(level = "info", skip_all)]
    async fn generate(&self, prompt: &str, schema: &Value) -> Result<String, ClassificationError> {
        let total_t0 = Instant::now();
        let mut attempt = 0usize;

        loop {
            match self.inner.generate(prompt, schema).await {
                Ok(resp) => return Ok(resp),
                Err(e) if !e.is_retryable() => return Err(e),
                Err(e) => {
                    attempt += 1;
                    let total_dt = total_t0.elapsed();

                    if attempt > self.max_retries {
                        error!(
                            attempt,
                            max = self.max_retries,
                            elapsed_ms_total = total_dt.as_millis(),
                            error = %e,
                            "generate() exhausted retries"
                        );
                        return Err(e);
                    }

                    let delay = self.backoff(attempt);
                    warn!(
                        attempt,
                        max = self.max_retries,
                        elapsed_ms_total = total_dt.as_millis(),
                        ?delay,
                        error = %e,
                        "generate() attempt failed; backing off"
                    );
                    sleep(delay).await;
                }
            }
        }
    }
}

/// Client for the Gemini `generateContent` endpoint.
#[derive(Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeminiClient")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl GeminiClient {
    /// Create a client for `model` against the public endpoint.
    ///
    /// # Arguments
    ///
    /// * `http` - Shared HTTP client (timeouts are configured there)
    /// * `api_key` - Sent as the `x-goog-api-key` header
    /// * `model` - Model name, e.g. [`DEFAULT_MODEL`]
    pub fn new(http: reqwest::Client, api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            http,
            api_key: api_key.into(),
            model: model.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Point the client at another API root. A trailing `/` is dropped.
    pub fn with_base_url(mut self, url: &str) -> Self {
        self.base_url = url.trim_end_matches('/').to_string();
        self
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.base_url,
            urlencoding::encode(&self.model)
        )
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig<'a>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig<'a> {
    response_mime_type: &'static str,
    response_json_schema: &'a Value,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

impl GenerateResponse {
    fn into_text(self) -> Option<String> {
        self.candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .and_then(|c| c.parts.into_iter().find_map(|p| p.text))
    }
}

impl TextGeneration for GeminiClient {
    #[instrument(level = "info", skip_all, fields(model = %self.model))]
    async fn generate(&self, prompt: &str, schema: &Value) -> Result<String, ClassificationError> {
        let t0 = Instant::now();
        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![RequestPart { text: prompt }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
                response_json_schema: schema,
            },
        };

        let response = self
            .http
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(
                elapsed_ms = t0.elapsed().as_millis(),
                status = status.as_u16(),
                "Gemini call failed"
            );
            return Err(ClassificationError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: GenerateResponse = response.json().await?;
        debug!(elapsed_ms = t0.elapsed().as_millis(), "Gemini call succeeded");
        parsed.into_text().ok_or(ClassificationError::EmptyResponse)
    }
}
