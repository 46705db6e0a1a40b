//! LLM client: the single point of entry for all text-generation calls.
//!
//! ARCHITECTURAL RULE: no other module may call the Anthropic API directly.
//! Every stochastic output enters the system through [`generate`], which
//! parses and validates it against a named schema before any downstream
//! code sees it. Downstream components may assume schema-conformant input.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

pub mod schemas;

use schemas::StructuredSchema;

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
/// The model used for all LLM calls.
/// Intentionally hardcoded to prevent accidental drift.
pub const MODEL: &str = "claude-sonnet-4-5";
const MAX_TOKENS: u32 = 8192;
/// Transport-level retries (429 / 5xx / connection errors) inside `call`.
const TRANSPORT_RETRIES: u32 = 3;
/// Schema-level attempts (malformed or non-conformant output) in `generate`.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Rate limited after {retries} retries")]
    RateLimited { retries: u32 },

    #[error("LLM returned empty content")]
    EmptyContent,
}

/// Terminal failure of schema-constrained generation.
///
/// `RetriesExhausted` means the model kept returning malformed or
/// non-conformant output, a degraded condition that callers may
/// absorb with a stage-local fallback. `Transport` means the call itself
/// failed in a way retrying cannot help (auth, quota, network exhaustion);
/// callers should treat this as "system down" and propagate.
#[derive(Debug, Error)]
pub enum GenerationFailure {
    #[error("no schema-conformant output after {attempts} attempts")]
    RetriesExhausted { attempts: u32 },

    #[error("transport failure: {0}")]
    Transport(#[from] LlmError),
}

/// Why a single generation attempt was rejected. These are
/// expected-frequency failures, modelled as values rather than errors.
#[derive(Debug)]
pub enum Malformed {
    Json(String),
    Schema(String),
}

#[derive(Debug, Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: Vec<AnthropicMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct AnthropicMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct LlmResponse {
    pub content: Vec<ContentBlock>,
    pub usage: Usage,
}

#[derive(Debug, Deserialize)]
pub struct ContentBlock {
    #[serde(rename = "type")]
    pub block_type: String,
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

impl LlmResponse {
    /// Extracts the text content from the first text block.
    pub fn text(&self) -> Option<&str> {
        self.content
            .iter()
            .find(|b| b.block_type == "text")
            .and_then(|b| b.text.as_deref())
    }
}

#[derive(Debug, Deserialize)]
struct AnthropicError {
    error: AnthropicErrorBody,
}

#[derive(Debug, Deserialize)]
struct AnthropicErrorBody {
    message: String,
}

/// The raw text-generation capability. The pipeline depends on this trait,
/// never on the concrete client, so stages are testable with scripted stubs.
#[async_trait]
pub trait StructuredGenerator: Send + Sync {
    async fn complete(&self, prompt: &str, system: &str) -> Result<String, LlmError>;
}

/// Production generator wrapping the Anthropic Messages API with
/// transport-level retry logic.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    api_key: String,
}

impl LlmClient {
    pub fn new(api_key: String) -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(120))
                .build()
                .expect("Failed to build HTTP client"),
            api_key,
        }
    }

    /// Makes a raw call to the API, returning the full response object.
    /// Retries on 429 (rate limit) and 5xx errors with exponential backoff.
    pub async fn call(&self, prompt: &str, system: &str) -> Result<LlmResponse, LlmError> {
        let request_body = AnthropicRequest {
            model: MODEL,
            max_tokens: MAX_TOKENS,
            system,
            messages: vec![AnthropicMessage {
                role: "user",
                content: prompt,
            }],
        };

        let mut last_error: Option<LlmError> = None;

        for attempt in 0..TRANSPORT_RETRIES {
            if attempt > 0 {
                // Exponential backoff: 1s, 2s, 4s
                let delay = std::time::Duration::from_millis(1000 * (1 << (attempt - 1)));
                warn!(
                    "LLM call attempt {} failed, retrying after {}ms...",
                    attempt,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            let response = self
                .client
                .post(ANTHROPIC_API_URL)
                .header("x-api-key", &self.api_key)
                .header("anthropic-version", ANTHROPIC_VERSION)
                .header("content-type", "application/json")
                .json(&request_body)
                .send()
                .await;

            let response = match response {
                Ok(r) => r,
                Err(e) => {
                    last_error = Some(LlmError::Http(e));
                    continue;
                }
            };

            let status = response.status();

            if status.as_u16() == 429 || status.is_server_error() {
                let body = response.text().await.unwrap_or_default();
                warn!("LLM API returned {}: {}", status, body);
                last_error = Some(LlmError::Api {
                    status: status.as_u16(),
                    message: body,
                });
                continue;
            }

            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                // Try to parse error message
                let message = serde_json::from_str::<AnthropicError>(&body)
                    .map(|e| e.error.message)
                    .unwrap_or(body);
                return Err(LlmError::Api {
                    status: status.as_u16(),
                    message,
                });
            }

            let llm_response: LlmResponse = match response.json().await {
                Ok(r) => r,
                Err(e) => {
                    last_error = Some(LlmError::Http(e));
                    continue;
                }
            };

            debug!(
                "LLM call succeeded: input_tokens={}, output_tokens={}",
                llm_response.usage.input_tokens, llm_response.usage.output_tokens
            );

            return Ok(llm_response);
        }

        Err(last_error.unwrap_or(LlmError::RateLimited {
            retries: TRANSPORT_RETRIES,
        }))
    }
}

#[async_trait]
impl StructuredGenerator for LlmClient {
    async fn complete(&self, prompt: &str, system: &str) -> Result<String, LlmError> {
        let response = self.call(prompt, system).await?;
        response
            .text()
            .map(str::to_owned)
            .ok_or(LlmError::EmptyContent)
    }
}

/// Schema-constrained generation: invoke the generator, parse the text as
/// JSON, validate it against `T`, and retry with exponential backoff
/// (2^attempt seconds) while the output stays malformed. A transport error
/// aborts immediately; the raw call has already retried anything retryable.
pub async fn generate<T: StructuredSchema>(
    generator: &dyn StructuredGenerator,
    prompt: &str,
    max_attempts: u32,
) -> Result<T, GenerationFailure> {
    let system = schema_system_prompt::<T>();

    for attempt in 0..max_attempts {
        if attempt > 0 {
            let delay = std::time::Duration::from_secs(1 << (attempt - 1));
            tokio::time::sleep(delay).await;
        }

        let text = generator.complete(prompt, &system).await?;

        match parse_candidate::<T>(&text) {
            Ok(value) => {
                debug!(schema = T::NAME, attempt, "structured generation succeeded");
                return Ok(value);
            }
            Err(Malformed::Json(e)) => {
                warn!(
                    schema = T::NAME,
                    attempt, "output was not valid JSON: {e}"
                );
            }
            Err(Malformed::Schema(e)) => {
                warn!(
                    schema = T::NAME,
                    attempt, "output failed schema validation: {e}"
                );
            }
        }
    }

    Err(GenerationFailure::RetriesExhausted {
        attempts: max_attempts,
    })
}

/// Parse-then-validate for a single attempt. No exceptions for expected
/// failures: a malformed candidate is an ordinary value.
pub fn parse_candidate<T: StructuredSchema>(text: &str) -> Result<T, Malformed> {
    let text = strip_json_fences(text);
    let value: T = serde_json::from_str(text).map_err(|e| Malformed::Json(e.to_string()))?;
    value.validate().map_err(Malformed::Schema)?;
    Ok(value)
}

/// System prompt binding the model to a named, versioned schema.
fn schema_system_prompt<T: StructuredSchema>() -> String {
    format!(
        "You are a precise assistant that responds ONLY with valid JSON. \
        Your response must conform exactly to the '{}' schema (version {}):\n{}\n\
        Do NOT include any text outside the JSON object. \
        Do NOT use markdown code fences. \
        Ensure all required fields are present and valid.",
        T::NAME,
        T::VERSION,
        T::shape()
    )
}

/// Strips ```json ... ``` or ``` ... ``` code fences from LLM output.
fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    if let Some(stripped) = text.strip_prefix("```json") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else if let Some(stripped) = text.strip_prefix("```") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else {
        text
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use schemas::CoachingEnhancement;
    use std::sync::Mutex;

    /// Returns scripted responses in order; repeats the last one when
    /// exhausted. Used across pipeline tests.
    pub struct ScriptedGenerator {
        responses: Mutex<Vec<Result<String, ()>>>,
        pub calls: Mutex<u32>,
    }

    impl ScriptedGenerator {
        pub fn new(responses: Vec<Result<String, ()>>) -> Self {
            let mut responses = responses;
            responses.reverse();
            Self {
                responses: Mutex::new(responses),
                calls: Mutex::new(0),
            }
        }

        pub fn always(text: &str) -> Self {
            Self::new(vec![Ok(text.to_string())])
        }

        pub fn call_count(&self) -> u32 {
            *self.calls.lock().unwrap()
        }
    }

    #[async_trait]
    impl StructuredGenerator for ScriptedGenerator {
        async fn complete(&self, _prompt: &str, _system: &str) -> Result<String, LlmError> {
            *self.calls.lock().unwrap() += 1;
            let mut responses = self.responses.lock().unwrap();
            let next = if responses.len() > 1 {
                responses.pop().unwrap()
            } else {
                responses.last().cloned().unwrap_or(Err(()))
            };
            next.map_err(|_| LlmError::Api {
                status: 401,
                message: "invalid api key".to_string(),
            })
        }
    }

    const GOOD_COACHING: &str = r#"{"additional_coaching_tips": ["Review your notes every Friday and write down one thing that surprised you."]}"#;

    #[test]
    fn test_strip_json_fences_with_json_tag() {
        let input = "```json\n{\"key\": \"value\"}\n```";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_strip_json_fences_without_tag() {
        let input = "```\n{\"key\": \"value\"}\n```";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_strip_json_fences_no_fences() {
        let input = "{\"key\": \"value\"}";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_parse_candidate_rejects_invalid_json() {
        let result = parse_candidate::<CoachingEnhancement>("not json at all");
        assert!(matches!(result, Err(Malformed::Json(_))));
    }

    #[test]
    fn test_parse_candidate_rejects_schema_violation() {
        // Parses as JSON but fails semantic validation (empty tip list).
        let result = parse_candidate::<CoachingEnhancement>(r#"{"additional_coaching_tips": []}"#);
        assert!(matches!(result, Err(Malformed::Schema(_))));
    }

    #[test]
    fn test_parse_candidate_accepts_fenced_output() {
        let fenced = format!("```json\n{GOOD_COACHING}\n```");
        let result = parse_candidate::<CoachingEnhancement>(&fenced);
        assert!(result.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_generate_retries_malformed_then_succeeds() {
        let generator = ScriptedGenerator::new(vec![
            Ok("garbage".to_string()),
            Ok(r#"{"additional_coaching_tips": []}"#.to_string()),
            Ok(GOOD_COACHING.to_string()),
        ]);

        let result = generate::<CoachingEnhancement>(&generator, "prompt", 3).await;
        assert!(result.is_ok());
        assert_eq!(generator.call_count(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_generate_exhausts_retries_on_persistent_garbage() {
        let generator = ScriptedGenerator::always("garbage");

        let result = generate::<CoachingEnhancement>(&generator, "prompt", 3).await;
        assert!(matches!(
            result,
            Err(GenerationFailure::RetriesExhausted { attempts: 3 })
        ));
        assert_eq!(generator.call_count(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_generate_aborts_immediately_on_transport_error() {
        let generator = ScriptedGenerator::new(vec![Err(())]);

        let result = generate::<CoachingEnhancement>(&generator, "prompt", 3).await;
        assert!(matches!(result, Err(GenerationFailure::Transport(_))));
        assert_eq!(generator.call_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_generate_backoff_doubles_between_attempts() {
        let generator = ScriptedGenerator::always("garbage");

        let started = tokio::time::Instant::now();
        let _ = generate::<CoachingEnhancement>(&generator, "prompt", 3).await;
        // 3 attempts → sleeps of 1s and 2s between them.
        assert_eq!(started.elapsed(), std::time::Duration::from_secs(3));
    }

    #[test]
    fn test_schema_system_prompt_names_schema_and_version() {
        let system = schema_system_prompt::<CoachingEnhancement>();
        assert!(system.contains(CoachingEnhancement::NAME));
        assert!(system.contains("version"));
    }
}
