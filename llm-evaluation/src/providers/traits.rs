//! Provider trait definitions for text-generation backends

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A message in a conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: String,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }
}

/// Static descriptor of a provider, as printed by the model catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelInfo {
    pub name: String,
    pub requires_api_key: bool,
    pub available_models: Vec<String>,
    pub description: String,
}

impl ModelInfo {
    pub fn new(
        name: impl Into<String>,
        requires_api_key: bool,
        available_models: &[&str],
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            requires_api_key,
            available_models: available_models.iter().map(|m| m.to_string()).collect(),
            description: description.into(),
        }
    }
}

/// Request for a completion from a provider
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<Message>,
    pub max_tokens: u32,
    pub temperature: Option<f32>,
    pub system_prompt: Option<String>,
    /// Structured-output constraint; only honoured by providers that support it
    pub response_format: Option<serde_json::Value>,
}

impl CompletionRequest {
    pub fn new(model: impl Into<String>, messages: Vec<Message>, max_tokens: u32) -> Self {
        Self {
            model: model.into(),
            messages,
            max_tokens,
            temperature: None,
            system_prompt: None,
            response_format: None,
        }
    }

    pub fn with_temperature(mut self, temp: f32) -> Self {
        self.temperature = Some(temp);
        self
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system_prompt = Some(system.into());
        self
    }

    pub fn with_response_format(mut self, format: serde_json::Value) -> Self {
        self.response_format = Some(format);
        self
    }
}

/// Response from a provider
#[derive(Debug, Clone)]
pub struct CompletionResponse {
    pub content: String,
    pub model: String,
    pub input_tokens: u32,
    pub output_tokens: u32,
    pub finish_reason: String,
    pub latency_ms: u64,
}

impl CompletionResponse {
    /// One-line usage report for debug logs
    pub fn usage_summary(&self) -> String {
        format!(
            "model={} input_tokens={} output_tokens={} finish_reason={} latency={}ms",
            self.model, self.input_tokens, self.output_tokens, self.finish_reason, self.latency_ms
        )
    }
}

/// Error types for provider operations
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("{provider} requires an API key")]
    MissingApiKey { provider: String },

    #[error("Unknown implementation: {0}")]
    UnknownImplementation(String),

    #[error("Timeout after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type ProviderResult<T> = Result<T, ProviderError>;

/// Default output budget for generation requests
pub const DEFAULT_MAX_TOKENS: u32 = 4096;

/// Trait for text-generation providers
#[async_trait]
pub trait LLMProvider: Send + Sync {
    /// Catalog descriptor for this provider
    fn info(&self) -> &ModelInfo;

    /// Display name (e.g., "OpenAI", "Anthropic", "Google AI")
    fn name(&self) -> &str {
        &self.info().name
    }

    /// Send a completion request using the given credential
    async fn complete(
        &self,
        api_key: Option<&str>,
        request: &CompletionRequest,
    ) -> ProviderResult<CompletionResponse>;

    /// Output budget used by [`LLMProvider::generate`]
    fn max_tokens(&self) -> u32 {
        DEFAULT_MAX_TOKENS
    }

    /// Generate one response text for a user prompt.
    ///
    /// Sampling temperature is fixed at 0 so repeated runs stay comparable.
    async fn generate(
        &self,
        api_key: Option<&str>,
        system_prompt: Option<&str>,
        user_prompt: &str,
        model: &str,
    ) -> ProviderResult<String> {
        let api_key = api_key.filter(|k| !k.is_empty());
        if self.info().requires_api_key && api_key.is_none() {
            return Err(ProviderError::MissingApiKey {
                provider: self.name().to_string(),
            });
        }

        let mut request =
            CompletionRequest::new(model, vec![Message::user(user_prompt)], self.max_tokens())
                .with_temperature(0.0);
        if let Some(system) = system_prompt.filter(|s| !s.is_empty()) {
            request = request.with_system(system);
        }

        let response = self.complete(api_key, &request).await?;
        tracing::debug!("{} generation: {}", self.name(), response.usage_summary());
        Ok(response.content)
    }
}

/// Resolve a credential that has already passed the requirement check
pub(crate) fn require_key<'a>(provider: &str, api_key: Option<&'a str>) -> ProviderResult<&'a str> {
    api_key
        .filter(|k| !k.is_empty())
        .ok_or_else(|| ProviderError::MissingApiKey {
            provider: provider.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct RecordingProvider {
        info: ModelInfo,
        seen: Mutex<Vec<CompletionRequest>>,
    }

    impl RecordingProvider {
        fn new(requires_api_key: bool) -> Self {
            Self {
                info: ModelInfo::new("Recording", requires_api_key, &["rec-1"], "test"),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl LLMProvider for RecordingProvider {
        fn info(&self) -> &ModelInfo {
            &self.info
        }

        async fn complete(
            &self,
            _api_key: Option<&str>,
            request: &CompletionRequest,
        ) -> ProviderResult<CompletionResponse> {
            self.seen.lock().unwrap().push(request.clone());
            Ok(CompletionResponse {
                content: "generated".to_string(),
                model: request.model.clone(),
                input_tokens: 1,
                output_tokens: 1,
                finish_reason: "stop".to_string(),
                latency_ms: 0,
            })
        }
    }

    #[tokio::test]
    async fn test_generate_requires_key() {
        let provider = RecordingProvider::new(true);
        let err = provider.generate(None, None, "hi", "rec-1").await.unwrap_err();
        assert_eq!(err.to_string(), "Recording requires an API key");

        let err = provider.generate(Some(""), None, "hi", "rec-1").await.unwrap_err();
        assert!(matches!(err, ProviderError::MissingApiKey { .. }));
        assert!(provider.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_generate_builds_deterministic_request() {
        let provider = RecordingProvider::new(true);
        let text = provider
            .generate(Some("key"), Some("be brief"), "hello", "rec-1")
            .await
            .unwrap();
        assert_eq!(text, "generated");

        let seen = provider.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].model, "rec-1");
        assert_eq!(seen[0].temperature, Some(0.0));
        assert_eq!(seen[0].system_prompt.as_deref(), Some("be brief"));
        assert_eq!(seen[0].messages, vec![Message::user("hello")]);
    }

    #[test]
    fn test_usage_summary() {
        let response = CompletionResponse {
            content: "hi".to_string(),
            model: "rec-1".to_string(),
            input_tokens: 12,
            output_tokens: 3,
            finish_reason: "stop".to_string(),
            latency_ms: 250,
        };
        assert_eq!(
            response.usage_summary(),
            "model=rec-1 input_tokens=12 output_tokens=3 finish_reason=stop latency=250ms"
        );
    }

    #[tokio::test]
    async fn test_generate_without_key_requirement() {
        let provider = RecordingProvider::new(false);
        let text = provider.generate(None, Some(""), "hello", "rec-1").await.unwrap();
        assert_eq!(text, "generated");
        assert!(provider.seen.lock().unwrap()[0].system_prompt.is_none());
    }
}
