//! OpenAI chat-completions client

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use super::traits::{
    require_key, CompletionRequest, CompletionResponse, LLMProvider, Message, ModelInfo,
    ProviderError, ProviderResult, DEFAULT_MAX_TOKENS,
};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// OpenAI API client
pub struct OpenAIClient {
    base_url: String,
    http_client: Client,
    info: ModelInfo,
    max_tokens: u32,
}

impl OpenAIClient {
    pub fn new() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            http_client: Client::new(),
            info: Self::catalog_entry(),
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }

    /// Built-in catalog descriptor
    pub fn catalog_entry() -> ModelInfo {
        ModelInfo::new(
            "OpenAI",
            true,
            &["gpt-4o", "gpt-4o-mini", "gpt-4", "gpt-3.5-turbo"],
            "OpenAI's ChatGPT models",
        )
    }

    /// Set custom base URL
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Replace the advertised model list
    pub fn with_available_models(mut self, models: Vec<String>) -> Self {
        self.info.available_models = models;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}

impl Default for OpenAIClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Reasoning models (o1, o3) reject the temperature parameter
fn is_reasoning_model(model: &str) -> bool {
    model.starts_with("o1") || model.starts_with("o3")
}

#[derive(Serialize)]
struct OpenAIRequest {
    model: String,
    messages: Vec<OpenAIMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_completion_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<serde_json::Value>,
}

#[derive(Serialize, Deserialize)]
struct OpenAIMessage {
    role: String,
    #[serde(default)]
    content: Option<String>,
}

impl From<&Message> for OpenAIMessage {
    fn from(msg: &Message) -> Self {
        Self {
            role: msg.role.clone(),
            content: Some(msg.content.clone()),
        }
    }
}

#[derive(Deserialize)]
struct OpenAIResponse {
    choices: Vec<Choice>,
    model: String,
    #[serde(default)]
    usage: Option<OpenAIUsage>,
}

#[derive(Deserialize)]
struct Choice {
    message: OpenAIMessage,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct OpenAIUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

#[derive(Deserialize)]
struct OpenAIError {
    error: OpenAIErrorDetail,
}

#[derive(Deserialize)]
struct OpenAIErrorDetail {
    message: String,
}

#[async_trait]
impl LLMProvider for OpenAIClient {
    fn info(&self) -> &ModelInfo {
        &self.info
    }

    fn max_tokens(&self) -> u32 {
        self.max_tokens
    }

    async fn complete(
        &self,
        api_key: Option<&str>,
        request: &CompletionRequest,
    ) -> ProviderResult<CompletionResponse> {
        let api_key = require_key(self.name(), api_key)?;
        let start = Instant::now();

        let mut messages: Vec<OpenAIMessage> = Vec::new();
        if let Some(system) = &request.system_prompt {
            messages.push(OpenAIMessage::from(&Message::system(system.clone())));
        }
        for msg in &request.messages {
            messages.push(msg.into());
        }

        let reasoning = is_reasoning_model(&request.model);
        let body = OpenAIRequest {
            model: request.model.clone(),
            messages,
            // Reasoning models take max_completion_tokens instead of max_tokens
            max_tokens: (!reasoning).then_some(request.max_tokens),
            max_completion_tokens: reasoning.then_some(request.max_tokens),
            temperature: if reasoning { None } else { request.temperature },
            response_format: request.response_format.clone(),
        };

        tracing::debug!("OpenAI request: model={}", body.model);

        let response = self
            .http_client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let latency_ms = start.elapsed().as_millis() as u64;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = match serde_json::from_str::<OpenAIError>(&body) {
                Ok(error) => error.error.message,
                Err(_) => format!("HTTP {}: {}", status.as_u16(), body),
            };

            if status == 401 || status == 403 {
                return Err(ProviderError::Config(format!(
                    "OpenAI auth error ({}): {}",
                    status.as_u16(),
                    message
                )));
            }

            return Err(ProviderError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let api_response: OpenAIResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Parse(e.to_string()))?;

        let choice = api_response
            .choices
            .first()
            .ok_or_else(|| ProviderError::Parse("No choices in response".to_string()))?;

        let content = choice
            .message
            .content
            .clone()
            .ok_or_else(|| ProviderError::Parse("Empty message content".to_string()))?;

        let (input_tokens, output_tokens) = api_response
            .usage
            .map(|u| (u.prompt_tokens, u.completion_tokens))
            .unwrap_or((0, 0));

        Ok(CompletionResponse {
            content,
            model: api_response.model,
            input_tokens,
            output_tokens,
            finish_reason: choice
                .finish_reason
                .clone()
                .unwrap_or_else(|| "unknown".to_string()),
            latency_ms,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::{matchers, Mock, MockServer, ResponseTemplate};

    fn chat_response(content: &str) -> serde_json::Value {
        serde_json::json!({
            "model": "gpt-4o-mini",
            "choices": [{
                "message": {"role": "assistant", "content": content},
                "finish_reason": "stop"
            }],
            "usage": {"prompt_tokens": 12, "completion_tokens": 3}
        })
    }

    #[tokio::test]
    async fn test_generate_sends_system_and_user_messages() {
        let mock_server = MockServer::start().await;

        Mock::given(matchers::method("POST"))
            .and(matchers::path("/chat/completions"))
            .and(matchers::header("authorization", "Bearer test-key"))
            .and(matchers::body_partial_json(serde_json::json!({
                "model": "gpt-4o-mini",
                "temperature": 0.0,
                "max_tokens": 4096,
                "messages": [
                    {"role": "system", "content": "You are terse."},
                    {"role": "user", "content": "Capital of France?"}
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(chat_response("Paris")))
            .mount(&mock_server)
            .await;

        let client = OpenAIClient::new().with_base_url(mock_server.uri());
        let text = client
            .generate(
                Some("test-key"),
                Some("You are terse."),
                "Capital of France?",
                "gpt-4o-mini",
            )
            .await
            .unwrap();

        assert_eq!(text, "Paris");
    }

    #[tokio::test]
    async fn test_reasoning_model_omits_temperature() {
        let mock_server = MockServer::start().await;

        Mock::given(matchers::method("POST"))
            .and(matchers::path("/chat/completions"))
            .and(matchers::body_partial_json(serde_json::json!({
                "model": "o3-mini",
                "max_completion_tokens": 4096
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(chat_response("ok")))
            .mount(&mock_server)
            .await;

        let client = OpenAIClient::new().with_base_url(mock_server.uri());
        let request = CompletionRequest::new("o3-mini", vec![Message::user("hi")], 4096)
            .with_temperature(0.0);
        let response = client.complete(Some("k"), &request).await.unwrap();

        assert_eq!(response.content, "ok");
        let received = mock_server.received_requests().await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&received[0].body).unwrap();
        assert!(body.get("temperature").is_none());
        assert!(body.get("max_tokens").is_none());
    }

    #[tokio::test]
    async fn test_api_error_is_reported() {
        let mock_server = MockServer::start().await;

        Mock::given(matchers::method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_json(serde_json::json!({
                "error": {"message": "Rate limit exceeded", "type": "rate_limit_error"}
            })))
            .mount(&mock_server)
            .await;

        let client = OpenAIClient::new().with_base_url(mock_server.uri());
        let err = client
            .generate(Some("k"), None, "hi", "gpt-4o")
            .await
            .unwrap_err();

        match err {
            ProviderError::Api { status, message } => {
                assert_eq!(status, 429);
                assert_eq!(message, "Rate limit exceeded");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_auth_error_is_config_error() {
        let mock_server = MockServer::start().await;

        Mock::given(matchers::method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("nope"))
            .mount(&mock_server)
            .await;

        let client = OpenAIClient::new().with_base_url(mock_server.uri());
        let err = client
            .generate(Some("bad"), None, "hi", "gpt-4o")
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Config(_)));
        assert!(err.to_string().contains("401"));
    }

    #[tokio::test]
    async fn test_missing_key_fails_before_request() {
        let client = OpenAIClient::new().with_base_url("http://127.0.0.1:9");
        let err = client.generate(None, None, "hi", "gpt-4o").await.unwrap_err();
        assert_eq!(err.to_string(), "OpenAI requires an API key");
    }

    #[test]
    fn test_catalog_entry() {
        let info = OpenAIClient::catalog_entry();
        assert_eq!(info.name, "OpenAI");
        assert!(info.requires_api_key);
        assert!(info.available_models.contains(&"gpt-4o".to_string()));
    }
}
