//! Text-generation provider implementations and the provider registry

pub mod anthropic;
pub mod gemini;
pub mod openai;
pub mod traits;

pub use anthropic::AnthropicClient;
pub use gemini::GeminiClient;
pub use openai::OpenAIClient;
pub use traits::{
    CompletionRequest, CompletionResponse, LLMProvider, Message, ModelInfo, ProviderError,
    ProviderResult,
};

use crate::config::{Config, ProviderConfig};
use std::sync::Arc;

/// Enum to hold any provider type
pub enum Provider {
    OpenAI(OpenAIClient),
    Anthropic(AnthropicClient),
    Gemini(GeminiClient),
}

impl Provider {
    /// Config key for each provider
    pub const KEYS: [&'static str; 3] = ["openai", "anthropic", "gemini"];

    /// Resolve a display name or alias to its config key
    pub fn key_for(name: &str) -> Option<&'static str> {
        match name.trim().to_lowercase().as_str() {
            "openai" | "gpt" => Some("openai"),
            "anthropic" | "claude" => Some("anthropic"),
            "google ai" | "google" | "gemini" => Some("gemini"),
            _ => None,
        }
    }

    /// Build a provider by config key, applying settings from config
    fn from_key(key: &str, config: &Config) -> ProviderResult<Self> {
        let settings = config.get_provider(key).cloned().unwrap_or_default();
        match key {
            "openai" => Ok(Provider::OpenAI(configure_openai(OpenAIClient::new(), &settings))),
            "anthropic" => Ok(Provider::Anthropic(configure_anthropic(
                AnthropicClient::new(),
                &settings,
            ))),
            "gemini" => Ok(Provider::Gemini(configure_gemini(GeminiClient::new(), &settings))),
            _ => Err(ProviderError::UnknownImplementation(key.to_string())),
        }
    }

    fn into_arc(self) -> Arc<dyn LLMProvider> {
        match self {
            Provider::OpenAI(c) => Arc::new(c),
            Provider::Anthropic(c) => Arc::new(c),
            Provider::Gemini(c) => Arc::new(c),
        }
    }
}

fn configure_openai(mut client: OpenAIClient, pc: &ProviderConfig) -> OpenAIClient {
    if let Some(url) = &pc.base_url {
        client = client.with_base_url(url);
    }
    if !pc.available_models.is_empty() {
        client = client.with_available_models(pc.available_models.clone());
    }
    client.with_max_tokens(pc.max_tokens)
}

fn configure_anthropic(mut client: AnthropicClient, pc: &ProviderConfig) -> AnthropicClient {
    if let Some(url) = &pc.base_url {
        client = client.with_base_url(url);
    }
    if !pc.available_models.is_empty() {
        client = client.with_available_models(pc.available_models.clone());
    }
    client.with_max_tokens(pc.max_tokens)
}

fn configure_gemini(mut client: GeminiClient, pc: &ProviderConfig) -> GeminiClient {
    if let Some(url) = &pc.base_url {
        client = client.with_base_url(url);
    }
    if !pc.available_models.is_empty() {
        client = client.with_available_models(pc.available_models.clone());
    }
    client.with_max_tokens(pc.max_tokens)
}

/// All enabled providers, in catalog order
pub fn available_implementations(config: &Config) -> ProviderResult<Vec<Arc<dyn LLMProvider>>> {
    let mut providers = Vec::new();
    for key in Provider::KEYS {
        if config.get_provider(key).map_or(true, |pc| pc.enabled) {
            providers.push(Provider::from_key(key, config)?.into_arc());
        }
    }
    Ok(providers)
}

/// Catalog of enabled providers, as served to front ends
pub fn models_config(config: &Config) -> ProviderResult<Vec<ModelInfo>> {
    Ok(available_implementations(config)?
        .iter()
        .map(|p| p.info().clone())
        .collect())
}

/// Look up an enabled provider by display name or alias
pub fn find_implementation(name: &str, config: &Config) -> ProviderResult<Arc<dyn LLMProvider>> {
    let key = Provider::key_for(name)
        .filter(|key| config.get_provider(key).map_or(true, |pc| pc.enabled))
        .ok_or_else(|| ProviderError::UnknownImplementation(name.to_string()))?;
    Ok(Provider::from_key(key, config)?.into_arc())
}

/// Generate a response with the named implementation and model
pub async fn generate_model_response(
    implementation_name: &str,
    api_key: Option<&str>,
    system_prompt: Option<&str>,
    user_prompt: &str,
    model: &str,
    config: &Config,
) -> ProviderResult<String> {
    let provider = find_implementation(implementation_name, config)?;
    provider
        .generate(api_key, system_prompt, user_prompt, model)
        .await
}
