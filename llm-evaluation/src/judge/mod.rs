//! LLM-as-judge scoring
//!
//! A judge model rates a response on seven fixed attributes (eight when
//! grounding context is supplied). Each attribute is a separate request
//! with its own rubric as the system instruction, and the reply is
//! constrained to a `{score, explanation}` object. The attribute scores
//! are combined through [`ScoringRubric`] into an overall score.

pub mod prompts;
pub mod rubric;
pub mod types;

pub use rubric::{CriterionScore, QualityCriterion, RubricScore, ScoringRubric};
pub use types::{Attribute, AttributeScore, EvaluationResult};

use std::sync::Arc;

use crate::config::{Config, EnvConfig};
use crate::providers::{CompletionRequest, LLMProvider, Message, OpenAIClient, ProviderError};

/// Output budget for one attribute judgment
const JUDGE_MAX_TOKENS: u32 = 1024;

/// Judge errors
#[derive(Debug, thiserror::Error)]
pub enum JudgeError {
    #[error("Judge request for {attribute} failed: {source}")]
    Provider {
        attribute: Attribute,
        #[source]
        source: ProviderError,
    },

    #[error("Malformed {attribute} judgment: {message}")]
    MalformedOutput { attribute: Attribute, message: String },
}

/// Structured-output constraint for a single attribute judgment
pub fn attribute_score_format() -> serde_json::Value {
    serde_json::json!({
        "type": "json_schema",
        "json_schema": {
            "name": "AttributeScore",
            "strict": true,
            "schema": {
                "type": "object",
                "properties": {
                    "score": {"type": "number"},
                    "explanation": {"type": "string"}
                },
                "required": ["score", "explanation"],
                "additionalProperties": false
            }
        }
    })
}

/// Scores responses with a judge model
pub struct LlmJudge {
    provider: Arc<dyn LLMProvider>,
    api_key: String,
    model: String,
}

impl LlmJudge {
    pub fn new(
        provider: Arc<dyn LLMProvider>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            api_key: api_key.into(),
            model: model.into(),
        }
    }

    /// OpenAI-backed judge using the environment credential. The endpoint
    /// is `[judge].base_url`, else `[providers.openai].base_url`.
    pub fn from_config(env: &EnvConfig, config: &Config) -> Self {
        let base_url = config.judge.base_url.clone().or_else(|| {
            config
                .get_provider("openai")
                .and_then(|pc| pc.base_url.clone())
        });

        let mut client = OpenAIClient::new();
        if let Some(url) = base_url {
            client = client.with_base_url(url);
        }

        Self::new(Arc::new(client), env.api_key.clone(), env.judge_model(config))
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Judge one attribute
    pub async fn judge_attribute(
        &self,
        attribute: Attribute,
        question: &str,
        response: &str,
        reference: &str,
        context: Option<&str>,
    ) -> Result<AttributeScore, JudgeError> {
        let user_prompt = prompts::build_user_prompt(question, response, reference, context);
        let request = CompletionRequest::new(
            self.model.clone(),
            vec![Message::user(user_prompt)],
            JUDGE_MAX_TOKENS,
        )
        .with_system(prompts::rubric_for(attribute))
        .with_temperature(0.0)
        .with_response_format(attribute_score_format());

        let completion = self
            .provider
            .complete(Some(&self.api_key), &request)
            .await
            .map_err(|source| JudgeError::Provider { attribute, source })?;
        tracing::debug!("Judged {}: {}", attribute, completion.usage_summary());

        let judged: AttributeScore = serde_json::from_str(completion.content.trim()).map_err(|e| {
            JudgeError::MalformedOutput {
                attribute,
                message: e.to_string(),
            }
        })?;

        if !(0.0..=1.0).contains(&judged.score) {
            tracing::warn!(
                "Judge returned out-of-range {} score {}; keeping it as given",
                attribute,
                judged.score
            );
        }

        tracing::debug!("{}: {:.3}", attribute, judged.score);
        Ok(judged)
    }

    /// Judge every attribute and combine them into an overall score.
    ///
    /// Requests run one at a time in rubric order; the first failure aborts
    /// the judgment.
    pub async fn judge(
        &self,
        question: &str,
        response: &str,
        reference: &str,
        context: Option<&str>,
    ) -> Result<EvaluationResult, JudgeError> {
        let context = context.filter(|c| !c.trim().is_empty());

        let mut scores = Vec::with_capacity(Attribute::BASE.len());
        for attribute in Attribute::BASE {
            let score = self
                .judge_attribute(attribute, question, response, reference, None)
                .await?;
            scores.push(score);
        }

        let context_adherence = match context {
            Some(ctx) => Some(
                self.judge_attribute(
                    Attribute::ContextAdherence,
                    question,
                    response,
                    reference,
                    Some(ctx),
                )
                .await?,
            ),
            None => None,
        };

        let mut weighted: Vec<(Attribute, f64)> = Attribute::BASE
            .iter()
            .zip(&scores)
            .map(|(attr, s)| (*attr, s.score))
            .collect();
        if let Some(ctx) = &context_adherence {
            weighted.push((Attribute::ContextAdherence, ctx.score));
        }
        let overall_score = ScoringRubric::for_context(context.is_some())
            .evaluate(&weighted)
            .composite_score;

        let [accuracy, relevance, coherence, ethical_considerations, professionalism, reasoning, creativity]: [AttributeScore; 7] =
            scores.try_into().map_err(|_| JudgeError::MalformedOutput {
                attribute: Attribute::Accuracy,
                message: "incomplete attribute set".to_string(),
            })?;

        Ok(EvaluationResult {
            accuracy,
            relevance,
            coherence,
            ethical_considerations,
            professionalism,
            reasoning,
            creativity,
            context_adherence,
            overall_score,
        })
    }
}
