//! Method dispatch for response evaluation
//!
//! [`ResponseEvaluator::evaluate`] runs every requested method against one
//! (question, response, reference) triple. Methods are isolated from each
//! other: an unknown name or a failing judge produces a zero-score entry
//! for that method only.

use indexmap::IndexMap;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::analysis::{calculate_bleu, calculate_meteor, calculate_rouge, RougeScore};
use crate::judge::{AttributeScore, JudgeError, LlmJudge};

pub const UNSUPPORTED_METHOD: &str = "Unsupported evaluation method";

/// Supported evaluation methods
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EvaluationMethod {
    Bleu,
    Rouge,
    Meteor,
    LlmJudge,
}

impl EvaluationMethod {
    pub const ALL: [EvaluationMethod; 4] = [
        EvaluationMethod::Bleu,
        EvaluationMethod::Rouge,
        EvaluationMethod::Meteor,
        EvaluationMethod::LlmJudge,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EvaluationMethod::Bleu => "BLEU",
            EvaluationMethod::Rouge => "ROUGE",
            EvaluationMethod::Meteor => "METEOR",
            EvaluationMethod::LlmJudge => "LLM_JUDGE",
        }
    }
}

impl fmt::Display for EvaluationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EvaluationMethod {
    type Err = String;

    /// Method names are matched exactly
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| UNSUPPORTED_METHOD.to_string())
    }
}

/// Prompt, generated answer and reference shown alongside a judgment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JudgeResponses {
    pub input: String,
    pub llm_response: String,
    pub reference_response: String,
}

/// Method-specific diagnostic data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MethodDetails {
    Tokens {
        method: String,
        reference_tokens: Vec<String>,
        response_tokens: Vec<String>,
    },
    Rouge {
        method: String,
        rouge1: RougeScore,
        rouge2: RougeScore,
        #[serde(rename = "rougeL")]
        rouge_l: RougeScore,
    },
    Judge {
        attributes: IndexMap<String, AttributeScore>,
        responses: JudgeResponses,
    },
    Error {
        method: String,
        error: String,
    },
}

/// Outcome of one evaluation method
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MethodResult {
    pub score: f64,
    /// Generated text, attached by the runner to non-judge results
    #[serde(default)]
    pub model_response: Option<String>,
    pub details: MethodDetails,
}

impl MethodResult {
    pub fn error(method: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            score: 0.0,
            model_response: None,
            details: MethodDetails::Error {
                method: method.into(),
                error: error.into(),
            },
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self.details, MethodDetails::Error { .. })
    }

    pub fn is_judgment(&self) -> bool {
        matches!(self.details, MethodDetails::Judge { .. })
    }
}

impl Serialize for MethodResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let len = if self.model_response.is_some() { 3 } else { 2 };
        let mut map = serializer.serialize_map(Some(len))?;
        // Failed methods report an integral zero
        if self.is_error() {
            map.serialize_entry("score", &0)?;
        } else {
            map.serialize_entry("score", &self.score)?;
        }
        if let Some(response) = &self.model_response {
            map.serialize_entry("model_response", response)?;
        }
        map.serialize_entry("details", &self.details)?;
        map.end()
    }
}

/// Scores responses with lexical metrics and, when configured, an LLM judge
#[derive(Default)]
pub struct ResponseEvaluator {
    judge: Option<LlmJudge>,
}

impl ResponseEvaluator {
    /// Evaluator without a judge; `LLM_JUDGE` requests report an error
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_judge(mut self, judge: LlmJudge) -> Self {
        self.judge = Some(judge);
        self
    }

    pub fn has_judge(&self) -> bool {
        self.judge.is_some()
    }

    pub fn bleu(reference: &str, response: &str) -> MethodResult {
        let bleu = calculate_bleu(reference, response);
        MethodResult {
            score: bleu.score,
            model_response: None,
            details: MethodDetails::Tokens {
                method: EvaluationMethod::Bleu.to_string(),
                reference_tokens: bleu.reference_tokens,
                response_tokens: bleu.response_tokens,
            },
        }
    }

    /// Reported score is the ROUGE-L F-measure
    pub fn rouge(reference: &str, response: &str) -> MethodResult {
        let scores = calculate_rouge(reference, response);
        MethodResult {
            score: scores.rouge_l.fmeasure,
            model_response: None,
            details: MethodDetails::Rouge {
                method: EvaluationMethod::Rouge.to_string(),
                rouge1: scores.rouge1,
                rouge2: scores.rouge2,
                rouge_l: scores.rouge_l,
            },
        }
    }

    pub fn meteor(reference: &str, response: &str) -> MethodResult {
        let meteor = calculate_meteor(reference, response);
        MethodResult {
            score: meteor.score,
            model_response: None,
            details: MethodDetails::Tokens {
                method: EvaluationMethod::Meteor.to_string(),
                reference_tokens: meteor.reference_tokens,
                response_tokens: meteor.response_tokens,
            },
        }
    }

    /// Full judgment reshaped into a method result
    pub async fn llm_judge(
        judge: &LlmJudge,
        question: &str,
        response: &str,
        reference: &str,
        context: Option<&str>,
    ) -> Result<MethodResult, JudgeError> {
        let result = judge.judge(question, response, reference, context).await?;

        let attributes = result
            .attributes()
            .into_iter()
            .map(|(attr, score)| (attr.to_string(), score.clone()))
            .collect();

        Ok(MethodResult {
            score: result.overall_score,
            model_response: None,
            details: MethodDetails::Judge {
                attributes,
                responses: JudgeResponses {
                    input: question.to_string(),
                    llm_response: response.to_string(),
                    reference_response: reference.to_string(),
                },
            },
        })
    }

    /// Run one method, converting every failure into an error entry
    pub async fn evaluate_method(
        &self,
        method: &str,
        question: &str,
        response: &str,
        reference: &str,
        context: Option<&str>,
    ) -> MethodResult {
        let parsed = match method.parse::<EvaluationMethod>() {
            Ok(parsed) => parsed,
            Err(error) => return MethodResult::error(method, error),
        };

        match parsed {
            EvaluationMethod::Bleu => Self::bleu(reference, response),
            EvaluationMethod::Rouge => Self::rouge(reference, response),
            EvaluationMethod::Meteor => Self::meteor(reference, response),
            EvaluationMethod::LlmJudge => {
                let Some(judge) = &self.judge else {
                    return MethodResult::error(method, "LLM judge is not configured");
                };
                match Self::llm_judge(judge, question, response, reference, context).await {
                    Ok(result) => result,
                    Err(e) => {
                        tracing::warn!("{} failed: {}", method, e);
                        MethodResult::error(method, e.to_string())
                    }
                }
            }
        }
    }

    /// Evaluate with every requested method, keyed by method name in
    /// request order. A repeated name keeps its first position and the
    /// last result.
    pub async fn evaluate(
        &self,
        question: &str,
        response: &str,
        reference: &str,
        methods: &[String],
        context: Option<&str>,
    ) -> IndexMap<String, MethodResult> {
        let mut results = IndexMap::new();

        for method in methods {
            tracing::debug!("Method: {}", method);
            let result = self
                .evaluate_method(method, question, response, reference, context)
                .await;
            results.insert(method.clone(), result);
        }

        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::{
        CompletionRequest, CompletionResponse, LLMProvider, ModelInfo, ProviderError,
        ProviderResult,
    };
    use async_trait::async_trait;
    use std::sync::Arc;

    struct FixedJudge {
        info: ModelInfo,
        content: Option<&'static str>,
    }

    #[async_trait]
    impl LLMProvider for FixedJudge {
        fn info(&self) -> &ModelInfo {
            &self.info
        }

        async fn complete(
            &self,
            _api_key: Option<&str>,
            request: &CompletionRequest,
        ) -> ProviderResult<CompletionResponse> {
            let content = self.content.ok_or(ProviderError::Api {
                status: 503,
                message: "overloaded".to_string(),
            })?;
            Ok(CompletionResponse {
                content: content.to_string(),
                model: request.model.clone(),
                input_tokens: 0,
                output_tokens: 0,
                finish_reason: "stop".to_string(),
                latency_ms: 0,
            })
        }
    }

    fn judge(content: Option<&'static str>) -> LlmJudge {
        let provider = FixedJudge {
            info: ModelInfo::new("Fixed", true, &["judge"], "test"),
            content,
        };
        LlmJudge::new(Arc::new(provider), "key", "judge")
    }

    fn methods(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_method_names() {
        assert_eq!("BLEU".parse::<EvaluationMethod>(), Ok(EvaluationMethod::Bleu));
        assert_eq!("LLM_JUDGE".parse::<EvaluationMethod>(), Ok(EvaluationMethod::LlmJudge));
        assert!("bleu".parse::<EvaluationMethod>().is_err());
    }

    #[tokio::test]
    async fn test_unsupported_method() {
        let evaluator = ResponseEvaluator::new();
        let results = evaluator
            .evaluate("Q", "R", "Ref", &methods(&["NOT_A_METHOD"]), None)
            .await;

        let json = serde_json::to_value(&results).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "NOT_A_METHOD": {
                    "score": 0,
                    "details": {"method": "NOT_A_METHOD", "error": "Unsupported evaluation method"}
                }
            })
        );
    }

    #[tokio::test]
    async fn test_identical_text_scores() {
        let evaluator = ResponseEvaluator::new();
        let text = "The cat sat on the mat.";
        let results = evaluator
            .evaluate("Q", text, text, &methods(&["BLEU", "ROUGE", "METEOR"]), None)
            .await;

        assert_eq!(results.keys().collect::<Vec<_>>(), vec!["BLEU", "ROUGE", "METEOR"]);
        assert!((results["BLEU"].score - 1.0).abs() < 1e-9);
        assert!((results["ROUGE"].score - 1.0).abs() < 1e-9);
        assert!(results["METEOR"].score > 0.99);

        let rouge = serde_json::to_value(&results["ROUGE"]).unwrap();
        assert_eq!(rouge["details"]["method"], "ROUGE");
        assert_eq!(rouge["details"]["rouge2"]["fmeasure"], 1.0);
        assert_eq!(rouge["details"]["rougeL"]["recall"], 1.0);
        assert!(rouge.get("model_response").is_none());

        let bleu = serde_json::to_value(&results["BLEU"]).unwrap();
        assert_eq!(bleu["details"]["reference_tokens"][0], "the");
        assert_eq!(bleu["details"]["reference_tokens"][6], ".");
    }

    #[tokio::test]
    async fn test_judge_not_configured() {
        let evaluator = ResponseEvaluator::new();
        let results = evaluator
            .evaluate("Q", "R", "Ref", &methods(&["LLM_JUDGE", "BLEU"]), None)
            .await;
        assert!(results["LLM_JUDGE"].is_error());
        assert!(!results["BLEU"].is_error());
    }

    #[tokio::test]
    async fn test_judge_result_shape() {
        let evaluator = ResponseEvaluator::new()
            .with_judge(judge(Some(r#"{"score": 0.7, "explanation": "fair"}"#)));
        let results = evaluator
            .evaluate("Q", "R", "Ref", &methods(&["LLM_JUDGE"]), None)
            .await;

        let result = &results["LLM_JUDGE"];
        assert!(result.is_judgment());
        assert!((result.score - 0.7).abs() < 1e-9);

        let json = serde_json::to_value(result).unwrap();
        let attributes = json["details"]["attributes"].as_object().unwrap();
        assert_eq!(attributes.len(), 7);
        assert_eq!(attributes.keys().next().unwrap(), "accuracy");
        assert_eq!(json["details"]["attributes"]["ethical_considerations"]["explanation"], "fair");
        assert_eq!(json["details"]["responses"]["input"], "Q");
        assert_eq!(json["details"]["responses"]["llm_response"], "R");
        assert_eq!(json["details"]["responses"]["reference_response"], "Ref");
    }

    #[tokio::test]
    async fn test_judge_context_attribute_reported() {
        let evaluator = ResponseEvaluator::new()
            .with_judge(judge(Some(r#"{"score": 1.0, "explanation": "ok"}"#)));
        let results = evaluator
            .evaluate("Q", "R", "Ref", &methods(&["LLM_JUDGE"]), Some("ctx"))
            .await;

        let MethodDetails::Judge { attributes, .. } = &results["LLM_JUDGE"].details else {
            panic!("expected a judgment");
        };
        assert_eq!(attributes.len(), 8);
        assert!(attributes.contains_key("context_adherence"));
    }

    #[tokio::test]
    async fn test_judge_failure_is_isolated() {
        let evaluator = ResponseEvaluator::new().with_judge(judge(None));
        let results = evaluator
            .evaluate("Q", "same", "same", &methods(&["LLM_JUDGE", "ROUGE"]), None)
            .await;

        let failed = serde_json::to_value(&results["LLM_JUDGE"]).unwrap();
        assert_eq!(failed["score"], 0);
        assert_eq!(failed["details"]["method"], "LLM_JUDGE");
        assert!(failed["details"]["error"].as_str().unwrap().contains("overloaded"));
        assert!((results["ROUGE"].score - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_method_result_round_trips_through_json() {
        let original = ResponseEvaluator::rouge("a b c", "a b d");
        let json = serde_json::to_string(&original).unwrap();
        let parsed: MethodResult = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, original);
    }
}
