//! Response evaluation harness for LLM outputs
//!
//! Given a prompt, a generated response and a reference answer, this crate
//! scores the response with lexical-overlap metrics (BLEU, ROUGE, METEOR)
//! or with a multi-attribute LLM judge. It also routes generation across
//! OpenAI, Anthropic and Google AI behind one provider trait, and runs
//! batches of test cases end to end.
//!
//! # Example
//!
//! ```no_run
//! use llm_evaluation::{
//!     config::{Config, EnvConfig},
//!     evaluator::ResponseEvaluator,
//!     judge::LlmJudge,
//!     runner::TestRunner,
//!     tasks::{BatchRequest, TestCase},
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load_or_default();
//!     let env = EnvConfig::from_env()?;
//!
//!     let evaluator = ResponseEvaluator::new().with_judge(LlmJudge::from_config(&env, &config));
//!     let runner = TestRunner::new(config, evaluator);
//!
//!     let batch = BatchRequest {
//!         test_cases: vec![TestCase::new("1", "What is the capital of France?", "Paris")],
//!         model_implementation: "OpenAI".to_string(),
//!         specific_model: "gpt-4o-mini".to_string(),
//!         api_key: Some(env.api_key.clone()),
//!         grading_methods: vec!["ROUGE".to_string(), "LLM_JUDGE".to_string()],
//!     };
//!
//!     for result in runner.run_all_tests(&batch).await {
//!         println!("{}: {:?}", result.test_case_id, result.error);
//!     }
//!     Ok(())
//! }
//! ```

pub mod analysis;
pub mod config;
pub mod evaluator;
pub mod judge;
pub mod providers;
pub mod reporting;
pub mod runner;
pub mod tasks;

pub use config::{Config, EnvConfig};

/// Prelude module for common imports
pub mod prelude {
    pub use crate::analysis::{calculate_bleu, calculate_meteor, calculate_rouge};
    pub use crate::config::{Config, ConfigError, EnvConfig};
    pub use crate::evaluator::{EvaluationMethod, MethodDetails, MethodResult, ResponseEvaluator};
    pub use crate::judge::{Attribute, AttributeScore, EvaluationResult, JudgeError, LlmJudge};
    pub use crate::providers::{
        find_implementation, generate_model_response, models_config, CompletionRequest,
        CompletionResponse, LLMProvider, Message, ModelInfo, ProviderError, ProviderResult,
    };
    pub use crate::reporting::{BatchOutput, RunSummary};
    pub use crate::runner::{RunnerConfig, TestRunner};
    pub use crate::tasks::{BatchRequest, TestCase, TestCaseId, TestResult, TestStatus};
}
