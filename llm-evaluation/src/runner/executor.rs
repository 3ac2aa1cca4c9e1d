//! Async test runner: generation followed by evaluation, per test case

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;

use crate::config::{Config, RunnerSettings};
use crate::evaluator::ResponseEvaluator;
use crate::providers::{generate_model_response, ProviderError};
use crate::reporting::log_case_scores;
use crate::tasks::{BatchRequest, TestCase, TestResult, TestStatus};

/// Configuration for the runner
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Maximum test cases in flight; 1 runs them strictly in order
    pub parallel_requests: usize,
    /// Generation timeout in milliseconds; 0 disables it
    pub timeout_ms: u64,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self::from(&RunnerSettings::default())
    }
}

impl From<&RunnerSettings> for RunnerConfig {
    fn from(settings: &RunnerSettings) -> Self {
        Self {
            parallel_requests: settings.parallel_requests.max(1),
            timeout_ms: settings.timeout_ms,
        }
    }
}

/// Generation and grading settings shared by every case of a batch
#[derive(Debug, Clone)]
pub struct TestPlan {
    pub model_implementation: String,
    pub specific_model: String,
    pub api_key: Option<String>,
    pub grading_methods: Vec<String>,
}

impl From<&BatchRequest> for TestPlan {
    fn from(batch: &BatchRequest) -> Self {
        Self {
            model_implementation: batch.model_implementation.clone(),
            specific_model: batch.specific_model.clone(),
            api_key: batch.api_key.clone(),
            grading_methods: batch.grading_methods.clone(),
        }
    }
}

/// Runs test cases against one provider model and grades the responses
#[derive(Clone)]
pub struct TestRunner {
    config: RunnerConfig,
    providers: Arc<Config>,
    evaluator: Arc<ResponseEvaluator>,
    semaphore: Arc<Semaphore>,
    progress: Arc<dyn ProgressCallback>,
}

impl TestRunner {
    /// Create a runner; limits come from the `[runner]` table of `config`
    pub fn new(config: Config, evaluator: ResponseEvaluator) -> Self {
        let runner_config = RunnerConfig::from(&config.runner);
        let semaphore = Arc::new(Semaphore::new(runner_config.parallel_requests));
        Self {
            config: runner_config,
            providers: Arc::new(config),
            evaluator: Arc::new(evaluator),
            semaphore,
            progress: Arc::new(NoOpProgress),
        }
    }

    /// Override the runner limits
    pub fn with_runner_config(mut self, config: RunnerConfig) -> Self {
        let parallel = config.parallel_requests.max(1);
        self.semaphore = Arc::new(Semaphore::new(parallel));
        self.config = RunnerConfig {
            parallel_requests: parallel,
            ..config
        };
        self
    }

    pub fn with_progress(mut self, progress: Arc<dyn ProgressCallback>) -> Self {
        self.progress = progress;
        self
    }

    pub fn runner_config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Generate a response for one test case and grade it.
    ///
    /// Never fails: any generation error becomes a failed [`TestResult`].
    pub async fn run_single_test(&self, test_case: &TestCase, plan: &TestPlan) -> TestResult {
        let case_id = test_case.id.to_string();
        let mut status = TestStatus::Pending;
        self.progress.on_case_start(&case_id, status);

        let model_response = match self.generate(test_case, plan).await {
            Ok(response) => response,
            Err(e) => {
                tracing::error!("Test case {} failed: {}", test_case.id, e);
                status = TestStatus::Failed;
                self.progress.on_case_complete(&case_id, status);
                return TestResult::failure(test_case, e.to_string());
            }
        };
        status = TestStatus::Generated;
        tracing::debug!("Test case {} {:?}", test_case.id, status);

        let mut evaluation = self
            .evaluator
            .evaluate(
                &test_case.prompt,
                &model_response,
                &test_case.expected_response,
                &plan.grading_methods,
                test_case.context.as_deref(),
            )
            .await;

        for result in evaluation.values_mut() {
            if !result.is_judgment() {
                result.model_response = Some(model_response.clone());
            }
        }

        log_case_scores(test_case, &model_response, &evaluation);

        status = TestStatus::Evaluated;
        self.progress.on_case_complete(&case_id, status);
        TestResult::success(test_case, model_response, evaluation)
    }

    /// Single generation attempt, bounded by the configured timeout
    async fn generate(&self, test_case: &TestCase, plan: &TestPlan) -> Result<String, ProviderError> {
        let generation = generate_model_response(
            &plan.model_implementation,
            plan.api_key.as_deref(),
            test_case.system_prompt.as_deref(),
            &test_case.prompt,
            &plan.specific_model,
            &self.providers,
        );

        if self.config.timeout_ms == 0 {
            return generation.await;
        }

        let timeout = Duration::from_millis(self.config.timeout_ms);
        match tokio::time::timeout(timeout, generation).await {
            Ok(result) => result,
            Err(_) => Err(ProviderError::Timeout {
                timeout_ms: self.config.timeout_ms,
            }),
        }
    }

    /// Run every test case of a batch; results follow input order
    pub async fn run_all_tests(&self, batch: &BatchRequest) -> Vec<TestResult> {
        let plan = Arc::new(TestPlan::from(batch));
        let total = batch.test_cases.len();
        let mut handles = Vec::with_capacity(total);

        for test_case in &batch.test_cases {
            let test_case = test_case.clone();
            let plan = Arc::clone(&plan);
            let runner = self.clone();

            let handle = tokio::spawn(async move {
                let _permit = match runner.semaphore.clone().acquire_owned().await {
                    Ok(permit) => permit,
                    Err(e) => return TestResult::failure(&test_case, e.to_string()),
                };
                runner.run_single_test(&test_case, &plan).await
            });

            handles.push(handle);
        }

        let mut results = Vec::with_capacity(total);
        for (test_case, handle) in batch.test_cases.iter().zip(handles) {
            match handle.await {
                Ok(result) => results.push(result),
                Err(e) => {
                    tracing::error!("Test execution panicked: {}", e);
                    results.push(TestResult::failure(
                        test_case,
                        format!("Test execution panicked: {}", e),
                    ));
                }
            }
            self.progress.on_progress(results.len(), total);
        }

        results
    }
}

/// Progress callback for tracking execution
pub trait ProgressCallback: Send + Sync {
    fn on_case_start(&self, test_case_id: &str, status: TestStatus);
    fn on_case_complete(&self, test_case_id: &str, status: TestStatus);
    fn on_progress(&self, completed: usize, total: usize);
}

/// Default no-op progress callback
pub struct NoOpProgress;

impl ProgressCallback for NoOpProgress {
    fn on_case_start(&self, _test_case_id: &str, _status: TestStatus) {}
    fn on_case_complete(&self, _test_case_id: &str, _status: TestStatus) {}
    fn on_progress(&self, _completed: usize, _total: usize) {}
}

/// Progress reported through `tracing`, so it lands on stderr
pub struct LogProgress;

impl ProgressCallback for LogProgress {
    fn on_case_start(&self, test_case_id: &str, _status: TestStatus) {
        tracing::debug!("Starting test case {}", test_case_id);
    }

    fn on_case_complete(&self, test_case_id: &str, status: TestStatus) {
        let label = if status == TestStatus::Failed { "FAILED" } else { "OK" };
        tracing::info!("{} test case {}", label, test_case_id);
    }

    fn on_progress(&self, completed: usize, total: usize) {
        tracing::debug!("Progress: {}/{} test cases complete", completed, total);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluator::MethodDetails;
    use std::sync::Mutex;
    use wiremock::{matchers, Mock, MockServer, ResponseTemplate};

    fn chat_response(content: &str) -> serde_json::Value {
        serde_json::json!({
            "model": "gpt-4o-mini",
            "choices": [{
                "message": {"role": "assistant", "content": content},
                "finish_reason": "stop"
            }]
        })
    }

    fn config_for(server: &MockServer) -> Config {
        let mut config = Config::default();
        if let Some(openai) = config.providers.get_mut("openai") {
            openai.base_url = Some(server.uri());
        }
        config
    }

    fn batch(cases: Vec<TestCase>, implementation: &str, methods: &[&str]) -> BatchRequest {
        BatchRequest {
            test_cases: cases,
            model_implementation: implementation.to_string(),
            specific_model: "gpt-4o-mini".to_string(),
            api_key: Some("sk-test".to_string()),
            grading_methods: methods.iter().map(|m| m.to_string()).collect(),
        }
    }

    #[derive(Default)]
    struct RecordingProgress {
        completed: Mutex<Vec<(String, TestStatus)>>,
    }

    impl ProgressCallback for RecordingProgress {
        fn on_case_start(&self, _test_case_id: &str, _status: TestStatus) {}
        fn on_case_complete(&self, test_case_id: &str, status: TestStatus) {
            self.completed
                .lock()
                .unwrap()
                .push((test_case_id.to_string(), status));
        }
        fn on_progress(&self, _completed: usize, _total: usize) {}
    }

    #[tokio::test]
    async fn test_generate_then_evaluate() {
        let server = MockServer::start().await;
        Mock::given(matchers::method("POST"))
            .and(matchers::path("/chat/completions"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(chat_response("The cat sat on the mat.")),
            )
            .mount(&server)
            .await;

        let progress = Arc::new(RecordingProgress::default());
        let runner = TestRunner::new(config_for(&server), ResponseEvaluator::new())
            .with_progress(progress.clone());
        let request = batch(
            vec![TestCase::new("1", "Where is the cat?", "The cat sat on the mat.")],
            "OpenAI",
            &["BLEU", "NOT_A_METHOD"],
        );

        let results = runner.run_all_tests(&request).await;
        assert_eq!(results.len(), 1);

        let result = &results[0];
        assert!(result.is_success());
        assert_eq!(result.model_response, "The cat sat on the mat.");
        let bleu = &result.evaluation_result["BLEU"];
        assert!((bleu.score - 1.0).abs() < 1e-9);
        assert_eq!(bleu.model_response.as_deref(), Some("The cat sat on the mat."));
        assert!(matches!(
            result.evaluation_result["NOT_A_METHOD"].details,
            MethodDetails::Error { .. }
        ));

        assert_eq!(
            progress.completed.lock().unwrap().as_slice(),
            &[("1".to_string(), TestStatus::Evaluated)]
        );
    }

    #[tokio::test]
    async fn test_unknown_implementation_is_isolated() {
        let runner = TestRunner::new(Config::default(), ResponseEvaluator::new());
        let request = batch(
            vec![TestCase::new("a", "p", "e"), TestCase::new("b", "p", "e")],
            "Nonexistent",
            &["BLEU"],
        );

        let results = runner.run_all_tests(&request).await;
        assert_eq!(results.len(), 2);
        for result in &results {
            assert_eq!(result.error.as_deref(), Some("Unknown implementation: Nonexistent"));
            assert_eq!(result.model_response, "");
            assert!(result.evaluation_result.is_empty());
        }
    }

    #[tokio::test]
    async fn test_provider_error_becomes_case_error() {
        let server = MockServer::start().await;
        Mock::given(matchers::method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_json(serde_json::json!({
                "error": {"message": "Rate limit reached"}
            })))
            .mount(&server)
            .await;

        let runner = TestRunner::new(config_for(&server), ResponseEvaluator::new());
        let request = batch(vec![TestCase::new("1", "p", "e")], "OpenAI", &["BLEU"]);

        let results = runner.run_all_tests(&request).await;
        assert_eq!(results[0].status(), TestStatus::Failed);
        assert!(results[0].error.as_deref().unwrap().contains("Rate limit reached"));
    }

    #[tokio::test]
    async fn test_missing_api_key() {
        let runner = TestRunner::new(Config::default(), ResponseEvaluator::new());
        let mut request = batch(vec![TestCase::new("1", "p", "e")], "Anthropic", &["BLEU"]);
        request.api_key = None;

        let results = runner.run_all_tests(&request).await;
        assert_eq!(results[0].error.as_deref(), Some("Anthropic requires an API key"));
    }

    #[tokio::test]
    async fn test_generation_timeout() {
        let server = MockServer::start().await;
        Mock::given(matchers::method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(chat_response("late"))
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&server)
            .await;

        let runner = TestRunner::new(config_for(&server), ResponseEvaluator::new())
            .with_runner_config(RunnerConfig {
                parallel_requests: 1,
                timeout_ms: 50,
            });
        let request = batch(vec![TestCase::new("1", "p", "e")], "OpenAI", &["BLEU"]);

        let results = runner.run_all_tests(&request).await;
        assert_eq!(results[0].error.as_deref(), Some("Timeout after 50ms"));
    }

    #[tokio::test]
    async fn test_parallel_results_keep_input_order() {
        let server = MockServer::start().await;
        Mock::given(matchers::method("POST"))
            .and(matchers::body_string_contains("slow"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(chat_response("slow answer"))
                    .set_delay(Duration::from_millis(200)),
            )
            .mount(&server)
            .await;
        Mock::given(matchers::method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(chat_response("fast answer")))
            .mount(&server)
            .await;

        let runner = TestRunner::new(config_for(&server), ResponseEvaluator::new())
            .with_runner_config(RunnerConfig {
                parallel_requests: 4,
                timeout_ms: 5_000,
            });
        let request = batch(
            vec![
                TestCase::new("first", "slow question", "e"),
                TestCase::new("second", "quick question", "e"),
                TestCase::new("third", "quick question", "e"),
            ],
            "OpenAI",
            &["ROUGE"],
        );

        let results = runner.run_all_tests(&request).await;
        let ids: Vec<String> = results.iter().map(|r| r.test_case_id.to_string()).collect();
        assert_eq!(ids, vec!["first", "second", "third"]);
        assert_eq!(results[0].model_response, "slow answer");
        assert_eq!(results[2].model_response, "fast answer");
    }

    #[test]
    fn test_runner_config_from_settings() {
        let settings = RunnerSettings {
            timeout_ms: 1_000,
            parallel_requests: 0,
        };
        let config = RunnerConfig::from(&settings);
        assert_eq!(config.parallel_requests, 1);
        assert_eq!(config.timeout_ms, 1_000);
    }
}
