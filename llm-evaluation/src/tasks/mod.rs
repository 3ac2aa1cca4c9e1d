//! Test case definitions, results and batch loading

pub mod loader;

pub use loader::{load_batch_from_file, BatchRequest, LoadError};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::evaluator::MethodResult;

/// A prompt with its reference answer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestCase {
    pub id: TestCaseId,
    pub prompt: String,
    pub expected_response: String,
    #[serde(default)]
    pub system_prompt: Option<String>,
    /// Grounding material; enables the judge's context-adherence attribute
    #[serde(default)]
    pub context: Option<String>,
}

impl TestCase {
    pub fn new(
        id: impl Into<TestCaseId>,
        prompt: impl Into<String>,
        expected_response: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            prompt: prompt.into(),
            expected_response: expected_response.into(),
            system_prompt: None,
            context: None,
        }
    }

    pub fn with_system_prompt(mut self, system_prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(system_prompt.into());
        self
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }
}

/// Test case identifier, echoed back with the JSON type it arrived in
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TestCaseId {
    Number(serde_json::Number),
    Text(String),
}

impl fmt::Display for TestCaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TestCaseId::Number(n) => write!(f, "{}", n),
            TestCaseId::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for TestCaseId {
    fn from(id: &str) -> Self {
        TestCaseId::Text(id.to_string())
    }
}

impl From<String> for TestCaseId {
    fn from(id: String) -> Self {
        TestCaseId::Text(id)
    }
}

impl From<u64> for TestCaseId {
    fn from(id: u64) -> Self {
        TestCaseId::Number(id.into())
    }
}

/// Lifecycle of a test case inside the runner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestStatus {
    Pending,
    Generated,
    Evaluated,
    Failed,
}

/// Outcome of one test case
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestResult {
    pub test_case_id: TestCaseId,
    pub prompt: String,
    pub model_response: String,
    pub expected_response: String,
    pub evaluation_result: IndexMap<String, MethodResult>,
    pub error: Option<String>,
}

impl TestResult {
    /// Create an evaluated result
    pub fn success(
        test_case: &TestCase,
        model_response: String,
        evaluation_result: IndexMap<String, MethodResult>,
    ) -> Self {
        Self {
            test_case_id: test_case.id.clone(),
            prompt: test_case.prompt.clone(),
            model_response,
            expected_response: test_case.expected_response.clone(),
            evaluation_result,
            error: None,
        }
    }

    /// Create a failure result with no response and no evaluation
    pub fn failure(test_case: &TestCase, error: impl Into<String>) -> Self {
        Self {
            test_case_id: test_case.id.clone(),
            prompt: test_case.prompt.clone(),
            model_response: String::new(),
            expected_response: test_case.expected_response.clone(),
            evaluation_result: IndexMap::new(),
            error: Some(error.into()),
        }
    }

    pub fn status(&self) -> TestStatus {
        if self.error.is_some() {
            TestStatus::Failed
        } else {
            TestStatus::Evaluated
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}
