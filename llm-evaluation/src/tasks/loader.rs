//! Batch request loading from JSON

use serde::{Deserialize, Serialize};
use std::io::Read;
use std::path::Path;

use super::TestCase;

/// Error type for batch loading
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Parse(#[from] serde_json::Error),
}

/// One test-runner invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchRequest {
    pub test_cases: Vec<TestCase>,
    /// Provider display name, e.g. "OpenAI"
    pub model_implementation: String,
    pub specific_model: String,
    /// Credential for the generating provider
    #[serde(default)]
    pub api_key: Option<String>,
    pub grading_methods: Vec<String>,
}

impl BatchRequest {
    /// Parse a batch request from a JSON string
    pub fn from_json(content: &str) -> Result<Self, LoadError> {
        Ok(serde_json::from_str(content)?)
    }

    /// Read a whole JSON document from a reader (typically stdin)
    pub fn from_reader<R: Read>(mut reader: R) -> Result<Self, LoadError> {
        let mut content = String::new();
        reader.read_to_string(&mut content)?;
        Self::from_json(&content)
    }
}

/// Load a batch request from a JSON file
pub fn load_batch_from_file(path: impl AsRef<Path>) -> Result<BatchRequest, LoadError> {
    let content = std::fs::read_to_string(path)?;
    BatchRequest::from_json(&content)
}
