//! Results reporting
//!
//! Standard output carries exactly one JSON document per invocation
//! ([`BatchOutput`] for the test runner). Everything meant for humans goes
//! through `tracing`, which the binary routes to standard error.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::evaluator::{MethodDetails, MethodResult};
use crate::tasks::{TestCase, TestResult};

/// Top-level JSON document written by the test runner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BatchOutput {
    Success {
        success: bool,
        results: Vec<TestResult>,
    },
    Failure {
        success: bool,
        error: String,
    },
}

impl BatchOutput {
    pub fn success(results: Vec<TestResult>) -> Self {
        BatchOutput::Success {
            success: true,
            results,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        BatchOutput::Failure {
            success: false,
            error: error.into(),
        }
    }

    /// The batch input could not be read or parsed
    pub fn parse_failure(error: impl std::fmt::Display) -> Self {
        Self::failure(format!("Failed to parse input: {}", error))
    }

    /// The batch could not be run as a whole
    pub fn run_failure(error: impl std::fmt::Display) -> Self {
        Self::failure(format!("Failed to run tests: {}", error))
    }

    pub fn is_success(&self) -> bool {
        matches!(self, BatchOutput::Success { .. })
    }

    /// Process exit code for this outcome
    pub fn exit_code(&self) -> i32 {
        if self.is_success() {
            0
        } else {
            1
        }
    }
}

/// Per-method statistics across a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodSummary {
    pub evaluated: usize,
    pub errors: usize,
    /// Mean over results that did not error
    pub mean_score: Option<f64>,
}

/// Aggregate view of one batch run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub total_cases: usize,
    pub failed_cases: usize,
    pub methods: IndexMap<String, MethodSummary>,
}

impl RunSummary {
    pub fn from_results(results: &[TestResult]) -> Self {
        let mut sums: IndexMap<String, (usize, usize, f64)> = IndexMap::new();

        for result in results {
            for (method, outcome) in &result.evaluation_result {
                let entry = sums.entry(method.clone()).or_insert((0, 0, 0.0));
                if outcome.is_error() {
                    entry.1 += 1;
                } else {
                    entry.0 += 1;
                    entry.2 += outcome.score;
                }
            }
        }

        let methods = sums
            .into_iter()
            .map(|(method, (evaluated, errors, total))| {
                let mean_score = (evaluated > 0).then(|| total / evaluated as f64);
                (
                    method,
                    MethodSummary {
                        evaluated,
                        errors,
                        mean_score,
                    },
                )
            })
            .collect();

        Self {
            total_cases: results.len(),
            failed_cases: results.iter().filter(|r| !r.is_success()).count(),
            methods,
        }
    }

    /// Write to JSON file
    pub fn write_to_file(&self, path: impl AsRef<Path>) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, json)
    }

    /// Log the summary, best mean score first
    pub fn log(&self) {
        tracing::info!(
            "Run complete: {} test cases, {} failed",
            self.total_cases,
            self.failed_cases
        );

        let mut ranked: Vec<_> = self.methods.iter().collect();
        ranked.sort_by(|a, b| {
            b.1.mean_score
                .unwrap_or(f64::NEG_INFINITY)
                .partial_cmp(&a.1.mean_score.unwrap_or(f64::NEG_INFINITY))
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        for (method, summary) in ranked {
            match summary.mean_score {
                Some(mean) => tracing::info!(
                    "  {}: mean {:.3} over {} ({} errors)",
                    method,
                    mean,
                    summary.evaluated,
                    summary.errors
                ),
                None => tracing::info!("  {}: no scores ({} errors)", method, summary.errors),
            }
        }
    }
}

/// Diagnostic log for one evaluated test case
pub fn log_case_scores(
    test_case: &TestCase,
    model_response: &str,
    evaluation: &IndexMap<String, MethodResult>,
) {
    tracing::debug!("Question: {}", test_case.prompt);
    tracing::debug!("Model Response: {}", model_response);
    tracing::debug!("Reference: {}", test_case.expected_response);

    for (method, result) in evaluation {
        tracing::info!("[{}] {} Score: {:.3}", test_case.id, method, result.score);

        match &result.details {
            MethodDetails::Tokens {
                method,
                reference_tokens,
                response_tokens,
            } if method == "BLEU" => {
                tracing::debug!("  Reference tokens: {:?}", reference_tokens);
                tracing::debug!("  Response tokens:  {:?}", response_tokens);
            }
            MethodDetails::Rouge {
                rouge1,
                rouge2,
                rouge_l,
                ..
            } => {
                tracing::info!("  ROUGE-1: {:.3}", rouge1.fmeasure);
                tracing::info!("  ROUGE-2: {:.3}", rouge2.fmeasure);
                tracing::info!("  ROUGE-L: {:.3}", rouge_l.fmeasure);
            }
            MethodDetails::Error { error, .. } => {
                tracing::warn!("  {} error: {}", method, error);
            }
            _ => {}
        }
    }
}
