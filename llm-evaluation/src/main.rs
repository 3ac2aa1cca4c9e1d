//! LLM evaluation CLI
//!
//! Standard output carries JSON only; logs go to standard error.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use llm_evaluation::{
    config::{Config, EnvConfig},
    evaluator::ResponseEvaluator,
    judge::LlmJudge,
    providers::models_config,
    reporting::{BatchOutput, RunSummary},
    runner::{LogProgress, TestRunner},
    tasks::{load_batch_from_file, BatchRequest},
};

#[derive(Parser)]
#[command(name = "llm-eval")]
#[command(about = "Score model responses with lexical metrics or an LLM judge")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Score one response and print method -> {score, details}
    Evaluate {
        /// Comma-separated evaluation methods (BLEU, ROUGE, METEOR, LLM_JUDGE)
        #[arg(long)]
        methods: String,

        /// Original user message
        #[arg(long)]
        user_message: String,

        /// Expected response
        #[arg(long)]
        expected: String,

        /// Model response
        #[arg(long)]
        response: String,

        /// Grounding context for the judge's context-adherence attribute
        #[arg(long)]
        context: Option<String>,
    },

    /// Print the provider catalog as JSON
    Models,

    /// Run a batch of test cases (JSON on stdin unless --input is given)
    RunTests {
        /// Read the batch from a file instead of stdin
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Also write a run summary to this JSON file
        #[arg(long)]
        summary: Option<PathBuf>,
    },

    /// Generate sample configuration
    InitConfig {
        /// Output path for configuration file
        #[arg(short, long, default_value = "config/llm-eval.toml")]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging; stdout is reserved for JSON
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("llm_evaluation=debug,info")
        } else {
            EnvFilter::new("llm_evaluation=info,warn")
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let code = match cli.command {
        Commands::Evaluate {
            methods,
            user_message,
            expected,
            response,
            context,
        } => {
            evaluate(
                cli.config,
                &methods,
                &user_message,
                &expected,
                &response,
                context.as_deref(),
            )
            .await
        }

        Commands::Models => list_models(cli.config),

        Commands::RunTests { input, summary } => run_tests(cli.config, input, summary).await,

        Commands::InitConfig { output } => {
            init_config(output)?;
            0
        }
    };

    if code != 0 {
        std::process::exit(code);
    }
    Ok(())
}

/// Print `{"error": ...}` on stderr for the catalog and single-evaluation commands
fn report_error(error: impl std::fmt::Display) -> i32 {
    eprintln!("{}", serde_json::json!({ "error": error.to_string() }));
    1
}

fn split_methods(methods: &str) -> Vec<String> {
    methods
        .split(',')
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(String::from)
        .collect()
}

async fn evaluate(
    config_path: Option<PathBuf>,
    methods: &str,
    user_message: &str,
    expected: &str,
    response: &str,
    context: Option<&str>,
) -> i32 {
    let config = match Config::load(config_path.as_deref()) {
        Ok(config) => config,
        Err(e) => return report_error(e),
    };
    let env = match EnvConfig::from_env() {
        Ok(env) => env,
        Err(e) => {
            tracing::error!("{}", e);
            return report_error(e);
        }
    };

    let evaluator = ResponseEvaluator::new().with_judge(LlmJudge::from_config(&env, &config));
    let results = evaluator
        .evaluate(
            user_message,
            response,
            expected,
            &split_methods(methods),
            context,
        )
        .await;

    match serde_json::to_string(&results) {
        Ok(json) => {
            println!("{}", json);
            0
        }
        Err(e) => report_error(e),
    }
}

fn list_models(config_path: Option<PathBuf>) -> i32 {
    let catalog = Config::load(config_path.as_deref())
        .map_err(|e| e.to_string())
        .and_then(|config| models_config(&config).map_err(|e| e.to_string()))
        .and_then(|catalog| serde_json::to_string(&catalog).map_err(|e| e.to_string()));

    match catalog {
        Ok(json) => {
            println!("{}", json);
            0
        }
        Err(e) => report_error(e),
    }
}

/// Write the envelope to stdout and return its exit code
fn emit(output: &BatchOutput) -> i32 {
    match serde_json::to_string(output) {
        Ok(json) => {
            println!("{}", json);
            output.exit_code()
        }
        Err(e) => {
            let fallback = BatchOutput::run_failure(e);
            println!(
                "{}",
                serde_json::to_string(&fallback).unwrap_or_else(|_| {
                    r#"{"success":false,"error":"Failed to run tests"}"#.to_string()
                })
            );
            1
        }
    }
}

async fn run_tests(
    config_path: Option<PathBuf>,
    input: Option<PathBuf>,
    summary_path: Option<PathBuf>,
) -> i32 {
    let env = match EnvConfig::from_env() {
        Ok(env) => env,
        Err(e) => {
            tracing::error!("{}", e);
            return emit(&BatchOutput::failure(e.to_string()));
        }
    };

    let batch = match input {
        Some(path) => load_batch_from_file(path),
        None => BatchRequest::from_reader(std::io::stdin().lock()),
    };
    let batch = match batch {
        Ok(batch) => batch,
        Err(e) => return emit(&BatchOutput::parse_failure(e)),
    };

    let config = match Config::load(config_path.as_deref()) {
        Ok(config) => config,
        Err(e) => return emit(&BatchOutput::run_failure(e)),
    };

    tracing::info!(
        "Running {} test cases on {} / {} with methods {:?}",
        batch.test_cases.len(),
        batch.model_implementation,
        batch.specific_model,
        batch.grading_methods
    );

    let evaluator = ResponseEvaluator::new().with_judge(LlmJudge::from_config(&env, &config));
    let runner = TestRunner::new(config, evaluator).with_progress(Arc::new(LogProgress));
    let results = runner.run_all_tests(&batch).await;

    let summary = RunSummary::from_results(&results);
    summary.log();
    if let Some(path) = summary_path {
        if let Err(e) = summary.write_to_file(&path) {
            tracing::warn!("Could not write summary to {}: {}", path.display(), e);
        }
    }

    emit(&BatchOutput::success(results))
}

fn init_config(output: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::default();

    // Ensure parent directory exists
    if let Some(parent) = output.parent() {
        std::fs::create_dir_all(parent)?;
    }

    config.save_toml(&output)?;
    eprintln!("Configuration written to: {}", output.display());
    Ok(())
}
