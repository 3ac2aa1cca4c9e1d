//! Test execution engine

pub mod executor;

pub use executor::{
    LogProgress, NoOpProgress, ProgressCallback, RunnerConfig, TestPlan, TestRunner,
};
