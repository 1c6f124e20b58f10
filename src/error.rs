use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CareersError {
    #[error("Could not parse job description markup: {0}")]
    Parse(String),

    #[error("Navigation failed: {0}")]
    Navigation(String),

    #[error("Timed out after {timeout:?} waiting for {what}")]
    Timeout { what: String, timeout: Duration },

    #[error("Structured data is missing required data: {0}")]
    DataShape(String),

    #[error("{message} (expected: {expected:?}, actual: {actual:?})")]
    AssertionMismatch {
        message: String,
        expected: String,
        actual: String,
    },

    #[error("Undefined step: {0}")]
    UndefinedStep(String),

    #[error("Feature file error at line {line}: {reason}")]
    FeatureParse { line: usize, reason: String },

    #[error("Step needs {0}, but no earlier step provided it")]
    MissingState(&'static str),

    #[error("Failed to launch browser: {0}")]
    BrowserLaunch(String),

    #[error("Browser error: {0}")]
    Browser(#[from] chromiumoxide::error::CdpError),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CareersError {
    pub fn mismatch(
        message: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        CareersError::AssertionMismatch {
            message: message.into(),
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// True for failures that come from comparing expected and observed values,
    /// as opposed to the scenario being unable to run.
    pub fn is_assertion(&self) -> bool {
        matches!(self, CareersError::AssertionMismatch { .. })
    }
}

pub type Result<T> = std::result::Result<T, CareersError>;
