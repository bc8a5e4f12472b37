//! Structured warnings surfaced alongside the log output.
//!
//! Binding failures are per-channel and recoverable; they land here (and on
//! the `log` facade) instead of aborting the animation, so callers and tests
//! can inspect what went wrong.

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Warning,
    Error,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    /// Channel path the diagnostic refers to, when applicable.
    pub path: Option<String>,
    pub message: String,
}

impl Diagnostic {
    pub fn warning(path: Option<String>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            path,
            message: message.into(),
        }
    }

    pub fn error(path: Option<String>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            path,
            message: message.into(),
        }
    }
}
