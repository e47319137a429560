//! Vendor tool errors.

use thiserror::Error;

use crate::hints::install_hint;

/// Errors raised while locating or running an external tool.
#[derive(Debug, Error)]
pub enum ToolError {
    /// The executable is not on the search path.
    #[error("'{tool}' not found in PATH. Install it first: {hint}")]
    NotFound { tool: String, hint: String },

    /// The process ran and exited unsuccessfully.
    #[error("{tool} failed with exit code {code}{}", stderr_suffix(.stderr))]
    Failed {
        tool: String,
        code: i32,
        stderr: String,
    },

    /// The process did not finish within its deadline and was killed.
    #[error("{tool} timed out after {seconds}s")]
    Timeout { tool: String, seconds: u64 },

    /// The process could not be started.
    #[error("Failed to start {tool}: {source}")]
    Spawn {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    /// IO error while wiring up stdin/stdout.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ToolError {
    /// Build the missing-tool error with its installation hint.
    pub fn not_found(tool: &str) -> Self {
        ToolError::NotFound {
            tool: tool.to_string(),
            hint: install_hint(tool).to_string(),
        }
    }

    /// Whether this error means the tool is absent rather than broken.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ToolError::NotFound { .. })
    }
}

fn stderr_suffix(stderr: &str) -> String {
    if stderr.is_empty() {
        String::new()
    } else {
        format!(": {}", stderr)
    }
}
