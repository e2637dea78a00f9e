//! CLI-specific error types and exit code mapping

use dashprobe_core::error::DashprobeError;
use dashprobe_dashboard::DashboardError;

/// CLI-specific error type.
///
/// Each variant carries enough context for a user-friendly message.
/// The `exit_code()` method maps errors to standard Unix exit codes.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Configuration loading or validation failure.
    #[error("configuration error: {0}")]
    Config(String),

    /// A subcommand-specific operation failed.
    #[error("{0}")]
    Command(String),

    /// The orchestration tool could not be driven (missing binary, timeout, bad output).
    #[error("model not reachable: {0}")]
    ModelUnavailable(String),

    /// One or more scenarios failed.
    #[error("{failed} scenario(s) failed")]
    ScenarioFailed { failed: usize },

    /// JSON serialisation failed during output rendering.
    #[error("json output error: {0}")]
    JsonSerialize(#[from] serde_json::Error),

    /// IO error (file read, stdout write, etc.).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Wrapped domain error from dashprobe-core.
    #[error("{0}")]
    Core(#[from] DashprobeError),
}

impl CliError {
    /// Map the error to a process exit code.
    ///
    /// | Code | Meaning                               |
    /// |------|---------------------------------------|
    /// | 0    | Success                               |
    /// | 1    | Command error or failed scenario      |
    /// | 2    | Configuration error                   |
    /// | 3    | Model unreachable                     |
    /// | 10   | IO error                              |
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) => 2,
            Self::ModelUnavailable(_) => 3,
            Self::Io(_) => 10,
            Self::Core(core) => match core {
                DashprobeError::Config(_) => 2,
                DashprobeError::Model(_) => 3,
                DashprobeError::Io(_) => 10,
                _ => 1,
            },
            Self::ScenarioFailed { .. } | Self::JsonSerialize(_) | Self::Command(_) => 1,
        }
    }
}

impl From<DashboardError> for CliError {
    fn from(e: DashboardError) -> Self {
        Self::Core(e.into())
    }
}
