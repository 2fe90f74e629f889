//! Error types for pipeline stages

use std::path::PathBuf;
use thiserror::Error;

use crate::domain::diagnostic::Severity;

/// Exit status for a full successful run
pub const EXIT_SUCCESS: i32 = 0;

/// Exit status for any generic stage failure
pub const EXIT_GENERIC: i32 = 1;

/// Exit status reserved for package-manager install failures
pub const EXIT_PACKAGE: i32 = 2;

/// Renders an optional process status for messages
fn status_text(status: &Option<i32>) -> String {
    match status {
        Some(code) => format!("status {}", code),
        None => "no status (terminated by signal)".to_string(),
    }
}

/// Reasons a stage can fail
///
/// Every variant is fatal to the run. The variant decides the process
/// exit status and the diagnostic tag.
#[derive(Debug, Error)]
pub enum StageError {
    /// Expected directory is absent
    #[error("directory not found: {}", path.display())]
    MissingDirectory { path: PathBuf },

    /// Path exists but is not a directory
    #[error("not a directory: {}", path.display())]
    NotADirectory { path: PathBuf },

    /// Expected file is absent
    #[error("file not found: {}", path.display())]
    MissingFile { path: PathBuf },

    /// The package manager failed to install a package
    #[error("package manager failed to install '{package}' (exited with {})", status_text(status))]
    PackageInstall { package: String, status: Option<i32> },

    /// An external tool returned a non-zero status
    #[error("{action} failed (exited with {})", status_text(status))]
    CommandFailed { action: String, status: Option<i32> },

    /// An external tool could not be started
    #[error("failed to start '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// A filesystem operation failed
    #[error("{action}: {source}")]
    Io {
        action: String,
        #[source]
        source: std::io::Error,
    },

    /// A parameter is missing, empty or malformed
    #[error("invalid parameter '{name}': {reason}")]
    InvalidParameter { name: String, reason: String },

    /// The downstream writer returned a non-zero status
    #[error("writer exited with status {status}")]
    HandoffFailed { status: i32 },
}

impl StageError {
    /// Creates an I/O error naming the failed action
    pub fn io(action: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            action: action.into(),
            source,
        }
    }

    /// Creates an invalid parameter error
    pub fn invalid(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Process exit status this error terminates the run with
    ///
    /// The hand-off failure forwards the writer's literal status.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::PackageInstall { .. } => EXIT_PACKAGE,
            Self::HandoffFailed { status } => *status,
            _ => EXIT_GENERIC,
        }
    }

    /// Severity the diagnostic for this error is reported with
    pub fn severity(&self) -> Severity {
        match self {
            Self::PackageInstall { .. } => Severity::PackageError,
            _ => Severity::Error,
        }
    }
}
