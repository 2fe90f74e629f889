//! Diagnostic domain types
//!
//! Every message the pipeline shows an operator is a `Diagnostic`.
//! The severity decides both the literal bracketed tag and which
//! stream the line is written to.

use crate::domain::stage::StageId;

/// Severity of a diagnostic line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
    PackageError,
}

/// Output stream a diagnostic belongs on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stream {
    Stdout,
    Stderr,
}

impl Severity {
    /// Literal tag prefixed to every line
    pub fn tag(self) -> &'static str {
        match self {
            Severity::Info => "[INFO]",
            Severity::Success => "[SUCCESS]",
            Severity::Warning => "[WARNING]",
            Severity::Error => "[ERROR]",
            Severity::PackageError => "[PACKAGE_ERROR]",
        }
    }

    /// Informational and success lines go to stdout, everything else to stderr
    pub fn stream(self) -> Stream {
        match self {
            Severity::Info | Severity::Success => Stream::Stdout,
            Severity::Warning | Severity::Error | Severity::PackageError => Stream::Stderr,
        }
    }
}

/// A single diagnostic emitted during a run
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub severity: Severity,
    pub stage: Option<StageId>,
    pub message: String,
}

impl Diagnostic {
    pub fn new(severity: Severity, stage: Option<StageId>, message: impl Into<String>) -> Self {
        Self {
            timestamp: chrono::Utc::now(),
            severity,
            stage,
            message: message.into(),
        }
    }

    /// Renders the line without the tag, e.g. `stage 4 (engine-package): package file not found`
    pub fn body(&self) -> String {
        match self.stage {
            Some(stage) => format!("{}: {}", stage, self.message),
            None => self.message.clone(),
        }
    }

    /// Renders the full line including the literal tag
    pub fn render(&self) -> String {
        format!("{} {}", self.severity.tag(), self.body())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_streams() {
        assert_eq!(Severity::Info.stream(), Stream::Stdout);
        assert_eq!(Severity::Success.stream(), Stream::Stdout);
        assert_eq!(Severity::Warning.stream(), Stream::Stderr);
        assert_eq!(Severity::Error.stream(), Stream::Stderr);
        assert_eq!(Severity::PackageError.stream(), Stream::Stderr);
    }

    #[test]
    fn test_render_with_stage() {
        let diag = Diagnostic::new(
            Severity::PackageError,
            Some(StageId::Prerequisites),
            "dnf exited with status 1",
        );
        assert_eq!(
            diag.render(),
            "[PACKAGE_ERROR] stage 1 (prerequisites): dnf exited with status 1"
        );
    }

    #[test]
    fn test_render_without_stage() {
        let diag = Diagnostic::new(Severity::Success, None, "done");
        assert_eq!(diag.render(), "[SUCCESS] done");
    }
}
