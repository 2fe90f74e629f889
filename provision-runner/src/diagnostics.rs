//! Diagnostic reporting
//!
//! Uniform error/info/success reporting used by every stage. The
//! `Reporter` is generic over a `DiagnosticSink` so the CLI can write
//! to the terminal while tests collect lines in memory.

use colored::Colorize;
use provision_core::domain::diagnostic::{Diagnostic, Severity, Stream};
use provision_core::domain::stage::StageId;
use std::io::{IsTerminal, Write};
use std::sync::{Arc, Mutex};
use tracing::debug;

/// Destination for diagnostics
pub trait DiagnosticSink: Send + Sync {
    /// Writes a single diagnostic
    fn write(&self, diagnostic: &Diagnostic);
}

/// Writes tagged lines to stdout or stderr according to severity
///
/// The tag is coloured only when the target stream is a terminal.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleSink;

impl ConsoleSink {
    pub fn new() -> Self {
        Self
    }

    fn colored_tag(severity: Severity) -> String {
        let tag = severity.tag();
        match severity {
            Severity::Info => tag.cyan().to_string(),
            Severity::Success => tag.green().bold().to_string(),
            Severity::Warning => tag.yellow().to_string(),
            Severity::Error => tag.red().bold().to_string(),
            Severity::PackageError => tag.magenta().bold().to_string(),
        }
    }

    fn format(diagnostic: &Diagnostic, terminal: bool) -> String {
        if terminal {
            format!(
                "{} {}",
                Self::colored_tag(diagnostic.severity),
                diagnostic.body()
            )
        } else {
            diagnostic.render()
        }
    }
}

impl DiagnosticSink for ConsoleSink {
    fn write(&self, diagnostic: &Diagnostic) {
        // A closed stream must not abort provisioning
        match diagnostic.severity.stream() {
            Stream::Stdout => {
                let stdout = std::io::stdout();
                let line = Self::format(diagnostic, stdout.is_terminal());
                let mut handle = stdout.lock();
                let _ = writeln!(handle, "{}", line);
                let _ = handle.flush();
            }
            Stream::Stderr => {
                let stderr = std::io::stderr();
                let line = Self::format(diagnostic, stderr.is_terminal());
                let mut handle = stderr.lock();
                let _ = writeln!(handle, "{}", line);
            }
        }
    }
}

/// Collects diagnostics in memory
#[derive(Debug, Clone, Default)]
pub struct InMemorySink {
    entries: Arc<Mutex<Vec<Diagnostic>>>,
}

impl InMemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of collected diagnostics
    pub fn entries(&self) -> Vec<Diagnostic> {
        self.entries
            .lock()
            .map(|entries| entries.clone())
            .unwrap_or_default()
    }

    /// Rendered lines routed to the given stream
    pub fn lines(&self, stream: Stream) -> Vec<String> {
        self.entries()
            .iter()
            .filter(|d| d.severity.stream() == stream)
            .map(Diagnostic::render)
            .collect()
    }
}

impl DiagnosticSink for InMemorySink {
    fn write(&self, diagnostic: &Diagnostic) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.push(diagnostic.clone());
        }
    }
}

/// Front end for emitting diagnostics
///
/// Each call writes exactly one line to the sink. The tracing mirror is
/// debug-only so the default filter never repeats a diagnostic on stderr.
#[derive(Clone)]
pub struct Reporter {
    sink: Arc<dyn DiagnosticSink>,
}

impl Reporter {
    pub fn new(sink: Arc<dyn DiagnosticSink>) -> Self {
        Self { sink }
    }

    /// Reporter writing to the terminal
    pub fn console() -> Self {
        Self::new(Arc::new(ConsoleSink::new()))
    }

    pub fn emit(&self, severity: Severity, stage: Option<StageId>, message: impl Into<String>) {
        let diagnostic = Diagnostic::new(severity, stage, message);

        debug!("{} {}", severity.tag(), diagnostic.body());
        self.sink.write(&diagnostic);
    }

    pub fn info(&self, stage: Option<StageId>, message: impl Into<String>) {
        self.emit(Severity::Info, stage, message);
    }

    pub fn success(&self, stage: Option<StageId>, message: impl Into<String>) {
        self.emit(Severity::Success, stage, message);
    }

    pub fn warning(&self, stage: Option<StageId>, message: impl Into<String>) {
        self.emit(Severity::Warning, stage, message);
    }

    pub fn error(&self, stage: Option<StageId>, message: impl Into<String>) {
        self.emit(Severity::Error, stage, message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reporter_routes_by_severity() {
        let sink = InMemorySink::new();
        let reporter = Reporter::new(Arc::new(sink.clone()));

        reporter.info(Some(StageId::Prerequisites), "installing bundle");
        reporter.success(None, "done");
        reporter.warning(Some(StageId::RuntimeDependencies), "manifest missing");
        reporter.error(Some(StageId::EnginePackage), "file not found: /x");
        reporter.emit(Severity::PackageError, Some(StageId::Prerequisites), "dnf failed");

        assert_eq!(
            sink.lines(Stream::Stdout),
            vec![
                "[INFO] stage 1 (prerequisites): installing bundle",
                "[SUCCESS] done",
            ]
        );
        assert_eq!(
            sink.lines(Stream::Stderr),
            vec![
                "[WARNING] stage 5 (runtime-dependencies): manifest missing",
                "[ERROR] stage 4 (engine-package): file not found: /x",
                "[PACKAGE_ERROR] stage 1 (prerequisites): dnf failed",
            ]
        );
    }

    #[test]
    fn test_console_format_keeps_literal_tag_off_terminal() {
        let diagnostic = Diagnostic::new(Severity::Warning, None, "skipped");
        assert_eq!(ConsoleSink::format(&diagnostic, false), "[WARNING] skipped");
    }
}
