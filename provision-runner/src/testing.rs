//! Test support: a recording command runner and a temp-rooted environment

use provision_core::domain::diagnostic::Stream;
use provision_core::domain::params::ParameterSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::command::{CommandOutput, CommandRunner, CommandSpec};
use crate::config::Config;
use crate::context::StageContext;
use crate::diagnostics::{InMemorySink, Reporter};

struct Rule {
    program: String,
    needle: String,
    outcome: Outcome,
}

#[derive(Clone, Copy)]
enum Outcome {
    Status(Option<i32>),
    SpawnError,
}

/// Records every command and answers with scripted statuses
///
/// Commands succeed unless a rule matches. A rule matches when the
/// program's file name equals `program` and, if `needle` is non-empty,
/// some argument contains it.
#[derive(Clone, Default)]
pub struct RecordingRunner {
    calls: Arc<Mutex<Vec<CommandSpec>>>,
    rules: Arc<Mutex<Vec<Rule>>>,
}

impl RecordingRunner {
    pub fn new() -> Self {
        Self::default()
    }

    fn add_rule(&self, program: &str, needle: &str, outcome: Outcome) {
        self.rules.lock().unwrap().push(Rule {
            program: program.to_string(),
            needle: needle.to_string(),
            outcome,
        });
    }

    pub fn fail_when(&self, program: &str, needle: &str, status: i32) {
        self.add_rule(program, needle, Outcome::Status(Some(status)));
    }

    pub fn kill_when(&self, program: &str, needle: &str) {
        self.add_rule(program, needle, Outcome::Status(None));
    }

    pub fn spawn_error_when(&self, program: &str, needle: &str) {
        self.add_rule(program, needle, Outcome::SpawnError);
    }

    pub fn calls(&self) -> Vec<CommandSpec> {
        self.calls.lock().unwrap().clone()
    }

    /// Recorded commands rendered with secrets masked
    pub fn command_lines(&self) -> Vec<String> {
        self.calls().iter().map(ToString::to_string).collect()
    }

    /// Whether any recorded command used the given program file name
    pub fn invoked(&self, program: &str) -> bool {
        self.calls().iter().any(|spec| file_name(&spec.program) == program)
    }
}

fn file_name(program: &str) -> &str {
    Path::new(program)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(program)
}

impl CommandRunner for RecordingRunner {
    fn run(&self, spec: &CommandSpec) -> std::io::Result<CommandOutput> {
        self.calls.lock().unwrap().push(spec.clone());

        let rules = self.rules.lock().unwrap();
        let matched = rules.iter().find(|rule| {
            file_name(&spec.program) == rule.program
                && (rule.needle.is_empty() || spec.args.iter().any(|a| a.contains(&rule.needle)))
        });

        match matched.map(|rule| rule.outcome) {
            Some(Outcome::SpawnError) => Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "program not found",
            )),
            Some(Outcome::Status(status)) => Ok(CommandOutput {
                status,
                ..CommandOutput::default()
            }),
            None => Ok(CommandOutput::with_status(0)),
        }
    }
}

/// Parameters, config, runner and reporter rooted in a temp directory
pub struct TestEnv {
    pub tmp: tempfile::TempDir,
    pub params: ParameterSet,
    pub config: Config,
    pub runner: RecordingRunner,
    pub sink: InMemorySink,
    pub reporter: Reporter,
}

impl TestEnv {
    pub fn new() -> Self {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path();

        let mut params = ParameterSet::default();
        params.service_account.home = root.join("home/oracle");
        params.layout.install_root = root.join("opt/oracle");
        params.layout.engine_home = root.join("opt/oracle/product/19c/dbhome_1");
        params.storage.datafile_destination = root.join("opt/oracle/oradata");
        params.storage.recovery_area_destination = root.join("opt/oracle/fast_recovery_area");
        params.credentials.system_password = "Tone_Row_12".to_string();

        let mut config = Config::new(root.join("writer"));
        config.media_dir = root.join("media");

        let sink = InMemorySink::new();
        let reporter = Reporter::new(Arc::new(sink.clone()));

        Self {
            tmp,
            params,
            config,
            runner: RecordingRunner::new(),
            sink,
            reporter,
        }
    }

    pub fn root(&self) -> &Path {
        self.tmp.path()
    }

    pub fn context(&self) -> StageContext<'_> {
        StageContext::new(&self.params, &self.config, &self.runner, &self.reporter)
    }

    /// Places the engine package at the media location
    pub fn with_media_package(&self) -> PathBuf {
        std::fs::create_dir_all(&self.config.media_dir).unwrap();
        let package = self.config.engine_package_path();
        std::fs::write(&package, b"rpm").unwrap();
        package
    }

    /// Creates the instance-creation tool inside the engine home
    pub fn with_creation_tool(&self) -> PathBuf {
        let tool = self.params.layout.creation_tool();
        std::fs::create_dir_all(tool.parent().unwrap()).unwrap();
        std::fs::write(&tool, b"#!/bin/sh\n").unwrap();
        tool
    }

    /// Creates the writer directory with its environment and entry point
    pub fn with_writer(&self) {
        std::fs::create_dir_all(self.config.venv_dir().join("bin")).unwrap();
        std::fs::write(self.config.entry_script_path(), b"print('writer')\n").unwrap();
    }

    /// Writes the dependency manifest
    pub fn with_manifest(&self) -> PathBuf {
        let manifest = self.config.manifest_path();
        std::fs::create_dir_all(manifest.parent().unwrap()).unwrap();
        std::fs::write(&manifest, b"oracledb\npython-dotenv\n").unwrap();
        manifest
    }

    pub fn stdout(&self) -> Vec<String> {
        self.sink.lines(Stream::Stdout)
    }

    pub fn stderr(&self) -> Vec<String> {
        self.sink.lines(Stream::Stderr)
    }
}
