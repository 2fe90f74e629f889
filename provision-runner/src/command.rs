//! External command execution
//!
//! Every side effect the pipeline delegates to another program (package
//! manager, account tools, instance creation, the writer) goes through a
//! `CommandRunner`. Stages build a `CommandSpec`, hand it to the runner and
//! decide what the returned status means.

use std::collections::BTreeMap;
use std::fmt;
use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use tracing::debug;

use provision_core::domain::params::SECRET_MASK;

/// Description of one external invocation
#[derive(Debug, Clone, Default)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    /// Working directory, inherited when unset
    pub cwd: Option<PathBuf>,
    /// Variables added to the inherited environment
    pub env: BTreeMap<String, String>,
    /// Variables removed from the inherited environment
    pub env_remove: Vec<String>,
    /// Data written to the child's stdin
    pub stdin: Option<String>,
    /// Capture stdout/stderr instead of inheriting them
    pub capture: bool,
    /// Values masked whenever the command is displayed
    pub sensitive: Vec<String>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            ..Self::default()
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    pub fn env_remove(mut self, key: impl Into<String>) -> Self {
        self.env_remove.push(key.into());
        self
    }

    pub fn stdin(mut self, input: impl Into<String>) -> Self {
        self.stdin = Some(input.into());
        self
    }

    pub fn capture(mut self) -> Self {
        self.capture = true;
        self
    }

    /// Marks values that must never appear in logs
    pub fn sensitive<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sensitive.extend(
            values
                .into_iter()
                .map(Into::into)
                .filter(|v: &String| !v.is_empty()),
        );
        self
    }

    fn mask(&self, text: &str) -> String {
        self.sensitive
            .iter()
            .fold(text.to_string(), |acc, secret| acc.replace(secret.as_str(), SECRET_MASK))
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.mask(&self.program))?;
        for arg in &self.args {
            write!(f, " {}", self.mask(arg))?;
        }
        Ok(())
    }
}

/// Result of a finished command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit status; `None` when the process was terminated by a signal
    pub status: Option<i32>,
    /// Captured stdout, empty unless capture was requested
    pub stdout: String,
    /// Captured stderr, empty unless capture was requested
    pub stderr: String,
}

impl CommandOutput {
    pub fn with_status(status: i32) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn success(&self) -> bool {
        self.status == Some(0)
    }
}

/// Executes external commands
///
/// Calls block until the child exits; there is no timeout.
pub trait CommandRunner {
    /// Runs the command to completion
    ///
    /// Returns `Err` only when the program could not be started; a
    /// non-zero status is reported through `CommandOutput`.
    fn run(&self, spec: &CommandSpec) -> std::io::Result<CommandOutput>;
}

/// `CommandRunner` backed by `std::process::Command`
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemCommandRunner;

impl SystemCommandRunner {
    pub fn new() -> Self {
        Self
    }

    fn build(spec: &CommandSpec) -> Command {
        let mut command = Command::new(&spec.program);
        command.args(&spec.args);

        if let Some(dir) = &spec.cwd {
            command.current_dir(dir);
        }
        for key in &spec.env_remove {
            command.env_remove(key);
        }
        command.envs(&spec.env);

        command.stdin(if spec.stdin.is_some() {
            Stdio::piped()
        } else {
            Stdio::inherit()
        });

        if spec.capture {
            command.stdout(Stdio::piped()).stderr(Stdio::piped());
        } else {
            command.stdout(Stdio::inherit()).stderr(Stdio::inherit());
        }

        command
    }
}

impl CommandRunner for SystemCommandRunner {
    fn run(&self, spec: &CommandSpec) -> std::io::Result<CommandOutput> {
        debug!("Executing: {}", spec);

        let mut child = Self::build(spec).spawn()?;

        if let Some(input) = &spec.stdin {
            // Dropping the handle closes the pipe so the child sees EOF
            if let Some(mut handle) = child.stdin.take() {
                handle.write_all(input.as_bytes())?;
            }
        }

        let output = child.wait_with_output()?;
        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();

        if !stdout.trim().is_empty() {
            debug!("{} stdout: {}", spec.program, spec.mask(stdout.trim()));
        }
        if !stderr.trim().is_empty() {
            debug!("{} stderr: {}", spec.program, spec.mask(stderr.trim()));
        }

        debug!(
            "Command {} finished with status {:?}",
            spec.program,
            output.status.code()
        );

        Ok(CommandOutput {
            status: output.status.code(),
            stdout,
            stderr,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_masks_secrets() {
        let spec = CommandSpec::new("dbca")
            .args(["-silent", "-sysPassword", "S3cret!"])
            .sensitive(["S3cret!", ""]);

        assert_eq!(spec.to_string(), "dbca -silent -sysPassword ********");
        assert_eq!(spec.sensitive.len(), 1);
    }

    #[test]
    fn test_builder_collects_fields() {
        let spec = CommandSpec::new("python3.11")
            .arg("main.py")
            .current_dir("/srv/writer")
            .env("VIRTUAL_ENV", "/srv/writer/venv")
            .env_remove("PYTHONHOME")
            .stdin("input")
            .capture();

        assert_eq!(spec.args, vec!["main.py"]);
        assert_eq!(spec.cwd, Some(PathBuf::from("/srv/writer")));
        assert_eq!(spec.env.get("VIRTUAL_ENV").map(String::as_str), Some("/srv/writer/venv"));
        assert_eq!(spec.env_remove, vec!["PYTHONHOME"]);
        assert_eq!(spec.stdin.as_deref(), Some("input"));
        assert!(spec.capture);
    }

    #[test]
    fn test_system_runner_reports_status() {
        let runner = SystemCommandRunner::new();

        let ok = runner.run(&CommandSpec::new("sh").args(["-c", "exit 0"])).unwrap();
        assert!(ok.success());

        let failed = runner.run(&CommandSpec::new("sh").args(["-c", "exit 7"])).unwrap();
        assert_eq!(failed.status, Some(7));
        assert!(!failed.success());
    }

    #[test]
    fn test_system_runner_pipes_stdin_and_captures() {
        let runner = SystemCommandRunner::new();
        let output = runner
            .run(&CommandSpec::new("cat").stdin("oracle:secret\n").capture())
            .unwrap();

        assert!(output.success());
        assert_eq!(output.stdout, "oracle:secret\n");
    }

    #[test]
    fn test_system_runner_spawn_failure() {
        let runner = SystemCommandRunner::new();
        let result = runner.run(&CommandSpec::new("definitely-not-a-real-program-xyz"));
        assert!(result.is_err());
    }
}
