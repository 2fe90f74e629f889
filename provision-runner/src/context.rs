//! Execution context for pipeline stages
//!
//! Contains everything a stage may read or use:
//! - The frozen parameter set
//! - Runtime configuration (paths, package manager)
//! - Command runner for external tools
//! - Reporter for diagnostics
//!
//! Stages never consult global state; they receive this context by reference.

use provision_core::StageError;
use provision_core::domain::params::ParameterSet;
use provision_core::domain::stage::StageId;
use std::path::Path;

use crate::command::{CommandOutput, CommandRunner, CommandSpec};
use crate::config::Config;
use crate::diagnostics::Reporter;

/// Execution context shared across the stages of one run
pub struct StageContext<'a> {
    pub params: &'a ParameterSet,
    pub config: &'a Config,
    pub runner: &'a dyn CommandRunner,
    pub reporter: &'a Reporter,
}

impl<'a> StageContext<'a> {
    pub fn new(
        params: &'a ParameterSet,
        config: &'a Config,
        runner: &'a dyn CommandRunner,
        reporter: &'a Reporter,
    ) -> Self {
        Self {
            params,
            config,
            runner,
            reporter,
        }
    }

    /// Runs a command, mapping a start failure to `StageError::Spawn`
    pub fn run(&self, spec: &CommandSpec) -> Result<CommandOutput, StageError> {
        self.runner.run(spec).map_err(|source| StageError::Spawn {
            program: spec.program.clone(),
            source,
        })
    }

    /// Runs a command and requires a zero status
    ///
    /// `action` names the sub-action in the failure message.
    pub fn run_checked(&self, spec: &CommandSpec, action: &str) -> Result<(), StageError> {
        let output = self.run(spec)?;
        if output.success() {
            Ok(())
        } else {
            Err(StageError::CommandFailed {
                action: action.to_string(),
                status: output.status,
            })
        }
    }

    /// Runs a package-manager install, failing with the package-class error
    pub fn install_packages(&self, packages: &[&str]) -> Result<(), StageError> {
        let spec = CommandSpec::new(&self.config.package_manager)
            .arg("-y")
            .arg("install")
            .args(packages.iter().copied());

        let output = self.run(&spec)?;
        if output.success() {
            Ok(())
        } else {
            Err(StageError::PackageInstall {
                package: packages.join(" "),
                status: output.status,
            })
        }
    }

    pub fn info(&self, stage: StageId, message: impl Into<String>) {
        self.reporter.info(Some(stage), message);
    }

    pub fn success(&self, stage: StageId, message: impl Into<String>) {
        self.reporter.success(Some(stage), message);
    }

    pub fn warning(&self, stage: StageId, message: impl Into<String>) {
        self.reporter.warning(Some(stage), message);
    }
}

/// Requires `path` to exist and be a directory
pub fn require_dir(path: &Path) -> Result<(), StageError> {
    if !path.exists() {
        return Err(StageError::MissingDirectory {
            path: path.to_path_buf(),
        });
    }
    if !path.is_dir() {
        return Err(StageError::NotADirectory {
            path: path.to_path_buf(),
        });
    }
    Ok(())
}

/// Requires `path` to exist as a file
pub fn require_file(path: &Path) -> Result<(), StageError> {
    if !path.is_file() {
        return Err(StageError::MissingFile {
            path: path.to_path_buf(),
        });
    }
    Ok(())
}
