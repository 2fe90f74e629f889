//! Stage 7: hand-off to the downstream writer
//!
//! Runs the writer's entry point inside its isolated runtime environment
//! and forwards the writer's literal exit status. The environment is
//! activated for the child process only, so the pipeline's own working
//! directory and environment are unchanged afterwards.

use provision_core::StageError;
use provision_core::domain::stage::StageId;
use std::path::Path;

use super::Stage;
use crate::command::CommandSpec;
use crate::context::{StageContext, require_dir, require_file};

pub struct HandoffStage;

impl HandoffStage {
    /// Writer invocation with the runtime environment activated
    fn writer_command(venv: &Path, entry: &Path, workdir: &Path) -> CommandSpec {
        let bin = venv.join("bin");
        let path = match std::env::var_os("PATH") {
            Some(existing) => format!("{}:{}", bin.display(), existing.to_string_lossy()),
            None => bin.display().to_string(),
        };

        CommandSpec::new(bin.join("python").to_string_lossy())
            .arg(entry.to_string_lossy())
            .current_dir(workdir)
            .env("VIRTUAL_ENV", venv.to_string_lossy())
            .env("PATH", path)
            .env_remove("PYTHONHOME")
    }
}

impl Stage for HandoffStage {
    fn id(&self) -> StageId {
        StageId::Handoff
    }

    fn run(&self, ctx: &StageContext<'_>) -> Result<(), StageError> {
        let workdir = &ctx.config.writer_dir;
        let venv = ctx.config.venv_dir();
        let entry = ctx.config.entry_script_path();

        require_dir(workdir)?;
        require_dir(&venv)?;
        require_file(&entry)?;

        ctx.info(
            self.id(),
            format!(
                "Running writer {} in {}",
                entry.display(),
                workdir.display()
            ),
        );

        let spec = Self::writer_command(&venv, &entry, workdir);
        let output = ctx.run(&spec)?;

        match output.status {
            Some(0) => {
                ctx.success(self.id(), "Writer completed");
                Ok(())
            }
            Some(status) => Err(StageError::HandoffFailed { status }),
            None => Err(StageError::CommandFailed {
                action: "writer".to_string(),
                status: None,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::TestEnv;

    #[test]
    fn test_runs_entry_point_inside_environment() {
        let env = TestEnv::new();
        env.with_writer();
        let cwd_before = std::env::current_dir().unwrap();

        HandoffStage.run(&env.context()).unwrap();

        let calls = env.runner.calls();
        assert_eq!(calls.len(), 1);
        let venv = env.config.venv_dir();
        assert_eq!(
            calls[0].program,
            venv.join("bin/python").to_string_lossy()
        );
        assert_eq!(
            calls[0].args,
            vec![env.config.entry_script_path().to_string_lossy().to_string()]
        );
        assert_eq!(calls[0].cwd.as_deref(), Some(env.config.writer_dir.as_path()));
        assert_eq!(
            calls[0].env.get("VIRTUAL_ENV").map(String::as_str),
            Some(&*venv.to_string_lossy())
        );
        assert!(calls[0].env["PATH"].starts_with(&venv.join("bin").display().to_string()));
        assert_eq!(calls[0].env_remove, vec!["PYTHONHOME"]);
        assert_eq!(std::env::current_dir().unwrap(), cwd_before);
    }

    #[test]
    fn test_forwards_writer_status() {
        let env = TestEnv::new();
        env.with_writer();
        env.runner.fail_when("python", "main.py", 42);

        let err = HandoffStage.run(&env.context()).unwrap_err();
        assert!(matches!(err, StageError::HandoffFailed { status: 42 }));
        assert_eq!(err.exit_code(), 42);
        assert_eq!(err.to_string(), "writer exited with status 42");
    }

    #[test]
    fn test_writer_killed_by_signal_is_generic() {
        let env = TestEnv::new();
        env.with_writer();
        env.runner.kill_when("python", "");

        let err = HandoffStage.run(&env.context()).unwrap_err();
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn test_each_precondition_has_its_own_message() {
        let env = TestEnv::new();
        let err = HandoffStage.run(&env.context()).unwrap_err();
        assert_eq!(
            err.to_string(),
            format!("directory not found: {}", env.config.writer_dir.display())
        );

        std::fs::create_dir_all(&env.config.writer_dir).unwrap();
        let err = HandoffStage.run(&env.context()).unwrap_err();
        assert_eq!(
            err.to_string(),
            format!("directory not found: {}", env.config.venv_dir().display())
        );

        std::fs::create_dir_all(env.config.venv_dir()).unwrap();
        let err = HandoffStage.run(&env.context()).unwrap_err();
        assert_eq!(
            err.to_string(),
            format!("file not found: {}", env.config.entry_script_path().display())
        );

        assert!(env.runner.calls().is_empty());
    }
}
