//! Stage 5: writer runtime and dependencies
//!
//! Installs the runtime and its package installer through the OS package
//! manager, then creates the writer's isolated runtime environment. The
//! dependency manifest is optional: when it is absent only the dependency
//! install is skipped, with a warning, and the stage still succeeds.

use provision_core::StageError;
use provision_core::domain::stage::StageId;

use super::Stage;
use crate::command::CommandSpec;
use crate::context::StageContext;

pub struct RuntimeDependenciesStage;

impl Stage for RuntimeDependenciesStage {
    fn id(&self) -> StageId {
        StageId::RuntimeDependencies
    }

    fn run(&self, ctx: &StageContext<'_>) -> Result<(), StageError> {
        let runtime = ctx.config.runtime_program();
        let pip = format!("{}-pip", runtime);

        ctx.info(self.id(), format!("Installing {} and {}", runtime, pip));
        ctx.install_packages(&[runtime.as_str(), pip.as_str()])
            .map_err(|err| match err {
                // Only stage 1 reports the package-class status
                StageError::PackageInstall { package, status } => StageError::CommandFailed {
                    action: format!("install of {}", package),
                    status,
                },
                other => other,
            })?;

        let venv = ctx.config.venv_dir();
        let create_venv = CommandSpec::new(&runtime)
            .args(["-m", "venv"])
            .arg(venv.to_string_lossy());
        ctx.run_checked(
            &create_venv,
            &format!("create runtime environment {}", venv.display()),
        )?;

        let manifest = ctx.config.manifest_path();
        if !manifest.is_file() {
            ctx.warning(
                self.id(),
                format!(
                    "Dependency manifest {} not found, skipping dependency installation",
                    manifest.display()
                ),
            );
            ctx.success(
                self.id(),
                format!("{} installed with environment {}", runtime, venv.display()),
            );
            return Ok(());
        }

        let venv_pip = venv.join("bin").join("pip");
        let install = CommandSpec::new(venv_pip.to_string_lossy())
            .args(["install", "-r"])
            .arg(manifest.to_string_lossy());
        ctx.run_checked(
            &install,
            &format!("install dependencies from {}", manifest.display()),
        )?;

        ctx.success(
            self.id(),
            format!(
                "{} installed with dependencies from {}",
                runtime,
                manifest.display()
            ),
        );
        Ok(())
    }
}
