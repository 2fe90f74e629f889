//! Stage 4: engine package install from local media
//!
//! Three distinguishable failures: the media location is missing or not a
//! directory, the package file is missing, or the local install fails.
//! The package is matched by file name only.

use provision_core::StageError;
use provision_core::domain::stage::StageId;

use super::Stage;
use crate::command::CommandSpec;
use crate::context::{StageContext, require_dir, require_file};

pub struct EnginePackageStage;

impl Stage for EnginePackageStage {
    fn id(&self) -> StageId {
        StageId::EnginePackage
    }

    fn run(&self, ctx: &StageContext<'_>) -> Result<(), StageError> {
        require_dir(&ctx.config.media_dir)?;

        let package = ctx.config.engine_package_path();
        require_file(&package)?;

        ctx.info(
            self.id(),
            format!("Installing engine package {}", package.display()),
        );

        let spec = CommandSpec::new(&ctx.config.package_manager)
            .arg("-y")
            .arg("localinstall")
            .arg(package.to_string_lossy());
        ctx.run_checked(
            &spec,
            &format!("local install of {}", package.display()),
        )?;

        ctx.success(self.id(), "Engine package installed");
        Ok(())
    }
}
