//! Stage 1: OS prerequisite package bundle

use provision_core::StageError;
use provision_core::domain::stage::StageId;

use super::Stage;
use crate::context::StageContext;

pub struct PrerequisitesStage;

impl Stage for PrerequisitesStage {
    fn id(&self) -> StageId {
        StageId::Prerequisites
    }

    fn run(&self, ctx: &StageContext<'_>) -> Result<(), StageError> {
        let package = ctx.config.prerequisite_package.as_str();
        ctx.info(self.id(), format!("Installing prerequisite package {}", package));

        ctx.install_packages(&[package])?;

        ctx.success(self.id(), format!("Prerequisite package {} installed", package));
        Ok(())
    }
}
