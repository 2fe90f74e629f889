//! Stage 2: guest-integration installer
//!
//! The installer is an opaque vendor script. When no installer is
//! configured the stage is skipped with a warning.

use provision_core::StageError;
use provision_core::domain::stage::StageId;

use super::Stage;
use crate::command::CommandSpec;
use crate::context::{StageContext, require_file};

pub struct GuestAdditionsStage;

impl Stage for GuestAdditionsStage {
    fn id(&self) -> StageId {
        StageId::GuestAdditions
    }

    fn run(&self, ctx: &StageContext<'_>) -> Result<(), StageError> {
        let Some(installer) = &ctx.config.guest_additions_installer else {
            ctx.warning(
                self.id(),
                "No guest-integration installer configured, skipping",
            );
            return Ok(());
        };

        require_file(installer)?;

        ctx.info(
            self.id(),
            format!("Running guest-integration installer {}", installer.display()),
        );

        let spec = CommandSpec::new("sh").arg(installer.to_string_lossy());
        ctx.run_checked(&spec, "guest-integration installer")?;

        ctx.success(self.id(), "Guest integration installed");
        Ok(())
    }
}
