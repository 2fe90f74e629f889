//! Stage 3: service account setup
//!
//! Sets the account password, creates the account's home and the engine
//! home tree, hands the install root over to the account and installs its
//! shell profile.
//! Each sub-action fails on its own with a message naming it.

use provision_core::StageError;
use provision_core::domain::stage::StageId;
use std::fs;
use std::path::PathBuf;

use super::Stage;
use crate::command::CommandSpec;
use crate::context::{StageContext, require_file};

/// Shell profile installed when no profile file is configured
pub const BUNDLED_PROFILE: &str = include_str!("../../assets/oracle.bash_profile");

/// Profile file name inside the account's home directory
pub const PROFILE_FILE_NAME: &str = ".bash_profile";

/// Permission bits applied recursively to the install root
const INSTALL_ROOT_MODE: &str = "775";

pub struct ServiceAccountStage;

impl ServiceAccountStage {
    fn set_password(&self, ctx: &StageContext<'_>) -> Result<(), StageError> {
        let account = &ctx.params.service_account;
        let spec = CommandSpec::new("chpasswd")
            .stdin(format!("{}:{}\n", account.name, account.password))
            .sensitive([account.password.clone()]);

        ctx.run_checked(
            &spec,
            &format!("set password for account '{}'", account.name),
        )
    }

    fn create_directories(&self, ctx: &StageContext<'_>) -> Result<(), StageError> {
        let params = ctx.params;
        let dirs = [
            &params.service_account.home,
            &params.layout.engine_home,
            &params.storage.datafile_destination,
            &params.storage.recovery_area_destination,
        ];

        for dir in dirs {
            // create_dir_all treats an existing directory as success
            fs::create_dir_all(dir)
                .map_err(|e| StageError::io(format!("create directory {}", dir.display()), e))?;
        }
        Ok(())
    }

    fn assign_ownership(&self, ctx: &StageContext<'_>) -> Result<(), StageError> {
        let account = &ctx.params.service_account;
        let root = ctx.params.layout.install_root.to_string_lossy().to_string();

        let chown = CommandSpec::new("chown")
            .arg("-R")
            .arg(format!("{}:{}", account.name, account.group))
            .arg(&root);
        ctx.run_checked(&chown, &format!("assign ownership of {}", root))?;

        let chmod = CommandSpec::new("chmod")
            .arg("-R")
            .arg(INSTALL_ROOT_MODE)
            .arg(&root);
        ctx.run_checked(&chmod, &format!("set permissions on {}", root))
    }

    fn install_profile(&self, ctx: &StageContext<'_>) -> Result<PathBuf, StageError> {
        let account = &ctx.params.service_account;
        let destination = account.home.join(PROFILE_FILE_NAME);

        match &ctx.config.profile_source {
            Some(source) => fs::copy(source, &destination).map(|_| ()).map_err(|e| {
                StageError::io(
                    format!(
                        "copy profile {} to {}",
                        source.display(),
                        destination.display()
                    ),
                    e,
                )
            })?,
            None => fs::write(&destination, BUNDLED_PROFILE).map_err(|e| {
                StageError::io(format!("write profile {}", destination.display()), e)
            })?,
        }

        let dest = destination.to_string_lossy().to_string();
        let chown = CommandSpec::new("chown")
            .arg(format!("{}:{}", account.name, account.group))
            .arg(&dest);
        ctx.run_checked(&chown, &format!("transfer ownership of {}", dest))?;

        let activate = CommandSpec::new("runuser")
            .args(["-u", account.name.as_str(), "--", "bash", "-c"])
            .arg(format!("source {}", dest));
        ctx.run_checked(&activate, &format!("activate profile {}", dest))?;

        Ok(destination)
    }
}

impl Stage for ServiceAccountStage {
    fn id(&self) -> StageId {
        StageId::ServiceAccount
    }

    fn run(&self, ctx: &StageContext<'_>) -> Result<(), StageError> {
        let account = &ctx.params.service_account;

        if let Some(source) = &ctx.config.profile_source {
            require_file(source)?;
        }

        ctx.info(
            self.id(),
            format!("Configuring service account '{}'", account.name),
        );

        self.set_password(ctx)?;
        self.create_directories(ctx)?;
        self.assign_ownership(ctx)?;
        let profile = self.install_profile(ctx)?;

        ctx.success(
            self.id(),
            format!(
                "Service account '{}' ready, profile installed at {}",
                account.name,
                profile.display()
            ),
        );
        Ok(())
    }
}
