//! Stage 6: instance creation and writer environment file
//!
//! The creation tool runs silently as the service account with every
//! parameter passed as a named argument. Only once it succeeds is the
//! writer's environment file generated, from the parameters the tool
//! confirmed.

use provision_core::StageError;
use provision_core::domain::params::ParameterSet;
use provision_core::domain::stage::StageId;
use std::path::PathBuf;
use tracing::debug;

use super::Stage;
use crate::artifact;
use crate::command::CommandSpec;
use crate::context::{StageContext, require_file};

/// Named arguments for silent instance creation
pub fn creation_arguments(params: &ParameterSet) -> Vec<String> {
    let path = |p: &std::path::Path| p.to_string_lossy().to_string();
    let flag = |b: bool| b.to_string();

    let pairs: Vec<(&str, String)> = vec![
        ("-templateName", params.template.clone()),
        ("-gdbname", params.global_db_name.clone()),
        ("-sid", params.sid.clone()),
        ("-responseFile", "NO_VALUE".to_string()),
        ("-characterSet", params.character_set.clone()),
        ("-sysPassword", params.credentials.sys_password.clone()),
        ("-systemPassword", params.credentials.system_password.clone()),
        (
            "-createAsContainerDatabase",
            flag(params.topology.container_database),
        ),
        ("-numberOfPDBs", params.topology.pdb_count.to_string()),
        ("-pdbName", params.topology.pdb_name.clone()),
        (
            "-pdbAdminPassword",
            params.credentials.pdb_admin_password.clone(),
        ),
        ("-databaseType", params.database_type.clone()),
        (
            "-memoryMgmtType",
            params.storage.memory_management.as_arg().to_string(),
        ),
        ("-totalMemory", params.storage.total_memory_mb.to_string()),
        ("-storageType", params.storage.storage_type.as_arg().to_string()),
        (
            "-datafileDestination",
            path(&params.storage.datafile_destination),
        ),
        ("-redoLogFileSize", params.storage.redo_log_size_mb.to_string()),
        ("-emConfiguration", params.features.em_configuration.clone()),
        ("-enableArchive", flag(params.features.archiving)),
        (
            "-recoveryAreaDestination",
            path(&params.storage.recovery_area_destination),
        ),
        (
            "-recoveryAreaSize",
            params.storage.recovery_area_size_mb.to_string(),
        ),
    ];

    let mut args = vec!["-silent".to_string(), "-createDatabase".to_string()];
    for (name, value) in pairs {
        args.push(name.to_string());
        args.push(value);
    }
    args.push("-ignorePreReqs".to_string());
    args
}

/// Proof that the creation tool accepted a parameter set
pub struct AppliedInstance<'a> {
    params: &'a ParameterSet,
}

impl<'a> AppliedInstance<'a> {
    pub fn params(&self) -> &'a ParameterSet {
        self.params
    }
}

pub struct InstanceCreationStage;

impl InstanceCreationStage {
    fn create_instance<'a>(
        &self,
        ctx: &StageContext<'a>,
    ) -> Result<AppliedInstance<'a>, StageError> {
        let params = ctx.params;
        let tool = params.layout.creation_tool();
        require_file(&tool)?;

        ctx.info(
            self.id(),
            format!(
                "Creating instance {} with pluggable database {} (this can take a while)",
                params.sid, params.topology.pdb_name
            ),
        );

        let spec = CommandSpec::new("runuser")
            .args(["-u", params.service_account.name.as_str(), "--"])
            .arg(tool.to_string_lossy())
            .args(creation_arguments(params))
            .sensitive([
                params.credentials.sys_password.as_str(),
                params.credentials.system_password.as_str(),
                params.credentials.pdb_admin_password.as_str(),
            ]);
        debug!("Instance creation command: {}", spec);

        ctx.run_checked(&spec, &format!("creation of instance {}", params.sid))?;

        Ok(AppliedInstance { params })
    }

    fn generate_artifact(
        &self,
        ctx: &StageContext<'_>,
        applied: &AppliedInstance<'_>,
    ) -> Result<PathBuf, StageError> {
        let path = ctx.config.env_file_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| StageError::io(format!("create directory {}", parent.display()), e))?;
        }

        artifact::write_env_file(applied.params(), &path)?;
        Ok(path)
    }
}

impl Stage for InstanceCreationStage {
    fn id(&self) -> StageId {
        StageId::InstanceCreation
    }

    fn run(&self, ctx: &StageContext<'_>) -> Result<(), StageError> {
        ctx.params.validate()?;

        let applied = self.create_instance(ctx)?;
        ctx.success(
            self.id(),
            format!("Instance {} created", applied.params().sid),
        );

        let path = self.generate_artifact(ctx, &applied)?;
        ctx.success(
            self.id(),
            format!("Writer environment file written to {}", path.display()),
        );
        Ok(())
    }
}
