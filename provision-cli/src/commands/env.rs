//! Env command handler
//!
//! Regenerates the writer environment file without touching the instance.

use anyhow::{Context, Result};
use provision_runner::Reporter;
use provision_runner::artifact::write_env_file;
use provision_runner::context::require_dir;

use crate::config::Settings;

/// Overwrite `<writer_dir>/.env` from the parameter set
pub fn handle_env(settings: &Settings, reporter: &Reporter) -> Result<i32> {
    let path = settings.config.env_file_path();

    require_dir(&settings.config.writer_dir)
        .and_then(|_| write_env_file(&settings.params, &path))
        .with_context(|| format!("Failed to write {}", path.display()))?;

    reporter.success(None, format!("Wrote {}", path.display()));
    Ok(provision_core::error::EXIT_SUCCESS)
}
