//! Configuration module
//!
//! Resolves the parameter set and the runtime configuration from the
//! built-in defaults, environment variables and command-line flags.

use anyhow::{Context, Result};
use provision_core::domain::params::ParameterSet;
use provision_runner::Config;
use std::path::{Path, PathBuf};

/// Command-line overrides applied on top of the environment
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub params_file: Option<PathBuf>,
    pub media_dir: Option<PathBuf>,
    pub writer_dir: Option<PathBuf>,
    pub guest_additions: Option<PathBuf>,
    pub profile: Option<PathBuf>,
}

/// Everything a command needs, resolved once at startup
#[derive(Debug, Clone)]
pub struct Settings {
    pub params: ParameterSet,
    pub config: Config,
}

impl Settings {
    /// Loads settings from the environment and applies the overrides
    pub fn load(overrides: &Overrides) -> Result<Self> {
        let mut config = Config::from_env().context("Invalid PROVISION_* environment")?;

        if let Some(dir) = &overrides.media_dir {
            config.media_dir = dir.clone();
        }
        if let Some(dir) = &overrides.writer_dir {
            config.writer_dir = dir.clone();
        }
        if let Some(installer) = &overrides.guest_additions {
            config.guest_additions_installer = Some(installer.clone());
        }
        if let Some(profile) = &overrides.profile {
            config.profile_source = Some(profile.clone());
        }
        config.validate()?;

        let params = match &overrides.params_file {
            Some(path) => load_params(path)?,
            None => ParameterSet::default(),
        };

        Ok(Self { params, config })
    }
}

/// Reads a JSON parameter override document
pub fn load_params(path: &Path) -> Result<ParameterSet> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read parameter file {}", path.display()))?;

    ParameterSet::from_json(&json)
        .with_context(|| format!("Failed to parse parameter file {}", path.display()))
}
