//! Runtime configuration
//!
//! Defines where the pipeline finds its inputs on the machine: the package
//! manager, installation media, optional installer and profile files, and
//! the downstream writer's working directory. Database parameters live in
//! `provision_core::domain::params` instead.

use serde::Serialize;
use std::path::{Path, PathBuf};

/// Name of the environment file generated inside the writer directory
pub const ENV_FILE_NAME: &str = ".env";

/// Name of the isolated runtime environment inside the writer directory
pub const VENV_DIR_NAME: &str = "venv";

/// Runtime configuration
#[derive(Debug, Clone, Serialize)]
pub struct Config {
    /// Package manager executable (e.g., "dnf")
    pub package_manager: String,

    /// OS prerequisite package bundle installed by stage 1
    pub prerequisite_package: String,

    /// Directory expected to hold the engine package
    pub media_dir: PathBuf,

    /// File name of the engine package inside `media_dir`
    pub engine_package: String,

    /// Guest-integration installer; the stage is skipped when unset
    pub guest_additions_installer: Option<PathBuf>,

    /// Pre-built shell profile; the bundled profile is used when unset
    pub profile_source: Option<PathBuf>,

    /// Writer runtime version (e.g., "3.11")
    pub runtime_version: String,

    /// Working directory of the downstream writer
    pub writer_dir: PathBuf,

    /// Dependency manifest; defaults to `<writer_dir>/requirements.txt`
    pub manifest: Option<PathBuf>,

    /// Writer entry-point script, relative to `writer_dir`
    pub entry_script: String,
}

impl Config {
    /// Creates a new configuration with defaults for the given writer directory
    pub fn new(writer_dir: PathBuf) -> Self {
        Self {
            package_manager: "dnf".to_string(),
            prerequisite_package: "oracle-database-preinstall-19c".to_string(),
            media_dir: PathBuf::from("/mnt/oracle-media"),
            engine_package: "oracle-database-ee-19c-1.0-1.x86_64.rpm".to_string(),
            guest_additions_installer: None,
            profile_source: None,
            runtime_version: "3.11".to_string(),
            writer_dir,
            manifest: None,
            entry_script: "main.py".to_string(),
        }
    }

    /// Creates configuration from environment variables
    ///
    /// Every variable is optional and falls back to the default:
    /// - PROVISION_PACKAGE_MANAGER
    /// - PROVISION_PREREQUISITE_PACKAGE
    /// - PROVISION_MEDIA_DIR
    /// - PROVISION_ENGINE_PACKAGE
    /// - PROVISION_GUEST_ADDITIONS
    /// - PROVISION_PROFILE
    /// - PROVISION_RUNTIME_VERSION
    /// - PROVISION_WRITER_DIR
    /// - PROVISION_MANIFEST
    /// - PROVISION_ENTRY_SCRIPT
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds configuration from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let mut config = Self::default();

        if let Some(value) = var("PROVISION_PACKAGE_MANAGER") {
            config.package_manager = value;
        }
        if let Some(value) = var("PROVISION_PREREQUISITE_PACKAGE") {
            config.prerequisite_package = value;
        }
        if let Some(value) = var("PROVISION_MEDIA_DIR") {
            config.media_dir = PathBuf::from(value);
        }
        if let Some(value) = var("PROVISION_ENGINE_PACKAGE") {
            config.engine_package = value;
        }
        config.guest_additions_installer = var("PROVISION_GUEST_ADDITIONS").map(PathBuf::from);
        config.profile_source = var("PROVISION_PROFILE").map(PathBuf::from);
        if let Some(value) = var("PROVISION_RUNTIME_VERSION") {
            config.runtime_version = value;
        }
        if let Some(value) = var("PROVISION_WRITER_DIR") {
            config.writer_dir = PathBuf::from(value);
        }
        config.manifest = var("PROVISION_MANIFEST").map(PathBuf::from);
        if let Some(value) = var("PROVISION_ENTRY_SCRIPT") {
            config.entry_script = value;
        }

        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.package_manager.trim().is_empty() {
            anyhow::bail!("package_manager cannot be empty");
        }

        if self.prerequisite_package.trim().is_empty() {
            anyhow::bail!("prerequisite_package cannot be empty");
        }

        if self.engine_package.trim().is_empty() {
            anyhow::bail!("engine_package cannot be empty");
        }

        if Path::new(&self.engine_package).components().count() != 1 {
            anyhow::bail!("engine_package must be a plain file name, not a path");
        }

        if self.media_dir.as_os_str().is_empty() {
            anyhow::bail!("media_dir cannot be empty");
        }

        if self.writer_dir.as_os_str().is_empty() {
            anyhow::bail!("writer_dir cannot be empty");
        }

        if self.runtime_version.trim().is_empty() {
            anyhow::bail!("runtime_version cannot be empty");
        }

        if self.entry_script.trim().is_empty() {
            anyhow::bail!("entry_script cannot be empty");
        }

        Ok(())
    }

    /// Full path of the engine package
    pub fn engine_package_path(&self) -> PathBuf {
        self.media_dir.join(&self.engine_package)
    }

    /// Writer runtime interpreter name (e.g., "python3.11")
    pub fn runtime_program(&self) -> String {
        format!("python{}", self.runtime_version)
    }

    /// Dependency manifest, explicit or the default inside the writer directory
    pub fn manifest_path(&self) -> PathBuf {
        self.manifest
            .clone()
            .unwrap_or_else(|| self.writer_dir.join("requirements.txt"))
    }

    /// Isolated runtime environment of the writer
    pub fn venv_dir(&self) -> PathBuf {
        self.writer_dir.join(VENV_DIR_NAME)
    }

    /// Writer entry point
    pub fn entry_script_path(&self) -> PathBuf {
        self.writer_dir.join(&self.entry_script)
    }

    /// Generated environment file consumed by the writer
    pub fn env_file_path(&self) -> PathBuf {
        self.writer_dir.join(ENV_FILE_NAME)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(PathBuf::from("/opt/tonerow-writer"))
    }
}
