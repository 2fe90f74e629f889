//! Configuration Parameter Set
//!
//! The fixed collection of named values describing the target database
//! instance and the service account it runs under. `ParameterSet::default()`
//! is the build-time profile; a JSON document may override any subset
//! of fields before the set is frozen and handed to the pipeline.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::error::StageError;

/// Administrative username the writer connects as
pub const ADMIN_USERNAME: &str = "system";

/// Listener host the writer connects to
pub const LISTENER_HOST: &str = "localhost";

/// Listener port the writer connects to
pub const LISTENER_PORT: u16 = 1521;

/// Mask used wherever a secret would otherwise be displayed
pub const SECRET_MASK: &str = "********";

/// Dedicated OS identity the engine and its tooling run as
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceAccount {
    pub name: String,
    pub password: String,
    pub group: String,
    /// Home directory the shell profile is installed into
    pub home: PathBuf,
}

impl Default for ServiceAccount {
    fn default() -> Self {
        Self {
            name: "oracle".to_string(),
            password: "oracle".to_string(),
            group: "oinstall".to_string(),
            home: PathBuf::from("/home/oracle"),
        }
    }
}

/// Filesystem layout of the engine installation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InstallLayout {
    /// Root that is recursively handed over to the service account
    pub install_root: PathBuf,
    /// Nested engine home created under the install root
    pub engine_home: PathBuf,
}

impl Default for InstallLayout {
    fn default() -> Self {
        Self {
            install_root: PathBuf::from("/opt/oracle"),
            engine_home: PathBuf::from("/opt/oracle/product/19c/dbhome_1"),
        }
    }
}

impl InstallLayout {
    /// Path of the silent instance-creation tool inside the engine home
    pub fn creation_tool(&self) -> PathBuf {
        self.engine_home.join("bin").join("dbca")
    }
}

/// Passwords for the administrative database accounts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdminCredentials {
    pub sys_password: String,
    /// Password of the `system` account, also handed to the writer
    pub system_password: String,
    pub pdb_admin_password: String,
}

impl Default for AdminCredentials {
    fn default() -> Self {
        let password = "Oracle_19c".to_string();
        Self {
            sys_password: password.clone(),
            system_password: password.clone(),
            pdb_admin_password: password,
        }
    }
}

/// Container / pluggable database topology
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Topology {
    pub container_database: bool,
    pub pdb_count: u32,
    /// Name of the pluggable database, also the writer's service name
    pub pdb_name: String,
}

impl Default for Topology {
    fn default() -> Self {
        Self {
            container_database: true,
            pdb_count: 1,
            pdb_name: "ORCLPDB1".to_string(),
        }
    }
}

/// Memory management mode understood by the creation tool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MemoryManagement {
    AutoSga,
    Auto,
    CustomSga,
}

impl MemoryManagement {
    pub fn as_arg(self) -> &'static str {
        match self {
            MemoryManagement::AutoSga => "AUTO_SGA",
            MemoryManagement::Auto => "AUTO",
            MemoryManagement::CustomSga => "CUSTOM_SGA",
        }
    }
}

/// Storage backing for data files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum StorageType {
    Fs,
    Asm,
}

impl StorageType {
    pub fn as_arg(self) -> &'static str {
        match self {
            StorageType::Fs => "FS",
            StorageType::Asm => "ASM",
        }
    }
}

/// Memory and storage policy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoragePolicy {
    pub memory_management: MemoryManagement,
    pub total_memory_mb: u32,
    pub storage_type: StorageType,
    pub datafile_destination: PathBuf,
    pub recovery_area_destination: PathBuf,
    pub recovery_area_size_mb: u32,
    pub redo_log_size_mb: u32,
}

impl Default for StoragePolicy {
    fn default() -> Self {
        Self {
            memory_management: MemoryManagement::AutoSga,
            total_memory_mb: 2048,
            storage_type: StorageType::Fs,
            datafile_destination: PathBuf::from("/opt/oracle/oradata"),
            recovery_area_destination: PathBuf::from("/opt/oracle/fast_recovery_area"),
            recovery_area_size_mb: 15360,
            redo_log_size_mb: 200,
        }
    }
}

/// Feature toggles
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Features {
    pub archiving: bool,
    /// Management console mode, `NONE` disables it
    pub em_configuration: String,
}

impl Default for Features {
    fn default() -> Self {
        Self {
            archiving: false,
            em_configuration: "NONE".to_string(),
        }
    }
}

/// The full, immutable Configuration Parameter Set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParameterSet {
    pub service_account: ServiceAccount,
    pub layout: InstallLayout,
    /// Instance identifier
    pub sid: String,
    pub global_db_name: String,
    pub character_set: String,
    pub template: String,
    pub database_type: String,
    pub credentials: AdminCredentials,
    pub topology: Topology,
    pub storage: StoragePolicy,
    pub features: Features,
    /// Freeform application flags appended to the writer environment file
    pub app_flags: BTreeMap<String, String>,
}

impl Default for ParameterSet {
    fn default() -> Self {
        let mut app_flags = BTreeMap::new();
        app_flags.insert("DISPLAY_PASSWORD".to_string(), "false".to_string());
        app_flags.insert("WRITER_LIMIT_FOR_TESTING".to_string(), "0".to_string());

        Self {
            service_account: ServiceAccount::default(),
            layout: InstallLayout::default(),
            sid: "ORCLCDB".to_string(),
            global_db_name: "ORCLCDB".to_string(),
            character_set: "AL32UTF8".to_string(),
            template: "General_Purpose.dbc".to_string(),
            database_type: "MULTIPURPOSE".to_string(),
            credentials: AdminCredentials::default(),
            topology: Topology::default(),
            storage: StoragePolicy::default(),
            features: Features::default(),
            app_flags,
        }
    }
}

fn require_text(name: &str, value: &str) -> Result<(), StageError> {
    if value.trim().is_empty() {
        return Err(StageError::invalid(name, "must not be empty"));
    }
    if value.contains('\n') || value.contains('\r') {
        return Err(StageError::invalid(name, "must not contain line breaks"));
    }
    Ok(())
}

fn require_path(name: &str, value: &std::path::Path) -> Result<(), StageError> {
    if value.as_os_str().is_empty() {
        return Err(StageError::invalid(name, "must not be empty"));
    }
    if !value.is_absolute() {
        return Err(StageError::invalid(name, "must be an absolute path"));
    }
    Ok(())
}

fn require_positive(name: &str, value: u32) -> Result<(), StageError> {
    if value == 0 {
        return Err(StageError::invalid(name, "must be greater than 0"));
    }
    Ok(())
}

impl ParameterSet {
    /// Parses a JSON override document on top of the build-time defaults
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Checks that every parameter the instance-creation stage reads is
    /// present and non-empty
    pub fn validate(&self) -> Result<(), StageError> {
        let account = &self.service_account;
        require_text("service_account.name", &account.name)?;
        require_text("service_account.password", &account.password)?;
        require_text("service_account.group", &account.group)?;
        require_path("service_account.home", &account.home)?;

        require_path("layout.install_root", &self.layout.install_root)?;
        require_path("layout.engine_home", &self.layout.engine_home)?;
        if !self.layout.engine_home.starts_with(&self.layout.install_root) {
            return Err(StageError::invalid(
                "layout.engine_home",
                "must be inside layout.install_root",
            ));
        }

        require_text("sid", &self.sid)?;
        require_text("global_db_name", &self.global_db_name)?;
        require_text("character_set", &self.character_set)?;
        require_text("template", &self.template)?;
        require_text("database_type", &self.database_type)?;

        require_text("credentials.sys_password", &self.credentials.sys_password)?;
        require_text("credentials.system_password", &self.credentials.system_password)?;
        require_text(
            "credentials.pdb_admin_password",
            &self.credentials.pdb_admin_password,
        )?;

        require_text("topology.pdb_name", &self.topology.pdb_name)?;
        require_positive("topology.pdb_count", self.topology.pdb_count)?;
        if !self.topology.container_database {
            return Err(StageError::invalid(
                "topology.container_database",
                "pluggable databases require a container database",
            ));
        }

        require_positive("storage.total_memory_mb", self.storage.total_memory_mb)?;
        require_path(
            "storage.datafile_destination",
            &self.storage.datafile_destination,
        )?;
        require_path(
            "storage.recovery_area_destination",
            &self.storage.recovery_area_destination,
        )?;
        require_positive(
            "storage.recovery_area_size_mb",
            self.storage.recovery_area_size_mb,
        )?;
        require_positive("storage.redo_log_size_mb", self.storage.redo_log_size_mb)?;

        require_text("features.em_configuration", &self.features.em_configuration)?;

        for (key, value) in &self.app_flags {
            let name = format!("app_flags.{}", key);
            require_text(&name, key)?;
            if key.contains('=') || key.contains(char::is_whitespace) {
                return Err(StageError::invalid(name, "key must not contain '=' or whitespace"));
            }
            if value.contains('\n') || value.contains('\r') {
                return Err(StageError::invalid(name, "must not contain line breaks"));
            }
        }

        Ok(())
    }

    /// Copy of the set with every secret replaced by the mask
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        copy.service_account.password = SECRET_MASK.to_string();
        copy.credentials.sys_password = SECRET_MASK.to_string();
        copy.credentials.system_password = SECRET_MASK.to_string();
        copy.credentials.pdb_admin_password = SECRET_MASK.to_string();
        copy
    }

    /// Connect descriptor the writer uses, `host:port/service`
    pub fn dsn(&self) -> String {
        format!(
            "{}:{}/{}",
            LISTENER_HOST, LISTENER_PORT, self.topology.pdb_name
        )
    }
}
