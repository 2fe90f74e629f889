//! Stage identity types
//!
//! The pipeline is a fixed, linearly ordered sequence. Each stage is
//! identified by a `StageId` that carries its ordinal position, the
//! name used on the command line, and a short description.

use std::fmt;
use std::str::FromStr;

/// Identity of one pipeline stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StageId {
    Prerequisites,
    GuestAdditions,
    ServiceAccount,
    EnginePackage,
    RuntimeDependencies,
    InstanceCreation,
    Handoff,
}

impl StageId {
    /// All stages in execution order
    pub const ALL: [StageId; 7] = [
        StageId::Prerequisites,
        StageId::GuestAdditions,
        StageId::ServiceAccount,
        StageId::EnginePackage,
        StageId::RuntimeDependencies,
        StageId::InstanceCreation,
        StageId::Handoff,
    ];

    /// 1-based position in the pipeline
    pub fn ordinal(self) -> usize {
        match self {
            StageId::Prerequisites => 1,
            StageId::GuestAdditions => 2,
            StageId::ServiceAccount => 3,
            StageId::EnginePackage => 4,
            StageId::RuntimeDependencies => 5,
            StageId::InstanceCreation => 6,
            StageId::Handoff => 7,
        }
    }

    /// Name used on the command line and in diagnostics
    pub fn name(self) -> &'static str {
        match self {
            StageId::Prerequisites => "prerequisites",
            StageId::GuestAdditions => "guest-additions",
            StageId::ServiceAccount => "service-account",
            StageId::EnginePackage => "engine-package",
            StageId::RuntimeDependencies => "runtime-dependencies",
            StageId::InstanceCreation => "instance-creation",
            StageId::Handoff => "handoff",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            StageId::Prerequisites => "Install the OS prerequisite package bundle",
            StageId::GuestAdditions => "Run the guest-integration installer",
            StageId::ServiceAccount => "Prepare the database service account and install root",
            StageId::EnginePackage => "Install the database engine from local media",
            StageId::RuntimeDependencies => "Install the writer runtime and its dependencies",
            StageId::InstanceCreation => "Create the database instance and the writer environment file",
            StageId::Handoff => "Run the downstream writer and forward its status",
        }
    }
}

impl fmt::Display for StageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "stage {} ({})", self.ordinal(), self.name())
    }
}

/// Error returned when a stage name does not match any known stage
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown stage '{0}' (expected one of: {names})", names = known_names())]
pub struct UnknownStage(pub String);

fn known_names() -> String {
    StageId::ALL
        .iter()
        .map(|s| s.name())
        .collect::<Vec<_>>()
        .join(", ")
}

impl FromStr for StageId {
    type Err = UnknownStage;

    /// Accepts the stage name or its ordinal
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Ok(ordinal) = trimmed.parse::<usize>() {
            return StageId::ALL
                .into_iter()
                .find(|stage| stage.ordinal() == ordinal)
                .ok_or_else(|| UnknownStage(trimmed.to_string()));
        }

        let normalized = trimmed.to_ascii_lowercase().replace('_', "-");
        StageId::ALL
            .into_iter()
            .find(|stage| stage.name() == normalized)
            .ok_or_else(|| UnknownStage(trimmed.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordinals_follow_declaration_order() {
        for (idx, stage) in StageId::ALL.iter().enumerate() {
            assert_eq!(stage.ordinal(), idx + 1);
        }
    }

    #[test]
    fn test_parse_by_name_and_ordinal() {
        assert_eq!("engine-package".parse::<StageId>(), Ok(StageId::EnginePackage));
        assert_eq!("Runtime_Dependencies".parse::<StageId>(), Ok(StageId::RuntimeDependencies));
        assert_eq!("7".parse::<StageId>(), Ok(StageId::Handoff));
    }

    #[test]
    fn test_parse_unknown() {
        let err = "deploy".parse::<StageId>().unwrap_err();
        assert!(err.to_string().contains("deploy"));
        assert!(err.to_string().contains("handoff"));
        assert!("0".parse::<StageId>().is_err());
        assert!("8".parse::<StageId>().is_err());
    }

    #[test]
    fn test_display_names_stage() {
        assert_eq!(StageId::EnginePackage.to_string(), "stage 4 (engine-package)");
    }
}
