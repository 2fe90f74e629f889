//! Pipeline stages
//!
//! Each stage validates its own preconditions, performs its action and
//! returns `Ok(())` or the `StageError` that ends the run. Stages are
//! constructed once when the pipeline is defined and never mutated.

mod engine;
mod guest_additions;
mod handoff;
mod instance;
mod prerequisites;
mod runtime;
mod service_account;

pub use engine::EnginePackageStage;
pub use guest_additions::GuestAdditionsStage;
pub use handoff::HandoffStage;
pub use instance::{InstanceCreationStage, creation_arguments};
pub use prerequisites::PrerequisitesStage;
pub use runtime::RuntimeDependenciesStage;
pub use service_account::ServiceAccountStage;

use provision_core::StageError;
use provision_core::domain::stage::StageId;

use crate::context::StageContext;

/// One ordered unit of the provisioning pipeline
pub trait Stage {
    /// Identity and ordinal of this stage
    fn id(&self) -> StageId;

    /// Runs the stage to completion
    fn run(&self, ctx: &StageContext<'_>) -> Result<(), StageError>;
}

/// Creates the stage implementation for an identity
pub fn stage_for(id: StageId) -> Box<dyn Stage> {
    match id {
        StageId::Prerequisites => Box::new(PrerequisitesStage),
        StageId::GuestAdditions => Box::new(GuestAdditionsStage),
        StageId::ServiceAccount => Box::new(ServiceAccountStage),
        StageId::EnginePackage => Box::new(EnginePackageStage),
        StageId::RuntimeDependencies => Box::new(RuntimeDependenciesStage),
        StageId::InstanceCreation => Box::new(InstanceCreationStage),
        StageId::Handoff => Box::new(HandoffStage),
    }
}
