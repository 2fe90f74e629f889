//! Domain types for the provisioning pipeline

pub mod diagnostic;
pub mod params;
pub mod run;
pub mod stage;
