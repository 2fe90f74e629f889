//! Provision Core
//!
//! Core types for the single-node database provisioning pipeline.
//!
//! This crate contains:
//! - Domain types: parameter set, stage identities, diagnostics, run results
//! - Error taxonomy shared by every stage
//!
//! Nothing here touches the machine; execution lives in `provision-runner`.

pub mod domain;
pub mod error;

pub use error::StageError;
