//! Provision Runner
//!
//! Executes the provisioning pipeline on the local machine.
//!
//! Architecture:
//! - Configuration: runtime layout from environment or defaults
//! - Command: external tool execution behind the `CommandRunner` trait
//! - Diagnostics: tagged operator messages behind the `DiagnosticSink` trait
//! - Stages: the seven ordered units of work
//! - Pipeline: the fail-fast driver
//!
//! Every stage receives the frozen parameter set through a `StageContext`
//! and reports success or a typed `StageError`.

pub mod artifact;
pub mod command;
pub mod config;
pub mod context;
pub mod diagnostics;
pub mod pipeline;
pub mod stages;

#[cfg(test)]
pub(crate) mod testing;

pub use command::{CommandRunner, CommandSpec, SystemCommandRunner};
pub use config::Config;
pub use context::StageContext;
pub use diagnostics::{ConsoleSink, DiagnosticSink, InMemorySink, Reporter};
pub use pipeline::Pipeline;
