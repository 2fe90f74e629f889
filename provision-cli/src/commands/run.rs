//! Run command handlers
//!
//! Drives the pipeline against the real system.

use anyhow::Result;
use provision_core::domain::run::RunReport;
use provision_core::domain::stage::StageId;
use provision_runner::{Pipeline, Reporter, StageContext, SystemCommandRunner};
use tracing::info;

use crate::config::Settings;

/// Run the whole pipeline, optionally resuming from a stage
pub fn handle_run(from: Option<StageId>, settings: &Settings, reporter: &Reporter) -> Result<i32> {
    let runner = SystemCommandRunner::new();
    let ctx = StageContext::new(&settings.params, &settings.config, &runner, reporter);
    let pipeline = Pipeline::standard();

    let report = match from {
        Some(stage) => pipeline.run_from(stage, &ctx),
        None => pipeline.run(&ctx),
    };

    Ok(finish(&report))
}

/// Run a single stage in isolation
pub fn handle_stage(stage: StageId, settings: &Settings, reporter: &Reporter) -> Result<i32> {
    let runner = SystemCommandRunner::new();
    let ctx = StageContext::new(&settings.params, &settings.config, &runner, reporter);

    let report = Pipeline::standard().run_only(stage, &ctx);

    Ok(finish(&report))
}

fn finish(report: &RunReport) -> i32 {
    info!(
        "Run {} finished at {} with exit status {}",
        report.run_id,
        report.finished_at.format("%Y-%m-%d %H:%M:%S"),
        report.exit_code()
    );
    report.exit_code()
}
