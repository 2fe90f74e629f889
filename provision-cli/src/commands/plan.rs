//! Plan command handler

use anyhow::Result;
use colored::*;
use provision_core::domain::stage::StageId;

/// Print the stages in execution order
pub fn handle_plan() -> Result<i32> {
    println!(
        "{}",
        format!("Pipeline of {} stage(s):", StageId::ALL.len()).bold()
    );
    println!();

    for stage in StageId::ALL {
        println!(
            "  {} {}. {}",
            "▸".cyan(),
            stage.ordinal(),
            stage.name().bold()
        );
        println!("     {}", stage.description().dimmed());
    }

    Ok(provision_core::error::EXIT_SUCCESS)
}
