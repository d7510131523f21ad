use super::orchestrator;
use crate::output::print_json;
use anyhow::Context;
use clap::Args;
use prevc_core::scale::{estimated_time, ScaleContext};
use prevc_core::status::{SettingsOverrides, WorkflowStatus};
use prevc_core::types::ScaleLevel;
use std::path::Path;

#[derive(Args)]
pub struct InitArgs {
    /// Project name
    name: String,

    /// Scale: quick, small, medium, large, enterprise (or 0-4)
    #[arg(long, conflicts_with_all = ["description", "files"])]
    scale: Option<String>,

    /// Describe the work; the scale is detected from it
    #[arg(long)]
    description: Option<String>,

    /// Approximate number of files touched, used for scale detection
    #[arg(long, value_name = "N")]
    files: Option<usize>,

    /// Archive an existing workflow before starting
    #[arg(long, conflicts_with = "replace")]
    archive: bool,

    /// Delete an existing workflow before starting
    #[arg(long)]
    replace: bool,

    /// Skip every gate
    #[arg(long)]
    autonomous: bool,

    /// Do not require a linked plan to leave Planning
    #[arg(long)]
    no_plan: bool,

    /// Do not require plan approval before Execution
    #[arg(long)]
    no_approval: bool,
}

impl InitArgs {
    fn overrides(&self) -> SettingsOverrides {
        SettingsOverrides {
            autonomous_mode: self.autonomous.then_some(true),
            require_plan: self.no_plan.then_some(false),
            require_approval: self.no_approval.then_some(false),
        }
    }

    fn archive_previous(&self) -> Option<bool> {
        match (self.archive, self.replace) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        }
    }
}

pub fn run(root: &Path, args: InitArgs, json: bool) -> anyhow::Result<()> {
    let orch = orchestrator(root)?;
    let overrides = args.overrides();
    let archive = args.archive_previous();

    let status = match &args.scale {
        Some(s) => {
            let scale = ScaleLevel::parse_lenient(s);
            orch.init_workflow_with_scale(&args.name, scale, Some(&overrides), archive)
        }
        None => {
            let mut ctx = ScaleContext::new(
                args.name.as_str(),
                args.description.clone().unwrap_or_default(),
            );
            if let Some(n) = args.files {
                ctx = ctx.with_file_count(n);
            }
            orch.init_workflow(&ctx, Some(&overrides), archive)
        }
    }
    .context("failed to initialize workflow")?;

    if json {
        return print_json(&status);
    }
    print_created(&status);
    Ok(())
}

fn print_created(status: &WorkflowStatus) {
    let route = status.route();
    let required: Vec<&str> = route.required_phases.iter().map(|p| p.as_str()).collect();
    println!(
        "Initialized workflow '{}' ({} scale)",
        status.project.name, status.project.scale
    );
    println!("Phases:   {}", required.join(" -> "));
    println!(
        "Current:  {} {}",
        status.project.current_phase,
        status.project.current_phase.name()
    );
    println!("Estimate: {}", estimated_time(status.project.scale).label());
    if status.settings.autonomous_mode {
        println!("Autonomous mode is on: gates will not be enforced.");
    }
}
