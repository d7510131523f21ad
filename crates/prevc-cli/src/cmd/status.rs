use super::orchestrator;
use crate::output::{print_json, print_table};
use anyhow::Context;
use prevc_core::types::PhaseCode;
use std::path::Path;

pub fn run(root: &Path, json: bool) -> anyhow::Result<()> {
    let status = orchestrator(root)?
        .get_status()
        .context("failed to load workflow")?;

    if json {
        return print_json(&status);
    }

    println!("Project:  {} ({})", status.project.name, status.project.scale);
    if let Some(desc) = &status.project.description {
        println!("          {desc}");
    }
    println!(
        "Phase:    {} {}",
        status.project.current_phase,
        status.project.current_phase.name()
    );
    if let Some(plan) = &status.linked_plan {
        let approved = match &status.approval {
            Some(a) => format!("approved by {}", a.approver),
            None => "not approved".to_string(),
        };
        println!("Plan:     {plan} ({approved})");
    }
    println!();

    let rows = PhaseCode::all()
        .iter()
        .filter_map(|code| status.phase(*code).map(|p| (code, p)))
        .map(|(code, p)| {
            vec![
                code.to_string(),
                code.name().to_string(),
                p.status.to_string(),
                p.outputs.len().to_string(),
            ]
        })
        .collect();
    print_table(&["PHASE", "NAME", "STATUS", "OUTPUTS"], rows);

    if !status.roles.is_empty() {
        println!();
        let rows = status
            .roles
            .iter()
            .map(|(id, r)| {
                vec![
                    id.to_string(),
                    r.status.to_string(),
                    r.phase.to_string(),
                    r.outputs.len().to_string(),
                ]
            })
            .collect();
        print_table(&["ROLE", "STATUS", "PHASE", "OUTPUTS"], rows);
    }
    Ok(())
}

pub fn summary(root: &Path, json: bool) -> anyhow::Result<()> {
    let summary = orchestrator(root)?
        .get_summary()
        .context("failed to load workflow")?;

    if json {
        return print_json(&summary);
    }

    let state = if summary.is_complete {
        "complete".to_string()
    } else {
        format!(
            "{} {}",
            summary.current_phase,
            summary.current_phase.name()
        )
    };
    println!(
        "{} [{}] {}/{} phases ({}%) - {}",
        summary.name,
        summary.scale,
        summary.progress.completed,
        summary.progress.total,
        summary.progress.percentage,
        state
    );
    Ok(())
}
