use super::orchestrator;
use crate::output::{print_json, print_table};
use prevc_core::status::WorkflowEvent;
use std::path::Path;

pub fn run(root: &Path, limit: Option<usize>, json: bool) -> anyhow::Result<()> {
    let mut history = orchestrator(root)?.history()?;
    if let Some(n) = limit {
        let skip = history.len().saturating_sub(n);
        history.drain(..skip);
    }

    if json {
        return print_json(&history);
    }
    if history.is_empty() {
        println!("No history recorded.");
        return Ok(());
    }
    let rows = history
        .iter()
        .map(|h| {
            vec![
                h.at.format("%Y-%m-%d %H:%M:%S").to_string(),
                h.phase.to_string(),
                describe(&h.event),
            ]
        })
        .collect();
    print_table(&["AT", "PHASE", "EVENT"], rows);
    Ok(())
}

fn describe(event: &WorkflowEvent) -> String {
    match event {
        WorkflowEvent::Initialized { scale } => format!("initialized ({scale})"),
        WorkflowEvent::PhaseStarted { phase } => format!("started {phase}"),
        WorkflowEvent::PhaseCompleted { phase, outputs } => {
            format!("completed {phase} ({outputs} outputs)")
        }
        WorkflowEvent::PhaseSkipped { phase } => format!("skipped {phase}"),
        WorkflowEvent::GateBypassed {
            gate,
            transition,
            forced,
        } => {
            let how = if *forced { "force" } else { "autonomous mode" };
            format!("bypassed {gate} gate on {transition} ({how})")
        }
        WorkflowEvent::RoleStarted { role } => format!("role {role} started"),
        WorkflowEvent::RoleCompleted { role, outputs } => {
            format!("role {role} completed ({outputs} outputs)")
        }
        WorkflowEvent::Handoff {
            from,
            to,
            artifacts,
        } => format!("handoff {from} -> {to} ({} artifacts)", artifacts.len()),
        WorkflowEvent::PlanLinked { plan_id } => format!("plan '{plan_id}' linked"),
        WorkflowEvent::PlanApproved { approver } => format!("plan approved by {approver}"),
        WorkflowEvent::SettingsChanged { settings } => format!(
            "settings changed (autonomous={}, plan={}, approval={})",
            settings.autonomous_mode, settings.require_plan, settings.require_approval
        ),
    }
}
