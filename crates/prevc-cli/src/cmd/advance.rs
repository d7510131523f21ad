use super::{orchestrator, output_refs};
use crate::output::print_json;
use prevc_core::orchestrator::CompletePhaseOptions;
use std::path::Path;

pub fn run(root: &Path, outputs: &[String], force: bool, json: bool) -> anyhow::Result<()> {
    let orch = orchestrator(root)?;
    let next = orch.complete_phase(&output_refs(outputs), CompletePhaseOptions { force })?;

    if json {
        let value = serde_json::json!({
            "next_phase": next,
            "complete": next.is_none(),
        });
        return print_json(&value);
    }
    match next {
        Some(phase) => println!("Advanced to {} {}.", phase, phase.name()),
        None => println!("Workflow complete."),
    }
    Ok(())
}

pub fn gates(root: &Path, json: bool) -> anyhow::Result<()> {
    let result = orchestrator(root)?.check_gates()?;

    if json {
        return print_json(&result);
    }
    if result.allowed {
        println!("Allowed: {}", result.hint);
    } else if result.blockers.is_empty() {
        println!("Blocked: {}", result.hint);
    } else {
        let names: Vec<&str> = result.blockers.iter().map(|g| g.as_str()).collect();
        println!("Blocked by: {}", names.join(", "));
        println!("Hint:       {}", result.hint);
    }
    Ok(())
}
