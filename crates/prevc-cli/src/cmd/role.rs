use super::{orchestrator, output_refs};
use crate::output::print_json;
use clap::Subcommand;
use prevc_core::catalog;
use prevc_core::types::RoleId;
use std::path::Path;

#[derive(Subcommand)]
pub enum RoleSubcommand {
    /// Start a role in the current phase
    Start { role: RoleId },
    /// Complete a role started in the current phase
    Complete {
        role: RoleId,
        /// Output produced by the role (repeatable)
        #[arg(long = "output", value_name = "PATH")]
        outputs: Vec<String>,
    },
    /// Describe a role from the catalog
    Show { role: RoleId },
}

pub fn run(root: &Path, subcmd: RoleSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        RoleSubcommand::Start { role } => {
            let status = orchestrator(root)?.start_role(role)?;
            if json {
                return print_json(&status);
            }
            let def = catalog::role(role);
            println!("Started {} in phase {}.", role, status.phase);
            for r in def.responsibilities {
                println!("  - {r}");
            }
        }
        RoleSubcommand::Complete { role, outputs } => {
            let status = orchestrator(root)?.complete_role(role, &output_refs(&outputs))?;
            if json {
                return print_json(&status);
            }
            println!(
                "Completed {} in phase {} ({} outputs).",
                role,
                status.phase,
                status.outputs.len()
            );
        }
        RoleSubcommand::Show { role } => show(role, json)?,
    }
    Ok(())
}

fn show(role: RoleId, json: bool) -> anyhow::Result<()> {
    let def = catalog::role(role);
    let phases = catalog::phases_for_role(role);
    if json {
        let value = serde_json::json!({
            "id": def.id,
            "name": def.name,
            "description": def.description,
            "responsibilities": def.responsibilities,
            "outputs": def.outputs,
            "phases": phases,
        });
        return print_json(&value);
    }
    println!("{} ({})", def.name, def.id);
    println!("{}", def.description);
    let codes: Vec<&str> = phases.iter().map(|p| p.as_str()).collect();
    println!("Phases: {}", codes.join(" "));
    println!("Responsibilities:");
    for r in def.responsibilities {
        println!("  - {r}");
    }
    println!("Expected outputs: {}", def.outputs.join(", "));
    Ok(())
}

pub fn handoff(
    root: &Path,
    from: RoleId,
    to: RoleId,
    artifacts: &[String],
    json: bool,
) -> anyhow::Result<()> {
    let record = orchestrator(root)?.handoff(from, to, &output_refs(artifacts))?;
    if json {
        return print_json(&record);
    }
    println!(
        "Handed off {} -> {} in phase {} ({} artifacts).",
        record.from,
        record.to,
        record.phase,
        record.artifacts.len()
    );
    if record.started {
        println!("Started {}.", record.to);
    }
    Ok(())
}
