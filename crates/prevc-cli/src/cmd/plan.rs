use super::orchestrator;
use crate::output::print_json;
use clap::Subcommand;
use prevc_core::types::Approver;
use std::path::Path;

#[derive(Subcommand)]
pub enum PlanSubcommand {
    /// Link an externally authored plan to the workflow
    Link { plan_id: String },
    /// Approve the linked plan
    Approve {
        /// Role id or free-form approver name
        approver: String,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Show the linked plan and its approval
    Show,
}

pub fn run(root: &Path, subcmd: PlanSubcommand, json: bool) -> anyhow::Result<()> {
    let orch = orchestrator(root)?;
    match subcmd {
        PlanSubcommand::Link { plan_id } => {
            orch.mark_plan_created(&plan_id)?;
            if json {
                return print_json(&serde_json::json!({ "linked_plan": plan_id.trim() }));
            }
            println!("Linked plan '{}'.", plan_id.trim());
        }
        PlanSubcommand::Approve { approver, notes } => {
            let approval = orch.approve_plan(Approver::from(approver.as_str()), notes)?;
            if json {
                return print_json(&approval);
            }
            println!("Plan approved by {}.", approval.approver);
        }
        PlanSubcommand::Show => {
            let status = orch.get_status()?;
            if json {
                let value = serde_json::json!({
                    "linked_plan": status.linked_plan,
                    "approval": status.approval,
                });
                return print_json(&value);
            }
            match &status.linked_plan {
                None => println!("No plan linked. Run: prevc plan link <id>"),
                Some(plan) => {
                    println!("Plan:     {plan}");
                    match &status.approval {
                        Some(a) => {
                            println!("Approved: {} at {}", a.approver, a.approved_at.to_rfc3339());
                            if let Some(notes) = &a.notes {
                                println!("Notes:    {notes}");
                            }
                        }
                        None => println!("Approved: no"),
                    }
                }
            }
        }
    }
    Ok(())
}
