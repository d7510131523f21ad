use super::orchestrator;
use crate::output::print_json;
use clap::Subcommand;
use prevc_core::status::{SettingsOverrides, WorkflowSettings};
use std::path::Path;

#[derive(Subcommand)]
pub enum SettingsSubcommand {
    /// Show the current settings
    Show,
    /// Change one or more settings
    Set {
        #[arg(long, value_name = "BOOL")]
        autonomous: Option<bool>,
        #[arg(long, value_name = "BOOL")]
        require_plan: Option<bool>,
        #[arg(long, value_name = "BOOL")]
        require_approval: Option<bool>,
    },
}

pub fn run(root: &Path, subcmd: Option<SettingsSubcommand>, json: bool) -> anyhow::Result<()> {
    let orch = orchestrator(root)?;
    let settings = match subcmd.unwrap_or(SettingsSubcommand::Show) {
        SettingsSubcommand::Show => orch.get_settings()?,
        SettingsSubcommand::Set {
            autonomous,
            require_plan,
            require_approval,
        } => {
            let overrides = SettingsOverrides {
                autonomous_mode: autonomous,
                require_plan,
                require_approval,
            };
            if overrides.is_empty() {
                anyhow::bail!(
                    "nothing to set: pass --autonomous, --require-plan or --require-approval"
                );
            }
            orch.set_settings(&overrides)?
        }
    };

    if json {
        return print_json(&settings);
    }
    print_settings(&settings);
    Ok(())
}

fn print_settings(settings: &WorkflowSettings) {
    println!("autonomous_mode:  {}", settings.autonomous_mode);
    println!("require_plan:     {}", settings.require_plan);
    println!("require_approval: {}", settings.require_approval);
}
