use super::orchestrator;
use crate::output::print_json;
use std::path::Path;

pub fn run(root: &Path, json: bool) -> anyhow::Result<()> {
    let actions = orchestrator(root)?.get_recommended_actions()?;
    if json {
        return print_json(&actions);
    }
    for (i, action) in actions.iter().enumerate() {
        println!("{}. {action}", i + 1);
    }
    Ok(())
}
