use crate::output::{print_json, print_list};
use anyhow::Context;
use clap::Args;
use prevc_core::collaboration::CollaborationManager;
use prevc_core::types::RoleId;

#[derive(Args)]
pub struct CollabArgs {
    /// What the session is about
    topic: String,

    /// Participating role (repeatable; default: picked from the topic)
    #[arg(long = "participant", value_name = "ROLE")]
    participants: Vec<RoleId>,

    /// Contribution as role=message (repeatable, in order)
    #[arg(long = "say", value_name = "ROLE=MESSAGE")]
    says: Vec<String>,
}

fn parse_say(raw: &str) -> anyhow::Result<(RoleId, &str)> {
    let (role, message) = raw
        .split_once('=')
        .with_context(|| format!("invalid contribution '{raw}': expected role=message"))?;
    let role: RoleId = role
        .parse()
        .with_context(|| format!("invalid contribution '{raw}'"))?;
    Ok((role, message.trim()))
}

pub fn run(args: CollabArgs, json: bool) -> anyhow::Result<()> {
    let manager = CollaborationManager::new();
    let session = manager.create_session(&args.topic, Some(args.participants))?;

    for raw in &args.says {
        let (role, message) = parse_say(raw)?;
        manager.contribute(&session.id, role, message)?;
    }
    let synthesis = manager.synthesize(&session.id)?;

    if json {
        let value = serde_json::json!({
            "session": manager.get_session(&session.id),
            "synthesis": synthesis,
        });
        return print_json(&value);
    }

    let names: Vec<&str> = synthesis.participants.iter().map(|r| r.as_str()).collect();
    println!("Topic:        {}", synthesis.topic);
    println!("Participants: {}", names.join(", "));
    println!("Contributions: {}", synthesis.contribution_count);
    print_list("Decisions", &synthesis.decisions);
    print_list("Recommendations", &synthesis.recommendations);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_say_splits_on_first_equals() {
        let (role, msg) = parse_say("qa=we should test a=b").unwrap();
        assert_eq!(role, RoleId::Qa);
        assert_eq!(msg, "we should test a=b");
    }

    #[test]
    fn parse_say_rejects_bad_input() {
        assert!(parse_say("no separator").is_err());
        assert!(parse_say("wizard=hello").is_err());
    }
}
