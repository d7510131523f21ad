use crate::output::{print_json, print_table};
use clap::Subcommand;
use prevc_core::scale::{detect_scale, estimated_time, get_scale_route, ScaleContext, StackHint};
use prevc_core::types::{PhaseCode, ScaleLevel};

#[derive(Subcommand)]
pub enum ScaleSubcommand {
    /// Classify a piece of work
    Detect {
        name: String,
        #[arg(long)]
        description: Option<String>,
        /// Approximate number of files touched
        #[arg(long, value_name = "N")]
        files: Option<usize>,
        /// Language in the stack (repeatable)
        #[arg(long = "language", value_name = "LANG")]
        languages: Vec<String>,
    },
    /// Show the phases and roles a scale requires
    Route { scale: ScaleLevel },
}

pub fn run(subcmd: ScaleSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        ScaleSubcommand::Detect {
            name,
            description,
            files,
            languages,
        } => {
            let mut ctx = ScaleContext::new(name, description.unwrap_or_default());
            if let Some(n) = files {
                ctx = ctx.with_file_count(n);
            }
            if !languages.is_empty() {
                ctx = ctx.with_stack(StackHint {
                    languages,
                    frameworks: Vec::new(),
                });
            }
            let scale = detect_scale(&ctx);
            if json {
                let value = serde_json::json!({
                    "scale": scale,
                    "estimated_time": estimated_time(scale),
                });
                return print_json(&value);
            }
            println!("{scale} ({})", estimated_time(scale).label());
        }
        ScaleSubcommand::Route { scale } => route(scale, json)?,
    }
    Ok(())
}

fn route(scale: ScaleLevel, json: bool) -> anyhow::Result<()> {
    let route = get_scale_route(scale);
    if json {
        return print_json(&route);
    }
    let rows = PhaseCode::all()
        .iter()
        .map(|p| {
            let roles: Vec<&str> = route.roles_for(*p).iter().map(|r| r.as_str()).collect();
            vec![
                p.to_string(),
                p.name().to_string(),
                if route.is_required(*p) { "required" } else { "skipped" }.to_string(),
                roles.join(", "),
            ]
        })
        .collect();
    print_table(&["PHASE", "NAME", "ROUTE", "ROLES"], rows);
    println!();
    println!("Estimate: {}", estimated_time(scale).label());
    Ok(())
}
