pub mod advance;
pub mod collab;
pub mod config;
pub mod history;
pub mod init;
pub mod next;
pub mod plan;
pub mod role;
pub mod scale;
pub mod settings;
pub mod status;

use anyhow::Context;
use prevc_core::types::OutputRef;
use prevc_core::Orchestrator;
use std::path::Path;

pub(crate) fn orchestrator(root: &Path) -> anyhow::Result<Orchestrator> {
    Orchestrator::new(root).context("failed to load .prevc/config.yaml")
}

pub(crate) fn output_refs(paths: &[String]) -> Vec<OutputRef> {
    paths.iter().map(|p| OutputRef::new(p.as_str())).collect()
}
