pub mod catalog;
pub mod collaboration;
pub mod config;
pub mod error;
pub mod gate;
pub mod io;
pub mod orchestrator;
pub mod paths;
pub mod scale;
pub mod status;
pub mod types;

pub use error::{PrevcError, Result};
pub use orchestrator::Orchestrator;
