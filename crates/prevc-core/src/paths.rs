use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Directory constants
// ---------------------------------------------------------------------------

pub const PREVC_DIR: &str = ".prevc";
pub const WORKFLOW_DIR: &str = ".prevc/workflow";
pub const ARCHIVE_DIR: &str = ".prevc/workflow/archive";

pub const CONFIG_FILE: &str = ".prevc/config.yaml";
pub const STATUS_FILE: &str = ".prevc/workflow/status.json";
pub const STATUS_LOCK_FILE: &str = ".prevc/workflow/status.lock";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn prevc_dir(root: &Path) -> PathBuf {
    root.join(PREVC_DIR)
}

pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}

pub fn status_path(root: &Path) -> PathBuf {
    root.join(STATUS_FILE)
}

pub fn status_lock_path(root: &Path) -> PathBuf {
    root.join(STATUS_LOCK_FILE)
}

pub fn archive_dir(root: &Path) -> PathBuf {
    root.join(ARCHIVE_DIR)
}

/// Backup location for a status document replaced at `at`.
pub fn archive_path(root: &Path, at: DateTime<Utc>) -> PathBuf {
    archive_dir(root).join(format!("status-{}.json", at.format("%Y%m%dT%H%M%S%3fZ")))
}

// ---------------------------------------------------------------------------
// Root discovery
// ---------------------------------------------------------------------------

/// Walk upward from `start` looking for a directory that contains `.prevc/`.
pub fn discover_root(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join(PREVC_DIR).is_dir())
        .map(Path::to_path_buf)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
