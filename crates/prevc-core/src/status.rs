use crate::config::Config;
use crate::error::{PrevcError, Result};
use crate::gate::GateType;
use crate::paths;
use crate::scale::{get_scale_route, ScaleRoute};
use crate::types::{
    Approver, OutputRef, PhaseCode, PhaseState, RoleId, RoleState, ScaleLevel, Transition,
};
use chrono::{DateTime, Utc};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowSettings {
    #[serde(default)]
    pub autonomous_mode: bool,
    #[serde(default = "default_true")]
    pub require_plan: bool,
    #[serde(default = "default_true")]
    pub require_approval: bool,
}

fn default_true() -> bool {
    true
}

impl Default for WorkflowSettings {
    fn default() -> Self {
        Self {
            autonomous_mode: false,
            require_plan: true,
            require_approval: true,
        }
    }
}

impl WorkflowSettings {
    /// Plans are required when the scale keeps Planning; approval when it
    /// keeps Review.
    pub fn for_scale(scale: ScaleLevel) -> Self {
        let route = get_scale_route(scale);
        Self {
            autonomous_mode: false,
            require_plan: route.is_required(PhaseCode::Planning),
            require_approval: route.is_required(PhaseCode::Review),
        }
    }

    pub fn apply(&mut self, overrides: &SettingsOverrides) {
        if let Some(v) = overrides.autonomous_mode {
            self.autonomous_mode = v;
        }
        if let Some(v) = overrides.require_plan {
            self.require_plan = v;
        }
        if let Some(v) = overrides.require_approval {
            self.require_approval = v;
        }
    }
}

/// Partial settings update; `None` leaves a field unchanged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingsOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub autonomous_mode: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub require_plan: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub require_approval: Option<bool>,
}

impl SettingsOverrides {
    pub fn is_empty(&self) -> bool {
        self.autonomous_mode.is_none() && self.require_plan.is_none() && self.require_approval.is_none()
    }
}

// ---------------------------------------------------------------------------
// Document parts
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectInfo {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub scale: ScaleLevel,
    pub current_phase: PhaseCode,
    pub started: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseStatus {
    pub status: PhaseState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub outputs: Vec<OutputRef>,
}

impl PhaseStatus {
    fn with_state(status: PhaseState) -> Self {
        Self {
            status,
            started_at: None,
            completed_at: None,
            outputs: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleStatus {
    pub status: RoleState,
    /// Phase the role was last started in.
    pub phase: PhaseCode,
    #[serde(default)]
    pub outputs: Vec<OutputRef>,
    pub last_active: DateTime<Utc>,
}

impl RoleStatus {
    pub fn is_active_in(&self, phase: PhaseCode) -> bool {
        self.status == RoleState::InProgress && self.phase == phase
    }

    /// Started (and possibly finished) during `phase`.
    pub fn was_started_in(&self, phase: PhaseCode) -> bool {
        self.status != RoleState::Pending && self.phase == phase
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanApproval {
    pub approver: Approver,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub approved_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Timeline
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WorkflowEvent {
    Initialized {
        scale: ScaleLevel,
    },
    PhaseStarted {
        phase: PhaseCode,
    },
    PhaseCompleted {
        phase: PhaseCode,
        outputs: usize,
    },
    PhaseSkipped {
        phase: PhaseCode,
    },
    GateBypassed {
        gate: GateType,
        transition: Transition,
        forced: bool,
    },
    RoleStarted {
        role: RoleId,
    },
    RoleCompleted {
        role: RoleId,
        outputs: usize,
    },
    Handoff {
        from: RoleId,
        to: RoleId,
        artifacts: Vec<OutputRef>,
    },
    PlanLinked {
        plan_id: String,
    },
    PlanApproved {
        approver: Approver,
    },
    SettingsChanged {
        settings: WorkflowSettings,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub at: DateTime<Utc>,
    /// Phase that was current when the event happened.
    pub phase: PhaseCode,
    pub event: WorkflowEvent,
}

// ---------------------------------------------------------------------------
// WorkflowStatus
// ---------------------------------------------------------------------------

/// The persisted record of one workflow. One per project root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowStatus {
    /// Bumped on every committed save; used to reject stale writes.
    #[serde(default)]
    pub revision: u64,
    pub project: ProjectInfo,
    pub phases: BTreeMap<PhaseCode, PhaseStatus>,
    #[serde(default)]
    pub roles: BTreeMap<RoleId, RoleStatus>,
    #[serde(default)]
    pub settings: WorkflowSettings,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linked_plan: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approval: Option<PlanApproval>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub history: Vec<HistoryEntry>,
}

impl WorkflowStatus {
    /// Fresh document for `scale`: required phases pending, the rest skipped,
    /// and the first required phase already in progress.
    pub fn new(
        name: impl Into<String>,
        description: Option<String>,
        scale: ScaleLevel,
        settings: WorkflowSettings,
    ) -> Self {
        let now = Utc::now();
        let route = get_scale_route(scale);
        let first = route.first_required();

        let mut phases: BTreeMap<PhaseCode, PhaseStatus> = PhaseCode::all()
            .iter()
            .map(|&p| {
                let state = if route.is_required(p) {
                    PhaseState::Pending
                } else {
                    PhaseState::Skipped
                };
                (p, PhaseStatus::with_state(state))
            })
            .collect();
        if let Some(ps) = phases.get_mut(&first) {
            ps.status = PhaseState::InProgress;
            ps.started_at = Some(now);
        }

        let mut roles = BTreeMap::new();
        for &phase in &route.required_phases {
            for &role in route.roles_for(phase) {
                roles.entry(role).or_insert_with(|| RoleStatus {
                    status: RoleState::Pending,
                    phase,
                    outputs: Vec::new(),
                    last_active: now,
                });
            }
        }

        let history = vec![
            HistoryEntry {
                at: now,
                phase: first,
                event: WorkflowEvent::Initialized { scale },
            },
            HistoryEntry {
                at: now,
                phase: first,
                event: WorkflowEvent::PhaseStarted { phase: first },
            },
        ];

        Self {
            revision: 0,
            project: ProjectInfo {
                name: name.into(),
                description,
                scale,
                current_phase: first,
                started: now,
            },
            phases,
            roles,
            settings,
            linked_plan: None,
            approval: None,
            history,
        }
    }

    pub fn route(&self) -> ScaleRoute {
        get_scale_route(self.project.scale)
    }

    pub fn current_phase(&self) -> PhaseCode {
        self.project.current_phase
    }

    pub fn phase(&self, code: PhaseCode) -> Option<&PhaseStatus> {
        self.phases.get(&code)
    }

    /// Every phase is completed or skipped.
    pub fn is_complete(&self) -> bool {
        PhaseCode::all()
            .iter()
            .all(|p| self.phases.get(p).map(|s| s.status.is_done()).unwrap_or(false))
    }

    pub fn record(&mut self, event: WorkflowEvent, limit: usize) {
        self.history.push(HistoryEntry {
            at: Utc::now(),
            phase: self.project.current_phase,
            event,
        });
        if self.history.len() > limit {
            self.history.drain(..self.history.len() - limit);
        }
    }

    /// Fill gaps left by older or hand-edited documents so callers never see
    /// a partial model.
    pub fn normalize(&mut self) {
        let route = self.route();
        for &p in PhaseCode::all() {
            self.phases.entry(p).or_insert_with(|| {
                let state = if route.is_required(p) {
                    PhaseState::Pending
                } else {
                    PhaseState::Skipped
                };
                PhaseStatus::with_state(state)
            });
        }
    }
}

/// Append `new` to `list`, skipping paths already present. Returns how many
/// were appended.
pub(crate) fn append_outputs(list: &mut Vec<OutputRef>, new: &[OutputRef]) -> usize {
    let mut added = 0;
    for out in new {
        if !list.contains(out) {
            list.push(out.clone());
            added += 1;
        }
    }
    added
}

// ---------------------------------------------------------------------------
// StatusStore
// ---------------------------------------------------------------------------

/// Durable home of the status document.
///
/// Writes use optimistic concurrency: the document carries a `revision`, and
/// `save` refuses to overwrite a document whose on-disk revision differs from
/// the one the caller loaded. The write itself is temp-file + rename.
#[derive(Debug, Clone)]
pub struct StatusStore {
    root: PathBuf,
    defaults: SettingsOverrides,
}

impl StatusStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            defaults: SettingsOverrides::default(),
        }
    }

    pub fn with_config(root: impl Into<PathBuf>, config: &Config) -> Self {
        Self {
            root: root.into(),
            defaults: config.defaults,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path(&self) -> PathBuf {
        paths::status_path(&self.root)
    }

    pub fn exists(&self) -> bool {
        self.path().exists()
    }

    // -----------------------------------------------------------------------
    // Read / write
    // -----------------------------------------------------------------------

    pub fn load(&self) -> Result<WorkflowStatus> {
        self.read()?.ok_or(PrevcError::NoWorkflow)
    }

    fn read(&self) -> Result<Option<WorkflowStatus>> {
        let path = self.path();
        if !path.exists() {
            return Ok(None);
        }
        let data = std::fs::read_to_string(&path)?;
        let mut status: WorkflowStatus = serde_json::from_str(&data)?;
        status.normalize();
        Ok(Some(status))
    }

    /// Commit `status`. On success its revision is advanced to match disk.
    ///
    /// The revision check and the rename run under an exclusive advisory lock
    /// on `status.lock`, so two writers cannot both pass the check. Readers
    /// take no lock; the rename keeps every read whole.
    pub fn save(&self, status: &mut WorkflowStatus) -> Result<()> {
        let _lock = self.lock()?;
        let on_disk = self.read()?;
        let found = on_disk.as_ref().map(|s| s.revision).unwrap_or(0);
        if found != status.revision {
            return Err(PrevcError::StaleWrite {
                expected: status.revision,
                found,
            });
        }
        if on_disk.as_ref() == Some(&*status) {
            return Ok(());
        }

        let mut next = status.clone();
        next.revision += 1;
        let data = serde_json::to_string_pretty(&next)?;
        crate::io::atomic_write(&self.path(), data.as_bytes())?;
        tracing::debug!(revision = next.revision, "saved workflow status");
        *status = next;
        Ok(())
    }

    /// Released when the returned file is dropped.
    fn lock(&self) -> Result<File> {
        let path = paths::status_lock_path(&self.root);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&path)?;
        file.lock_exclusive()?;
        Ok(file)
    }

    // -----------------------------------------------------------------------
    // Creation
    // -----------------------------------------------------------------------

    /// Scale defaults, then project defaults, then call-site overrides.
    pub fn settings_for(
        &self,
        scale: ScaleLevel,
        overrides: Option<&SettingsOverrides>,
    ) -> WorkflowSettings {
        let mut settings = WorkflowSettings::for_scale(scale);
        settings.apply(&self.defaults);
        if let Some(o) = overrides {
            settings.apply(o);
        }
        settings
    }

    pub fn create_from_scale(
        &self,
        name: &str,
        scale: ScaleLevel,
        overrides: Option<&SettingsOverrides>,
        archive_previous: Option<bool>,
    ) -> Result<WorkflowStatus> {
        let settings = self.settings_for(scale, overrides);
        self.create(
            WorkflowStatus::new(name, None, scale, settings),
            archive_previous,
        )
    }

    /// Persist a fresh document. An existing one is archived
    /// (`Some(true)`), deleted (`Some(false)`), or refused (`None`).
    pub fn create(
        &self,
        mut status: WorkflowStatus,
        archive_previous: Option<bool>,
    ) -> Result<WorkflowStatus> {
        if self.exists() {
            match archive_previous {
                Some(true) => {
                    self.archive()?;
                }
                Some(false) => {
                    self.remove()?;
                }
                None => return Err(PrevcError::WorkflowExists),
            }
        }
        status.revision = 0;
        self.save(&mut status)?;
        tracing::info!(
            project = %status.project.name,
            scale = %status.project.scale,
            phase = %status.project.current_phase,
            "workflow initialized"
        );
        Ok(status)
    }

    /// Move the current document to a timestamped backup.
    pub fn archive(&self) -> Result<Option<PathBuf>> {
        if !self.exists() {
            return Ok(None);
        }
        let dest = paths::archive_path(&self.root, Utc::now());
        crate::io::move_file(&self.path(), &dest)?;
        tracing::warn!(archive = %dest.display(), "archived previous workflow");
        Ok(Some(dest))
    }

    pub fn remove(&self) -> Result<bool> {
        if !self.exists() {
            return Ok(false);
        }
        std::fs::remove_file(self.path())?;
        tracing::warn!("deleted previous workflow");
        Ok(true)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store(dir: &TempDir) -> StatusStore {
        StatusStore::new(dir.path())
    }

    #[test]
    fn new_quick_workflow_starts_in_execution() {
        let status = WorkflowStatus::new(
            "demo",
            None,
            ScaleLevel::Quick,
            WorkflowSettings::for_scale(ScaleLevel::Quick),
        );
        assert_eq!(status.current_phase(), PhaseCode::Execution);
        assert_eq!(
            status.phase(PhaseCode::Execution).unwrap().status,
            PhaseState::InProgress
        );
        assert_eq!(
            status.phase(PhaseCode::Planning).unwrap().status,
            PhaseState::Skipped
        );
        assert_eq!(
            status.phase(PhaseCode::Validation).unwrap().status,
            PhaseState::Pending
        );
        assert_eq!(status.roles.len(), 1);
        assert!(status.roles.contains_key(&RoleId::SoloDev));
        assert!(!status.settings.require_plan);
        assert!(!status.settings.require_approval);
    }

    #[test]
    fn exactly_one_phase_in_progress_after_init() {
        for scale in ScaleLevel::all() {
            let status =
                WorkflowStatus::new("x", None, *scale, WorkflowSettings::for_scale(*scale));
            let active = status
                .phases
                .values()
                .filter(|p| p.status == PhaseState::InProgress)
                .count();
            assert_eq!(active, 1, "{scale}");
        }
    }

    #[test]
    fn load_without_document_is_no_workflow() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(store(&dir).load(), Err(PrevcError::NoWorkflow)));
        assert!(!store(&dir).exists());
    }

    #[test]
    fn create_and_load_roundtrip() {
        let dir = TempDir::new().unwrap();
        let s = store(&dir);
        let created = s
            .create_from_scale("demo", ScaleLevel::Medium, None, None)
            .unwrap();
        assert_eq!(created.revision, 1);
        let loaded = s.load().unwrap();
        assert_eq!(loaded, created);
    }

    #[test]
    fn save_of_unchanged_document_is_noop() {
        let dir = TempDir::new().unwrap();
        let s = store(&dir);
        s.create_from_scale("demo", ScaleLevel::Small, None, None)
            .unwrap();
        let before = std::fs::read(s.path()).unwrap();

        let mut loaded = s.load().unwrap();
        s.save(&mut loaded).unwrap();

        assert_eq!(loaded.revision, 1);
        assert_eq!(std::fs::read(s.path()).unwrap(), before);
    }

    #[test]
    fn concurrent_writer_gets_stale_write() {
        let dir = TempDir::new().unwrap();
        let s = store(&dir);
        s.create_from_scale("demo", ScaleLevel::Small, None, None)
            .unwrap();

        let mut first = s.load().unwrap();
        let mut second = s.load().unwrap();

        first.linked_plan = Some("plan-a".to_string());
        s.save(&mut first).unwrap();
        assert_eq!(first.revision, 2);

        second.linked_plan = Some("plan-b".to_string());
        let err = s.save(&mut second).unwrap_err();
        assert!(err.is_retryable());
        assert!(matches!(
            err,
            PrevcError::StaleWrite {
                expected: 1,
                found: 2
            }
        ));
        assert_eq!(s.load().unwrap().linked_plan.as_deref(), Some("plan-a"));
    }

    #[test]
    fn racing_writers_commit_exactly_once() {
        let dir = TempDir::new().unwrap();
        let s = store(&dir);
        s.create_from_scale("demo", ScaleLevel::Small, None, None)
            .unwrap();

        let writers = 8;
        let barrier = std::sync::Barrier::new(writers);
        let results: Vec<Result<()>> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..writers)
                .map(|i| {
                    let s = s.clone();
                    let barrier = &barrier;
                    scope.spawn(move || {
                        let mut status = s.load()?;
                        status.linked_plan = Some(format!("plan-{i}"));
                        barrier.wait();
                        s.save(&mut status)
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(results
            .iter()
            .filter_map(|r| r.as_ref().err())
            .all(PrevcError::is_retryable));
        assert_eq!(s.load().unwrap().revision, 2);
    }

    #[test]
    fn create_refuses_existing_without_choice() {
        let dir = TempDir::new().unwrap();
        let s = store(&dir);
        s.create_from_scale("one", ScaleLevel::Quick, None, None)
            .unwrap();
        assert!(matches!(
            s.create_from_scale("two", ScaleLevel::Quick, None, None),
            Err(PrevcError::WorkflowExists)
        ));
    }

    #[test]
    fn create_with_archive_keeps_backup() {
        let dir = TempDir::new().unwrap();
        let s = store(&dir);
        s.create_from_scale("one", ScaleLevel::Quick, None, None)
            .unwrap();
        let second = s
            .create_from_scale("two", ScaleLevel::Large, None, Some(true))
            .unwrap();
        assert_eq!(second.project.name, "two");
        assert_eq!(second.revision, 1);

        let backups: Vec<_> = std::fs::read_dir(paths::archive_dir(dir.path()))
            .unwrap()
            .collect();
        assert_eq!(backups.len(), 1);
    }

    #[test]
    fn create_with_replace_deletes_previous() {
        let dir = TempDir::new().unwrap();
        let s = store(&dir);
        s.create_from_scale("one", ScaleLevel::Quick, None, None)
            .unwrap();
        s.create_from_scale("two", ScaleLevel::Quick, None, Some(false))
            .unwrap();
        assert!(!paths::archive_dir(dir.path()).exists());
        assert_eq!(s.load().unwrap().project.name, "two");
    }

    #[test]
    fn corrupt_document_fails_loudly() {
        let dir = TempDir::new().unwrap();
        let s = store(&dir);
        crate::io::atomic_write(&s.path(), b"{ not json").unwrap();
        assert!(matches!(s.load(), Err(PrevcError::Json(_))));
    }

    #[test]
    fn load_normalizes_sparse_document() {
        let dir = TempDir::new().unwrap();
        let s = store(&dir);
        let doc = r#"{
            "project": {
                "name": "legacy",
                "scale": "small",
                "current_phase": "P",
                "started": "2026-01-01T00:00:00Z"
            },
            "phases": { "P": { "status": "in_progress" } },
            "settings": { "autonomous_mode": true }
        }"#;
        crate::io::atomic_write(&s.path(), doc.as_bytes()).unwrap();

        let status = s.load().unwrap();
        assert_eq!(status.revision, 0);
        assert!(status.settings.autonomous_mode);
        assert!(status.settings.require_plan);
        assert!(status.settings.require_approval);
        assert_eq!(status.phases.len(), 5);
        assert_eq!(
            status.phase(PhaseCode::Review).unwrap().status,
            PhaseState::Skipped
        );
        assert_eq!(
            status.phase(PhaseCode::Execution).unwrap().status,
            PhaseState::Pending
        );
        assert!(status.roles.is_empty());
        assert!(status.history.is_empty());
    }

    #[test]
    fn settings_layering() {
        let dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.defaults.require_approval = Some(false);
        let s = StatusStore::with_config(dir.path(), &config);

        let settings = s.settings_for(
            ScaleLevel::Large,
            Some(&SettingsOverrides {
                autonomous_mode: Some(true),
                ..Default::default()
            }),
        );
        assert!(settings.require_plan);
        assert!(!settings.require_approval);
        assert!(settings.autonomous_mode);
    }

    #[test]
    fn history_is_trimmed_to_limit() {
        let mut status = WorkflowStatus::new(
            "x",
            None,
            ScaleLevel::Quick,
            WorkflowSettings::default(),
        );
        for _ in 0..10 {
            status.record(
                WorkflowEvent::RoleStarted {
                    role: RoleId::SoloDev,
                },
                4,
            );
        }
        assert_eq!(status.history.len(), 4);
    }

    #[test]
    fn append_outputs_skips_duplicates() {
        let mut list = vec![OutputRef::new("a.md")];
        let added = append_outputs(&mut list, &["a.md".into(), "b.md".into()]);
        assert_eq!(added, 1);
        assert_eq!(list.len(), 2);
    }
}
