//! Workflow façade.
//!
//! Every mutating operation is a single load → mutate → save unit against the
//! status document. An error anywhere in the closure leaves the document as it
//! was on disk; a concurrent writer surfaces as a retryable
//! [`PrevcError::StaleWrite`].

mod advice;

pub use advice::{Progress, WorkflowSummary};

use crate::catalog;
use crate::config::Config;
use crate::error::{PrevcError, Result};
use crate::gate::{GateCheckResult, GateChecker};
use crate::scale::{detect_scale, ScaleContext};
use crate::status::{
    append_outputs, HistoryEntry, PlanApproval, RoleStatus, SettingsOverrides, StatusStore,
    WorkflowEvent, WorkflowSettings, WorkflowStatus,
};
use crate::types::{
    Approver, OutputRef, PhaseCode, PhaseState, RoleId, RoleState, ScaleLevel, Transition,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, Default)]
pub struct CompletePhaseOptions {
    /// Advance even when a gate blocks.
    pub force: bool,
}

/// Returned by [`Orchestrator::handoff`]; the same data lands in the history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HandoffRecord {
    pub from: RoleId,
    pub to: RoleId,
    pub phase: PhaseCode,
    pub artifacts: Vec<OutputRef>,
    pub at: DateTime<Utc>,
    /// The receiving role was started by this handoff.
    pub started: bool,
}

pub struct Orchestrator {
    root: PathBuf,
    store: StatusStore,
    gates: GateChecker,
    config: Config,
}

impl Orchestrator {
    /// Build an orchestrator for `root`, reading `.prevc/config.yaml` once.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        let config = Config::load(&root)?;
        Ok(Self::with_config(root, config))
    }

    pub fn with_config(root: impl Into<PathBuf>, config: Config) -> Self {
        let root = root.into();
        Self {
            store: StatusStore::with_config(&root, &config),
            gates: GateChecker::new(config.gates.clone()),
            root,
            config,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &StatusStore {
        &self.store
    }

    fn mutate<T>(&self, f: impl FnOnce(&mut WorkflowStatus) -> Result<T>) -> Result<T> {
        let mut status = self.store.load()?;
        let out = f(&mut status)?;
        self.store.save(&mut status)?;
        Ok(out)
    }

    // -----------------------------------------------------------------------
    // Initialization
    // -----------------------------------------------------------------------

    pub fn init_workflow_with_scale(
        &self,
        name: &str,
        scale: ScaleLevel,
        overrides: Option<&SettingsOverrides>,
        archive_previous: Option<bool>,
    ) -> Result<WorkflowStatus> {
        self.store
            .create_from_scale(name, scale, overrides, archive_previous)
    }

    /// Detect the scale from `ctx`, then initialize as
    /// [`init_workflow_with_scale`](Self::init_workflow_with_scale) would.
    pub fn init_workflow(
        &self,
        ctx: &ScaleContext,
        overrides: Option<&SettingsOverrides>,
        archive_previous: Option<bool>,
    ) -> Result<WorkflowStatus> {
        let scale = detect_scale(ctx);
        debug!(project = %ctx.name, %scale, "detected scale");
        let description = Some(ctx.description.trim())
            .filter(|d| !d.is_empty())
            .map(str::to_string);
        let settings = self.store.settings_for(scale, overrides);
        let status = WorkflowStatus::new(ctx.name.as_str(), description, scale, settings);
        self.store.create(status, archive_previous)
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    pub fn get_status(&self) -> Result<WorkflowStatus> {
        self.store.load()
    }

    pub fn is_complete(&self) -> Result<bool> {
        Ok(self.store.load()?.is_complete())
    }

    pub fn history(&self) -> Result<Vec<HistoryEntry>> {
        Ok(self.store.load()?.history)
    }

    pub fn get_settings(&self) -> Result<WorkflowSettings> {
        Ok(self.store.load()?.settings)
    }

    pub fn get_approval(&self) -> Result<Option<PlanApproval>> {
        Ok(self.store.load()?.approval)
    }

    pub fn get_summary(&self) -> Result<WorkflowSummary> {
        Ok(advice::summarize(&self.store.load()?))
    }

    pub fn get_recommended_actions(&self) -> Result<Vec<String>> {
        let status = self.store.load()?;
        Ok(advice::recommended_actions(&status, &self.gates))
    }

    /// Preview of the gates `complete_phase` would run right now.
    pub fn check_gates(&self) -> Result<GateCheckResult> {
        let status = self.store.load()?;
        if status.is_complete() {
            return Ok(GateCheckResult {
                allowed: false,
                blockers: Vec::new(),
                hint: "workflow is complete".to_string(),
            });
        }
        let t = next_transition(&status);
        Ok(self.gates.check(&status, t.from, t.to))
    }

    // -----------------------------------------------------------------------
    // Phase transitions
    // -----------------------------------------------------------------------

    /// Record `outputs` on the current phase and advance to the next required
    /// phase. Returns the new phase, or `None` when the workflow completed.
    pub fn complete_phase(
        &self,
        outputs: &[OutputRef],
        options: CompletePhaseOptions,
    ) -> Result<Option<PhaseCode>> {
        let limit = self.config.history_limit;
        self.mutate(|status| {
            ensure_open(status)?;
            let now = Utc::now();
            let transition = next_transition(status);
            let Transition { from, to } = transition;

            let recorded = {
                let phase = phase_mut(status, from)?;
                append_outputs(&mut phase.outputs, outputs);
                phase.outputs.len()
            };
            if from == PhaseCode::Planning && recorded == 0 {
                if let Some(plan) = status.linked_plan.clone() {
                    phase_mut(status, from)?.outputs.push(OutputRef::new(plan));
                }
            }

            let blockers = self.gates.blockers(status, from, to);
            if let Some(first) = blockers.first() {
                if !options.force && !status.settings.autonomous_mode {
                    return Err(PrevcError::Gate {
                        transition,
                        gate: first.gate,
                        hint: first.hint.clone(),
                    });
                }
                for b in &blockers {
                    warn!(gate = %b.gate, %transition, forced = options.force, "gate bypassed");
                    status.record(
                        WorkflowEvent::GateBypassed {
                            gate: b.gate,
                            transition,
                            forced: options.force,
                        },
                        limit,
                    );
                }
            }

            let output_count = {
                let phase = phase_mut(status, from)?;
                phase.status = PhaseState::Completed;
                phase.completed_at = Some(now);
                phase.outputs.len()
            };
            status.record(
                WorkflowEvent::PhaseCompleted {
                    phase: from,
                    outputs: output_count,
                },
                limit,
            );

            for skipped in status.route().skipped_between(from, to) {
                let phase = phase_mut(status, skipped)?;
                if phase.status != PhaseState::Skipped {
                    phase.status = PhaseState::Skipped;
                    status.record(WorkflowEvent::PhaseSkipped { phase: skipped }, limit);
                }
            }

            match to {
                Some(next) => {
                    let phase = phase_mut(status, next)?;
                    phase.status = PhaseState::InProgress;
                    phase.started_at = Some(now);
                    status.project.current_phase = next;
                    status.record(WorkflowEvent::PhaseStarted { phase: next }, limit);
                    info!(%transition, "phase advanced");
                    Ok(Some(next))
                }
                None => {
                    info!(project = %status.project.name, "workflow complete");
                    Ok(None)
                }
            }
        })
    }

    // -----------------------------------------------------------------------
    // Roles
    // -----------------------------------------------------------------------

    pub fn start_role(&self, role: RoleId) -> Result<RoleStatus> {
        let limit = self.config.history_limit;
        self.mutate(|status| {
            ensure_open(status)?;
            let phase = status.current_phase();
            ensure_operates(role, phase)?;
            start_role_in(status, role, phase, limit)
        })
    }

    /// Finish a role started in the current phase. Its outputs are added to
    /// both the role and the phase.
    pub fn complete_role(&self, role: RoleId, outputs: &[OutputRef]) -> Result<RoleStatus> {
        let limit = self.config.history_limit;
        self.mutate(|status| {
            ensure_open(status)?;
            let phase = status.current_phase();
            let role_status = status
                .roles
                .get_mut(&role)
                .filter(|r| r.is_active_in(phase))
                .ok_or(PrevcError::RoleNotStarted { role, phase })?;
            append_outputs(&mut role_status.outputs, outputs);
            role_status.status = RoleState::Completed;
            role_status.last_active = Utc::now();
            let snapshot = role_status.clone();

            append_outputs(&mut phase_mut(status, phase)?.outputs, outputs);
            status.record(
                WorkflowEvent::RoleCompleted {
                    role,
                    outputs: outputs.len(),
                },
                limit,
            );
            debug!(%role, %phase, "role completed");
            Ok(snapshot)
        })
    }

    pub fn handoff(
        &self,
        from: RoleId,
        to: RoleId,
        artifacts: &[OutputRef],
    ) -> Result<HandoffRecord> {
        let limit = self.config.history_limit;
        self.mutate(|status| {
            ensure_open(status)?;
            let phase = status.current_phase();
            ensure_operates(from, phase)?;
            ensure_operates(to, phase)?;
            if !status
                .roles
                .get(&from)
                .is_some_and(|r| r.was_started_in(phase))
            {
                return Err(PrevcError::RoleNotStarted { role: from, phase });
            }

            // A role already started here (active or finished) keeps its state.
            let started = !status
                .roles
                .get(&to)
                .is_some_and(|r| r.was_started_in(phase));
            if started {
                start_role_in(status, to, phase, limit)?;
            }
            status.record(
                WorkflowEvent::Handoff {
                    from,
                    to,
                    artifacts: artifacts.to_vec(),
                },
                limit,
            );
            debug!(%from, %to, %phase, artifacts = artifacts.len(), "handoff");
            Ok(HandoffRecord {
                from,
                to,
                phase,
                artifacts: artifacts.to_vec(),
                at: Utc::now(),
                started,
            })
        })
    }

    // -----------------------------------------------------------------------
    // Plan and approval
    // -----------------------------------------------------------------------

    /// Link an externally authored plan. Linking a different plan clears any
    /// approval of the previous one.
    pub fn mark_plan_created(&self, plan_id: &str) -> Result<()> {
        let plan_id = plan_id.trim();
        if plan_id.is_empty() {
            return Err(PrevcError::InvalidPlanId(plan_id.to_string()));
        }
        let limit = self.config.history_limit;
        self.mutate(|status| {
            if status.linked_plan.as_deref() == Some(plan_id) {
                return Ok(());
            }
            if status.approval.take().is_some() {
                info!(plan = plan_id, "plan replaced, previous approval cleared");
            }
            status.linked_plan = Some(plan_id.to_string());
            status.record(
                WorkflowEvent::PlanLinked {
                    plan_id: plan_id.to_string(),
                },
                limit,
            );
            Ok(())
        })
    }

    pub fn approve_plan(
        &self,
        approver: impl Into<Approver>,
        notes: Option<String>,
    ) -> Result<PlanApproval> {
        let approver = approver.into();
        let limit = self.config.history_limit;
        self.mutate(|status| {
            if status.linked_plan.is_none() {
                return Err(PrevcError::NoPlanToApprove);
            }
            let approval = PlanApproval {
                approver: approver.clone(),
                notes,
                approved_at: Utc::now(),
            };
            status.approval = Some(approval.clone());
            status.record(WorkflowEvent::PlanApproved { approver }, limit);
            info!(approver = %approval.approver, "plan approved");
            Ok(approval)
        })
    }

    // -----------------------------------------------------------------------
    // Settings
    // -----------------------------------------------------------------------

    pub fn set_settings(&self, overrides: &SettingsOverrides) -> Result<WorkflowSettings> {
        let limit = self.config.history_limit;
        self.mutate(|status| {
            let before = status.settings;
            status.settings.apply(overrides);
            let after = status.settings;
            if after != before {
                if after.autonomous_mode && !before.autonomous_mode {
                    warn!("autonomous mode enabled: gates will not be enforced");
                }
                status.record(WorkflowEvent::SettingsChanged { settings: after }, limit);
            }
            Ok(after)
        })
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// The move `complete_phase` would make from the current phase.
pub(crate) fn next_transition(status: &WorkflowStatus) -> Transition {
    let from = status.current_phase();
    Transition {
        from,
        to: status.route().next_required_after(from),
    }
}

fn ensure_open(status: &WorkflowStatus) -> Result<()> {
    if status.is_complete() {
        return Err(PrevcError::WorkflowComplete);
    }
    Ok(())
}

fn ensure_operates(role: RoleId, phase: PhaseCode) -> Result<()> {
    if !catalog::role_operates_in(role, phase) {
        return Err(PrevcError::RoleNotInPhase { role, phase });
    }
    Ok(())
}

fn phase_mut(
    status: &mut WorkflowStatus,
    code: PhaseCode,
) -> Result<&mut crate::status::PhaseStatus> {
    status
        .phases
        .get_mut(&code)
        .ok_or_else(|| PrevcError::InvalidPhase(code.to_string()))
}

fn start_role_in(
    status: &mut WorkflowStatus,
    role: RoleId,
    phase: PhaseCode,
    limit: usize,
) -> Result<RoleStatus> {
    if status.roles.get(&role).is_some_and(|r| r.is_active_in(phase)) {
        return Err(PrevcError::RoleAlreadyActive { role, phase });
    }
    let now = Utc::now();
    let entry = status.roles.entry(role).or_insert_with(|| RoleStatus {
        status: RoleState::Pending,
        phase,
        outputs: Vec::new(),
        last_active: now,
    });
    entry.status = RoleState::InProgress;
    entry.phase = phase;
    entry.last_active = now;
    let snapshot = entry.clone();
    status.record(WorkflowEvent::RoleStarted { role }, limit);
    debug!(%role, %phase, "role started");
    Ok(snapshot)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gate::GateType;
    use tempfile::TempDir;

    fn orch(dir: &TempDir) -> Orchestrator {
        Orchestrator::new(dir.path()).unwrap()
    }

    fn outputs(paths: &[&str]) -> Vec<OutputRef> {
        paths.iter().map(|p| OutputRef::new(*p)).collect()
    }

    #[test]
    fn reads_without_workflow_fail() {
        let dir = TempDir::new().unwrap();
        let o = orch(&dir);
        assert!(matches!(o.get_status(), Err(PrevcError::NoWorkflow)));
        assert!(matches!(o.get_summary(), Err(PrevcError::NoWorkflow)));
        assert!(matches!(o.check_gates(), Err(PrevcError::NoWorkflow)));
    }

    #[test]
    fn quick_workflow_runs_to_completion() {
        let dir = TempDir::new().unwrap();
        let o = orch(&dir);
        o.init_workflow_with_scale("demo", ScaleLevel::Quick, None, None)
            .unwrap();

        let next = o
            .complete_phase(&outputs(&["src/lib.rs"]), CompletePhaseOptions::default())
            .unwrap();
        assert_eq!(next, Some(PhaseCode::Validation));

        let done = o
            .complete_phase(&outputs(&["report.md"]), CompletePhaseOptions::default())
            .unwrap();
        assert_eq!(done, None);
        assert!(o.is_complete().unwrap());

        let status = o.get_status().unwrap();
        assert_eq!(
            status.phase(PhaseCode::Confirmation).unwrap().status,
            PhaseState::Skipped
        );
        assert!(matches!(
            o.complete_phase(&[], CompletePhaseOptions::default()),
            Err(PrevcError::WorkflowComplete)
        ));
        assert!(matches!(
            o.start_role(RoleId::SoloDev),
            Err(PrevcError::WorkflowComplete)
        ));

        let gates = o.check_gates().unwrap();
        assert!(!gates.allowed);
        assert!(gates.blockers.is_empty());
        assert_eq!(gates.hint, "workflow is complete");
    }

    #[test]
    fn rejected_advance_leaves_document_untouched() {
        let dir = TempDir::new().unwrap();
        let o = orch(&dir);
        o.init_workflow_with_scale("demo", ScaleLevel::Medium, None, None)
            .unwrap();
        let before = o.get_status().unwrap();

        let err = o
            .complete_phase(&outputs(&["plan.md"]), CompletePhaseOptions::default())
            .unwrap_err();
        match err {
            PrevcError::Gate {
                transition, gate, ..
            } => {
                assert_eq!(gate, GateType::Plan);
                assert_eq!(transition.from, PhaseCode::Planning);
                assert_eq!(transition.to, Some(PhaseCode::Review));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(o.get_status().unwrap(), before);
    }

    #[test]
    fn force_bypasses_gates_and_records_it() {
        let dir = TempDir::new().unwrap();
        let o = orch(&dir);
        o.init_workflow_with_scale("demo", ScaleLevel::Medium, None, None)
            .unwrap();
        let next = o
            .complete_phase(&[], CompletePhaseOptions { force: true })
            .unwrap();
        assert_eq!(next, Some(PhaseCode::Review));

        let bypassed: Vec<_> = o
            .history()
            .unwrap()
            .into_iter()
            .filter_map(|h| match h.event {
                WorkflowEvent::GateBypassed { gate, forced, .. } => Some((gate, forced)),
                _ => None,
            })
            .collect();
        assert_eq!(
            bypassed,
            vec![(GateType::Plan, true), (GateType::Outputs, true)]
        );
    }

    #[test]
    fn autonomous_mode_advances_without_force() {
        let dir = TempDir::new().unwrap();
        let o = orch(&dir);
        let overrides = SettingsOverrides {
            autonomous_mode: Some(true),
            ..Default::default()
        };
        o.init_workflow_with_scale("demo", ScaleLevel::Medium, Some(&overrides), None)
            .unwrap();
        assert!(o.check_gates().unwrap().allowed);
        assert_eq!(
            o.complete_phase(&[], CompletePhaseOptions::default())
                .unwrap(),
            Some(PhaseCode::Review)
        );
    }

    #[test]
    fn linked_plan_is_recorded_as_planning_output() {
        let dir = TempDir::new().unwrap();
        let o = orch(&dir);
        o.init_workflow_with_scale("demo", ScaleLevel::Small, None, None)
            .unwrap();
        o.mark_plan_created("plan-7").unwrap();
        o.approve_plan(RoleId::Planner, None).unwrap();
        assert_eq!(
            o.complete_phase(&[], CompletePhaseOptions::default())
                .unwrap(),
            Some(PhaseCode::Execution)
        );
        let status = o.get_status().unwrap();
        assert_eq!(
            status.phase(PhaseCode::Planning).unwrap().outputs,
            outputs(&["plan-7"])
        );
        assert_eq!(
            status.phase(PhaseCode::Review).unwrap().status,
            PhaseState::Skipped
        );
    }

    #[test]
    fn approval_requires_plan_and_relinking_clears_it() {
        let dir = TempDir::new().unwrap();
        let o = orch(&dir);
        o.init_workflow_with_scale("demo", ScaleLevel::Medium, None, None)
            .unwrap();
        assert!(matches!(
            o.approve_plan("alice", None),
            Err(PrevcError::NoPlanToApprove)
        ));
        assert!(matches!(
            o.mark_plan_created("   "),
            Err(PrevcError::InvalidPlanId(_))
        ));

        o.mark_plan_created("plan-1").unwrap();
        let approval = o
            .approve_plan("alice", Some("looks good".into()))
            .unwrap();
        assert_eq!(approval.approver, Approver::Name("alice".into()));
        assert!(o.get_approval().unwrap().is_some());

        o.mark_plan_created("plan-1").unwrap();
        assert!(o.get_approval().unwrap().is_some());

        o.mark_plan_created("plan-2").unwrap();
        assert!(o.get_approval().unwrap().is_none());
        assert_eq!(
            o.get_status().unwrap().linked_plan.as_deref(),
            Some("plan-2")
        );
    }

    #[test]
    fn role_lifecycle() {
        let dir = TempDir::new().unwrap();
        let o = orch(&dir);
        o.init_workflow_with_scale("demo", ScaleLevel::Large, None, None)
            .unwrap();

        assert!(matches!(
            o.start_role(RoleId::Developer),
            Err(PrevcError::RoleNotInPhase { .. })
        ));
        assert!(matches!(
            o.complete_role(RoleId::Planner, &[]),
            Err(PrevcError::RoleNotStarted { .. })
        ));

        let started = o.start_role(RoleId::Planner).unwrap();
        assert_eq!(started.status, RoleState::InProgress);
        assert_eq!(started.phase, PhaseCode::Planning);
        assert!(matches!(
            o.start_role(RoleId::Planner),
            Err(PrevcError::RoleAlreadyActive { .. })
        ));

        let done = o
            .complete_role(RoleId::Planner, &outputs(&["plan.md", "plan.md"]))
            .unwrap();
        assert_eq!(done.status, RoleState::Completed);
        assert_eq!(done.outputs, outputs(&["plan.md"]));
        assert!(matches!(
            o.complete_role(RoleId::Planner, &[]),
            Err(PrevcError::RoleNotStarted { .. })
        ));

        let status = o.get_status().unwrap();
        assert_eq!(
            status.phase(PhaseCode::Planning).unwrap().outputs,
            outputs(&["plan.md"])
        );
    }

    #[test]
    fn handoff_starts_receiving_role() {
        let dir = TempDir::new().unwrap();
        let o = orch(&dir);
        o.init_workflow_with_scale("demo", ScaleLevel::Large, None, None)
            .unwrap();

        assert!(matches!(
            o.handoff(RoleId::Planner, RoleId::Designer, &[]),
            Err(PrevcError::RoleNotStarted { .. })
        ));
        assert!(matches!(
            o.handoff(RoleId::Planner, RoleId::Qa, &[]),
            Err(PrevcError::RoleNotInPhase { .. })
        ));

        o.start_role(RoleId::Planner).unwrap();
        let record = o
            .handoff(RoleId::Planner, RoleId::Designer, &outputs(&["plan.md"]))
            .unwrap();
        assert!(record.started);
        assert_eq!(record.phase, PhaseCode::Planning);

        let again = o
            .handoff(RoleId::Planner, RoleId::Designer, &[])
            .unwrap();
        assert!(!again.started);

        let status = o.get_status().unwrap();
        assert_eq!(status.roles[&RoleId::Designer].status, RoleState::InProgress);
        assert!(status
            .history
            .iter()
            .any(|h| matches!(h.event, WorkflowEvent::Handoff { .. })));
    }

    #[test]
    fn handoff_leaves_role_completed_in_phase_alone() {
        let dir = TempDir::new().unwrap();
        let o = orch(&dir);
        o.init_workflow_with_scale("demo", ScaleLevel::Large, None, None)
            .unwrap();
        o.start_role(RoleId::Planner).unwrap();
        o.start_role(RoleId::Designer).unwrap();
        o.complete_role(RoleId::Designer, &outputs(&["design.md"]))
            .unwrap();

        let record = o
            .handoff(RoleId::Planner, RoleId::Designer, &outputs(&["plan.md"]))
            .unwrap();
        assert!(!record.started);

        let status = o.get_status().unwrap();
        assert_eq!(status.roles[&RoleId::Designer].status, RoleState::Completed);
        assert!(!status
            .history
            .iter()
            .skip_while(|h| !matches!(h.event, WorkflowEvent::RoleCompleted { .. }))
            .any(|h| matches!(h.event, WorkflowEvent::RoleStarted { .. })));
    }

    #[test]
    fn handoff_restarts_role_from_earlier_phase() {
        let dir = TempDir::new().unwrap();
        let o = orch(&dir);
        o.init_workflow_with_scale("demo", ScaleLevel::Large, None, None)
            .unwrap();
        o.start_role(RoleId::Designer).unwrap();
        o.complete_role(RoleId::Designer, &outputs(&["design.md"]))
            .unwrap();
        o.mark_plan_created("plan-1").unwrap();
        o.complete_phase(&[], CompletePhaseOptions::default())
            .unwrap();

        o.start_role(RoleId::Architect).unwrap();
        let record = o
            .handoff(RoleId::Architect, RoleId::Designer, &[])
            .unwrap();
        assert!(record.started);

        let designer = &o.get_status().unwrap().roles[&RoleId::Designer];
        assert_eq!(designer.status, RoleState::InProgress);
        assert_eq!(designer.phase, PhaseCode::Review);
    }

    #[test]
    fn settings_update_and_history() {
        let dir = TempDir::new().unwrap();
        let o = orch(&dir);
        o.init_workflow_with_scale("demo", ScaleLevel::Medium, None, None)
            .unwrap();
        let settings = o
            .set_settings(&SettingsOverrides {
                require_approval: Some(false),
                ..Default::default()
            })
            .unwrap();
        assert!(!settings.require_approval);
        assert!(settings.require_plan);
        assert_eq!(o.get_settings().unwrap(), settings);

        let revision = o.get_status().unwrap().revision;
        o.set_settings(&SettingsOverrides::default()).unwrap();
        assert_eq!(o.get_status().unwrap().revision, revision);
    }

    #[test]
    fn described_init_detects_scale() {
        let dir = TempDir::new().unwrap();
        let o = orch(&dir);
        let ctx = ScaleContext::new("docs", "Fix typo in README");
        let status = o.init_workflow(&ctx, None, None).unwrap();
        assert_eq!(status.project.scale, ScaleLevel::Quick);
        assert_eq!(
            status.project.description.as_deref(),
            Some("Fix typo in README")
        );
    }

    #[test]
    fn history_respects_configured_limit() {
        let dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.history_limit = 3;
        let o = Orchestrator::with_config(dir.path(), config);
        o.init_workflow_with_scale("demo", ScaleLevel::Small, None, None)
            .unwrap();
        for i in 0..5 {
            o.mark_plan_created(&format!("plan-{i}")).unwrap();
        }
        let history = o.history().unwrap();
        assert_eq!(history.len(), 3);
        assert!(matches!(
            &history[2].event,
            WorkflowEvent::PlanLinked { plan_id } if plan_id == "plan-4"
        ));
    }
}
