use crate::config::GateConfig;
use crate::status::WorkflowStatus;
use crate::types::{PhaseCode, PhaseState, Transition};
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// GateType
// ---------------------------------------------------------------------------

/// Preconditions on a forward transition, in evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GateType {
    Plan,
    Approval,
    Outputs,
}

impl GateType {
    pub fn as_str(self) -> &'static str {
        match self {
            GateType::Plan => "plan",
            GateType::Approval => "approval",
            GateType::Outputs => "outputs",
        }
    }
}

impl fmt::Display for GateType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// GateCheckResult
// ---------------------------------------------------------------------------

/// Outcome of a gate evaluation. Derived on demand, never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateCheckResult {
    pub allowed: bool,
    pub blockers: Vec<GateType>,
    pub hint: String,
}

impl GateCheckResult {
    fn open(hint: impl Into<String>) -> Self {
        Self {
            allowed: true,
            blockers: Vec::new(),
            hint: hint.into(),
        }
    }

    /// First blocker, if any.
    pub fn first_blocker(&self) -> Option<GateType> {
        self.blockers.first().copied()
    }
}

/// One unmet gate with a hint for satisfying it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blocker {
    pub gate: GateType,
    pub hint: String,
}

// ---------------------------------------------------------------------------
// GateChecker
// ---------------------------------------------------------------------------

/// Pure evaluation of transition gates against a status snapshot.
#[derive(Debug, Clone, Default)]
pub struct GateChecker {
    config: GateConfig,
}

impl GateChecker {
    pub fn new(config: GateConfig) -> Self {
        Self { config }
    }

    /// Every unmet gate for `from -> to`, ignoring autonomous mode.
    pub fn blockers(
        &self,
        status: &WorkflowStatus,
        from: PhaseCode,
        to: Option<PhaseCode>,
    ) -> Vec<Blocker> {
        let settings = &status.settings;
        let mut blockers = Vec::new();

        if from == PhaseCode::Planning && settings.require_plan && status.linked_plan.is_none() {
            blockers.push(Blocker {
                gate: GateType::Plan,
                hint: "Link a plan via markPlanCreated before advancing".to_string(),
            });
        }

        let enters_execution = to == Some(PhaseCode::Execution)
            && matches!(from, PhaseCode::Planning | PhaseCode::Review);
        if enters_execution && settings.require_approval && status.approval.is_none() {
            let hint = if status.linked_plan.is_some() {
                "Approve the linked plan via approvePlan before execution"
            } else {
                "Link a plan and approve it via approvePlan before execution"
            };
            blockers.push(Blocker {
                gate: GateType::Approval,
                hint: hint.to_string(),
            });
        }

        if self.config.enforce_outputs && !has_outputs(status, from) {
            blockers.push(Blocker {
                gate: GateType::Outputs,
                hint: format!(
                    "Record at least one output for {} before advancing",
                    from.name()
                ),
            });
        }

        blockers
    }

    pub fn check(
        &self,
        status: &WorkflowStatus,
        from: PhaseCode,
        to: Option<PhaseCode>,
    ) -> GateCheckResult {
        if status.settings.autonomous_mode {
            return GateCheckResult::open("autonomous mode: gates are not enforced");
        }

        let blockers = self.blockers(status, from, to);
        let transition = Transition { from, to };
        match blockers.first() {
            None => GateCheckResult::open(format!("{transition} is allowed")),
            Some(first) => GateCheckResult {
                allowed: false,
                hint: first.hint.clone(),
                blockers: blockers.iter().map(|b| b.gate).collect(),
            },
        }
    }
}

/// A skipped phase needs no outputs; a linked plan is Planning's output.
fn has_outputs(status: &WorkflowStatus, phase: PhaseCode) -> bool {
    let Some(ps) = status.phase(phase) else {
        return false;
    };
    if ps.status == PhaseState::Skipped || !ps.outputs.is_empty() {
        return true;
    }
    phase == PhaseCode::Planning && status.linked_plan.is_some()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
