use super::next_transition;
use crate::catalog;
use crate::gate::{Blocker, GateChecker};
use crate::status::WorkflowStatus;
use crate::types::{PhaseCode, ScaleLevel};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Summary
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    pub completed: usize,
    pub total: usize,
    /// Rounded down.
    pub percentage: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowSummary {
    pub name: String,
    pub scale: ScaleLevel,
    pub current_phase: PhaseCode,
    pub progress: Progress,
    pub is_complete: bool,
}

/// Progress counts only the phases this scale requires.
pub(crate) fn summarize(status: &WorkflowStatus) -> WorkflowSummary {
    let route = status.route();
    let total = route.required_phases.len();
    let completed = route
        .required_phases
        .iter()
        .filter(|p| status.phase(**p).is_some_and(|s| s.status.is_done()))
        .count();
    let percentage = if total == 0 {
        100
    } else {
        (completed * 100 / total) as u8
    };

    WorkflowSummary {
        name: status.project.name.clone(),
        scale: status.project.scale,
        current_phase: status.current_phase(),
        progress: Progress {
            completed,
            total,
            percentage,
        },
        is_complete: status.is_complete(),
    }
}

// ---------------------------------------------------------------------------
// Recommended actions
// ---------------------------------------------------------------------------

struct AdviceContext<'a> {
    status: &'a WorkflowStatus,
    phase: PhaseCode,
    next: Option<PhaseCode>,
    blockers: Vec<Blocker>,
}

/// Evaluated in order. A `terminal` rule that applies ends evaluation.
struct AdviceRule {
    id: &'static str,
    applies: fn(&AdviceContext) -> bool,
    advise: fn(&AdviceContext) -> Vec<String>,
    terminal: bool,
}

fn rules() -> [AdviceRule; 6] {
    [
        AdviceRule {
            id: "complete",
            applies: is_complete,
            advise: complete_message,
            terminal: true,
        },
        AdviceRule {
            id: "autonomous",
            applies: bypassing_gates,
            advise: bypass_warning,
            terminal: false,
        },
        AdviceRule {
            id: "gate-blockers",
            applies: blocked,
            advise: blocker_hints,
            terminal: false,
        },
        AdviceRule {
            id: "pending-roles",
            applies: has_pending_roles,
            advise: start_pending_roles,
            terminal: false,
        },
        AdviceRule {
            id: "active-roles",
            applies: has_active_roles,
            advise: complete_active_roles,
            terminal: false,
        },
        AdviceRule {
            id: "advance",
            applies: can_advance,
            advise: advance_message,
            terminal: false,
        },
    ]
}

// Conditions

fn is_complete(ctx: &AdviceContext) -> bool {
    ctx.status.is_complete()
}

fn bypassing_gates(ctx: &AdviceContext) -> bool {
    ctx.status.settings.autonomous_mode && !ctx.blockers.is_empty()
}

fn blocked(ctx: &AdviceContext) -> bool {
    !ctx.status.settings.autonomous_mode && !ctx.blockers.is_empty()
}

fn has_pending_roles(ctx: &AdviceContext) -> bool {
    !pending_roles(ctx).is_empty()
}

fn has_active_roles(ctx: &AdviceContext) -> bool {
    ctx.status.roles.values().any(|r| r.is_active_in(ctx.phase))
}

fn can_advance(ctx: &AdviceContext) -> bool {
    ctx.blockers.is_empty() || ctx.status.settings.autonomous_mode
}

// Messages

fn complete_message(ctx: &AdviceContext) -> Vec<String> {
    vec![format!(
        "Workflow '{}' is complete: every required phase is done",
        ctx.status.project.name
    )]
}

fn bypass_warning(ctx: &AdviceContext) -> Vec<String> {
    let gates: Vec<&str> = ctx.blockers.iter().map(|b| b.gate.as_str()).collect();
    vec![format!(
        "Autonomous mode is on: advancing will bypass the {} gate(s)",
        gates.join(", ")
    )]
}

fn blocker_hints(ctx: &AdviceContext) -> Vec<String> {
    ctx.blockers.iter().map(|b| b.hint.clone()).collect()
}

fn start_pending_roles(ctx: &AdviceContext) -> Vec<String> {
    pending_roles(ctx)
        .into_iter()
        .map(|role| {
            let def = catalog::role(role);
            let first = def
                .responsibilities
                .first()
                .copied()
                .unwrap_or(def.description);
            format!("Start the {} role for {}: {}", role, ctx.phase.name(), first)
        })
        .collect()
}

fn complete_active_roles(ctx: &AdviceContext) -> Vec<String> {
    ctx.status
        .roles
        .iter()
        .filter(|(_, r)| r.is_active_in(ctx.phase))
        .map(|(role, _)| {
            format!(
                "Complete the {} role once its {} work is done",
                role,
                ctx.phase.name()
            )
        })
        .collect()
}

fn advance_message(ctx: &AdviceContext) -> Vec<String> {
    let msg = match ctx.next {
        Some(next) => format!(
            "Complete {} to advance to {}",
            ctx.phase.name(),
            next.name()
        ),
        None => format!("Complete {} to finish the workflow", ctx.phase.name()),
    };
    vec![msg]
}

/// Route roles for the current phase that have not been started in it.
fn pending_roles(ctx: &AdviceContext) -> Vec<crate::types::RoleId> {
    ctx.status
        .route()
        .roles_for(ctx.phase)
        .iter()
        .copied()
        .filter(|role| {
            !ctx
                .status
                .roles
                .get(role)
                .is_some_and(|r| r.was_started_in(ctx.phase))
        })
        .collect()
}

/// Human-readable next steps. Derived on demand, never stored.
pub(crate) fn recommended_actions(status: &WorkflowStatus, gates: &GateChecker) -> Vec<String> {
    let transition = next_transition(status);
    let ctx = AdviceContext {
        status,
        phase: transition.from,
        next: transition.to,
        blockers: if status.is_complete() {
            Vec::new()
        } else {
            gates.blockers(status, transition.from, transition.to)
        },
    };

    let mut actions = Vec::new();
    for rule in rules() {
        if (rule.applies)(&ctx) {
            tracing::trace!(rule = rule.id, "advice rule applied");
            actions.extend((rule.advise)(&ctx));
            if rule.terminal {
                break;
            }
        }
    }
    actions
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::WorkflowSettings;
    use crate::types::{OutputRef, PhaseState, RoleId, RoleState};

    fn status(scale: ScaleLevel) -> WorkflowStatus {
        WorkflowStatus::new("demo", None, scale, WorkflowSettings::for_scale(scale))
    }

    #[test]
    fn progress_counts_required_phases_only() {
        let mut s = status(ScaleLevel::Quick);
        let summary = summarize(&s);
        assert_eq!(summary.progress.total, 2);
        assert_eq!(summary.progress.completed, 0);
        assert_eq!(summary.progress.percentage, 0);

        s.phases.get_mut(&PhaseCode::Execution).unwrap().status = PhaseState::Completed;
        assert_eq!(summarize(&s).progress.percentage, 50);
    }

    #[test]
    fn percentage_rounds_down() {
        let mut s = status(ScaleLevel::Small);
        s.phases.get_mut(&PhaseCode::Planning).unwrap().status = PhaseState::Completed;
        assert_eq!(summarize(&s).progress.percentage, 33);
    }

    #[test]
    fn fresh_medium_workflow_advice() {
        let s = status(ScaleLevel::Medium);
        let actions = recommended_actions(&s, &GateChecker::default());
        assert!(actions[0].contains("markPlanCreated"));
        assert!(actions
            .iter()
            .any(|a| a.starts_with("Start the planner role for Planning")));
        assert!(!actions.iter().any(|a| a.starts_with("Complete Planning")));
    }

    #[test]
    fn unblocked_phase_suggests_advancing() {
        let mut s = status(ScaleLevel::Quick);
        s.phases
            .get_mut(&PhaseCode::Execution)
            .unwrap()
            .outputs
            .push(OutputRef::new("src/main.rs"));
        s.roles.get_mut(&RoleId::SoloDev).unwrap().status = RoleState::InProgress;
        s.roles.get_mut(&RoleId::SoloDev).unwrap().phase = PhaseCode::Execution;

        let actions = recommended_actions(&s, &GateChecker::default());
        assert_eq!(
            actions,
            vec![
                "Complete the solo_dev role once its Execution work is done".to_string(),
                "Complete Execution to advance to Validation".to_string(),
            ]
        );
    }

    #[test]
    fn complete_workflow_has_single_action() {
        let mut s = status(ScaleLevel::Quick);
        for p in [PhaseCode::Execution, PhaseCode::Validation] {
            s.phases.get_mut(&p).unwrap().status = PhaseState::Completed;
        }
        let actions = recommended_actions(&s, &GateChecker::default());
        assert_eq!(actions.len(), 1);
        assert!(actions[0].contains("complete"));
    }
}
