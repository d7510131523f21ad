use crate::gate::GateType;
use crate::types::{PhaseCode, RoleId, Transition};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PrevcError {
    #[error("no workflow found: run 'prevc init' first")]
    NoWorkflow,

    #[error("a workflow already exists: pass archive or replace to start a new one")]
    WorkflowExists,

    #[error("workflow is already complete")]
    WorkflowComplete,

    #[error("no plan to approve: link a plan with markPlanCreated first")]
    NoPlanToApprove,

    #[error("transition {transition} blocked by {gate} gate: {hint}")]
    Gate {
        transition: Transition,
        gate: GateType,
        hint: String,
    },

    #[error("role '{role}' has not been started in phase {phase}")]
    RoleNotStarted { role: RoleId, phase: PhaseCode },

    #[error("role '{role}' does not operate in phase {phase}")]
    RoleNotInPhase { role: RoleId, phase: PhaseCode },

    #[error("role '{role}' is already active in phase {phase}")]
    RoleAlreadyActive { role: RoleId, phase: PhaseCode },

    #[error("stale write: expected revision {expected}, found {found} on disk; reload and retry")]
    StaleWrite { expected: u64, found: u64 },

    #[error("invalid phase: {0}")]
    InvalidPhase(String),

    #[error("invalid role: {0}")]
    InvalidRole(String),

    #[error("invalid scale: {0}")]
    InvalidScale(String),

    #[error("invalid plan id '{0}': must not be blank")]
    InvalidPlanId(String),

    #[error("collaboration topic must not be blank")]
    InvalidTopic,

    #[error("collaboration session not found: {0}")]
    SessionNotFound(String),

    #[error("role '{role}' is not a participant of session {session}")]
    NotAParticipant { session: String, role: RoleId },

    #[error("collaboration session {0} is no longer active")]
    SessionNotActive(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl PrevcError {
    /// Only an optimistic-concurrency conflict is safe to retry: reload,
    /// reapply the change and save again.
    pub fn is_retryable(&self) -> bool {
        matches!(self, PrevcError::StaleWrite { .. })
    }
}

pub type Result<T> = std::result::Result<T, PrevcError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_stale_write_is_retryable() {
        assert!(PrevcError::StaleWrite {
            expected: 3,
            found: 4
        }
        .is_retryable());
        assert!(!PrevcError::NoWorkflow.is_retryable());
        assert!(!PrevcError::NoPlanToApprove.is_retryable());
    }

    #[test]
    fn gate_error_message_names_transition_and_gate() {
        let err = PrevcError::Gate {
            transition: Transition {
                from: PhaseCode::Planning,
                to: Some(PhaseCode::Review),
            },
            gate: GateType::Plan,
            hint: "link a plan".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("P -> R"));
        assert!(msg.contains("plan gate"));
    }
}
