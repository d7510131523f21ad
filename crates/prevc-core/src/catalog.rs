//! Static phase and role definitions for the PREVC model.
//!
//! Pure data: nothing here is mutable or persisted. The scale router narrows
//! these tables per project; the orchestrator validates role membership
//! against them.

use crate::types::{PhaseCode, RoleId};

// ---------------------------------------------------------------------------
// Definitions
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct PhaseDefinition {
    pub code: PhaseCode,
    pub name: &'static str,
    pub description: &'static str,
    /// Some scale is allowed to skip this phase.
    pub optional: bool,
    pub roles: &'static [RoleId],
}

#[derive(Debug)]
pub struct RoleDefinition {
    pub id: RoleId,
    pub name: &'static str,
    pub description: &'static str,
    pub responsibilities: &'static [&'static str],
    pub outputs: &'static [&'static str],
}

static PHASES: [PhaseDefinition; 5] = [
    PhaseDefinition {
        code: PhaseCode::Planning,
        name: "Planning",
        description: "Capture requirements, scope and acceptance criteria",
        optional: true,
        roles: &[RoleId::Planner, RoleId::Designer],
    },
    PhaseDefinition {
        code: PhaseCode::Review,
        name: "Review",
        description: "Review the plan and settle the technical approach",
        optional: true,
        roles: &[RoleId::Architect, RoleId::Designer, RoleId::Reviewer],
    },
    PhaseDefinition {
        code: PhaseCode::Execution,
        name: "Execution",
        description: "Implement the approved plan",
        optional: false,
        roles: &[RoleId::Developer],
    },
    PhaseDefinition {
        code: PhaseCode::Validation,
        name: "Validation",
        description: "Test and review the implementation",
        optional: false,
        roles: &[RoleId::Qa, RoleId::Reviewer],
    },
    PhaseDefinition {
        code: PhaseCode::Confirmation,
        name: "Confirmation",
        description: "Document, hand over and close out the work",
        optional: true,
        roles: &[RoleId::Documenter],
    },
];

static ROLES: [RoleDefinition; 8] = [
    RoleDefinition {
        id: RoleId::Planner,
        name: "Planner",
        description: "Turns the request into a scoped, sequenced plan",
        responsibilities: &[
            "Break the work into scoped, ordered steps",
            "Define acceptance criteria",
            "Identify risks and dependencies",
        ],
        outputs: &["plan.md", "acceptance-criteria.md"],
    },
    RoleDefinition {
        id: RoleId::Designer,
        name: "Designer",
        description: "Shapes the user-facing experience",
        responsibilities: &[
            "Define the user experience and interface flows",
            "Keep the design consistent with existing patterns",
        ],
        outputs: &["design.md", "wireframes.md"],
    },
    RoleDefinition {
        id: RoleId::Architect,
        name: "Architect",
        description: "Owns the technical approach and system boundaries",
        responsibilities: &[
            "Validate the technical approach against the existing architecture",
            "Record architecture decisions",
            "Identify cross-cutting concerns such as security and performance",
        ],
        outputs: &["architecture.md", "adr.md"],
    },
    RoleDefinition {
        id: RoleId::Developer,
        name: "Developer",
        description: "Implements the plan",
        responsibilities: &[
            "Implement the agreed changes with tests",
            "Keep changes small and reviewable",
        ],
        outputs: &["implementation-notes.md"],
    },
    RoleDefinition {
        id: RoleId::Qa,
        name: "QA",
        description: "Verifies behaviour against acceptance criteria",
        responsibilities: &[
            "Verify the change against the acceptance criteria",
            "Exercise edge cases and regressions",
        ],
        outputs: &["test-report.md"],
    },
    RoleDefinition {
        id: RoleId::Reviewer,
        name: "Reviewer",
        description: "Reviews plans and code for correctness and quality",
        responsibilities: &[
            "Review changes for correctness, security and maintainability",
            "Confirm review feedback is addressed",
        ],
        outputs: &["review.md"],
    },
    RoleDefinition {
        id: RoleId::Documenter,
        name: "Documenter",
        description: "Keeps documentation in step with the change",
        responsibilities: &[
            "Update user and developer documentation",
            "Write release notes",
        ],
        outputs: &["CHANGELOG.md", "docs/"],
    },
    RoleDefinition {
        id: RoleId::SoloDev,
        name: "Solo Developer",
        description: "Covers every role on small changes",
        responsibilities: &[
            "Drive the change end to end, covering planning, implementation and verification",
        ],
        outputs: &["notes.md"],
    },
];

// ---------------------------------------------------------------------------
// Lookups
// ---------------------------------------------------------------------------

pub fn phases() -> &'static [PhaseDefinition] {
    &PHASES
}

pub fn phase(code: PhaseCode) -> &'static PhaseDefinition {
    &PHASES[code.index()]
}

pub fn role(id: RoleId) -> &'static RoleDefinition {
    &ROLES[id as usize]
}

pub fn next_phase(code: PhaseCode) -> Option<PhaseCode> {
    PhaseCode::all().get(code.index() + 1).copied()
}

pub fn previous_phase(code: PhaseCode) -> Option<PhaseCode> {
    code.index()
        .checked_sub(1)
        .and_then(|i| PhaseCode::all().get(i).copied())
}

/// Specialist roles for a phase. `SoloDev` is not listed; see
/// [`role_operates_in`].
pub fn roles_for_phase(code: PhaseCode) -> &'static [RoleId] {
    phase(code).roles
}

pub fn is_phase_optional(code: PhaseCode) -> bool {
    phase(code).optional
}

pub fn role_operates_in(role: RoleId, code: PhaseCode) -> bool {
    role == RoleId::SoloDev || roles_for_phase(code).contains(&role)
}

pub fn phases_for_role(role: RoleId) -> Vec<PhaseCode> {
    PhaseCode::all()
        .iter()
        .copied()
        .filter(|p| role_operates_in(role, *p))
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tables_are_indexed_by_enum_order() {
        for code in PhaseCode::all() {
            assert_eq!(phase(*code).code, *code);
        }
        for id in RoleId::all() {
            assert_eq!(role(*id).id, *id);
            assert!(!role(*id).responsibilities.is_empty());
        }
    }

    #[test]
    fn next_and_previous() {
        assert_eq!(next_phase(PhaseCode::Planning), Some(PhaseCode::Review));
        assert_eq!(next_phase(PhaseCode::Confirmation), None);
        assert_eq!(previous_phase(PhaseCode::Planning), None);
        assert_eq!(previous_phase(PhaseCode::Execution), Some(PhaseCode::Review));
    }

    #[test]
    fn execution_and_validation_are_mandatory() {
        assert!(!is_phase_optional(PhaseCode::Execution));
        assert!(!is_phase_optional(PhaseCode::Validation));
        assert!(is_phase_optional(PhaseCode::Planning));
    }

    #[test]
    fn solo_dev_operates_everywhere() {
        assert_eq!(phases_for_role(RoleId::SoloDev).len(), 5);
        assert!(role_operates_in(RoleId::Qa, PhaseCode::Validation));
        assert!(!role_operates_in(RoleId::Qa, PhaseCode::Planning));
        assert_eq!(
            phases_for_role(RoleId::Reviewer),
            vec![PhaseCode::Review, PhaseCode::Validation]
        );
    }
}
