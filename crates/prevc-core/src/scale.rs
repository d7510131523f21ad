use crate::catalog;
use crate::types::{PhaseCode, RoleId, ScaleLevel};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::OnceLock;

// ---------------------------------------------------------------------------
// ScaleContext
// ---------------------------------------------------------------------------

/// Optional summary handed over by an external stack detector.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StackHint {
    #[serde(default)]
    pub languages: Vec<String>,
    #[serde(default)]
    pub frameworks: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScaleContext {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub file_count: Option<usize>,
    #[serde(default)]
    pub stack: Option<StackHint>,
}

impl ScaleContext {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            file_count: None,
            stack: None,
        }
    }

    pub fn with_file_count(mut self, file_count: usize) -> Self {
        self.file_count = Some(file_count);
        self
    }

    pub fn with_stack(mut self, stack: StackHint) -> Self {
        self.stack = Some(stack);
        self
    }
}

// ---------------------------------------------------------------------------
// Detection
// ---------------------------------------------------------------------------

const QUICK_TEXT_MAX_WORDS: usize = 20;
const SHORT_TEXT_WORDS: usize = 8;

fn keyword_re(words: &[&str]) -> Regex {
    let alternation = words
        .iter()
        .map(|w| regex::escape(w))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(r"(?i)\b(?:{alternation})\b")).expect("keyword pattern is valid")
}

static ENTERPRISE_RE: OnceLock<Regex> = OnceLock::new();
static LARGE_RE: OnceLock<Regex> = OnceLock::new();
static QUICK_RE: OnceLock<Regex> = OnceLock::new();

fn enterprise_re() -> &'static Regex {
    ENTERPRISE_RE.get_or_init(|| {
        keyword_re(&[
            "enterprise",
            "compliance",
            "regulatory",
            "multi-tenant",
            "multitenant",
            "audit trail",
            "hipaa",
            "gdpr",
            "sox",
            "pci",
        ])
    })
}

fn large_re() -> &'static Regex {
    LARGE_RE.get_or_init(|| {
        keyword_re(&[
            "architecture",
            "migration",
            "migrate",
            "redesign",
            "rewrite",
            "overhaul",
            "platform",
            "microservice",
            "microservices",
            "new system",
        ])
    })
}

fn quick_re() -> &'static Regex {
    QUICK_RE.get_or_init(|| {
        keyword_re(&[
            "typo", "hotfix", "fix", "bugfix", "bug", "rename", "tweak", "bump", "cosmetic",
            "one-line",
        ])
    })
}

fn scale_for_file_count(n: usize) -> ScaleLevel {
    match n {
        0..=2 => ScaleLevel::Quick,
        3..=10 => ScaleLevel::Small,
        11..=50 => ScaleLevel::Medium,
        51..=200 => ScaleLevel::Large,
        _ => ScaleLevel::Enterprise,
    }
}

/// Classify a project from its name, description and optional hints.
///
/// Keyword signals win over file counts; file counts win over text length.
/// A polyglot stack (three or more languages) bumps a heuristic result one
/// level, never past `Large`. Empty input is `Medium`.
pub fn detect_scale(ctx: &ScaleContext) -> ScaleLevel {
    let text = format!("{} {}", ctx.name, ctx.description);
    let text = text.trim();
    if text.is_empty() && ctx.file_count.is_none() {
        return ScaleLevel::Medium;
    }

    if enterprise_re().is_match(text) {
        return ScaleLevel::Enterprise;
    }
    if large_re().is_match(text) {
        return ScaleLevel::Large;
    }
    let words = text.split_whitespace().count();
    if words <= QUICK_TEXT_MAX_WORDS && quick_re().is_match(text) {
        return ScaleLevel::Quick;
    }

    let heuristic = match ctx.file_count {
        Some(n) => scale_for_file_count(n),
        None if words > 0 && words < SHORT_TEXT_WORDS => ScaleLevel::Small,
        None => ScaleLevel::Medium,
    };

    match &ctx.stack {
        Some(stack) if stack.languages.len() >= 3 => heuristic.bump(ScaleLevel::Large),
        _ => heuristic,
    }
}

// ---------------------------------------------------------------------------
// ScaleRoute
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScaleRoute {
    pub scale: ScaleLevel,
    pub required_phases: Vec<PhaseCode>,
    pub optional_phases: Vec<PhaseCode>,
    pub roles_by_phase: BTreeMap<PhaseCode, Vec<RoleId>>,
}

impl ScaleRoute {
    pub fn is_required(&self, phase: PhaseCode) -> bool {
        self.required_phases.contains(&phase)
    }

    pub fn first_required(&self) -> PhaseCode {
        self.required_phases
            .first()
            .copied()
            .unwrap_or(PhaseCode::Execution)
    }

    /// The next required phase strictly after `phase`.
    pub fn next_required_after(&self, phase: PhaseCode) -> Option<PhaseCode> {
        self.required_phases.iter().copied().find(|p| *p > phase)
    }

    /// Optional phases strictly between `from` and `to` (or after `from` when
    /// `to` is `None`).
    pub fn skipped_between(&self, from: PhaseCode, to: Option<PhaseCode>) -> Vec<PhaseCode> {
        self.optional_phases
            .iter()
            .copied()
            .filter(|p| *p > from && to.map(|t| *p < t).unwrap_or(true))
            .collect()
    }

    pub fn roles_for(&self, phase: PhaseCode) -> &[RoleId] {
        self.roles_by_phase
            .get(&phase)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    pub fn all_roles(&self) -> Vec<RoleId> {
        let mut roles: Vec<RoleId> = Vec::new();
        for role in self.roles_by_phase.values().flatten() {
            if !roles.contains(role) {
                roles.push(*role);
            }
        }
        roles
    }
}

fn required_for(scale: ScaleLevel) -> &'static [PhaseCode] {
    use PhaseCode::*;
    match scale {
        ScaleLevel::Quick => &[Execution, Validation],
        ScaleLevel::Small => &[Planning, Execution, Validation],
        ScaleLevel::Medium => &[Planning, Review, Execution, Validation],
        ScaleLevel::Large | ScaleLevel::Enterprise => {
            &[Planning, Review, Execution, Validation, Confirmation]
        }
    }
}

fn lead_role(phase: PhaseCode) -> RoleId {
    match phase {
        PhaseCode::Planning => RoleId::Planner,
        PhaseCode::Review => RoleId::Architect,
        PhaseCode::Execution => RoleId::Developer,
        PhaseCode::Validation => RoleId::Qa,
        PhaseCode::Confirmation => RoleId::Documenter,
    }
}

/// Resolve which phases and roles a scale needs. Pure and deterministic.
pub fn get_scale_route(scale: ScaleLevel) -> ScaleRoute {
    let required = required_for(scale);
    let optional = PhaseCode::all()
        .iter()
        .copied()
        .filter(|p| !required.contains(p))
        .collect();

    let roles_by_phase = required
        .iter()
        .map(|&phase| {
            let roles = match scale {
                ScaleLevel::Quick | ScaleLevel::Small => vec![RoleId::SoloDev],
                ScaleLevel::Medium => vec![lead_role(phase)],
                ScaleLevel::Large | ScaleLevel::Enterprise => {
                    catalog::roles_for_phase(phase).to_vec()
                }
            };
            (phase, roles)
        })
        .collect();

    ScaleRoute {
        scale,
        required_phases: required.to_vec(),
        optional_phases: optional,
        roles_by_phase,
    }
}

// ---------------------------------------------------------------------------
// Time estimate
// ---------------------------------------------------------------------------

/// Rough effort window. Informational only; nothing is scheduled from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EstimatedTime {
    pub min_minutes: u32,
    pub max_minutes: u32,
}

impl EstimatedTime {
    pub fn label(&self) -> String {
        format!(
            "{} to {}",
            compact_minutes(self.min_minutes),
            compact_minutes(self.max_minutes)
        )
    }
}

fn compact_minutes(m: u32) -> String {
    const HOUR: u32 = 60;
    const DAY: u32 = 24 * HOUR;
    const WEEK: u32 = 7 * DAY;
    if m >= WEEK && m % WEEK == 0 {
        format!("{}w", m / WEEK)
    } else if m >= DAY && m % DAY == 0 {
        format!("{}d", m / DAY)
    } else if m >= HOUR && m % HOUR == 0 {
        format!("{}h", m / HOUR)
    } else {
        format!("{m}m")
    }
}

pub fn estimated_time(scale: ScaleLevel) -> EstimatedTime {
    let (min_minutes, max_minutes) = match scale {
        ScaleLevel::Quick => (5, 30),
        ScaleLevel::Small => (30, 120),
        ScaleLevel::Medium => (120, 480),
        ScaleLevel::Large => (1440, 4320),
        ScaleLevel::Enterprise => (10080, 40320),
    };
    EstimatedTime {
        min_minutes,
        max_minutes,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quick_route_skips_planning_and_review() {
        let route = get_scale_route(ScaleLevel::Quick);
        assert_eq!(
            route.required_phases,
            vec![PhaseCode::Execution, PhaseCode::Validation]
        );
        assert_eq!(route.first_required(), PhaseCode::Execution);
        assert_eq!(route.roles_for(PhaseCode::Execution), &[RoleId::SoloDev]);
        assert!(route.roles_for(PhaseCode::Planning).is_empty());
    }

    #[test]
    fn routes_only_skip_optional_phases() {
        for scale in ScaleLevel::all() {
            let route = get_scale_route(*scale);
            for phase in &route.optional_phases {
                assert!(catalog::is_phase_optional(*phase), "{scale}: {phase}");
            }
            assert_eq!(
                route.required_phases.len() + route.optional_phases.len(),
                5
            );
        }
    }

    #[test]
    fn route_is_deterministic() {
        for scale in ScaleLevel::all() {
            assert_eq!(get_scale_route(*scale), get_scale_route(*scale));
        }
    }

    #[test]
    fn large_route_uses_full_catalog_roles() {
        let route = get_scale_route(ScaleLevel::Large);
        assert_eq!(
            route.roles_for(PhaseCode::Review),
            catalog::roles_for_phase(PhaseCode::Review)
        );
        assert!(route.all_roles().contains(&RoleId::Documenter));
    }

    #[test]
    fn next_required_and_skipped_between() {
        let route = get_scale_route(ScaleLevel::Small);
        assert_eq!(
            route.next_required_after(PhaseCode::Planning),
            Some(PhaseCode::Execution)
        );
        assert_eq!(
            route.skipped_between(PhaseCode::Planning, Some(PhaseCode::Execution)),
            vec![PhaseCode::Review]
        );
        assert_eq!(route.next_required_after(PhaseCode::Validation), None);
        assert_eq!(
            route.skipped_between(PhaseCode::Validation, None),
            vec![PhaseCode::Confirmation]
        );
    }

    #[test]
    fn detect_keywords() {
        let ctx = ScaleContext::new("billing", "Add GDPR compliance reporting");
        assert_eq!(detect_scale(&ctx), ScaleLevel::Enterprise);

        let ctx = ScaleContext::new("core", "Migrate the payment service to the new platform");
        assert_eq!(detect_scale(&ctx), ScaleLevel::Large);

        let ctx = ScaleContext::new("docs", "Fix typo in README");
        assert_eq!(detect_scale(&ctx), ScaleLevel::Quick);
    }

    #[test]
    fn detect_file_count_and_length() {
        let ctx = ScaleContext::new("api", "Add pagination to the list endpoints").with_file_count(30);
        assert_eq!(detect_scale(&ctx), ScaleLevel::Medium);

        let ctx = ScaleContext::new("api", "Add pagination");
        assert_eq!(detect_scale(&ctx), ScaleLevel::Small);
    }

    #[test]
    fn detect_defaults_to_medium() {
        assert_eq!(detect_scale(&ScaleContext::default()), ScaleLevel::Medium);
    }

    #[test]
    fn polyglot_stack_bumps_heuristic() {
        let stack = StackHint {
            languages: vec!["rust".into(), "typescript".into(), "python".into()],
            frameworks: vec![],
        };
        let ctx = ScaleContext::new("api", "Add pagination")
            .with_file_count(8)
            .with_stack(stack);
        assert_eq!(detect_scale(&ctx), ScaleLevel::Medium);
    }

    #[test]
    fn estimate_labels() {
        assert_eq!(estimated_time(ScaleLevel::Quick).label(), "5m to 30m");
        assert_eq!(estimated_time(ScaleLevel::Large).label(), "1d to 3d");
        assert_eq!(estimated_time(ScaleLevel::Enterprise).label(), "1w to 4w");
    }
}
