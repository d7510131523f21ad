use crate::error::PrevcError;
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// PhaseCode
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PhaseCode {
    #[serde(rename = "P")]
    Planning,
    #[serde(rename = "R")]
    Review,
    #[serde(rename = "E")]
    Execution,
    #[serde(rename = "V")]
    Validation,
    #[serde(rename = "C")]
    Confirmation,
}

impl PhaseCode {
    pub fn all() -> &'static [PhaseCode] {
        &[
            PhaseCode::Planning,
            PhaseCode::Review,
            PhaseCode::Execution,
            PhaseCode::Validation,
            PhaseCode::Confirmation,
        ]
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PhaseCode::Planning => "P",
            PhaseCode::Review => "R",
            PhaseCode::Execution => "E",
            PhaseCode::Validation => "V",
            PhaseCode::Confirmation => "C",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            PhaseCode::Planning => "Planning",
            PhaseCode::Review => "Review",
            PhaseCode::Execution => "Execution",
            PhaseCode::Validation => "Validation",
            PhaseCode::Confirmation => "Confirmation",
        }
    }
}

impl fmt::Display for PhaseCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PhaseCode {
    type Err = PrevcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "p" | "planning" => Ok(PhaseCode::Planning),
            "r" | "review" => Ok(PhaseCode::Review),
            "e" | "execution" => Ok(PhaseCode::Execution),
            "v" | "validation" => Ok(PhaseCode::Validation),
            "c" | "confirmation" => Ok(PhaseCode::Confirmation),
            _ => Err(PrevcError::InvalidPhase(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// RoleId
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleId {
    Planner,
    Designer,
    Architect,
    Developer,
    Qa,
    Reviewer,
    Documenter,
    SoloDev,
}

impl RoleId {
    pub fn all() -> &'static [RoleId] {
        &[
            RoleId::Planner,
            RoleId::Designer,
            RoleId::Architect,
            RoleId::Developer,
            RoleId::Qa,
            RoleId::Reviewer,
            RoleId::Documenter,
            RoleId::SoloDev,
        ]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RoleId::Planner => "planner",
            RoleId::Designer => "designer",
            RoleId::Architect => "architect",
            RoleId::Developer => "developer",
            RoleId::Qa => "qa",
            RoleId::Reviewer => "reviewer",
            RoleId::Documenter => "documenter",
            RoleId::SoloDev => "solo_dev",
        }
    }
}

impl fmt::Display for RoleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RoleId {
    type Err = PrevcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "planner" => Ok(RoleId::Planner),
            "designer" => Ok(RoleId::Designer),
            "architect" => Ok(RoleId::Architect),
            "developer" | "dev" => Ok(RoleId::Developer),
            "qa" => Ok(RoleId::Qa),
            "reviewer" => Ok(RoleId::Reviewer),
            "documenter" => Ok(RoleId::Documenter),
            "solo_dev" | "solo" => Ok(RoleId::SoloDev),
            _ => Err(PrevcError::InvalidRole(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// ScaleLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScaleLevel {
    Quick,
    Small,
    Medium,
    Large,
    Enterprise,
}

impl ScaleLevel {
    pub fn all() -> &'static [ScaleLevel] {
        &[
            ScaleLevel::Quick,
            ScaleLevel::Small,
            ScaleLevel::Medium,
            ScaleLevel::Large,
            ScaleLevel::Enterprise,
        ]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ScaleLevel::Quick => "quick",
            ScaleLevel::Small => "small",
            ScaleLevel::Medium => "medium",
            ScaleLevel::Large => "large",
            ScaleLevel::Enterprise => "enterprise",
        }
    }

    /// One level up, saturating at `cap`.
    pub fn bump(self, cap: ScaleLevel) -> ScaleLevel {
        let all = ScaleLevel::all();
        let next = all
            .get(self as usize + 1)
            .copied()
            .unwrap_or(ScaleLevel::Enterprise);
        next.min(cap).max(self)
    }

    /// Like `FromStr`, but unknown or ambiguous input resolves to `Medium`.
    pub fn parse_lenient(s: &str) -> ScaleLevel {
        s.parse().unwrap_or_else(|_| {
            tracing::warn!(input = s, "unknown scale, defaulting to medium");
            ScaleLevel::Medium
        })
    }
}

impl fmt::Display for ScaleLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ScaleLevel {
    type Err = PrevcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "quick" | "0" => Ok(ScaleLevel::Quick),
            "small" | "1" => Ok(ScaleLevel::Small),
            "medium" | "2" => Ok(ScaleLevel::Medium),
            "large" | "3" => Ok(ScaleLevel::Large),
            "enterprise" | "4" => Ok(ScaleLevel::Enterprise),
            _ => Err(PrevcError::InvalidScale(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// PhaseState / RoleState
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseState {
    Pending,
    InProgress,
    Completed,
    Skipped,
}

impl PhaseState {
    /// Completed or skipped: the phase no longer holds up the workflow.
    pub fn is_done(self) -> bool {
        matches!(self, PhaseState::Completed | PhaseState::Skipped)
    }
}

impl fmt::Display for PhaseState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PhaseState::Pending => "pending",
            PhaseState::InProgress => "in_progress",
            PhaseState::Completed => "completed",
            PhaseState::Skipped => "skipped",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleState {
    Pending,
    InProgress,
    Completed,
}

impl fmt::Display for RoleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RoleState::Pending => "pending",
            RoleState::InProgress => "in_progress",
            RoleState::Completed => "completed",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------
// Transition
// ---------------------------------------------------------------------------

/// A forward move out of `from`. `to == None` completes the workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    pub from: PhaseCode,
    pub to: Option<PhaseCode>,
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to {
            Some(to) => write!(f, "{} -> {}", self.from, to),
            None => write!(f, "{} -> complete", self.from),
        }
    }
}

// ---------------------------------------------------------------------------
// OutputRef
// ---------------------------------------------------------------------------

/// Path of a file produced by an external generator, or the linked plan id
/// when Planning is left on the plan alone. Never opened here.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OutputRef {
    pub path: String,
}

impl OutputRef {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }
}

impl From<&str> for OutputRef {
    fn from(path: &str) -> Self {
        Self::new(path)
    }
}

impl From<String> for OutputRef {
    fn from(path: String) -> Self {
        Self::new(path)
    }
}

impl fmt::Display for OutputRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path)
    }
}

// ---------------------------------------------------------------------------
// Approver
// ---------------------------------------------------------------------------

/// Who signed off on a plan: a catalog role or a free-form name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Approver {
    Role(RoleId),
    Name(String),
}

impl fmt::Display for Approver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Approver::Role(r) => write!(f, "{r}"),
            Approver::Name(n) => f.write_str(n),
        }
    }
}

impl From<RoleId> for Approver {
    fn from(role: RoleId) -> Self {
        Approver::Role(role)
    }
}

impl From<&str> for Approver {
    fn from(s: &str) -> Self {
        match s.parse::<RoleId>() {
            Ok(role) => Approver::Role(role),
            Err(_) => Approver::Name(s.to_string()),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
