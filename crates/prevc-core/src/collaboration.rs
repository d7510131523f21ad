//! Ad-hoc, role-moderated discussions.
//!
//! Sessions live in process memory only and never touch the status document.
//! Each one accepts contributions while active and is synthesized exactly
//! once. Synthesis is a pluggable [`SynthesisStrategy`]; the default
//! [`KeywordSynthesizer`] scans contributions for decision and
//! recommendation markers.

use crate::catalog;
use crate::error::{PrevcError, Result};
use crate::types::RoleId;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::OnceLock;

// ---------------------------------------------------------------------------
// Session model
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Active,
    Synthesizing,
    Concluded,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contribution {
    pub role: RoleId,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollaborationSession {
    pub id: String,
    pub topic: String,
    pub participants: Vec<RoleId>,
    pub contributions: Vec<Contribution>,
    pub status: SessionStatus,
    pub started_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub concluded_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollaborationSynthesis {
    pub topic: String,
    pub participants: Vec<RoleId>,
    pub decisions: Vec<String>,
    pub recommendations: Vec<String>,
    pub contribution_count: usize,
}

// ---------------------------------------------------------------------------
// Default participants
// ---------------------------------------------------------------------------

static TOPIC_TABLE: OnceLock<Vec<(Regex, &'static [RoleId])>> = OnceLock::new();

fn topic_table() -> &'static [(Regex, &'static [RoleId])] {
    use RoleId::*;
    TOPIC_TABLE.get_or_init(|| {
        let entries: [(&str, &'static [RoleId]); 7] = [
            (r"secur\w*|seguran\w*", &[Qa, Architect, Reviewer]),
            (r"perf\w*|latency|throughput|desempenho", &[Architect, Developer, Qa]),
            (r"design\w*|ui|ux", &[Designer, Architect, Developer]),
            (r"architect\w*|arquitet\w*", &[Architect, Developer, Reviewer]),
            (
                r"test\w*|quality|bugs?|qa|teste\w*|qualidade",
                &[Qa, Developer, Reviewer],
            ),
            (r"doc\w*|documenta\w*", &[Documenter, Developer]),
            (
                r"plan\w*|roadmap|scope|planej\w*|escopo",
                &[Planner, Architect, Designer],
            ),
        ];
        entries
            .into_iter()
            .map(|(pattern, roles)| {
                let re = Regex::new(&format!(r"(?i)\b(?:{pattern})\b"))
                    .expect("topic pattern is valid");
                (re, roles)
            })
            .collect()
    })
}

const FALLBACK_PARTICIPANTS: &[RoleId] = &[RoleId::Architect, RoleId::Developer, RoleId::Qa];

/// Roles invited when a session names no participants: the union of every
/// matching topic entry, in table order.
pub fn default_participants(topic: &str) -> Vec<RoleId> {
    let mut roles = Vec::new();
    for (re, entry) in topic_table() {
        if re.is_match(topic) {
            push_unique(&mut roles, entry.iter().copied());
        }
    }
    if roles.is_empty() {
        roles.extend_from_slice(FALLBACK_PARTICIPANTS);
    }
    roles
}

fn push_unique(roles: &mut Vec<RoleId>, new: impl IntoIterator<Item = RoleId>) {
    for role in new {
        if !roles.contains(&role) {
            roles.push(role);
        }
    }
}

// ---------------------------------------------------------------------------
// Synthesis
// ---------------------------------------------------------------------------

/// Turns a finished discussion into decisions and recommendations.
pub trait SynthesisStrategy: Send + Sync {
    fn synthesize(&self, session: &CollaborationSession) -> CollaborationSynthesis;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Language {
    English,
    Portuguese,
}

fn marker_re(pattern: &str) -> Regex {
    Regex::new(&format!(r"(?i)\b(?:{pattern})\b")).expect("marker pattern is valid")
}

static EN_DECISION_RE: OnceLock<Regex> = OnceLock::new();
static EN_RECOMMENDATION_RE: OnceLock<Regex> = OnceLock::new();
static PT_DECISION_RE: OnceLock<Regex> = OnceLock::new();
static PT_RECOMMENDATION_RE: OnceLock<Regex> = OnceLock::new();

impl Language {
    fn decision_re(self) -> &'static Regex {
        match self {
            Language::English => EN_DECISION_RE.get_or_init(|| {
                marker_re(r"decided|decision|agreed|we will|we'll|let's go with|going with")
            }),
            Language::Portuguese => PT_DECISION_RE.get_or_init(|| {
                marker_re(r"decidimos|decidido|decisão|acordado|concordamos|vamos")
            }),
        }
    }

    fn recommendation_re(self) -> &'static Regex {
        match self {
            Language::English => EN_RECOMMENDATION_RE.get_or_init(|| {
                marker_re(r"recommend\w*|should|suggest\w*|consider(?:ing)?|propos\w*")
            }),
            Language::Portuguese => PT_RECOMMENDATION_RE.get_or_init(|| {
                marker_re(r"recomend\w*|deveria|devemos|sugiro|sugerimos|considere|proponho")
            }),
        }
    }
}

/// Marker-based synthesis. A contribution that reads as a decision is not
/// also counted as a recommendation.
#[derive(Debug, Clone)]
pub struct KeywordSynthesizer {
    languages: Vec<Language>,
}

impl KeywordSynthesizer {
    pub fn new(languages: Vec<Language>) -> Self {
        Self { languages }
    }

    fn matches(&self, text: &str, marker: fn(Language) -> &'static Regex) -> bool {
        self.languages.iter().any(|lang| marker(*lang).is_match(text))
    }
}

impl Default for KeywordSynthesizer {
    fn default() -> Self {
        Self::new(vec![Language::English, Language::Portuguese])
    }
}

impl SynthesisStrategy for KeywordSynthesizer {
    fn synthesize(&self, session: &CollaborationSession) -> CollaborationSynthesis {
        let mut decisions = Vec::new();
        let mut recommendations = Vec::new();

        for c in &session.contributions {
            let line = format!("{}: {}", c.role, c.message.trim());
            if self.matches(&c.message, Language::decision_re) {
                decisions.push(line);
            } else if self.matches(&c.message, Language::recommendation_re) {
                recommendations.push(line);
            }
        }

        for role in &session.participants {
            let def = catalog::role(*role);
            if let Some(first) = def.responsibilities.first() {
                recommendations.push(format!("{}: {}", def.name, first));
            }
        }

        CollaborationSynthesis {
            topic: session.topic.clone(),
            participants: session.participants.clone(),
            decisions,
            recommendations,
            contribution_count: session.contributions.len(),
        }
    }
}

// ---------------------------------------------------------------------------
// CollaborationManager
// ---------------------------------------------------------------------------

pub struct CollaborationManager {
    sessions: Mutex<HashMap<String, CollaborationSession>>,
    strategy: Box<dyn SynthesisStrategy>,
}

impl std::fmt::Debug for CollaborationManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CollaborationManager")
            .field("sessions", &self.sessions.lock().len())
            .finish_non_exhaustive()
    }
}

impl Default for CollaborationManager {
    fn default() -> Self {
        Self::new()
    }
}

impl CollaborationManager {
    pub fn new() -> Self {
        Self::with_strategy(Box::new(KeywordSynthesizer::default()))
    }

    pub fn with_strategy(strategy: Box<dyn SynthesisStrategy>) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            strategy,
        }
    }

    /// Open a session. Without participants (or with an empty list) the
    /// roles are picked from the topic.
    pub fn create_session(
        &self,
        topic: &str,
        participants: Option<Vec<RoleId>>,
    ) -> Result<CollaborationSession> {
        let topic = topic.trim();
        if topic.is_empty() {
            return Err(PrevcError::InvalidTopic);
        }
        let participants = match participants {
            Some(list) if !list.is_empty() => {
                let mut roles = Vec::new();
                push_unique(&mut roles, list);
                roles
            }
            _ => default_participants(topic),
        };

        let session = CollaborationSession {
            id: uuid::Uuid::new_v4().to_string(),
            topic: topic.to_string(),
            participants,
            contributions: Vec::new(),
            status: SessionStatus::Active,
            started_at: Utc::now(),
            concluded_at: None,
        };
        tracing::debug!(id = %session.id, topic, "collaboration session created");
        self.sessions
            .lock()
            .insert(session.id.clone(), session.clone());
        Ok(session)
    }

    pub fn contribute(&self, session_id: &str, role: RoleId, message: &str) -> Result<Contribution> {
        let mut sessions = self.sessions.lock();
        let session = sessions
            .get_mut(session_id)
            .ok_or_else(|| PrevcError::SessionNotFound(session_id.to_string()))?;
        if !session.participants.contains(&role) {
            return Err(PrevcError::NotAParticipant {
                session: session_id.to_string(),
                role,
            });
        }
        if session.status != SessionStatus::Active {
            return Err(PrevcError::SessionNotActive(session_id.to_string()));
        }
        let contribution = Contribution {
            role,
            message: message.to_string(),
            timestamp: Utc::now(),
        };
        session.contributions.push(contribution.clone());
        Ok(contribution)
    }

    /// Conclude a session. Only an active session can be synthesized, so a
    /// second call fails.
    pub fn synthesize(&self, session_id: &str) -> Result<CollaborationSynthesis> {
        let snapshot = {
            let mut sessions = self.sessions.lock();
            let session = sessions
                .get_mut(session_id)
                .ok_or_else(|| PrevcError::SessionNotFound(session_id.to_string()))?;
            if session.status != SessionStatus::Active {
                return Err(PrevcError::SessionNotActive(session_id.to_string()));
            }
            session.status = SessionStatus::Synthesizing;
            session.clone()
        };

        let synthesis = self.strategy.synthesize(&snapshot);

        if let Some(session) = self.sessions.lock().get_mut(session_id) {
            session.status = SessionStatus::Concluded;
            session.concluded_at = Some(Utc::now());
        }
        tracing::debug!(
            id = session_id,
            decisions = synthesis.decisions.len(),
            recommendations = synthesis.recommendations.len(),
            "collaboration session concluded"
        );
        Ok(synthesis)
    }

    pub fn get_session(&self, session_id: &str) -> Option<CollaborationSession> {
        self.sessions.lock().get(session_id).cloned()
    }

    /// All sessions, oldest first.
    pub fn list_sessions(&self) -> Vec<CollaborationSession> {
        let mut all: Vec<_> = self.sessions.lock().values().cloned().collect();
        all.sort_by_key(|s| s.started_at);
        all
    }

    pub fn get_active_sessions(&self) -> Vec<CollaborationSession> {
        let mut active: Vec<_> = self
            .sessions
            .lock()
            .values()
            .filter(|s| s.status == SessionStatus::Active)
            .cloned()
            .collect();
        active.sort_by_key(|s| s.started_at);
        active
    }

    /// Drop concluded sessions. Returns how many were removed.
    pub fn clear_concluded_sessions(&self) -> usize {
        let mut sessions = self.sessions.lock();
        let before = sessions.len();
        sessions.retain(|_, s| s.status != SessionStatus::Concluded);
        before - sessions.len()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
