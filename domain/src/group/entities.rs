//! Discussion group entity and lifecycle state machine

use crate::core::error::DomainError;
use crate::lesson::PlanId;
use crate::persona::PersonaId;
use crate::transcript::SeqNo;
use serde::{Deserialize, Serialize};

/// Identifier of a discussion group (Value Object)
///
/// Ids are assigned 1..n in partition order, so ascending id equals
/// group-creation order. The final evaluation consumes comments in this
/// order to keep runs reproducible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GroupId(i64);

impl GroupId {
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for GroupId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle state of a discussion group
///
/// ```text
/// Active ──▶ Consensus ──▶ Commented
///    └─────▶ TimedOut  ──▶ Commented
/// ```
///
/// A group leaves `Active` exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupStatus {
    /// Turns are being taken
    Active,
    /// The judge detected consensus
    Consensus,
    /// The turn cap was reached, or generation failed permanently
    TimedOut,
    /// The teacher commentary exists
    Commented,
}

impl GroupStatus {
    /// Terminal pre-comment states
    pub fn is_terminal(&self) -> bool {
        matches!(self, GroupStatus::Consensus | GroupStatus::TimedOut)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            GroupStatus::Active => "active",
            GroupStatus::Consensus => "consensus",
            GroupStatus::TimedOut => "timed_out",
            GroupStatus::Commented => "commented",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "active" => Some(GroupStatus::Active),
            "consensus" => Some(GroupStatus::Consensus),
            "timed_out" => Some(GroupStatus::TimedOut),
            "commented" => Some(GroupStatus::Commented),
            _ => None,
        }
    }
}

impl std::fmt::Display for GroupStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Why a group stopped without consensus
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopCause {
    /// The configured turn cap was reached before consensus
    TurnCap,
    /// Generation retries were exhausted on a transient failure
    GenerationExhausted(String),
    /// The generation capability reported an exceeded quota
    QuotaExceeded(String),
}

impl std::fmt::Display for StopCause {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StopCause::TurnCap => write!(f, "turn cap reached"),
            StopCause::GenerationExhausted(e) => write!(f, "generation retries exhausted: {}", e),
            StopCause::QuotaExceeded(e) => write!(f, "generation quota exceeded: {}", e),
        }
    }
}

/// A small group of personas discussing one lesson plan (Entity)
///
/// Created by the orchestrator at run start, mutated only by the
/// conversation engine (turn/state advances) and the commentator
/// (the `Commented` transition). Never deleted within a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscussionGroup {
    pub id: GroupId,
    pub plan_id: PlanId,
    /// Assigned persona ids in speaking order
    pub members: Vec<PersonaId>,
    pub status: GroupStatus,
    /// Completed turns; also the sequence number of the latest message
    pub turn_count: u32,
    /// Recorded cause for a `TimedOut` status
    pub status_reason: Option<String>,
}

impl DiscussionGroup {
    pub fn new(id: GroupId, plan_id: PlanId, members: Vec<PersonaId>) -> Self {
        Self {
            id,
            plan_id,
            members,
            status: GroupStatus::Active,
            turn_count: 0,
            status_reason: None,
        }
    }

    /// Display name, e.g. "Group3"
    pub fn name(&self) -> String {
        format!("Group{}", self.id)
    }

    /// The persona speaking next, by round-robin over the member list
    pub fn next_speaker(&self) -> &PersonaId {
        &self.members[self.turn_count as usize % self.members.len()]
    }

    /// Sequence number the next message will carry
    pub fn next_seq(&self) -> SeqNo {
        SeqNo::new(self.turn_count + 1)
    }

    /// Record one completed turn. Only legal while the group is active.
    pub fn record_turn(&mut self) -> Result<(), DomainError> {
        self.ensure_active()?;
        self.turn_count += 1;
        Ok(())
    }

    /// Transition `Active -> Consensus`
    pub fn reach_consensus(&mut self) -> Result<(), DomainError> {
        self.ensure_active()?;
        self.status = GroupStatus::Consensus;
        Ok(())
    }

    /// Transition `Active -> TimedOut`, recording the cause
    pub fn time_out(&mut self, cause: StopCause) -> Result<(), DomainError> {
        self.ensure_active()?;
        self.status = GroupStatus::TimedOut;
        self.status_reason = Some(cause.to_string());
        Ok(())
    }

    /// Transition `Consensus|TimedOut -> Commented`
    pub fn mark_commented(&mut self) -> Result<(), DomainError> {
        if !self.status.is_terminal() {
            return Err(DomainError::NotReadyForComment {
                group: self.id.value(),
                status: self.status.to_string(),
            });
        }
        self.status = GroupStatus::Commented;
        Ok(())
    }

    fn ensure_active(&self) -> Result<(), DomainError> {
        if self.status != GroupStatus::Active {
            return Err(DomainError::GroupNotActive {
                group: self.id.value(),
                status: self.status.to_string(),
            });
        }
        Ok(())
    }
}
