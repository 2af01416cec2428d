//! Persistence gateway port
//!
//! Durable, idempotent storage for groups, messages, verdicts, comments
//! and evaluations. Implementations retry transient connectivity failures
//! internally with bounded backoff; any error that escapes this port is
//! fatal for the run — an unrecorded transcript would silently corrupt
//! the dataset the system exists to produce.

use async_trait::async_trait;
use seminar_domain::{
    ConsensusVerdict, DiscussionGroup, FinalEvaluation, GroupId, Message, PlanId, TeacherComment,
};
use thiserror::Error;

/// Errors surfaced by the persistence gateway
#[derive(Error, Debug)]
pub enum PersistenceError {
    /// A transient failure that exhausted its retry budget
    #[error("store retries exhausted: {0}")]
    Exhausted(String),

    /// A non-retryable store failure (constraint violation, corruption)
    #[error("store error: {0}")]
    Fatal(String),
}

/// Durable store contract
///
/// Write contracts:
/// - [`append_message`](Self::append_message) is keyed on
///   `(group_id, seq)`; re-submitting an already-persisted key is a no-op.
/// - [`record_verdict`](Self::record_verdict) writes the verdict row and
///   the group's status/turn counter in one transaction, so a CONSENSUS
///   transition is never observable without its verdict.
/// - [`save_comment`](Self::save_comment) writes the comment and the
///   COMMENTED transition in one transaction; unique per group.
/// - [`save_evaluation`](Self::save_evaluation) is unique per plan; a
///   second submission is a no-op.
#[async_trait]
pub trait PersistenceGateway: Send + Sync {
    /// Insert or update a group's status, turn counter and status reason
    async fn upsert_group(&self, group: &DiscussionGroup) -> Result<(), PersistenceError>;

    /// Append a message; idempotent on `(group_id, seq)`
    async fn append_message(&self, message: &Message) -> Result<(), PersistenceError>;

    /// Record a consensus check together with the group state it produced
    async fn record_verdict(
        &self,
        group: &DiscussionGroup,
        verdict: &ConsensusVerdict,
    ) -> Result<(), PersistenceError>;

    /// Persist the teacher comment and the COMMENTED transition together
    async fn save_comment(
        &self,
        group: &DiscussionGroup,
        comment: &TeacherComment,
    ) -> Result<(), PersistenceError>;

    /// The comment for a group, if one was already persisted
    async fn comment_for_group(
        &self,
        group_id: GroupId,
    ) -> Result<Option<TeacherComment>, PersistenceError>;

    /// Group ids of the plan with durably COMMENTED status, ascending
    async fn commented_groups(&self, plan_id: &PlanId) -> Result<Vec<GroupId>, PersistenceError>;

    /// All comments for the plan, ordered by group id (creation order)
    async fn comments_for_plan(
        &self,
        plan_id: &PlanId,
    ) -> Result<Vec<TeacherComment>, PersistenceError>;

    /// Persist the final evaluation; idempotent on plan id
    async fn save_evaluation(&self, evaluation: &FinalEvaluation) -> Result<(), PersistenceError>;

    /// Whether an evaluation already exists for the plan
    async fn evaluation_exists(&self, plan_id: &PlanId) -> Result<bool, PersistenceError>;
}
