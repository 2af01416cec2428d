//! Discussion observer port
//!
//! Callback interface for following a run as it happens. Implementations
//! live in the presentation layer (e.g. a console reporter); the engine
//! never depends on what observers do with the events.

use seminar_domain::{
    ConsensusVerdict, DiscussionGroup, FinalEvaluation, Message, TeacherComment,
};

/// Callbacks fired while a simulation runs
///
/// All methods default to no-ops so implementations only override what
/// they display.
pub trait DiscussionObserver: Send + Sync {
    /// A group's discussion is starting
    fn on_group_started(&self, _group: &DiscussionGroup) {}

    /// A message was generated and durably persisted
    fn on_message(&self, _group: &DiscussionGroup, _message: &Message) {}

    /// A consensus check completed (successfully or not)
    fn on_consensus_check(&self, _group: &DiscussionGroup, _verdict: &ConsensusVerdict) {}

    /// A group reached a terminal state
    fn on_group_finished(&self, _group: &DiscussionGroup) {}

    /// The teacher commentary for a group was persisted
    fn on_comment(&self, _group: &DiscussionGroup, _comment: &TeacherComment) {}

    /// The final evaluation for the plan was persisted
    fn on_evaluation(&self, _evaluation: &FinalEvaluation) {}
}

/// No-op observer for when progress reporting is not needed
pub struct NoObserver;

impl DiscussionObserver for NoObserver {}
