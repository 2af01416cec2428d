//! Comment Group use case — the teacher commentator.
//!
//! Produces exactly one commentary per finished group and transitions the
//! group to `Commented`. Idempotent: a group that already has a durable
//! comment is left untouched, which makes resuming an interrupted run
//! safe.

use crate::config::SimulationParams;
use crate::ports::generation::{GenerationError, GenerationPort};
use crate::ports::observer::DiscussionObserver;
use crate::ports::persistence::{PersistenceError, PersistenceGateway};
use crate::retry::retry_with_backoff;
use seminar_domain::{
    DiscussionGroup, DomainError, LessonPlan, Persona, PersonaId, PromptTemplate, TeacherComment,
    Transcript,
};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

/// Errors that can occur while commenting a group
///
/// A generation failure here is surfaced, not swallowed: the plan's final
/// evaluation cannot run while any group lacks its comment.
#[derive(Error, Debug)]
pub enum CommentGroupError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("persistence failure: {0}")]
    Persistence(#[from] PersistenceError),

    #[error("commentary generation failed: {0}")]
    Generation(#[from] GenerationError),
}

/// Use case producing the teacher commentary for one finished group
pub struct CommentGroupUseCase<G, S> {
    generation: Arc<G>,
    store: Arc<S>,
    params: SimulationParams,
}

impl<G, S> CommentGroupUseCase<G, S>
where
    G: GenerationPort + 'static,
    S: PersistenceGateway + 'static,
{
    pub fn new(generation: Arc<G>, store: Arc<S>, params: SimulationParams) -> Self {
        Self {
            generation,
            store,
            params,
        }
    }

    /// Comment `group` and transition it to `Commented`.
    ///
    /// Requires the group to be in a terminal pre-comment state (or
    /// already commented, in which case the stored comment is returned).
    pub async fn execute(
        &self,
        group: &mut DiscussionGroup,
        transcript: &Transcript,
        personas: &[Persona],
        plan: &LessonPlan,
        observer: &dyn DiscussionObserver,
    ) -> Result<TeacherComment, CommentGroupError> {
        if let Some(existing) = self.store.comment_for_group(group.id).await? {
            info!(group = %group.name(), "comment already exists, skipping");
            if group.status.is_terminal() {
                group.mark_commented()?;
                // Re-assert the durable COMMENTED status: a resumed run
                // re-creates the group as active, and the plan barrier
                // reads the stored status. save_comment leaves the
                // existing comment row untouched.
                self.store.save_comment(group, &existing).await?;
            }
            return Ok(existing);
        }

        let roster: HashMap<&PersonaId, &Persona> =
            personas.iter().map(|p| (&p.id, p)).collect();
        let lines = transcript.speaker_lines(|id| {
            roster
                .get(id)
                .map(|p| p.display_name.clone())
                .unwrap_or_else(|| id.to_string())
        });
        let prompt = PromptTemplate::commentary_prompt(&group.name(), &plan.initial_prompt, &lines);

        info!(group = %group.name(), "generating teacher commentary");
        let text = retry_with_backoff(
            &self.params.retry,
            "comment_group",
            GenerationError::is_transient,
            || self.timed_generate(&prompt),
        )
        .await
        .map_err(|e| {
            warn!(group = %group.name(), "commentary generation failed permanently: {}", e);
            e
        })?;

        let comment = TeacherComment::new(group.id, text);
        group.mark_commented()?;
        // Comment row and COMMENTED transition land in one transaction.
        self.store.save_comment(group, &comment).await?;
        observer.on_comment(group, &comment);

        Ok(comment)
    }

    async fn timed_generate(&self, prompt: &str) -> Result<String, GenerationError> {
        match tokio::time::timeout(
            self.params.call_timeout,
            self.generation
                .generate(PromptTemplate::commentary_system(), prompt),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(GenerationError::Timeout),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::observer::NoObserver;
    use crate::retry::RetryPolicy;
    use crate::use_cases::harness::{plan, roster, MemoryStore, ScriptedGeneration};
    use seminar_domain::{GroupId, GroupStatus, PlanId, StopCause};
    use std::time::Duration;

    fn params() -> SimulationParams {
        SimulationParams::default().with_retry(RetryPolicy::new(2, Duration::ZERO))
    }

    fn terminal_group() -> DiscussionGroup {
        let personas = roster(3);
        let mut g = DiscussionGroup::new(
            GroupId::new(1),
            PlanId::new("lp-1"),
            personas.iter().map(|p| p.id.clone()).collect(),
        );
        g.time_out(StopCause::TurnCap).unwrap();
        g
    }

    #[tokio::test]
    async fn test_comments_terminal_group() {
        let store = Arc::new(MemoryStore::new());
        let uc = CommentGroupUseCase::new(Arc::new(ScriptedGeneration::ok()), store.clone(), params());

        let mut group = terminal_group();
        let transcript = Transcript::new(group.id);
        let comment = uc
            .execute(&mut group, &transcript, &roster(3), &plan(), &NoObserver)
            .await
            .unwrap();

        assert_eq!(group.status, GroupStatus::Commented);
        assert_eq!(comment.group_id, group.id);
        assert_eq!(store.comments().len(), 1);
        assert_eq!(store.group(1).unwrap().status, GroupStatus::Commented);
    }

    #[tokio::test]
    async fn test_active_group_cannot_be_commented() {
        let store = Arc::new(MemoryStore::new());
        let uc = CommentGroupUseCase::new(Arc::new(ScriptedGeneration::ok()), store.clone(), params());

        let personas = roster(3);
        let mut group = DiscussionGroup::new(
            GroupId::new(1),
            PlanId::new("lp-1"),
            personas.iter().map(|p| p.id.clone()).collect(),
        );

        let transcript = Transcript::new(group.id);
        let result = uc
            .execute(&mut group, &transcript, &personas, &plan(), &NoObserver)
            .await;

        assert!(matches!(result, Err(CommentGroupError::Domain(_))));
        assert!(store.comments().is_empty());
    }

    #[tokio::test]
    async fn test_existing_comment_is_noop() {
        let store = Arc::new(MemoryStore::new());
        let uc = CommentGroupUseCase::new(Arc::new(ScriptedGeneration::ok()), store.clone(), params());

        let mut group = terminal_group();
        let transcript = Transcript::new(group.id);
        let first = uc
            .execute(&mut group, &transcript, &roster(3), &plan(), &NoObserver)
            .await
            .unwrap();

        // Resume path: a fresh copy of the group still carrying the
        // terminal status re-runs the commentator.
        let mut resumed = terminal_group();
        let second = uc
            .execute(&mut resumed, &transcript, &roster(3), &plan(), &NoObserver)
            .await
            .unwrap();

        assert_eq!(first.text, second.text);
        assert_eq!(store.comments().len(), 1);
        assert_eq!(resumed.status, GroupStatus::Commented);
    }

    #[tokio::test]
    async fn test_permanent_generation_failure_surfaces() {
        let store = Arc::new(MemoryStore::new());
        let uc = CommentGroupUseCase::new(
            Arc::new(ScriptedGeneration::always_transient("down")),
            store.clone(),
            params(),
        );

        let mut group = terminal_group();
        let transcript = Transcript::new(group.id);
        let result = uc
            .execute(&mut group, &transcript, &roster(3), &plan(), &NoObserver)
            .await;

        assert!(matches!(result, Err(CommentGroupError::Generation(_))));
        assert!(store.comments().is_empty());
        // The group never claims to be commented.
        assert_eq!(group.status, GroupStatus::TimedOut);
    }
}
