//! Evaluate Plan use case — the final evaluator.
//!
//! Aggregates every teacher comment for a lesson plan into one
//! feasibility report. Comments are consumed in group-creation order so
//! identical inputs produce identical reports, regardless of which group
//! happened to finish first.

use crate::config::SimulationParams;
use crate::ports::generation::{GenerationError, GenerationPort};
use crate::ports::observer::DiscussionObserver;
use crate::ports::persistence::{PersistenceError, PersistenceGateway};
use crate::retry::retry_with_backoff;
use seminar_domain::{
    parse_feasibility_response, FinalEvaluation, GroupId, LessonPlan, PromptTemplate,
};
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

/// Errors that can occur during the final evaluation
#[derive(Error, Debug)]
pub enum EvaluatePlanError {
    #[error("persistence failure: {0}")]
    Persistence(#[from] PersistenceError),

    #[error("evaluation generation failed: {0}")]
    Generation(#[from] GenerationError),

    /// The plan-level barrier was not actually satisfied
    #[error("comments missing for groups: {0:?}")]
    IncompleteComments(Vec<i64>),
}

/// Use case producing the cross-group feasibility report for one plan
pub struct EvaluatePlanUseCase<G, S> {
    generation: Arc<G>,
    store: Arc<S>,
    params: SimulationParams,
}

impl<G, S> EvaluatePlanUseCase<G, S>
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

    /// Evaluate `plan` over the comments of `expected_groups`.
    ///
    /// Runs exactly once per plan: if an evaluation already exists this
    /// is a no-op returning `None`. Fails if any expected group lacks a
    /// durable comment.
    pub async fn execute(
        &self,
        plan: &LessonPlan,
        expected_groups: &[GroupId],
        observer: &dyn DiscussionObserver,
    ) -> Result<Option<FinalEvaluation>, EvaluatePlanError> {
        if self.store.evaluation_exists(&plan.id).await? {
            info!(plan = %plan.id, "evaluation already exists, skipping");
            return Ok(None);
        }

        let comments = self.store.comments_for_plan(&plan.id).await?;
        let missing: Vec<i64> = expected_groups
            .iter()
            .filter(|id| !comments.iter().any(|c| c.group_id == **id))
            .map(|id| id.value())
            .collect();
        if !missing.is_empty() {
            return Err(EvaluatePlanError::IncompleteComments(missing));
        }

        let pairs: Vec<(String, String)> = comments
            .iter()
            .map(|c| (format!("Group{}", c.group_id), c.text.clone()))
            .collect();
        let prompt = PromptTemplate::evaluation_prompt(&plan.title, &pairs);

        info!(plan = %plan.id, groups = comments.len(), "generating final evaluation");
        let summary = retry_with_backoff(
            &self.params.retry,
            "evaluate_plan",
            GenerationError::is_transient,
            || self.timed_generate(&prompt),
        )
        .await
        .map_err(|e| {
            warn!(plan = %plan.id, "final evaluation failed permanently: {}", e);
            e
        })?;

        let feasibility = parse_feasibility_response(&summary);
        let evaluation = FinalEvaluation::new(plan.id.clone(), summary, feasibility);
        self.store.save_evaluation(&evaluation).await?;
        observer.on_evaluation(&evaluation);

        Ok(Some(evaluation))
    }

    async fn timed_generate(&self, prompt: &str) -> Result<String, GenerationError> {
        match tokio::time::timeout(
            self.params.call_timeout,
            self.generation
                .generate(PromptTemplate::evaluation_system(), prompt),
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
    use crate::ports::persistence::PersistenceGateway;
    use crate::retry::RetryPolicy;
    use crate::use_cases::harness::{plan, roster, MemoryStore, ScriptedGeneration};
    use seminar_domain::{DiscussionGroup, PlanId, StopCause, TeacherComment};
    use std::time::Duration;

    fn params() -> SimulationParams {
        SimulationParams::default().with_retry(RetryPolicy::new(2, Duration::ZERO))
    }

    async fn commented_group(store: &MemoryStore, id: i64) -> GroupId {
        let personas = roster(2);
        let mut g = DiscussionGroup::new(
            GroupId::new(id),
            PlanId::new("lp-1"),
            personas.iter().map(|p| p.id.clone()).collect(),
        );
        g.time_out(StopCause::TurnCap).unwrap();
        g.mark_commented().unwrap();
        let comment = TeacherComment::new(g.id, format!("comment for group {}", id));
        store.save_comment(&g, &comment).await.unwrap();
        g.id
    }

    #[tokio::test]
    async fn test_evaluates_once_all_groups_commented() {
        let store = Arc::new(MemoryStore::new());
        let g1 = commented_group(&store, 1).await;
        let g2 = commented_group(&store, 2).await;

        let uc = EvaluatePlanUseCase::new(Arc::new(ScriptedGeneration::ok()), store.clone(), params());
        let evaluation = uc
            .execute(&plan(), &[g1, g2], &NoObserver)
            .await
            .unwrap()
            .expect("evaluation should be produced");

        assert_eq!(evaluation.plan_id, PlanId::new("lp-1"));
        assert_eq!(store.evaluations().len(), 1);
    }

    #[tokio::test]
    async fn test_missing_comment_blocks_evaluation() {
        let store = Arc::new(MemoryStore::new());
        let g1 = commented_group(&store, 1).await;

        let uc = EvaluatePlanUseCase::new(Arc::new(ScriptedGeneration::ok()), store.clone(), params());
        let result = uc.execute(&plan(), &[g1, GroupId::new(2)], &NoObserver).await;

        assert!(matches!(
            result,
            Err(EvaluatePlanError::IncompleteComments(ids)) if ids == vec![2]
        ));
        assert!(store.evaluations().is_empty());
    }

    #[tokio::test]
    async fn test_second_evaluation_is_noop() {
        let store = Arc::new(MemoryStore::new());
        let g1 = commented_group(&store, 1).await;

        let uc = EvaluatePlanUseCase::new(Arc::new(ScriptedGeneration::ok()), store.clone(), params());
        let first = uc.execute(&plan(), &[g1], &NoObserver).await.unwrap();
        assert!(first.is_some());

        let second = uc.execute(&plan(), &[g1], &NoObserver).await.unwrap();
        assert!(second.is_none());
        assert_eq!(store.evaluations().len(), 1);
    }
}
