//! Run Simulation use case — the group orchestrator.
//!
//! Partitions the roster into groups, drives each group through its
//! lifecycle inside a bounded worker pool, hands every finished group to
//! the commentator without waiting for siblings, and runs the final
//! evaluator once after the durable plan-level barrier is satisfied.

use crate::config::SimulationParams;
use crate::ports::generation::GenerationPort;
use crate::ports::judge::JudgePort;
use crate::ports::observer::{DiscussionObserver, NoObserver};
use crate::ports::persistence::{PersistenceError, PersistenceGateway};
use crate::use_cases::comment_group::{CommentGroupError, CommentGroupUseCase};
use crate::use_cases::evaluate_plan::{EvaluatePlanError, EvaluatePlanUseCase};
use crate::use_cases::run_group::{RunGroupError, RunGroupUseCase};
use seminar_domain::{
    partition_roster, DiscussionGroup, DomainError, FinalEvaluation, GroupId, LessonPlan, Persona,
    TeacherComment, Transcript,
};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Errors that can occur during a simulation run
#[derive(Error, Debug)]
pub enum RunSimulationError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("persistence failure: {0}")]
    Persistence(#[from] PersistenceError),

    #[error("group discussion failed: {0}")]
    Group(#[from] RunGroupError),

    #[error("teacher commentary failed: {0}")]
    Comment(#[from] CommentGroupError),

    #[error("final evaluation failed: {0}")]
    Evaluation(#[from] EvaluatePlanError),

    #[error("group worker panicked: {0}")]
    Join(String),

    /// Workers finished but some groups lack durable COMMENTED status
    #[error("groups missing durable comments: {0:?}")]
    BarrierIncomplete(Vec<i64>),

    #[error("simulation cancelled")]
    Cancelled,
}

/// Input for the RunSimulation use case
#[derive(Debug, Clone)]
pub struct RunSimulationInput {
    /// The lesson plan under discussion
    pub plan: LessonPlan,
    /// The full persona roster, in partition order
    pub personas: Vec<Persona>,
}

impl RunSimulationInput {
    pub fn new(plan: LessonPlan, personas: Vec<Persona>) -> Self {
        Self { plan, personas }
    }
}

/// One group's complete result
#[derive(Debug, Clone)]
pub struct GroupOutcome {
    pub group: DiscussionGroup,
    pub transcript: Transcript,
    pub comment: TeacherComment,
}

/// Full result of one simulation run
#[derive(Debug, Clone)]
pub struct SimulationReport {
    pub plan: LessonPlan,
    /// Outcomes in group-creation order
    pub outcomes: Vec<GroupOutcome>,
    /// `None` when a previous run already evaluated this plan
    pub evaluation: Option<FinalEvaluation>,
}

/// Use case for running one full simulation
pub struct RunSimulationUseCase<G, J, S> {
    generation: Arc<G>,
    judge: Arc<J>,
    store: Arc<S>,
    params: SimulationParams,
    cancellation_token: CancellationToken,
}

impl<G, J, S> RunSimulationUseCase<G, J, S>
where
    G: GenerationPort + 'static,
    J: JudgePort + 'static,
    S: PersistenceGateway + 'static,
{
    pub fn new(generation: Arc<G>, judge: Arc<J>, store: Arc<S>, params: SimulationParams) -> Self {
        Self {
            generation,
            judge,
            store,
            params,
            cancellation_token: CancellationToken::new(),
        }
    }

    pub fn with_cancellation_token(mut self, token: CancellationToken) -> Self {
        self.cancellation_token = token;
        self
    }

    /// Execute the run without progress reporting
    pub async fn execute(
        &self,
        input: RunSimulationInput,
    ) -> Result<SimulationReport, RunSimulationError> {
        self.execute_with_observer(input, Arc::new(NoObserver)).await
    }

    /// Execute the run, streaming events to `observer`
    pub async fn execute_with_observer(
        &self,
        input: RunSimulationInput,
        observer: Arc<dyn DiscussionObserver>,
    ) -> Result<SimulationReport, RunSimulationError> {
        let plan = Arc::new(input.plan);
        let personas: Arc<Vec<Persona>> = Arc::new(input.personas);

        let groups = partition_roster(&personas, self.params.group_size, &plan.id)?;
        let expected: Vec<GroupId> = groups.iter().map(|g| g.id).collect();
        info!(
            plan = %plan.id,
            groups = groups.len(),
            personas = personas.len(),
            concurrency = self.params.concurrency_limit,
            "simulation starting"
        );

        // Groups exist durably before any discussion starts.
        for group in &groups {
            self.store.upsert_group(group).await?;
        }

        let semaphore = Arc::new(Semaphore::new(self.params.concurrency_limit));
        let mut join_set = JoinSet::new();

        for group in groups {
            let engine = RunGroupUseCase::new(
                Arc::clone(&self.generation),
                Arc::clone(&self.judge),
                Arc::clone(&self.store),
                self.params.clone(),
            )
            .with_cancellation_token(self.cancellation_token.clone());
            let commentator = CommentGroupUseCase::new(
                Arc::clone(&self.generation),
                Arc::clone(&self.store),
                self.params.clone(),
            );
            let semaphore = Arc::clone(&semaphore);
            let personas = Arc::clone(&personas);
            let plan = Arc::clone(&plan);
            let observer = Arc::clone(&observer);

            join_set.spawn(async move {
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .expect("worker semaphore closed");

                let finished = engine
                    .execute(group, &personas, &plan, observer.as_ref())
                    .await?;

                // Terminal state reached: comment immediately, without
                // waiting for sibling groups.
                let mut group = finished.group;
                let comment = commentator
                    .execute(
                        &mut group,
                        &finished.transcript,
                        &personas,
                        &plan,
                        observer.as_ref(),
                    )
                    .await?;

                Ok::<GroupOutcome, RunSimulationError>(GroupOutcome {
                    group,
                    transcript: finished.transcript,
                    comment,
                })
            });
        }

        let mut outcomes = Vec::new();
        let mut failure: Option<RunSimulationError> = None;

        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok(Ok(outcome)) => outcomes.push(outcome),
                Ok(Err(e)) => {
                    if failure.is_none() {
                        warn!("group worker failed, cancelling remaining work: {}", e);
                        // Stop sibling groups promptly; their Cancelled
                        // errors are not the run's failure.
                        self.cancellation_token.cancel();
                        failure = Some(e);
                    }
                }
                Err(e) => {
                    if failure.is_none() {
                        self.cancellation_token.cancel();
                        failure = Some(RunSimulationError::Join(e.to_string()));
                    }
                }
            }
        }

        if let Some(e) = failure {
            return Err(normalize_cancellation(e));
        }
        if self.cancellation_token.is_cancelled() {
            return Err(RunSimulationError::Cancelled);
        }

        // Barrier: the evaluator only runs against durable COMMENTED
        // state, so a restart between commenting and evaluating is safe.
        let commented = self.store.commented_groups(&plan.id).await?;
        let missing: Vec<i64> = expected
            .iter()
            .filter(|id| !commented.contains(id))
            .map(|id| id.value())
            .collect();
        if !missing.is_empty() {
            return Err(RunSimulationError::BarrierIncomplete(missing));
        }

        let evaluator = EvaluatePlanUseCase::new(
            Arc::clone(&self.generation),
            Arc::clone(&self.store),
            self.params.clone(),
        );
        let evaluation = evaluator
            .execute(&plan, &expected, observer.as_ref())
            .await?;

        outcomes.sort_by_key(|o| o.group.id);
        info!(plan = %plan.id, groups = outcomes.len(), "simulation finished");

        Ok(SimulationReport {
            plan: Arc::try_unwrap(plan).unwrap_or_else(|arc| (*arc).clone()),
            outcomes,
            evaluation,
        })
    }
}

/// A worker that died because the run was being torn down is reported as
/// a cancellation, not as that group's own failure.
fn normalize_cancellation(e: RunSimulationError) -> RunSimulationError {
    match e {
        RunSimulationError::Group(RunGroupError::Cancelled) => RunSimulationError::Cancelled,
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retry::RetryPolicy;
    use crate::use_cases::harness::{plan, roster, MemoryStore, ScriptedGeneration, ScriptedJudge};
    use seminar_domain::{CheckCadence, GroupStatus, Message};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn params() -> SimulationParams {
        SimulationParams::default()
            .with_retry(RetryPolicy::new(2, Duration::ZERO))
            .with_group_size(2)
            .with_max_turns(4)
            .with_check_interval(CheckCadence::EveryRound)
            .with_concurrency_limit(2)
    }

    fn use_case(
        judge: ScriptedJudge,
        store: Arc<MemoryStore>,
        params: SimulationParams,
    ) -> RunSimulationUseCase<ScriptedGeneration, ScriptedJudge, MemoryStore> {
        RunSimulationUseCase::new(
            Arc::new(ScriptedGeneration::ok()),
            Arc::new(judge),
            store,
            params,
        )
    }

    #[tokio::test]
    async fn test_full_run_comments_every_group_and_evaluates_once() {
        let store = Arc::new(MemoryStore::new());
        let uc = use_case(ScriptedJudge::always(true), store.clone(), params());

        let report = uc
            .execute(RunSimulationInput::new(plan(), roster(4)))
            .await
            .unwrap();

        // 4 personas, size 2: two groups, consensus at the first round.
        assert_eq!(report.outcomes.len(), 2);
        for outcome in &report.outcomes {
            assert_eq!(outcome.group.status, GroupStatus::Commented);
            assert_eq!(outcome.transcript.len(), 2);
        }
        // Outcomes come back in creation order.
        assert_eq!(report.outcomes[0].group.id, GroupId::new(1));
        assert_eq!(report.outcomes[1].group.id, GroupId::new(2));

        assert_eq!(store.comments().len(), 2);
        assert_eq!(store.evaluations().len(), 1);
        assert!(report.evaluation.is_some());
    }

    #[tokio::test]
    async fn test_comment_exists_iff_group_terminal() {
        let store = Arc::new(MemoryStore::new());
        let uc = use_case(ScriptedJudge::always(false), store.clone(), params());

        uc.execute(RunSimulationInput::new(plan(), roster(4)))
            .await
            .unwrap();

        for id in [1, 2] {
            let group = store.group(id).unwrap();
            assert_eq!(group.status, GroupStatus::Commented);
            assert!(store.comments().iter().any(|c| c.group_id == group.id));
        }
    }

    #[tokio::test]
    async fn test_rerun_is_idempotent() {
        let store = Arc::new(MemoryStore::new());
        let uc = use_case(ScriptedJudge::always(true), store.clone(), params());
        uc.execute(RunSimulationInput::new(plan(), roster(4)))
            .await
            .unwrap();

        // The same run against the same store: comments and evaluation
        // already exist, nothing is duplicated.
        let uc = use_case(ScriptedJudge::always(true), store.clone(), params());
        let report = uc
            .execute(RunSimulationInput::new(plan(), roster(4)))
            .await
            .unwrap();

        assert_eq!(store.comments().len(), 2);
        assert_eq!(store.evaluations().len(), 1);
        assert!(report.evaluation.is_none());
    }

    #[tokio::test]
    async fn test_store_failure_mid_run_aborts_and_preserves_rows() {
        // Store goes permanently down after two groups are commented;
        // the run aborts but the first two groups' rows stay readable.
        struct FailAfterTwoComments {
            store: Arc<MemoryStore>,
            seen: AtomicUsize,
        }
        impl DiscussionObserver for FailAfterTwoComments {
            fn on_comment(&self, _g: &DiscussionGroup, _c: &TeacherComment) {
                if self.seen.fetch_add(1, Ordering::SeqCst) + 1 == 2 {
                    self.store.fail_writes();
                }
            }
        }

        let store = Arc::new(MemoryStore::new());
        // 6 personas, size 2: three groups; one worker at a time so two
        // groups fully finish before the third starts writing.
        let p = params().with_concurrency_limit(1);
        let uc = use_case(ScriptedJudge::always(true), store.clone(), p);

        let observer = Arc::new(FailAfterTwoComments {
            store: store.clone(),
            seen: AtomicUsize::new(0),
        });
        let result = uc
            .execute_with_observer(RunSimulationInput::new(plan(), roster(6)), observer)
            .await;

        match result {
            Err(RunSimulationError::Group(RunGroupError::Persistence(_))) => {}
            other => panic!("expected persistence abort, got {:?}", other.map(|_| ())),
        }

        // The two commented groups' data is intact and queryable.
        assert_eq!(store.comments().len(), 2);
        for comment in store.comments() {
            assert!(!store.messages_for_group(comment.group_id.value()).is_empty());
        }
        assert!(store.evaluations().is_empty());
    }

    #[tokio::test]
    async fn test_no_evaluation_when_commentary_fails() {
        let store = Arc::new(MemoryStore::new());
        // Generation succeeds for exactly the discussion turns of one
        // round (2 per group), then reports quota exhaustion, so the
        // commentary calls can never succeed.
        let uc = RunSimulationUseCase::new(
            Arc::new(ScriptedGeneration::quota_after(4, "credits gone")),
            Arc::new(ScriptedJudge::always(true)),
            store.clone(),
            params().with_concurrency_limit(1),
        );

        let result = uc.execute(RunSimulationInput::new(plan(), roster(4))).await;

        assert!(matches!(
            result,
            Err(RunSimulationError::Comment(CommentGroupError::Generation(_)))
        ));
        assert!(store.evaluations().is_empty());
    }

    #[tokio::test]
    async fn test_pre_cancelled_run_fails_fast() {
        let store = Arc::new(MemoryStore::new());
        let token = CancellationToken::new();
        token.cancel();
        let uc = use_case(ScriptedJudge::always(true), store.clone(), params())
            .with_cancellation_token(token);

        let result = uc.execute(RunSimulationInput::new(plan(), roster(4))).await;
        assert!(matches!(result, Err(RunSimulationError::Cancelled)));
    }

    #[tokio::test]
    async fn test_message_reappend_after_run_is_noop() {
        let store = Arc::new(MemoryStore::new());
        let uc = use_case(ScriptedJudge::always(true), store.clone(), params());
        uc.execute(RunSimulationInput::new(plan(), roster(2)))
            .await
            .unwrap();

        let original = store.messages_for_group(1);
        let replay = Message::new(
            GroupId::new(1),
            original[0].seq,
            original[0].speaker.clone(),
            "tampered",
        );
        store.append_message(&replay).await.unwrap();

        let after = store.messages_for_group(1);
        assert_eq!(after.len(), original.len());
        assert_eq!(after[0].text, original[0].text);
    }
}
