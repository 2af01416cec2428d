//! Run Group use case — the conversation engine.
//!
//! Drives one group's discussion turn by turn until a consensus check
//! returns true or the turn cap is reached. Turns are strictly
//! sequential: each one is generated against the full prior transcript,
//! and its persistence is awaited before the next turn starts, so the
//! durable transcript never lags the in-memory discussion.

use crate::config::SimulationParams;
use crate::ports::generation::{GenerationError, GenerationPort};
use crate::ports::judge::{JudgeError, JudgePort, JudgeVerdict};
use crate::ports::observer::DiscussionObserver;
use crate::ports::persistence::{PersistenceError, PersistenceGateway};
use crate::retry::retry_with_backoff;
use seminar_domain::{
    ConsensusVerdict, DiscussionGroup, DomainError, GroupStatus, LessonPlan, Message, Persona,
    PersonaId, PromptTemplate, SeqNo, StopCause, Transcript,
};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Errors that abort a group run
///
/// Generation failures are absent on purpose: exhausted generation
/// retries end the group in `TimedOut` and are not an error for the run.
#[derive(Error, Debug)]
pub enum RunGroupError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("persistence failure: {0}")]
    Persistence(#[from] PersistenceError),

    #[error("group run cancelled")]
    Cancelled,
}

/// A group that left the active state, with its full transcript
#[derive(Debug, Clone)]
pub struct FinishedGroup {
    pub group: DiscussionGroup,
    pub transcript: Transcript,
}

/// Use case driving one group's discussion to a terminal state
pub struct RunGroupUseCase<G, J, S> {
    generation: Arc<G>,
    judge: Arc<J>,
    store: Arc<S>,
    params: SimulationParams,
    cancellation_token: CancellationToken,
}

impl<G, J, S> RunGroupUseCase<G, J, S>
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

    /// Drive `group` until it reaches `Consensus` or `TimedOut`.
    ///
    /// `personas` must contain every member of the group.
    pub async fn execute(
        &self,
        mut group: DiscussionGroup,
        personas: &[Persona],
        plan: &LessonPlan,
        observer: &dyn DiscussionObserver,
    ) -> Result<FinishedGroup, RunGroupError> {
        let roster: HashMap<&PersonaId, &Persona> =
            personas.iter().map(|p| (&p.id, p)).collect();
        let mut transcript = Transcript::new(group.id);

        info!(
            group = %group.name(),
            members = group.members.len(),
            "discussion starting"
        );
        observer.on_group_started(&group);

        while group.status == GroupStatus::Active {
            if self.cancellation_token.is_cancelled() {
                return Err(RunGroupError::Cancelled);
            }

            self.advance_turn(&mut group, &mut transcript, &roster, plan, observer)
                .await?;
            if group.status != GroupStatus::Active {
                // Generation gave up; the group already timed out durably.
                break;
            }

            if self
                .params
                .consensus_check_interval
                .is_due(group.turn_count, group.members.len())
            {
                let verdict = self
                    .check_consensus(&mut group, &transcript, plan)
                    .await?;
                observer.on_consensus_check(&group, &verdict);
                if verdict.consensus {
                    info!(group = %group.name(), at = %verdict.seq, "consensus reached");
                    break;
                }
            }

            if group.turn_count >= self.params.max_turns_per_group {
                group.time_out(StopCause::TurnCap)?;
                self.store.upsert_group(&group).await?;
                info!(group = %group.name(), turns = group.turn_count, "turn cap reached");
                break;
            }
        }

        observer.on_group_finished(&group);
        Ok(FinishedGroup { group, transcript })
    }

    /// Generate, persist and record one turn.
    ///
    /// On unrecoverable generation failure the group is transitioned to
    /// `TimedOut` (with the cause recorded) instead of returning an error.
    async fn advance_turn(
        &self,
        group: &mut DiscussionGroup,
        transcript: &mut Transcript,
        roster: &HashMap<&PersonaId, &Persona>,
        plan: &LessonPlan,
        observer: &dyn DiscussionObserver,
    ) -> Result<(), RunGroupError> {
        let speaker_id = group.next_speaker().clone();
        // A member missing from the roster is a wiring bug, not a flow we
        // can continue from.
        let speaker = *roster
            .get(&speaker_id)
            .ok_or_else(|| DomainError::UnknownPersona {
                persona: speaker_id.to_string(),
            })?;

        let lines = transcript.speaker_lines(|id| display_name(roster, id));
        let prompt = PromptTemplate::turn_prompt(
            &group.name(),
            &plan.initial_prompt,
            &lines,
            &speaker.display_name,
        );

        debug!(group = %group.name(), speaker = %speaker_id, seq = %group.next_seq(), "generating turn");

        let generated = retry_with_backoff(
            &self.params.retry,
            "generate_turn",
            GenerationError::is_transient,
            || self.timed_generate(&speaker.prompt, &prompt),
        )
        .await;

        match generated {
            Ok(text) => {
                let message = Message::new(group.id, group.next_seq(), speaker_id, text);
                // Durability before progress: the message is on disk
                // before the turn counts as taken.
                self.store.append_message(&message).await?;
                transcript.push(message.clone())?;
                group.record_turn()?;
                self.store.upsert_group(group).await?;
                observer.on_message(group, &message);
                Ok(())
            }
            Err(GenerationError::QuotaExceeded(e)) => {
                warn!(group = %group.name(), "generation quota exceeded, stopping group: {}", e);
                group.time_out(StopCause::QuotaExceeded(e))?;
                self.store.upsert_group(group).await?;
                Ok(())
            }
            Err(e) => {
                warn!(group = %group.name(), "generation retries exhausted, stopping group: {}", e);
                group.time_out(StopCause::GenerationExhausted(e.to_string()))?;
                self.store.upsert_group(group).await?;
                Ok(())
            }
        }
    }

    /// Ask the judge whether the discussion has converged.
    ///
    /// Every check records a verdict row — a failed or malformed judge
    /// call becomes a no-consensus verdict carrying the failure, and
    /// never stops the group. A consensus verdict and the group's state
    /// transition are persisted together.
    async fn check_consensus(
        &self,
        group: &mut DiscussionGroup,
        transcript: &Transcript,
        plan: &LessonPlan,
    ) -> Result<ConsensusVerdict, RunGroupError> {
        let seq = SeqNo::new(group.turn_count);
        debug!(group = %group.name(), at = %seq, "consensus check");

        let outcome = retry_with_backoff(
            &self.params.retry,
            "judge",
            |e| matches!(e, JudgeError::Transient(_) | JudgeError::Timeout),
            || self.timed_judge(&plan.initial_prompt, transcript),
        )
        .await;

        let verdict = match outcome {
            Ok(v) => ConsensusVerdict::new(group.id, seq, v.consensus, v.rationale),
            Err(e) => {
                warn!(group = %group.name(), "consensus check unusable: {}", e);
                ConsensusVerdict::inconclusive(group.id, seq, format!("judge failed: {}", e))
            }
        };

        if verdict.consensus {
            group.reach_consensus()?;
        }
        self.store.record_verdict(group, &verdict).await?;

        Ok(verdict)
    }

    async fn timed_generate(
        &self,
        system_prompt: &str,
        prompt: &str,
    ) -> Result<String, GenerationError> {
        match tokio::time::timeout(
            self.params.call_timeout,
            self.generation.generate(system_prompt, prompt),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(GenerationError::Timeout),
        }
    }

    async fn timed_judge(
        &self,
        task: &str,
        transcript: &Transcript,
    ) -> Result<JudgeVerdict, JudgeError> {
        match tokio::time::timeout(self.params.call_timeout, self.judge.judge(task, transcript))
            .await
        {
            Ok(result) => result,
            Err(_) => Err(JudgeError::Timeout),
        }
    }
}

fn display_name(roster: &HashMap<&PersonaId, &Persona>, id: &PersonaId) -> String {
    roster
        .get(id)
        .map(|p| p.display_name.clone())
        .unwrap_or_else(|| id.to_string())
}
