//! Test doubles for the use-case tests: scripted generation/judge ports
//! and an in-memory persistence gateway honoring the same idempotency
//! contracts as the real store.

use crate::ports::generation::{GenerationError, GenerationPort};
use crate::ports::judge::{JudgeError, JudgePort, JudgeVerdict};
use crate::ports::persistence::{PersistenceError, PersistenceGateway};
use async_trait::async_trait;
use seminar_domain::{
    ConsensusVerdict, DiscussionGroup, FinalEvaluation, GroupId, LessonPlan, Message, Persona,
    PlanId, TeacherComment, Transcript,
};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Mutex;

pub(crate) fn roster(n: usize) -> Vec<Persona> {
    (1..=n)
        .map(|i| {
            Persona::new(
                format!("S{:03}", i),
                format!("Student {}", i),
                format!("You are student {} in a simulated classroom.", i),
            )
        })
        .collect()
}

pub(crate) fn plan() -> LessonPlan {
    LessonPlan::new("lp-1", "Fractions", "How would you split a pizza fairly?")
}

// ==================== Generation ====================

enum GenBehavior {
    /// Numbered utterances, always succeeding
    Ok,
    /// Always fails with a transient error
    AlwaysTransient(String),
    /// Succeeds `n` times, then reports an exhausted quota
    QuotaAfter(u32, String),
}

pub(crate) struct ScriptedGeneration {
    behavior: GenBehavior,
    calls: AtomicU32,
}

impl ScriptedGeneration {
    pub(crate) fn ok() -> Self {
        Self {
            behavior: GenBehavior::Ok,
            calls: AtomicU32::new(0),
        }
    }

    pub(crate) fn always_transient(message: &str) -> Self {
        Self {
            behavior: GenBehavior::AlwaysTransient(message.to_string()),
            calls: AtomicU32::new(0),
        }
    }

    pub(crate) fn quota_after(successes: u32, message: &str) -> Self {
        Self {
            behavior: GenBehavior::QuotaAfter(successes, message.to_string()),
            calls: AtomicU32::new(0),
        }
    }
}

#[async_trait]
impl GenerationPort for ScriptedGeneration {
    async fn generate(
        &self,
        _system_prompt: &str,
        _prompt: &str,
    ) -> Result<String, GenerationError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.behavior {
            GenBehavior::Ok => Ok(format!("utterance {}", call + 1)),
            GenBehavior::AlwaysTransient(m) => Err(GenerationError::Transient(m.clone())),
            GenBehavior::QuotaAfter(n, m) => {
                if call < *n {
                    Ok(format!("utterance {}", call + 1))
                } else {
                    Err(GenerationError::QuotaExceeded(m.clone()))
                }
            }
        }
    }
}

// ==================== Judge ====================

enum JudgeBehavior {
    Always(bool),
    AlwaysErr(Box<dyn Fn() -> JudgeError + Send + Sync>),
    Script(Mutex<Vec<Result<JudgeVerdict, JudgeError>>>),
}

pub(crate) struct ScriptedJudge {
    behavior: JudgeBehavior,
}

impl ScriptedJudge {
    pub(crate) fn always(consensus: bool) -> Self {
        Self {
            behavior: JudgeBehavior::Always(consensus),
        }
    }

    pub(crate) fn always_err<F>(make: F) -> Self
    where
        F: Fn() -> JudgeError + Send + Sync + 'static,
    {
        Self {
            behavior: JudgeBehavior::AlwaysErr(Box::new(make)),
        }
    }

    /// Verdicts consumed in order; panics if called past the script's end
    pub(crate) fn with_script(script: Vec<Result<JudgeVerdict, JudgeError>>) -> Self {
        let mut reversed = script;
        reversed.reverse();
        Self {
            behavior: JudgeBehavior::Script(Mutex::new(reversed)),
        }
    }
}

#[async_trait]
impl JudgePort for ScriptedJudge {
    async fn judge(
        &self,
        _task: &str,
        _transcript: &Transcript,
    ) -> Result<JudgeVerdict, JudgeError> {
        match &self.behavior {
            JudgeBehavior::Always(consensus) => {
                Ok(JudgeVerdict::new(*consensus, "scripted verdict"))
            }
            JudgeBehavior::AlwaysErr(make) => Err(make()),
            JudgeBehavior::Script(script) => script
                .lock()
                .unwrap()
                .pop()
                .expect("judge called more often than scripted"),
        }
    }
}

// ==================== Persistence ====================

#[derive(Default)]
struct MemoryState {
    groups: BTreeMap<i64, DiscussionGroup>,
    messages: BTreeMap<(i64, u32), Message>,
    verdicts: Vec<ConsensusVerdict>,
    comments: BTreeMap<i64, TeacherComment>,
    evaluations: BTreeMap<String, FinalEvaluation>,
}

/// In-memory gateway with the real store's idempotency semantics
#[derive(Default)]
pub(crate) struct MemoryStore {
    state: Mutex<MemoryState>,
    failing: AtomicBool,
}

impl MemoryStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// All subsequent writes fail permanently (reads keep working)
    pub(crate) fn fail_writes(&self) {
        self.failing.store(true, Ordering::SeqCst);
    }

    fn check_writable(&self) -> Result<(), PersistenceError> {
        if self.failing.load(Ordering::SeqCst) {
            Err(PersistenceError::Exhausted(
                "store unavailable (scripted failure)".to_string(),
            ))
        } else {
            Ok(())
        }
    }

    pub(crate) fn group(&self, id: i64) -> Option<DiscussionGroup> {
        self.state.lock().unwrap().groups.get(&id).cloned()
    }

    pub(crate) fn verdicts(&self) -> Vec<ConsensusVerdict> {
        self.state.lock().unwrap().verdicts.clone()
    }

    pub(crate) fn messages_for_group(&self, id: i64) -> Vec<Message> {
        self.state
            .lock()
            .unwrap()
            .messages
            .iter()
            .filter(|((g, _), _)| *g == id)
            .map(|(_, m)| m.clone())
            .collect()
    }

    pub(crate) fn comments(&self) -> Vec<TeacherComment> {
        self.state.lock().unwrap().comments.values().cloned().collect()
    }

    pub(crate) fn evaluations(&self) -> Vec<FinalEvaluation> {
        self.state
            .lock()
            .unwrap()
            .evaluations
            .values()
            .cloned()
            .collect()
    }
}

#[async_trait]
impl PersistenceGateway for MemoryStore {
    async fn upsert_group(&self, group: &DiscussionGroup) -> Result<(), PersistenceError> {
        self.check_writable()?;
        self.state
            .lock()
            .unwrap()
            .groups
            .insert(group.id.value(), group.clone());
        Ok(())
    }

    async fn append_message(&self, message: &Message) -> Result<(), PersistenceError> {
        self.check_writable()?;
        let mut state = self.state.lock().unwrap();
        let key = (message.group_id.value(), message.seq.value());
        // Idempotent: an existing row wins, the resubmission is dropped.
        state.messages.entry(key).or_insert_with(|| message.clone());
        Ok(())
    }

    async fn record_verdict(
        &self,
        group: &DiscussionGroup,
        verdict: &ConsensusVerdict,
    ) -> Result<(), PersistenceError> {
        self.check_writable()?;
        let mut state = self.state.lock().unwrap();
        state.verdicts.push(verdict.clone());
        state.groups.insert(group.id.value(), group.clone());
        Ok(())
    }

    async fn save_comment(
        &self,
        group: &DiscussionGroup,
        comment: &TeacherComment,
    ) -> Result<(), PersistenceError> {
        self.check_writable()?;
        let mut state = self.state.lock().unwrap();
        state
            .comments
            .entry(group.id.value())
            .or_insert_with(|| comment.clone());
        state.groups.insert(group.id.value(), group.clone());
        Ok(())
    }

    async fn comment_for_group(
        &self,
        group_id: GroupId,
    ) -> Result<Option<TeacherComment>, PersistenceError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .comments
            .get(&group_id.value())
            .cloned())
    }

    async fn commented_groups(&self, plan_id: &PlanId) -> Result<Vec<GroupId>, PersistenceError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .groups
            .values()
            .filter(|g| {
                g.plan_id == *plan_id && g.status == seminar_domain::GroupStatus::Commented
            })
            .map(|g| g.id)
            .collect())
    }

    async fn comments_for_plan(
        &self,
        plan_id: &PlanId,
    ) -> Result<Vec<TeacherComment>, PersistenceError> {
        let state = self.state.lock().unwrap();
        let mut out: Vec<TeacherComment> = state
            .groups
            .values()
            .filter(|g| g.plan_id == *plan_id)
            .filter_map(|g| state.comments.get(&g.id.value()).cloned())
            .collect();
        out.sort_by_key(|c| c.group_id);
        Ok(out)
    }

    async fn save_evaluation(&self, evaluation: &FinalEvaluation) -> Result<(), PersistenceError> {
        self.check_writable()?;
        self.state
            .lock()
            .unwrap()
            .evaluations
            .entry(evaluation.plan_id.to_string())
            .or_insert_with(|| evaluation.clone());
        Ok(())
    }

    async fn evaluation_exists(&self, plan_id: &PlanId) -> Result<bool, PersistenceError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .evaluations
            .contains_key(&plan_id.to_string()))
    }
}
