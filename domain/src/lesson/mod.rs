//! Lesson plan entities

use serde::{Deserialize, Serialize};

/// Identifier of a lesson plan (Value Object)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlanId(String);

impl PlanId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PlanId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for PlanId {
    fn from(s: &str) -> Self {
        PlanId::new(s)
    }
}

impl From<String> for PlanId {
    fn from(s: String) -> Self {
        PlanId::new(s)
    }
}

/// A lesson plan selected for one simulation run (Entity)
///
/// `initial_prompt` is the opening discussion question handed to every
/// group of the run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LessonPlan {
    pub id: PlanId,
    pub title: String,
    pub initial_prompt: String,
}

impl LessonPlan {
    pub fn new(
        id: impl Into<PlanId>,
        title: impl Into<String>,
        initial_prompt: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            initial_prompt: initial_prompt.into(),
        }
    }
}
