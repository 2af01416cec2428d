//! Evaluation entities - teacher commentary and the final feasibility report

use crate::group::entities::GroupId;
use crate::lesson::PlanId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Feasibility indicator extracted from the final evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feasibility {
    Feasible,
    NeedsRevision,
    Infeasible,
}

impl Feasibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Feasibility::Feasible => "feasible",
            Feasibility::NeedsRevision => "needs_revision",
            Feasibility::Infeasible => "infeasible",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "feasible" => Some(Feasibility::Feasible),
            "needs_revision" => Some(Feasibility::NeedsRevision),
            "infeasible" => Some(Feasibility::Infeasible),
            _ => None,
        }
    }
}

impl std::fmt::Display for Feasibility {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Qualitative commentary on one finished group's discussion (Entity)
///
/// Exactly one exists per group, created only after the group left the
/// active state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeacherComment {
    pub group_id: GroupId,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

impl TeacherComment {
    pub fn new(group_id: GroupId, text: impl Into<String>) -> Self {
        Self {
            group_id,
            text: text.into(),
            created_at: Utc::now(),
        }
    }
}

/// Aggregate feasibility report over all of a plan's teacher comments (Entity)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinalEvaluation {
    pub plan_id: PlanId,
    pub summary: String,
    pub feasibility: Feasibility,
    pub created_at: DateTime<Utc>,
}

impl FinalEvaluation {
    pub fn new(plan_id: PlanId, summary: impl Into<String>, feasibility: Feasibility) -> Self {
        Self {
            plan_id,
            summary: summary.into(),
            feasibility,
            created_at: Utc::now(),
        }
    }
}
