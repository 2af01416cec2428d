//! Consensus verdict entity

use crate::group::entities::GroupId;
use crate::transcript::SeqNo;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Outcome of one consensus check (Entity)
///
/// One row is recorded per check attempt, including checks whose judge
/// call failed or returned garbage — those carry `consensus = false` and
/// the failure in the rationale. The rows form the audit trail explaining
/// why a group stopped when it did.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsensusVerdict {
    pub group_id: GroupId,
    /// Sequence number of the latest message at check time
    pub seq: SeqNo,
    pub consensus: bool,
    pub rationale: String,
    pub created_at: DateTime<Utc>,
}

impl ConsensusVerdict {
    pub fn new(
        group_id: GroupId,
        seq: SeqNo,
        consensus: bool,
        rationale: impl Into<String>,
    ) -> Self {
        Self {
            group_id,
            seq,
            consensus,
            rationale: rationale.into(),
            created_at: Utc::now(),
        }
    }

    /// A no-consensus verdict recording a failed or unusable judge call
    pub fn inconclusive(group_id: GroupId, seq: SeqNo, reason: impl Into<String>) -> Self {
        Self::new(group_id, seq, false, reason)
    }
}
