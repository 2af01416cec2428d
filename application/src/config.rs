//! Simulation parameters — orchestration loop control.
//!
//! [`SimulationParams`] groups the static parameters that control group
//! sizing, stopping conditions, concurrency and failure handling. These
//! are application-layer concerns, not domain policy.

use crate::retry::RetryPolicy;
use seminar_domain::CheckCadence;
use std::time::Duration;

/// Knobs for one simulation run
#[derive(Debug, Clone)]
pub struct SimulationParams {
    /// Personas per group (remainder personas spread round-robin)
    pub group_size: usize,
    /// Turn cap per group before a TIMEOUT stop
    pub max_turns_per_group: u32,
    /// How often the judge inspects a transcript
    pub consensus_check_interval: CheckCadence,
    /// Maximum groups discussing in parallel
    pub concurrency_limit: usize,
    /// Retry budget for transient external failures
    pub retry: RetryPolicy,
    /// Per-call timeout for generation and judge calls
    pub call_timeout: Duration,
}

impl Default for SimulationParams {
    fn default() -> Self {
        Self {
            group_size: 6,
            max_turns_per_group: 24,
            consensus_check_interval: CheckCadence::EveryRound,
            concurrency_limit: 3,
            retry: RetryPolicy::default(),
            call_timeout: Duration::from_secs(120),
        }
    }
}

impl SimulationParams {
    // ==================== Builder Methods ====================

    pub fn with_group_size(mut self, size: usize) -> Self {
        self.group_size = size;
        self
    }

    pub fn with_max_turns(mut self, max: u32) -> Self {
        self.max_turns_per_group = max;
        self
    }

    pub fn with_check_interval(mut self, cadence: CheckCadence) -> Self {
        self.consensus_check_interval = cadence;
        self
    }

    pub fn with_concurrency_limit(mut self, limit: usize) -> Self {
        self.concurrency_limit = limit.max(1);
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }
}
