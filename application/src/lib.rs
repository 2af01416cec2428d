//! Application layer for seminar
//!
//! This crate contains use cases, port definitions, and application
//! configuration. It depends only on the domain layer.

pub mod config;
pub mod ports;
pub mod retry;
pub mod use_cases;

// Re-export commonly used types
pub use config::SimulationParams;
pub use ports::{
    generation::{GenerationError, GenerationPort},
    judge::{JudgeError, JudgePort, JudgeVerdict},
    observer::{DiscussionObserver, NoObserver},
    persistence::{PersistenceError, PersistenceGateway},
};
pub use retry::{retry_with_backoff, RetryPolicy};
pub use use_cases::comment_group::{CommentGroupError, CommentGroupUseCase};
pub use use_cases::evaluate_plan::{EvaluatePlanError, EvaluatePlanUseCase};
pub use use_cases::run_group::{FinishedGroup, RunGroupError, RunGroupUseCase};
pub use use_cases::run_simulation::{
    GroupOutcome, RunSimulationError, RunSimulationInput, RunSimulationUseCase, SimulationReport,
};
