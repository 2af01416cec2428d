//! Consensus subdomain
//!
//! The audit-trail verdict entity, the configurable check cadence, and the
//! pure text parsing that extracts structured decisions from free-form
//! judge and evaluator responses.

pub mod cadence;
pub mod parsing;
pub mod verdict;

pub use cadence::CheckCadence;
pub use parsing::{parse_feasibility_response, parse_judge_response};
pub use verdict::ConsensusVerdict;
