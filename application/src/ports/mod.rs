//! Port definitions (interfaces for external adapters)
//!
//! Ports define the contracts that infrastructure adapters must implement.
//! Generation and judging are deliberately separate ports: the judge is
//! never one of the discussion participants, which keeps consensus
//! detection free of self-assessment bias.

pub mod generation;
pub mod judge;
pub mod observer;
pub mod persistence;
