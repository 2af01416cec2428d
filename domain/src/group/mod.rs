//! Discussion group subdomain
//!
//! The [`entities::DiscussionGroup`] lifecycle state machine and the
//! deterministic roster [`partition::partition_roster`] policy.

pub mod entities;
pub mod partition;
