//! Transcript subdomain
//!
//! Append-only ordered messages for one group, with gapless 1-based
//! sequence numbers enforced at the entity level.

mod entities;

pub use entities::{Message, SeqNo, Transcript};
