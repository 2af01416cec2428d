//! LLM adapters
//!
//! [`ChatClient`] talks to an OpenAI-compatible chat-completion endpoint
//! and implements the generation port; [`LlmJudge`] wraps a client of its
//! own with the consensus-judge prompt and strict verdict parsing.

mod client;
mod judge;

pub use client::{ChatClient, ChatClientConfig};
pub use judge::LlmJudge;
