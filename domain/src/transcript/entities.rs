//! Message and transcript entities

use crate::core::error::DomainError;
use crate::group::entities::GroupId;
use crate::persona::PersonaId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Message sequence number within a group (Value Object)
///
/// Starts at 1 and increases without gaps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SeqNo(u32);

impl SeqNo {
    pub fn new(value: u32) -> Self {
        Self(value)
    }

    pub fn first() -> Self {
        Self(1)
    }

    pub fn value(&self) -> u32 {
        self.0
    }

    pub fn next(&self) -> Self {
        Self(self.0 + 1)
    }
}

impl std::fmt::Display for SeqNo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One utterance in a group discussion (Entity)
///
/// Append-only: never mutated after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub group_id: GroupId,
    pub seq: SeqNo,
    pub speaker: PersonaId,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

impl Message {
    pub fn new(
        group_id: GroupId,
        seq: SeqNo,
        speaker: PersonaId,
        text: impl Into<String>,
    ) -> Self {
        Self {
            group_id,
            seq,
            speaker,
            text: text.into(),
            created_at: Utc::now(),
        }
    }
}

/// The full ordered discussion of one group
///
/// `push` rejects messages from another group and messages whose sequence
/// number is not exactly `len + 1`, so an in-memory transcript is gapless
/// by construction.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    group_id: Option<GroupId>,
    messages: Vec<Message>,
}

impl Transcript {
    pub fn new(group_id: GroupId) -> Self {
        Self {
            group_id: Some(group_id),
            messages: Vec::new(),
        }
    }

    pub fn push(&mut self, message: Message) -> Result<(), DomainError> {
        if let Some(expected) = self.group_id {
            if message.group_id != expected {
                return Err(DomainError::ForeignMessage {
                    expected: expected.value(),
                    got: message.group_id.value(),
                });
            }
        } else {
            self.group_id = Some(message.group_id);
        }

        let expected = self.messages.len() as u32 + 1;
        if message.seq.value() != expected {
            return Err(DomainError::SequenceGap {
                expected,
                got: message.seq.value(),
            });
        }

        self.messages.push(message);
        Ok(())
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Speaker/text pairs for prompt rendering, in order.
    ///
    /// `display` resolves a persona id to the name shown in prompts.
    pub fn speaker_lines<'a, F>(&'a self, display: F) -> Vec<(String, String)>
    where
        F: Fn(&PersonaId) -> String + 'a,
    {
        self.messages
            .iter()
            .map(|m| (display(&m.speaker), m.text.clone()))
            .collect()
    }
}
