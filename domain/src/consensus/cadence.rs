//! Consensus check cadence

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// How often the judge inspects a group's transcript
///
/// Parsed from configuration: `"round"` (one check per full round, i.e.
/// one turn per member — the default) or an explicit number of turns.
///
/// # Example
///
/// ```
/// use seminar_domain::consensus::CheckCadence;
///
/// let cadence: CheckCadence = "round".parse().unwrap();
/// assert_eq!(cadence.interval_for(4), 4);
///
/// let cadence: CheckCadence = "2".parse().unwrap();
/// assert_eq!(cadence.interval_for(4), 2);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CheckCadence {
    /// Check after every full round (group size turns)
    EveryRound,
    /// Check after every N completed turns
    EveryTurns(u32),
}

impl CheckCadence {
    /// Turns between checks for a group with `members` participants
    pub fn interval_for(&self, members: usize) -> u32 {
        match self {
            CheckCadence::EveryRound => members.max(1) as u32,
            CheckCadence::EveryTurns(n) => (*n).max(1),
        }
    }

    /// Whether a check is due after `turn_count` completed turns
    pub fn is_due(&self, turn_count: u32, members: usize) -> bool {
        turn_count > 0 && turn_count % self.interval_for(members) == 0
    }
}

impl Default for CheckCadence {
    fn default() -> Self {
        CheckCadence::EveryRound
    }
}

impl FromStr for CheckCadence {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("round") {
            return Ok(CheckCadence::EveryRound);
        }
        match s.parse::<u32>() {
            Ok(n) if n > 0 => Ok(CheckCadence::EveryTurns(n)),
            _ => Err(format!(
                "invalid consensus_check_interval '{}': expected \"round\" or a positive turn count",
                s
            )),
        }
    }
}

impl std::fmt::Display for CheckCadence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CheckCadence::EveryRound => write!(f, "round"),
            CheckCadence::EveryTurns(n) => write!(f, "{}", n),
        }
    }
}
