//! Identifiers and bid primitives shared across the auction

use serde::{Deserialize, Serialize};
use std::fmt;

/// Score assigned to unassigned bids; every real bid must beat it
pub const MIN_SCORE: f64 = -1e20;

/// Unique identifier for an agent
///
/// IDs are opaque byte strings compared lexicographically; the comparison is
/// what makes tie-breaking deterministic across the fleet. The empty string
/// is reserved as the "no agent" sentinel.
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct AgentId(pub String);

impl AgentId {
    pub fn new(id: impl Into<String>) -> Self {
        AgentId(id.into())
    }

    /// The "no agent" sentinel, distinct from every real (non-empty) ID
    pub fn none() -> Self {
        AgentId(String::new())
    }

    pub fn is_none(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for AgentId {
    fn from(s: &str) -> Self {
        AgentId(s.to_string())
    }
}

impl From<String> for AgentId {
    fn from(s: String) -> Self {
        AgentId(s)
    }
}

/// Unique identifier for a task
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct TaskId(pub String);

impl TaskId {
    pub fn new(id: impl Into<String>) -> Self {
        TaskId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for TaskId {
    fn from(s: &str) -> Self {
        TaskId(s.to_string())
    }
}

impl From<String> for TaskId {
    fn from(s: String) -> Self {
        TaskId(s)
    }
}

/// An agent's bid on a task: who, how much, and when
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bid {
    pub agent: AgentId,
    pub score: f64,
    pub timestamp: f64,
}

impl Bid {
    pub fn new(agent: AgentId, score: f64, timestamp: f64) -> Self {
        Bid {
            agent,
            score,
            timestamp,
        }
    }

    /// The unassigned bid: no agent, sentinel score, epoch timestamp
    pub fn unassigned() -> Self {
        Bid {
            agent: AgentId::none(),
            score: MIN_SCORE,
            timestamp: 0.0,
        }
    }

    /// A bid is valid when it names a real agent with a real score
    pub fn is_valid(&self) -> bool {
        !self.agent.is_none() && self.score > MIN_SCORE
    }

    /// Total deterministic bid order used by the auction
    ///
    /// An assigned bid beats an unassigned one; otherwise higher score wins;
    /// ties break toward the lexicographically smaller agent ID. Timestamps
    /// do not participate here -- freshness is the consensus resolver's job.
    pub fn beats(&self, other: &Bid) -> bool {
        if self.agent.is_none() && !other.agent.is_none() {
            return false;
        }
        if !self.agent.is_none() && other.agent.is_none() {
            return true;
        }

        if self.score > other.score {
            true
        } else if self.score == other.score {
            self.agent < other.agent
        } else {
            false
        }
    }
}

impl Default for Bid {
    fn default() -> Self {
        Bid::unassigned()
    }
}
